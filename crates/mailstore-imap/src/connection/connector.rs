//! Opening authenticated connections.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use super::client::Connection;
use super::config::{AuthOptions, ConnectConfig, Credential, Endpoint};
use super::stream::{ImapStream, dial};
use crate::metrics::{LatencyRecorder, TracingRecorder};
use crate::{Error, Result};

/// Produces authenticated connections for a pool.
///
/// The pool owns its connector, so tests can swap in one that talks to an
/// in-memory server.
pub trait Connector: Send + Sync + 'static {
    /// Transport the connections run over.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Dials `endpoint`, reads the greeting and authenticates.
    ///
    /// Rejected credentials must surface as [`Error::Auth`] so the pool
    /// can retry with different [`AuthOptions`].
    fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        options: AuthOptions,
    ) -> impl Future<Output = Result<Connection<Self::Stream>>> + Send;
}

/// The default connector: TCP or TLS, greeting, then authentication.
#[derive(Clone)]
pub struct ImapConnector {
    config: ConnectConfig,
    recorder: Arc<dyn LatencyRecorder>,
}

impl std::fmt::Debug for ImapConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ImapConnector {
    fn default() -> Self {
        Self::new(ConnectConfig::default())
    }
}

impl ImapConnector {
    /// Creates a connector with the given dial settings.
    #[must_use]
    pub fn new(config: ConnectConfig) -> Self {
        Self {
            config,
            recorder: Arc::new(TracingRecorder),
        }
    }

    /// Sends command latencies of every new connection to `recorder`.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn LatencyRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    async fn open(&self, endpoint: &Endpoint) -> Result<Connection<ImapStream>> {
        let stream = dial(endpoint).await?;
        tracing::debug!(%endpoint, tls = stream.is_tls(), "transport established");
        Connection::from_greeting(stream).await
    }
}

impl Connector for ImapConnector {
    type Stream = ImapStream;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        options: AuthOptions,
    ) -> Result<Connection<ImapStream>> {
        let limit = self.config.connect_timeout;
        let conn = tokio::time::timeout(limit, self.open(endpoint))
            .await
            .map_err(|_| Error::Timeout(limit))??;

        let mut conn = conn.with_recorder(Arc::clone(&self.recorder));
        if let Some(read_timeout) = self.config.read_timeout {
            conn = conn.with_read_timeout(read_timeout);
        }

        conn.authenticate(credential, options).await?;
        tracing::info!(%endpoint, login = credential.login(), "connected");
        Ok(conn)
    }
}
