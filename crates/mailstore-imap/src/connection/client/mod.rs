//! One IMAP session and its command executor.
//!
//! [`Connection::execute`] writes a tagged command, collects every untagged
//! response until the matching completion arrives and returns both as
//! [`Responses`]. The typed helpers in this module's submodules take what
//! they understand and hand the remainder to [`Connection::dispatch`], which
//! keeps the selected-mailbox snapshot current and notifies observers.

#![allow(clippy::missing_errors_doc)]

mod auth;
mod mailbox;
mod message;

pub use message::Fetched;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::Instant;

use super::cache::FolderCache;
use super::framed::FramedStream;
use super::responses::{Completion, Responses};
use crate::command::{Command, TagGenerator};
use crate::handler::{self, ResponseHandler};
use crate::metrics::{LatencyRecorder, Outcome, TracingRecorder};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, MailboxStatus, ResponseCode};
use crate::{Error, Result};

/// An IMAP session over any byte stream.
///
/// Commands run strictly one at a time. Once the server says `BYE`, the
/// stream ends, or the owning pool closes the connection, every later
/// command fails with [`Error::ConnectionBroken`].
pub struct Connection<S> {
    stream: FramedStream<S>,
    tags: TagGenerator,
    capabilities: Vec<Capability>,
    login: Option<String>,
    observers: Vec<Box<dyn ResponseHandler>>,
    mailbox: MailboxStatus,
    folders: FolderCache,
    broken: bool,
    close_signal: Option<watch::Receiver<bool>>,
    recorder: Arc<dyn LatencyRecorder>,
    read_timeout: Option<Duration>,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("tags", &self.tags)
            .field("capabilities", &self.capabilities)
            .field("login", &self.login)
            .field("mailbox", &self.mailbox)
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

impl<S> Connection<S> {
    /// Reports command latency to `recorder` instead of `tracing`.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn LatencyRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Fails any single read that takes longer than `timeout`.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Registers an observer for unconsumed responses.
    pub fn add_observer(&mut self, observer: Box<dyn ResponseHandler>) {
        self.observers.push(observer);
    }

    /// Capabilities as last advertised.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server advertised `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Login name after authentication; empty for a `PREAUTH` session.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    /// Returns true once LOGIN/AUTHENTICATE succeeded or the server pre-authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.login.is_some()
    }

    /// Snapshot of the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &MailboxStatus {
        &self.mailbox
    }

    /// Folder metadata learned on this connection.
    #[must_use]
    pub const fn folders(&self) -> &FolderCache {
        &self.folders
    }

    /// Mutable access to the folder cache.
    pub const fn folders_mut(&mut self) -> &mut FolderCache {
        &mut self.folders
    }

    /// Returns true if the session is gone and must be discarded.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken || self.closed_by_owner()
    }

    #[cfg(test)]
    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub(crate) fn attach_close_signal(&mut self, signal: watch::Receiver<bool>) {
        self.close_signal = Some(signal);
    }

    pub(crate) fn detach_close_signal(&mut self) {
        self.close_signal = None;
    }

    fn closed_by_owner(&self) -> bool {
        self.close_signal.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Replays every unconsumed response to the mailbox snapshot and to each
    /// observer, in arrival order.
    pub fn dispatch(&mut self, responses: Responses) {
        for response in responses.into_remaining() {
            self.observe(&response);
            for observer in &mut self.observers {
                handler::deliver(observer.as_mut(), &response);
            }
        }
    }

    /// Checks the completion, then dispatches what is left.
    pub(crate) fn complete(&mut self, responses: Responses) -> Result<()> {
        let outcome = responses.check();
        self.dispatch(responses);
        outcome
    }

    fn observe(&mut self, response: &UntaggedResponse) {
        match response {
            UntaggedResponse::Capability(caps) => self.capabilities.clone_from(caps),
            UntaggedResponse::Exists(n) => self.mailbox.exists = *n,
            UntaggedResponse::Recent(n) => self.mailbox.recent = *n,
            UntaggedResponse::Expunge(_) => {
                self.mailbox.exists = self.mailbox.exists.saturating_sub(1);
            }
            UntaggedResponse::Flags(flags) => self.mailbox.flags.clone_from(flags),
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidNext(uid) => self.mailbox.uid_next = Some(*uid),
                ResponseCode::UidValidity(v) => self.mailbox.uid_validity = Some(*v),
                ResponseCode::ReadOnly => self.mailbox.read_only = true,
                ResponseCode::ReadWrite => self.mailbox.read_only = false,
                ResponseCode::Capability(caps) => self.capabilities.clone_from(caps),
                _ => {}
            },
            _ => {}
        }
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps a stream whose greeting has already been consumed.
    #[must_use]
    pub fn new(stream: S) -> Self {
        Self {
            stream: FramedStream::new(stream),
            tags: TagGenerator::default(),
            capabilities: Vec::new(),
            login: None,
            observers: Vec::new(),
            mailbox: MailboxStatus::default(),
            folders: FolderCache::default(),
            broken: false,
            close_signal: None,
            recorder: Arc::new(TracingRecorder),
            read_timeout: None,
        }
    }

    /// Wraps a freshly opened stream and reads the server greeting.
    ///
    /// Capabilities in the greeting's response code are kept. A `PREAUTH`
    /// greeting leaves the session authenticated; a `BYE` greeting is an
    /// error.
    pub async fn from_greeting(stream: S) -> Result<Self> {
        let mut conn = Self::new(stream);
        let greeting = conn.stream.read_response().await?;

        match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Ok { code, .. }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    conn.capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    conn.capabilities = caps;
                }
                conn.login = Some(String::new());
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::ConnectionBroken(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        tracing::debug!(capabilities = conn.capabilities.len(), "greeting received");
        Ok(conn)
    }

    /// Sends `command` and collects everything up to its completion.
    ///
    /// A NO or BAD completion is not an error here; call
    /// [`Responses::check`] for that. Transport failures, a server `BYE`
    /// followed by end of stream, and a close by the owning pool all mark the
    /// connection broken.
    pub async fn execute(&mut self, command: &Command) -> Result<Responses> {
        self.run(command, None).await
    }

    /// Like [`execute`](Self::execute), answering the first `+` continuation
    /// with `continuation` and any later one with an empty line.
    pub(crate) async fn run(
        &mut self,
        command: &Command,
        continuation: Option<&[u8]>,
    ) -> Result<Responses> {
        if self.is_broken() {
            self.broken = true;
            return Err(Error::ConnectionBroken("connection is closed".to_string()));
        }

        let verb = command.verb();
        let started = Instant::now();
        let result = self.exchange(command, continuation).await;

        let outcome = match &result {
            Ok(responses) => {
                let status = responses.completion().classify();
                if status.is_fatal() {
                    self.broken = true;
                }
                Outcome::from(status)
            }
            Err(err) => {
                if err.is_connection_broken() {
                    self.broken = true;
                }
                Outcome::Failed
            }
        };
        self.recorder.record(verb, started.elapsed(), outcome);
        result
    }

    async fn exchange(
        &mut self,
        command: &Command,
        mut continuation: Option<&[u8]>,
    ) -> Result<Responses> {
        let tag = self.tags.next_tag();
        let wire = command.serialize(tag.as_str());
        if command.is_sensitive() {
            tracing::trace!(%tag, verb = command.verb(), "C: <redacted>");
        } else {
            tracing::trace!(line = %String::from_utf8_lossy(&wire).trim_end(), "C:");
        }
        self.write(&wire).await?;

        let mut untagged = Vec::new();
        let mut farewell: Option<(Option<ResponseCode>, String)> = None;
        loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                Err(err) => {
                    return match farewell.take() {
                        Some((code, text)) if err.is_connection_broken() => {
                            Ok(Responses::new(untagged, Completion::bye(tag, code, text)))
                        }
                        _ => Err(err),
                    };
                }
            };

            let parsed = match ResponseParser::parse(&line) {
                Ok(parsed) => parsed,
                Err(err) if line.starts_with(tag.as_str().as_bytes()) => return Err(err),
                Err(err) => {
                    tracing::warn!(%err, "skipping unparseable response");
                    continue;
                }
            };

            match parsed {
                Response::Tagged {
                    tag: got,
                    status,
                    code,
                    text,
                } if got == tag => {
                    if let Some(ResponseCode::Capability(caps)) = &code {
                        self.capabilities.clone_from(caps);
                    }
                    let completion = Completion {
                        tag: got,
                        status,
                        code,
                        text,
                    };
                    return Ok(Responses::new(untagged, completion));
                }
                Response::Tagged { tag: got, .. } => {
                    tracing::warn!(expected = %tag, %got, "discarding completion for another tag");
                }
                Response::Untagged(response) => {
                    if let UntaggedResponse::Bye { code, text } = &response {
                        farewell = Some((code.clone(), text.clone()));
                    }
                    untagged.push(response);
                }
                Response::Continuation { .. } => {
                    let mut reply = continuation.take().unwrap_or_default().to_vec();
                    reply.extend_from_slice(b"\r\n");
                    self.write(&reply).await?;
                }
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let result = self.stream.write_command(data).await;
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    /// Reads one response. Any failure leaves the stream mid-response, so
    /// the connection is marked broken.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let line = self.read_line_inner().await;
        if line.is_err() {
            self.broken = true;
        }
        line
    }

    async fn read_line_inner(&mut self) -> Result<Vec<u8>> {
        let timeout = self.read_timeout;
        let signal = self.close_signal.clone();
        let read = async {
            match timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.stream.read_response()).await {
                        Ok(line) => line,
                        Err(_) => Err(Error::Timeout(limit)),
                    }
                }
                None => self.stream.read_response().await,
            }
        };

        match signal {
            Some(rx) => tokio::select! {
                line = read => line,
                () = closed(rx) => Err(Error::ConnectionBroken("closed by pool".to_string())),
            },
            None => read.await,
        }
    }

    /// Runs a command whose only result is its completion.
    pub(crate) async fn simple(&mut self, command: &Command) -> Result<()> {
        let responses = self.execute(command).await?;
        self.complete(responses)
    }
}

/// Resolves once the pool flags the connection closed.
async fn closed(mut signal: watch::Receiver<bool>) {
    if signal.wait_for(|closed| *closed).await.is_err() {
        // Pool gone without closing us: nothing will ever fire.
        std::future::pending::<()>().await;
    }
}
