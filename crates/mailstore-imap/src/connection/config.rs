//! Endpoints, credentials and dial settings.

use std::fmt;
use std::time::Duration;

/// Transport security for the default dialer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Security {
    /// TLS from the first byte (port 993).
    #[default]
    Tls,
    /// Plain TCP (port 143). Only for tests and trusted networks.
    Plain,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Tls => 993,
            Self::Plain => 143,
        }
    }
}

/// Server address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Server hostname, also used for TLS server name verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
}

impl Endpoint {
    /// Implicit-TLS endpoint on port 993.
    #[must_use]
    pub fn tls(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Tls.default_port(),
            security: Security::Tls,
        }
    }

    /// Plain-TCP endpoint on port 143.
    #[must_use]
    pub fn plain(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Plain.default_port(),
            security: Security::Plain,
        }
    }

    /// Overrides the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Login plus secret.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `LOGIN` or `AUTHENTICATE PLAIN`.
    Password {
        /// Login name.
        login: String,
        /// Password.
        password: String,
    },
    /// `AUTHENTICATE XOAUTH2` with a bearer token.
    OAuth2 {
        /// Login name.
        login: String,
        /// Access token.
        token: String,
    },
}

impl Credential {
    /// Password credential.
    #[must_use]
    pub fn password(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            login: login.into(),
            password: password.into(),
        }
    }

    /// OAuth2 bearer-token credential.
    #[must_use]
    pub fn oauth2(login: impl Into<String>, token: impl Into<String>) -> Self {
        Self::OAuth2 {
            login: login.into(),
            token: token.into(),
        }
    }

    /// The login name.
    #[must_use]
    pub fn login(&self) -> &str {
        match self {
            Self::Password { login, .. } | Self::OAuth2 { login, .. } => login,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Password { .. } => "Password",
            Self::OAuth2 { .. } => "OAuth2",
        };
        f.debug_struct(kind)
            .field("login", &self.login())
            .finish_non_exhaustive()
    }
}

/// Authentication knobs a connector honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthOptions {
    /// Never use `AUTHENTICATE PLAIN`, even if advertised.
    pub disable_plain: bool,
}

/// Settings for the default dialer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Limit for TCP connect plus TLS handshake plus greeting.
    pub connect_timeout: Duration,
    /// Limit for each response read; `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
        }
    }
}

impl ConnectConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConnectConfigBuilder {
        ConnectConfigBuilder::default()
    }
}

/// Builder for [`ConnectConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConnectConfigBuilder {
    config: ConnectConfig,
}

impl ConnectConfigBuilder {
    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the per-read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ConnectConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_defaults() {
        let tls = Endpoint::tls("imap.example.com");
        assert_eq!(tls.port, 993);
        assert_eq!(tls.to_string(), "imap.example.com:993");
        assert_eq!(Endpoint::plain("localhost").with_port(1143).port, 1143);
    }

    #[test]
    fn credential_debug_hides_secret() {
        let cred = Credential::password("fred", "hunter2");
        let shown = format!("{cred:?}");
        assert!(shown.contains("fred"));
        assert!(!shown.contains("hunter2"));
        assert_eq!(Credential::oauth2("fred", "tok").login(), "fred");
    }

    #[test]
    fn connect_config_builder() {
        let config = ConnectConfig::builder()
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(Duration::from_secs(60))
            .build();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(60)));
        assert_eq!(ConnectConfig::default().connect_timeout, Duration::from_secs(30));
    }
}
