//! Capability discovery, authentication and logout.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite};

use super::Connection;
use crate::command::Command;
use crate::connection::config::{AuthOptions, Credential};
use crate::parser::UntaggedResponse;
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Sends `CAPABILITY` and replaces the stored list.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let mut responses = self.execute(&Command::Capability).await?;
        let advertised = responses.take(|r| match r {
            UntaggedResponse::Capability(caps) => Ok(caps),
            other => Err(other),
        });
        self.complete(responses)?;
        if let Some(caps) = advertised.into_iter().last() {
            self.capabilities = caps;
        }
        Ok(self.capabilities.clone())
    }

    /// Sends `NOOP`; unsolicited updates go to the observers.
    pub async fn noop(&mut self) -> Result<()> {
        self.simple(&Command::Noop).await
    }

    /// Authenticates with whatever `credential` calls for.
    ///
    /// Passwords use `AUTHENTICATE PLAIN` when advertised and not disabled
    /// by `options`, otherwise `LOGIN`. Bearer tokens use XOAUTH2. A `NO`
    /// from the server becomes [`Error::Auth`].
    pub async fn authenticate(
        &mut self,
        credential: &Credential,
        options: AuthOptions,
    ) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }
        if self.capabilities.is_empty() {
            self.capability().await?;
        }

        match credential {
            Credential::Password { login, password } => {
                let plain = !options.disable_plain
                    && self.capabilities.iter().any(|c| c.is_auth("PLAIN"));
                if plain {
                    self.authenticate_plain(login, password).await
                } else {
                    self.login_with_password(login, password).await
                }
            }
            Credential::OAuth2 { login, token } => self.authenticate_xoauth2(login, token).await,
        }
    }

    /// Authenticates with `LOGIN`.
    pub async fn login_with_password(&mut self, login: &str, password: &str) -> Result<()> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Error::Capability("LOGIN".to_string()));
        }
        let command = Command::Login {
            username: login.to_string(),
            password: password.to_string(),
        };
        self.finish_auth(&command, None, login).await
    }

    /// Authenticates with SASL PLAIN (RFC 4616).
    pub async fn authenticate_plain(&mut self, login: &str, password: &str) -> Result<()> {
        let payload = STANDARD.encode(format!("\0{login}\0{password}"));
        self.sasl("PLAIN", payload, login).await
    }

    /// Authenticates with XOAUTH2 using a bearer token.
    pub async fn authenticate_xoauth2(&mut self, login: &str, token: &str) -> Result<()> {
        if !self.capabilities.iter().any(|c| c.is_auth("XOAUTH2")) {
            return Err(Error::Capability("AUTH=XOAUTH2".to_string()));
        }
        let payload = STANDARD.encode(format!("user={login}\x01auth=Bearer {token}\x01\x01"));
        self.sasl("XOAUTH2", payload, login).await
    }

    async fn sasl(&mut self, mechanism: &str, payload: String, login: &str) -> Result<()> {
        let initial = self.has_capability(&Capability::SaslIr);
        let (initial_response, continuation) = if initial {
            (Some(payload), None)
        } else {
            (None, Some(payload.into_bytes()))
        };
        let command = Command::Authenticate {
            mechanism: mechanism.to_string(),
            initial_response,
        };
        self.finish_auth(&command, continuation.as_deref(), login).await
    }

    async fn finish_auth(
        &mut self,
        command: &Command,
        continuation: Option<&[u8]>,
        login: &str,
    ) -> Result<()> {
        let responses = self.run(command, continuation).await?;
        let completion = responses.completion().clone();
        if completion.classify() == Status::No {
            self.dispatch(responses);
            tracing::warn!(login, verb = command.verb(), "authentication rejected");
            return Err(Error::Auth(completion.text));
        }

        let announced = matches!(completion.code, Some(ResponseCode::Capability(_)))
            || responses
                .remaining()
                .any(|r| matches!(r, UntaggedResponse::Capability(_)));
        self.complete(responses)?;
        self.login = Some(login.to_string());
        tracing::debug!(login, verb = command.verb(), "authenticated");

        // Capabilities usually grow after authentication.
        if !announced {
            self.capability().await?;
        }
        Ok(())
    }

    /// Sends `LOGOUT` and shuts the stream down.
    ///
    /// The connection is unusable afterwards whatever the server answers.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.execute(&Command::Logout).await;
        self.broken = true;
        self.stream.shutdown().await;

        match result {
            Ok(mut responses) => {
                responses.take(|r| match r {
                    UntaggedResponse::Bye { .. } => Ok(()),
                    other => Err(other),
                });
                self.dispatch(responses);
                Ok(())
            }
            Err(err) if err.is_connection_broken() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Closes a connection that is being thrown away.
    ///
    /// A usable session is logged out, bounded by `grace`; a broken one
    /// only has its stream shut down. Failures are logged and dropped.
    pub async fn close(mut self, grace: Duration) {
        if self.is_broken() {
            self.stream.shutdown().await;
            return;
        }
        match tokio::time::timeout(grace, self.logout()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::debug!(%err, "LOGOUT on close failed"),
            Err(_) => {
                tracing::debug!(?grace, "LOGOUT on close timed out");
                self.stream.shutdown().await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    #[tokio::test]
    async fn login_refreshes_capabilities() {
        let mock = Builder::new()
            .write(b"A0001 LOGIN fred secret\r\n")
            .read(b"A0001 OK [CAPABILITY IMAP4rev1 UIDPLUS] Logged in\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::Imap4Rev1];

        conn.login_with_password("fred", "secret").await.unwrap();
        assert!(conn.is_authenticated());
        assert!(conn.has_capability(&Capability::UidPlus));
    }

    #[tokio::test]
    async fn plain_with_initial_response() {
        let mock = Builder::new()
            .write(b"A0001 AUTHENTICATE PLAIN AGZyZWQAc2VjcmV0\r\n")
            .read(b"* CAPABILITY IMAP4rev1 SASL-IR AUTH=PLAIN QUOTA\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::SaslIr, Capability::Auth("PLAIN".into())];

        conn.authenticate(&Credential::password("fred", "secret"), AuthOptions::default())
            .await
            .unwrap();
        assert!(conn.has_capability(&Capability::Quota));
    }

    #[tokio::test]
    async fn plain_over_continuation() {
        let mock = Builder::new()
            .write(b"A0001 AUTHENTICATE PLAIN\r\n")
            .read(b"+ \r\n")
            .write(b"AGZyZWQAc2VjcmV0\r\n")
            .read(b"A0001 OK [CAPABILITY IMAP4rev1] done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::Auth("PLAIN".into())];

        conn.authenticate_plain("fred", "secret").await.unwrap();
        assert_eq!(conn.login(), Some("fred"));
    }

    #[tokio::test]
    async fn disable_plain_falls_back_to_login() {
        let mock = Builder::new()
            .write(b"A0001 LOGIN fred secret\r\n")
            .read(b"A0001 OK [CAPABILITY IMAP4rev1] ok\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::Auth("PLAIN".into())];

        let options = AuthOptions {
            disable_plain: true,
        };
        conn.authenticate(&Credential::password("fred", "secret"), options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_login_is_an_auth_error() {
        let mock = Builder::new()
            .write(b"A0001 LOGIN fred wrong\r\n")
            .read(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::Imap4Rev1];

        let err = conn.login_with_password("fred", "wrong").await.unwrap_err();
        assert!(err.is_auth());
        assert!(!conn.is_authenticated());
        assert!(!conn.is_broken());
    }

    #[tokio::test]
    async fn xoauth2_requires_capability() {
        let mut conn = Connection::new(Builder::new().build());
        conn.capabilities = vec![Capability::Imap4Rev1];
        let err = conn.authenticate_xoauth2("fred", "tok").await.unwrap_err();
        assert!(matches!(err, Error::Capability(_)));
    }

    #[tokio::test]
    async fn logout_tolerates_bye() {
        let mock = Builder::new()
            .write(b"A0001 LOGOUT\r\n")
            .read(b"* BYE see you\r\n")
            .read(b"A0001 OK LOGOUT completed\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.logout().await.unwrap();
        assert!(conn.is_broken());
    }

    #[tokio::test]
    async fn close_logs_out_a_usable_session() {
        let mock = Builder::new()
            .write(b"A0001 LOGOUT\r\n")
            .read(b"* BYE bye\r\nA0001 OK done\r\n")
            .build();
        Connection::new(mock).close(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn close_skips_logout_when_broken() {
        let mut conn = Connection::new(Builder::new().build());
        conn.mark_broken();
        conn.close(Duration::from_secs(1)).await;
    }
}
