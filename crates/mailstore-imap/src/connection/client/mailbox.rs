//! Mailbox-level commands: STATUS, QUOTA, ACL, LIST and friends.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Connection;
use crate::command::Command;
use crate::parser::{UntaggedResponse, status_counters};
use crate::types::{
    AclEntry, ListResponse, Mailbox, MailboxStatus, Quota, ResponseCode, StatusAttribute,
};
use crate::{Error, Result};

fn same_mailbox(a: &Mailbox, b: &Mailbox) -> bool {
    a == b || (a.is_inbox() && b.is_inbox())
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Asks for `keys` of `mailbox` and returns them in the same order.
    ///
    /// Counters the server leaves out come back as
    /// [`ABSENT`](crate::parser::ABSENT).
    pub async fn status(&mut self, mailbox: &Mailbox, keys: &[StatusAttribute]) -> Result<Vec<i64>> {
        let command = Command::Status {
            mailbox: mailbox.clone(),
            items: keys.to_vec(),
        };
        let mut responses = self.execute(&command).await?;
        let found = responses.take(|r| {
            if matches!(&r, UntaggedResponse::Status { mailbox: got, .. } if same_mailbox(got, mailbox)) {
                Ok(r)
            } else {
                Err(r)
            }
        });
        self.complete(responses)?;

        let response = found
            .last()
            .ok_or_else(|| Error::Protocol(format!("no STATUS data for {mailbox}")))?;
        status_counters(response, keys)
    }

    /// `GETQUOTAROOT`: every quota that applies to `mailbox`.
    pub async fn get_quota_root(&mut self, mailbox: &Mailbox) -> Result<Vec<Quota>> {
        let command = Command::GetQuotaRoot {
            mailbox: mailbox.clone(),
        };
        let mut responses = self.execute(&command).await?;
        responses.take(|r| match r {
            UntaggedResponse::QuotaRoot { .. } => Ok(()),
            other => Err(other),
        });
        let quotas = responses.take(|r| match r {
            UntaggedResponse::Quota(quota) => Ok(quota),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(quotas)
    }

    /// `GETACL`: identifier/rights pairs for `mailbox`.
    pub async fn get_acl(&mut self, mailbox: &Mailbox) -> Result<Vec<AclEntry>> {
        let command = Command::GetAcl {
            mailbox: mailbox.clone(),
        };
        let mut responses = self.execute(&command).await?;
        let entries = responses.take(|r| match r {
            UntaggedResponse::Acl { entries, .. } => Ok(entries),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(entries.into_iter().flatten().collect())
    }

    /// `MYRIGHTS`: the logged-in user's rights on `mailbox`.
    pub async fn my_rights(&mut self, mailbox: &Mailbox) -> Result<String> {
        let command = Command::MyRights {
            mailbox: mailbox.clone(),
        };
        let mut responses = self.execute(&command).await?;
        let rights = responses.take(|r| match r {
            UntaggedResponse::MyRights { rights, .. } => Ok(rights),
            other => Err(other),
        });
        self.complete(responses)?;
        rights
            .into_iter()
            .last()
            .ok_or_else(|| Error::Protocol("no MYRIGHTS data".to_string()))
    }

    /// `LIST`; every entry also refreshes the folder cache.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let command = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let mut responses = self.execute(&command).await?;
        let entries = responses.take(|r| match r {
            UntaggedResponse::List(entry) => Ok(entry),
            other => Err(other),
        });
        self.complete(responses)?;
        for entry in &entries {
            self.folders.record_list(entry);
        }
        Ok(entries)
    }

    /// `LSUB`: subscribed folders.
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let command = Command::Lsub {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let mut responses = self.execute(&command).await?;
        let entries = responses.take(|r| match r {
            UntaggedResponse::Lsub(entry) => Ok(entry),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(entries)
    }

    /// `CREATE`
    pub async fn create(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.folders.invalidate_folder(mailbox.as_str());
        self.simple(&Command::Create {
            mailbox: mailbox.clone(),
        })
        .await
    }

    /// `DELETE`
    pub async fn delete(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.folders.invalidate_folder(mailbox.as_str());
        self.simple(&Command::Delete {
            mailbox: mailbox.clone(),
        })
        .await
    }

    /// `RENAME`; both names leave the folder cache.
    pub async fn rename(&mut self, from: &Mailbox, to: &Mailbox) -> Result<()> {
        self.folders.invalidate_folder(from.as_str());
        self.folders.invalidate_folder(to.as_str());
        self.simple(&Command::Rename {
            from: from.clone(),
            to: to.clone(),
        })
        .await
    }

    /// `SUBSCRIBE`
    pub async fn subscribe(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.simple(&Command::Subscribe {
            mailbox: mailbox.clone(),
        })
        .await
    }

    /// `UNSUBSCRIBE`
    pub async fn unsubscribe(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.simple(&Command::Unsubscribe {
            mailbox: mailbox.clone(),
        })
        .await
    }

    /// `SELECT`: opens `mailbox` read-write and returns its snapshot.
    pub async fn select(&mut self, mailbox: &Mailbox) -> Result<MailboxStatus> {
        self.open(
            Command::Select {
                mailbox: mailbox.clone(),
            },
            mailbox,
            false,
        )
        .await
    }

    /// `EXAMINE`: opens `mailbox` read-only and returns its snapshot.
    pub async fn examine(&mut self, mailbox: &Mailbox) -> Result<MailboxStatus> {
        self.open(
            Command::Examine {
                mailbox: mailbox.clone(),
            },
            mailbox,
            true,
        )
        .await
    }

    async fn open(
        &mut self,
        command: Command,
        mailbox: &Mailbox,
        read_only: bool,
    ) -> Result<MailboxStatus> {
        self.mailbox = MailboxStatus {
            name: Some(mailbox.clone()),
            read_only,
            ..MailboxStatus::default()
        };

        let responses = self.execute(&command).await?;
        match &responses.completion().code {
            Some(ResponseCode::ReadOnly) => self.mailbox.read_only = true,
            Some(ResponseCode::ReadWrite) => self.mailbox.read_only = false,
            _ => {}
        }
        if let Err(err) = self.complete(responses) {
            // RFC 3501: a failed SELECT leaves no mailbox selected.
            self.mailbox = MailboxStatus::default();
            return Err(err);
        }

        self.folders
            .record_exists(mailbox.as_str(), self.mailbox.exists);
        Ok(self.mailbox.clone())
    }

    /// `CLOSE`: expunges silently and deselects.
    pub async fn close(&mut self) -> Result<()> {
        self.simple(&Command::Close).await?;
        self.mailbox = MailboxStatus::default();
        Ok(())
    }

    /// `SETMETADATA` (RFC 5464); a `None` value removes the entry.
    pub async fn set_metadata(
        &mut self,
        mailbox: &Mailbox,
        entries: &[(String, Option<String>)],
    ) -> Result<()> {
        self.simple(&Command::SetMetadata {
            mailbox: mailbox.clone(),
            entries: entries.to_vec(),
        })
        .await
    }
}
