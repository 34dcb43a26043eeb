//! Message-level commands in the selected mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Connection;
use crate::command::{Command, FetchItems, SearchCriteria, SortCriterion, StoreAction};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::settings::ClientSettings;
use crate::types::{Capability, SeqNum, SequenceSet, Uid, UidSet};
use crate::{Error, Result};

/// One message's FETCH data.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Sequence number at the time of the response.
    pub seq: SeqNum,
    /// Returned items.
    pub items: Vec<FetchItem>,
}

impl Fetched {
    /// The UID item, if present.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Uid(uid) => Some(*uid),
            _ => None,
        })
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// `SEARCH`: matching sequence numbers.
    pub async fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<u32>> {
        self.search_ids(Command::Search {
            criteria,
            uid: false,
        })
        .await
    }

    /// `UID SEARCH`: matching UIDs.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let ids = self
            .search_ids(Command::Search {
                criteria,
                uid: true,
            })
            .await?;
        Ok(ids.into_iter().filter_map(Uid::new).collect())
    }

    async fn search_ids(&mut self, command: Command) -> Result<Vec<u32>> {
        let mut responses = self.execute(&command).await?;
        let hits = responses.take(|r| match r {
            UntaggedResponse::Search(ids) => Ok(ids),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(hits.into_iter().flatten().collect())
    }

    /// `UID SORT` (RFC 5256) with UTF-8 charset.
    pub async fn uid_sort(
        &mut self,
        keys: &[SortCriterion],
        criteria: SearchCriteria,
    ) -> Result<Vec<Uid>> {
        if !self.has_capability(&Capability::Sort) {
            return Err(Error::Capability("SORT".to_string()));
        }
        let command = Command::Sort {
            keys: keys.to_vec(),
            charset: "UTF-8".to_string(),
            criteria,
            uid: true,
        };
        let mut responses = self.execute(&command).await?;
        let sorted = responses.take(|r| match r {
            UntaggedResponse::Sort(ids) => Ok(ids),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(sorted.into_iter().flatten().filter_map(Uid::new).collect())
    }

    /// Server-sorted UIDs when allowed and available, otherwise `UID SEARCH`
    /// results in ascending UID order.
    pub async fn sorted_uids(
        &mut self,
        keys: &[SortCriterion],
        criteria: SearchCriteria,
        settings: &ClientSettings,
    ) -> Result<Vec<Uid>> {
        if settings.prefer_server_sort && self.has_capability(&Capability::Sort) {
            return self.uid_sort(keys, criteria).await;
        }
        let mut uids = self.uid_search(criteria).await?;
        uids.sort_unstable();
        Ok(uids)
    }

    /// `FETCH` by sequence number.
    pub async fn fetch(&mut self, sequence: SequenceSet, items: FetchItems) -> Result<Vec<Fetched>> {
        let mut responses = self.execute(&Command::Fetch { sequence, items }).await?;
        let fetched = responses.take(|r| match r {
            UntaggedResponse::Fetch { seq, items } => Ok(Fetched { seq, items }),
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(fetched)
    }

    /// `UID FETCH`; FETCH data for messages outside `uids` is left for the
    /// observers.
    pub async fn uid_fetch(&mut self, uids: UidSet, items: FetchItems) -> Result<Vec<Fetched>> {
        let command = Command::UidFetch {
            uids: uids.clone(),
            items,
        };
        let mut responses = self.execute(&command).await?;
        let fetched = responses.take(|r| match r {
            UntaggedResponse::Fetch { seq, items } => {
                let message = Fetched { seq, items };
                match message.uid() {
                    Some(uid) if uids.contains(uid) => Ok(message),
                    _ => Err(UntaggedResponse::Fetch {
                        seq: message.seq,
                        items: message.items,
                    }),
                }
            }
            other => Err(other),
        });
        self.complete(responses)?;
        Ok(fetched)
    }

    /// `STORE` by sequence number.
    pub async fn store(
        &mut self,
        sequence: SequenceSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<()> {
        self.simple(&Command::Store {
            sequence,
            action,
            silent,
        })
        .await
    }

    /// `UID STORE`.
    pub async fn uid_store(&mut self, uids: UidSet, action: StoreAction, silent: bool) -> Result<()> {
        self.simple(&Command::UidStore {
            uids,
            action,
            silent,
        })
        .await
    }

    /// `EXPUNGE`: returns the reported sequence numbers, which observers also
    /// see.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        self.expunge_with(&Command::Expunge).await
    }

    /// `UID EXPUNGE` (RFC 4315). Only messages in `uids` that already carry
    /// `\Deleted` are removed.
    pub async fn uid_expunge(&mut self, uids: UidSet) -> Result<Vec<SeqNum>> {
        if !self.has_capability(&Capability::UidPlus) {
            return Err(Error::Capability("UIDPLUS".to_string()));
        }
        self.expunge_with(&Command::UidExpunge { uids }).await
    }

    async fn expunge_with(&mut self, command: &Command) -> Result<Vec<SeqNum>> {
        let responses = self.execute(command).await?;
        let removed = responses
            .remaining()
            .filter_map(|r| match r {
                UntaggedResponse::Expunge(seq) => Some(*seq),
                _ => None,
            })
            .collect();
        self.complete(responses)?;
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::command::{FetchAttribute, SortKey};
    use crate::types::Flag;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[tokio::test]
    async fn uid_search_skips_zero() {
        let mock = Builder::new()
            .write(b"A0001 UID SEARCH DELETED\r\n")
            .read(b"* SEARCH 0 4 9\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        let uids = conn.uid_search(SearchCriteria::Deleted).await.unwrap();
        assert_eq!(uids, vec![uid(4), uid(9)]);
    }

    #[tokio::test]
    async fn sorted_uids_without_sort_capability_searches() {
        let mock = Builder::new()
            .write(b"A0001 UID SEARCH ALL\r\n")
            .read(b"* SEARCH 9 3 5\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        let uids = conn
            .sorted_uids(
                &[SortCriterion::desc(SortKey::Date)],
                SearchCriteria::All,
                &ClientSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(uids, vec![uid(3), uid(5), uid(9)]);
    }

    #[tokio::test]
    async fn sorted_uids_prefers_server_sort() {
        let mock = Builder::new()
            .write(b"A0001 UID SORT (REVERSE DATE) UTF-8 ALL\r\n")
            .read(b"* SORT 9 3 5\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.capabilities = vec![Capability::Sort];
        let uids = conn
            .sorted_uids(
                &[SortCriterion::desc(SortKey::Date)],
                SearchCriteria::All,
                &ClientSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(uids, vec![uid(9), uid(3), uid(5)]);
    }

    #[tokio::test]
    async fn uid_fetch_leaves_foreign_fetches() {
        let mock = Builder::new()
            .write(b"A0001 UID FETCH 7 (UID FLAGS)\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
            .read(b"* 3 FETCH (UID 7 FLAGS (\\Flagged))\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        let items = FetchItems::Items(vec![FetchAttribute::Uid, FetchAttribute::Flags]);
        let fetched = conn.uid_fetch(UidSet::single(uid(7)), items).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].uid(), Some(uid(7)));
        assert_eq!(fetched[0].seq.get(), 3);
    }

    #[tokio::test]
    async fn expunge_reports_and_updates_snapshot() {
        let mock = Builder::new()
            .write(b"A0001 UID STORE 4 +FLAGS.SILENT (\\Deleted)\r\n")
            .read(b"A0001 OK done\r\n")
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"* 2 EXPUNGE\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);
        conn.mailbox.exists = 5;

        conn.uid_store(
            UidSet::single(uid(4)),
            StoreAction::Add(vec![Flag::Deleted]),
            true,
        )
        .await
        .unwrap();
        let removed = conn.expunge().await.unwrap();
        assert_eq!(removed, vec![SeqNum::new(2).unwrap()]);
        assert_eq!(conn.mailbox().exists, 4);
    }

    #[tokio::test]
    async fn uid_expunge_needs_uidplus() {
        let mut conn = Connection::new(Builder::new().build());
        let err = conn.uid_expunge(UidSet::single(uid(1))).await.unwrap_err();
        assert!(matches!(err, Error::Capability(_)));
    }
}
