//! Expunging an exact set of UIDs on servers with or without UIDPLUS.
//!
//! Plain `EXPUNGE` removes every `\Deleted` message in the mailbox, including
//! ones another client marked. Without `UID EXPUNGE` the fallback hides those
//! others first:
//!
//! 1. `UID SEARCH DELETED NOT UID <set>` finds the bystanders.
//! 2. `UID STORE <bystanders> -FLAGS.SILENT (\Deleted)`
//! 3. `EXPUNGE`
//! 4. `UID STORE <bystanders> +FLAGS.SILENT (\Deleted)`
//!
//! A concurrent client can still slip a change in between the steps.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::{SearchCriteria, StoreAction};
use crate::connection::Connection;
use crate::settings::ClientSettings;
use crate::types::{Capability, Flag, SeqNum, UidSet};
use crate::Result;

/// Removes the messages in `uids` that carry `\Deleted`, leaving every other
/// message (deleted or not) in place.
///
/// Uses `UID EXPUNGE` when the server has UIDPLUS and `settings` allow it.
/// If that fails with anything but a broken connection, the search/store
/// fallback runs instead. Returns the sequence numbers the server reported
/// as expunged.
///
/// # Errors
///
/// [`Error::ConnectionBroken`](crate::Error::ConnectionBroken) immediately; otherwise the first failing step
/// of the fallback. The `\Deleted` flags of bystanders are restored even if
/// the `EXPUNGE` itself was refused.
pub async fn uid_expunge_with_fallback<S>(
    conn: &mut Connection<S>,
    uids: &UidSet,
    settings: &ClientSettings,
) -> Result<Vec<SeqNum>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    if settings.native_uid_expunge && conn.has_capability(&Capability::UidPlus) {
        match conn.uid_expunge(uids.clone()).await {
            Ok(removed) => return Ok(removed),
            Err(err) if err.is_connection_broken() => return Err(err),
            Err(err) => {
                tracing::warn!(%err, uids = %uids, "UID EXPUNGE failed, using fallback");
            }
        }
    }

    fallback(conn, uids).await
}

async fn fallback<S>(conn: &mut Connection<S>, uids: &UidSet) -> Result<Vec<SeqNum>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let bystanders = conn
        .uid_search(SearchCriteria::And(vec![
            SearchCriteria::Deleted,
            SearchCriteria::not(SearchCriteria::Uid(uids.clone())),
        ]))
        .await?;

    let Some(bystanders) = UidSet::from_uids(bystanders) else {
        return conn.expunge().await;
    };

    tracing::info!(%bystanders, "shielding other deleted messages from EXPUNGE");
    conn.uid_store(
        bystanders.clone(),
        StoreAction::Remove(vec![Flag::Deleted]),
        true,
    )
    .await?;

    let expunged = conn.expunge().await;
    if let Err(err) = &expunged
        && err.is_connection_broken()
    {
        return expunged;
    }

    let restored = conn
        .uid_store(bystanders, StoreAction::Add(vec![Flag::Deleted]), true)
        .await;
    if let Err(err) = &restored {
        tracing::warn!(%err, "could not restore \\Deleted on shielded messages");
    }

    let removed = expunged?;
    restored?;
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::types::Uid;

    fn set(uids: &[u32]) -> UidSet {
        UidSet::from_uids(uids.iter().map(|&n| Uid::new(n).unwrap())).unwrap()
    }

    fn uidplus(builder: &mut Builder) -> &mut Builder {
        builder.read(b"* OK [CAPABILITY IMAP4rev1 UIDPLUS] ready\r\n")
    }

    #[tokio::test]
    async fn fallback_shields_bystanders() {
        let mock = Builder::new()
            .write(b"A0001 UID SEARCH DELETED NOT UID 5,7\r\n")
            .read(b"* SEARCH 9\r\n")
            .read(b"A0001 OK done\r\n")
            .write(b"A0002 UID STORE 9 -FLAGS.SILENT (\\Deleted)\r\n")
            .read(b"A0002 OK done\r\n")
            .write(b"A0003 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"* 2 EXPUNGE\r\n")
            .read(b"A0003 OK done\r\n")
            .write(b"A0004 UID STORE 9 +FLAGS.SILENT (\\Deleted)\r\n")
            .read(b"A0004 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let removed = uid_expunge_with_fallback(&mut conn, &set(&[5, 7]), &ClientSettings::default())
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
    }

    #[tokio::test]
    async fn fallback_without_bystanders_expunges_directly() {
        let mock = Builder::new()
            .write(b"A0001 UID SEARCH DELETED NOT UID 5\r\n")
            .read(b"* SEARCH\r\n")
            .read(b"A0001 OK done\r\n")
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"* 1 EXPUNGE\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let removed = uid_expunge_with_fallback(&mut conn, &set(&[5]), &ClientSettings::default())
            .await
            .unwrap();
        assert_eq!(removed, vec![SeqNum::new(1).unwrap()]);
    }

    #[tokio::test]
    async fn native_uid_expunge_when_advertised() {
        let mock = uidplus(&mut Builder::new())
            .write(b"A0001 UID EXPUNGE 5,7\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut conn = Connection::from_greeting(mock).await.unwrap();

        let removed = uid_expunge_with_fallback(&mut conn, &set(&[5, 7]), &ClientSettings::default())
            .await
            .unwrap();
        assert_eq!(removed, vec![SeqNum::new(3).unwrap()]);
    }

    #[tokio::test]
    async fn refused_native_falls_back() {
        let mock = uidplus(&mut Builder::new())
            .write(b"A0001 UID EXPUNGE 5\r\n")
            .read(b"A0001 BAD not today\r\n")
            .write(b"A0002 UID SEARCH DELETED NOT UID 5\r\n")
            .read(b"A0002 OK done\r\n")
            .write(b"A0003 EXPUNGE\r\n")
            .read(b"A0003 OK done\r\n")
            .build();
        let mut conn = Connection::from_greeting(mock).await.unwrap();

        let removed = uid_expunge_with_fallback(&mut conn, &set(&[5]), &ClientSettings::default())
            .await
            .unwrap();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn settings_can_disable_native() {
        let mock = uidplus(&mut Builder::new())
            .write(b"A0001 UID SEARCH DELETED NOT UID 5\r\n")
            .read(b"A0001 OK done\r\n")
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut conn = Connection::from_greeting(mock).await.unwrap();
        let settings = ClientSettings {
            native_uid_expunge: false,
            ..ClientSettings::default()
        };

        uid_expunge_with_fallback(&mut conn, &set(&[5]), &settings)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn broken_connection_skips_fallback() {
        let mock = uidplus(&mut Builder::new())
            .write(b"A0001 UID EXPUNGE 5\r\n")
            .read(b"* BYE shutting down\r\n")
            .build();
        let mut conn = Connection::from_greeting(mock).await.unwrap();

        let err = uid_expunge_with_fallback(&mut conn, &set(&[5]), &ClientSettings::default())
            .await
            .unwrap_err();
        assert!(err.is_connection_broken());
        assert!(conn.is_broken());
    }
}
