#![allow(clippy::uninlined_format_args)]
//! Example: print STATUS counters for a few mailboxes through the pool
//!
//! ## Running
//!
//! ```bash
//! IMAP_HOST=imap.example.com IMAP_USER=fred@example.com IMAP_PASSWORD=secret \
//!     RUST_LOG=mailstore_imap=debug \
//!     cargo run --package mailstore-imap --example status -- INBOX Sent
//! ```

use std::env;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mailstore_imap::connection::{Credential, Endpoint, ImapConnector};
use mailstore_imap::parser::ABSENT;
use mailstore_imap::pool::{Pool, PoolConfig};
use mailstore_imap::types::{Mailbox, StatusAttribute};

const KEYS: [StatusAttribute; 4] = [
    StatusAttribute::Messages,
    StatusAttribute::Recent,
    StatusAttribute::Unseen,
    StatusAttribute::UidNext,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = env::var("IMAP_HOST").context("IMAP_HOST is not set")?;
    let user = env::var("IMAP_USER").context("IMAP_USER is not set")?;
    let password = env::var("IMAP_PASSWORD").context("IMAP_PASSWORD is not set")?;

    let mut mailboxes: Vec<String> = env::args().skip(1).collect();
    if mailboxes.is_empty() {
        mailboxes.push("INBOX".to_string());
    }

    let pool = Pool::new(ImapConnector::default(), PoolConfig::default());
    let endpoint = Endpoint::tls(host);
    let credential = Credential::password(user, password);

    for name in &mailboxes {
        let mailbox = Mailbox::new(name.as_str());
        let counters = pool
            .with_connection(&endpoint, &credential, async |conn| {
                conn.status(&mailbox, &KEYS).await
            })
            .await
            .with_context(|| format!("STATUS {name}"))?;

        print!("{name}:");
        for (key, value) in KEYS.iter().zip(counters) {
            if value == ABSENT {
                print!(" {}=-", key);
            } else {
                print!(" {}={}", key, value);
            }
        }
        println!();
    }

    let quotas = pool
        .with_connection(&endpoint, &credential, async |conn| {
            conn.get_quota_root(&Mailbox::inbox()).await
        })
        .await;
    match quotas {
        Ok(quotas) => {
            for quota in quotas {
                for resource in &quota.resources {
                    println!(
                        "quota {:?} {}: {}/{}",
                        quota.root, resource.name, resource.usage, resource.limit
                    );
                }
            }
        }
        Err(err) => println!("quota unavailable: {err}"),
    }

    println!("pool: {:?}", pool.stats());
    Ok(())
}
