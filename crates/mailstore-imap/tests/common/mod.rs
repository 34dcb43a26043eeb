//! In-memory IMAP server and a connector that talks to it.
//!
//! The server understands just enough of RFC 3501 for the pool and expunge
//! tests: greeting, CAPABILITY, LOGIN, AUTHENTICATE PLAIN, SELECT, STATUS,
//! UID SEARCH, UID STORE, EXPUNGE, UID EXPUNGE, NOOP and LOGOUT.

#![allow(dead_code, clippy::unwrap_used)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use mailstore_imap::connection::{AuthOptions, Connector, Credential, Endpoint};
use mailstore_imap::{Connection, Error, Result};

/// One stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub uid: u32,
    pub deleted: bool,
}

/// Mailbox contents plus a log of every command verb received.
#[derive(Debug, Default)]
pub struct Mailstore {
    pub messages: Vec<StoredMessage>,
    pub commands: Vec<String>,
}

impl Mailstore {
    /// A mailbox holding `uids`, with `deleted` ones flagged `\Deleted`.
    pub fn with_messages(uids: &[u32], deleted: &[u32]) -> Self {
        Self {
            messages: uids
                .iter()
                .map(|&uid| StoredMessage {
                    uid,
                    deleted: deleted.contains(&uid),
                })
                .collect(),
            commands: Vec::new(),
        }
    }

    pub fn uids(&self) -> Vec<u32> {
        self.messages.iter().map(|m| m.uid).collect()
    }

    pub fn deleted_uids(&self) -> Vec<u32> {
        self.messages
            .iter()
            .filter(|m| m.deleted)
            .map(|m| m.uid)
            .collect()
    }

    fn max_uid(&self) -> u32 {
        self.messages.iter().map(|m| m.uid).max().unwrap_or(0)
    }
}

/// Server behaviour switches.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Advertise and accept `UID EXPUNGE`.
    pub uidplus: bool,
    /// Advertise `AUTH=PLAIN`.
    pub plain: bool,
    /// Reject every `AUTHENTICATE PLAIN`, even with the right password.
    pub broken_plain: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            uidplus: true,
            plain: true,
            broken_plain: false,
        }
    }
}

impl ServerOptions {
    fn capabilities(self) -> String {
        let mut caps = String::from("IMAP4rev1");
        if self.plain {
            caps.push_str(" AUTH=PLAIN");
        }
        if self.uidplus {
            caps.push_str(" UIDPLUS");
        }
        caps
    }
}

/// Connector that spawns a fresh in-memory server session per connection.
#[derive(Debug)]
pub struct FakeConnector {
    pub options: ServerOptions,
    pub password: String,
    pub store: Arc<Mutex<Mailstore>>,
    pub connects: AtomicUsize,
    /// Connects still to fail before the dial succeeds again.
    pub refuse: AtomicUsize,
    /// Sessions started under an older generation hang up on their next
    /// command.
    pub generation: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(options: ServerOptions, store: Mailstore) -> Self {
        Self {
            options,
            password: "secret".to_string(),
            store: Arc::new(Mutex::new(store)),
            connects: AtomicUsize::new(0),
            refuse: AtomicUsize::new(0),
            generation: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every open session drop its connection on the next command.
    pub fn hang_up(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.store.lock().unwrap().commands.clone()
    }

    /// Opens a session directly, bypassing any pool.
    pub async fn session(&self) -> Connection<DuplexStream> {
        self.connect(
            &endpoint(),
            &Credential::password("fred", "secret"),
            AuthOptions::default(),
        )
        .await
        .unwrap()
    }
}

impl Connector for FakeConnector {
    type Stream = DuplexStream;

    async fn connect(
        &self,
        _endpoint: &Endpoint,
        credential: &Credential,
        options: AuthOptions,
    ) -> Result<Connection<DuplexStream>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(
            server,
            Arc::clone(&self.store),
            self.options,
            self.password.clone(),
            Arc::clone(&self.generation),
        ));

        let mut conn = Connection::from_greeting(client).await?;
        conn.authenticate(credential, options).await?;
        Ok(conn)
    }
}

pub fn endpoint() -> Endpoint {
    Endpoint::plain("imap.test")
}

/// Runs one server session until LOGOUT, EOF or a hang-up.
pub async fn serve(
    stream: DuplexStream,
    store: Arc<Mutex<Mailstore>>,
    options: ServerOptions,
    password: String,
    generation: Arc<AtomicUsize>,
) {
    let born = generation.load(Ordering::SeqCst);
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let caps = options.capabilities();

    let greeting = format!("* OK [CAPABILITY {caps}] fake server ready\r\n");
    if write.write_all(greeting.as_bytes()).await.is_err() {
        return;
    }

    while let Ok(Some(line)) = lines.next_line().await {
        if generation.load(Ordering::SeqCst) != born {
            return;
        }
        let (tag, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let upper = rest.to_ascii_uppercase();

        let reply = if upper.starts_with("AUTHENTICATE PLAIN") {
            store.lock().unwrap().commands.push("AUTHENTICATE PLAIN".to_string());
            let initial = rest["AUTHENTICATE PLAIN".len()..].trim().to_string();
            let payload = if initial.is_empty() {
                if write.write_all(b"+ \r\n").await.is_err() {
                    return;
                }
                match lines.next_line().await {
                    Ok(Some(line)) => line,
                    _ => return,
                }
            } else {
                initial
            };
            let accepted = !options.broken_plain && plain_matches(&payload, &password);
            auth_reply(tag, accepted, &caps)
        } else if upper == "LOGOUT" {
            store.lock().unwrap().commands.push("LOGOUT".to_string());
            let _ = write
                .write_all(format!("* BYE logging out\r\n{tag} OK LOGOUT completed\r\n").as_bytes())
                .await;
            return;
        } else {
            handle(tag, rest, &upper, &store, options, &password, &caps)
        };

        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn handle(
    tag: &str,
    rest: &str,
    upper: &str,
    store: &Mutex<Mailstore>,
    options: ServerOptions,
    password: &str,
    caps: &str,
) -> String {
    let mut store = store.lock().unwrap();
    let verb = verb_of(upper);
    store.commands.push(verb.clone());
    let args = rest[verb.len()..].trim();

    match verb.as_str() {
        "CAPABILITY" => format!("* CAPABILITY {caps}\r\n{tag} OK CAPABILITY completed\r\n"),
        "NOOP" => format!("{tag} OK NOOP completed\r\n"),
        "LOGIN" => {
            let given = args.split_whitespace().nth(1).unwrap_or("").trim_matches('"');
            auth_reply(tag, given == password, caps)
        }
        "SELECT" | "EXAMINE" => format!(
            "* {} EXISTS\r\n* 0 RECENT\r\n* FLAGS (\\Deleted \\Seen)\r\n\
             * OK [UIDVALIDITY 1] UIDs valid\r\n* OK [UIDNEXT {}] predicted\r\n\
             {tag} OK [READ-WRITE] {verb} completed\r\n",
            store.messages.len(),
            store.max_uid() + 1,
        ),
        "STATUS" => {
            let mailbox = args.split_whitespace().next().unwrap_or("INBOX");
            let mut counters = Vec::new();
            if upper.contains("MESSAGES") {
                counters.push(format!("MESSAGES {}", store.messages.len()));
            }
            if upper.contains("UIDNEXT") {
                counters.push(format!("UIDNEXT {}", store.max_uid() + 1));
            }
            format!(
                "* STATUS {mailbox} ({})\r\n{tag} OK STATUS completed\r\n",
                counters.join(" ")
            )
        }
        "UID SEARCH" => {
            let hits: Vec<String> = store
                .messages
                .iter()
                .filter(|m| search_matches(args, m))
                .map(|m| m.uid.to_string())
                .collect();
            let mut line = String::from("* SEARCH");
            for hit in hits {
                line.push(' ');
                line.push_str(&hit);
            }
            format!("{line}\r\n{tag} OK SEARCH completed\r\n")
        }
        "UID STORE" => {
            let mut parts = args.splitn(2, ' ');
            let set = parts.next().unwrap_or("");
            let action = parts.next().unwrap_or("").to_ascii_uppercase();
            if !action.contains("\\DELETED") {
                return format!("{tag} BAD only \\Deleted is supported\r\n");
            }
            let value = action.starts_with('+');
            for message in &mut store.messages {
                if set_contains(set, message.uid) {
                    message.deleted = value;
                }
            }
            format!("{tag} OK STORE completed\r\n")
        }
        "EXPUNGE" => expunge(tag, &mut store, |_| true),
        "UID EXPUNGE" if options.uidplus => {
            let set = args.to_string();
            expunge(tag, &mut store, |uid| set_contains(&set, uid))
        }
        _ => format!("{tag} BAD command unknown or arguments invalid\r\n"),
    }
}

fn verb_of(upper: &str) -> String {
    let mut words = upper.split_whitespace();
    match words.next() {
        Some("UID") => format!("UID {}", words.next().unwrap_or("")),
        Some(word) => word.to_string(),
        None => String::new(),
    }
}

fn auth_reply(tag: &str, accepted: bool, caps: &str) -> String {
    if accepted {
        format!("{tag} OK [CAPABILITY {caps}] logged in\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] invalid credentials\r\n")
    }
}

fn plain_matches(payload: &str, password: &str) -> bool {
    let Ok(decoded) = STANDARD.decode(payload.trim()) else {
        return false;
    };
    let decoded = String::from_utf8_lossy(&decoded);
    decoded.split('\0').nth(2) == Some(password)
}

/// Removes matching `\Deleted` messages, reporting each removal with the
/// sequence number it had at that moment.
fn expunge(tag: &str, store: &mut Mailstore, selected: impl Fn(u32) -> bool) -> String {
    let mut reply = String::new();
    let mut seq = 1;
    store.messages.retain(|m| {
        if m.deleted && selected(m.uid) {
            reply.push_str(&format!("* {seq} EXPUNGE\r\n"));
            false
        } else {
            seq += 1;
            true
        }
    });
    reply.push_str(&format!("{tag} OK EXPUNGE completed\r\n"));
    reply
}

/// Evaluates the criteria the client sends: `ALL`, `DELETED`, `UID set`
/// and `NOT UID set`, joined by implicit AND.
fn search_matches(criteria: &str, message: &StoredMessage) -> bool {
    let tokens: Vec<&str> = criteria.split_whitespace().collect();
    let mut i = 0;
    let mut negate = false;
    while i < tokens.len() {
        let token = tokens[i].to_ascii_uppercase();
        let hit = match token.as_str() {
            "NOT" => {
                negate = true;
                i += 1;
                continue;
            }
            "DELETED" => message.deleted,
            "UNDELETED" => !message.deleted,
            "UID" => {
                i += 1;
                set_contains(tokens.get(i).copied().unwrap_or(""), message.uid)
            }
            _ => true,
        };
        if hit == negate {
            return false;
        }
        negate = false;
        i += 1;
    }
    true
}

fn set_contains(set: &str, uid: u32) -> bool {
    let bound = |s: &str| {
        if s == "*" {
            u32::MAX
        } else {
            s.parse().unwrap_or(0)
        }
    };
    set.split(',').any(|item| match item.split_once(':') {
        Some((a, b)) => {
            let (a, b) = (bound(a), bound(b));
            (a.min(b)..=a.max(b)).contains(&uid)
        }
        None => bound(item) == uid,
    })
}
