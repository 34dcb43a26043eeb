//! Observers for responses a command's caller did not consume.
//!
//! Servers may send EXISTS, EXPUNGE, FETCH and similar data at any time
//! (RFC 3501 section 7). After a command completes,
//! [`Connection::dispatch`](crate::connection::Connection::dispatch) replays
//! every response the caller left in place to each registered
//! [`ResponseHandler`].

use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{Flags, ResponseCode, SeqNum};

/// Callbacks for unsolicited server data.
///
/// Every method has an empty default, so implementors override only what
/// they care about.
pub trait ResponseHandler: Send {
    /// `* n EXISTS`
    fn on_exists(&mut self, count: u32) {
        let _ = count;
    }

    /// `* n RECENT`
    fn on_recent(&mut self, count: u32) {
        let _ = count;
    }

    /// `* n EXPUNGE`; `seq` is the position before removal.
    fn on_expunge(&mut self, seq: SeqNum) {
        let _ = seq;
    }

    /// `* n FETCH`, typically flag changes made by another client.
    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        let _ = (seq, items);
    }

    /// `* FLAGS`
    fn on_flags(&mut self, flags: &Flags) {
        let _ = flags;
    }

    /// `* BYE`
    fn on_bye(&mut self, text: &str) {
        let _ = text;
    }

    /// `[ALERT]` text, which RFC 3501 requires be shown to the user.
    fn on_alert(&mut self, text: &str) {
        let _ = text;
    }

    /// Any other response nobody consumed.
    fn on_other(&mut self, response: &UntaggedResponse) {
        let _ = response;
    }
}

/// Routes one response to the matching callback.
pub fn deliver(handler: &mut dyn ResponseHandler, response: &UntaggedResponse) {
    match response {
        UntaggedResponse::Exists(n) => handler.on_exists(*n),
        UntaggedResponse::Recent(n) => handler.on_recent(*n),
        UntaggedResponse::Expunge(seq) => handler.on_expunge(*seq),
        UntaggedResponse::Fetch { seq, items } => handler.on_fetch(*seq, items),
        UntaggedResponse::Flags(flags) => handler.on_flags(flags),
        UntaggedResponse::Bye { text, .. } => handler.on_bye(text),
        UntaggedResponse::Ok {
            code: Some(ResponseCode::Alert),
            text,
        }
        | UntaggedResponse::No {
            code: Some(ResponseCode::Alert),
            text,
        } => handler.on_alert(text),
        other => handler.on_other(other),
    }
}

/// Logs every callback with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ResponseHandler for LoggingHandler {
    fn on_exists(&mut self, count: u32) {
        tracing::debug!(count, "EXISTS");
    }

    fn on_recent(&mut self, count: u32) {
        tracing::debug!(count, "RECENT");
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        tracing::debug!(seq = seq.get(), "EXPUNGE");
    }

    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        tracing::debug!(seq = seq.get(), items = items.len(), "FETCH");
    }

    fn on_flags(&mut self, flags: &Flags) {
        tracing::debug!(%flags, "FLAGS");
    }

    fn on_bye(&mut self, text: &str) {
        tracing::info!(text, "BYE");
    }

    fn on_alert(&mut self, text: &str) {
        tracing::warn!(text, "ALERT");
    }

    fn on_other(&mut self, response: &UntaggedResponse) {
        tracing::trace!(keyword = response.keyword(), "unconsumed response");
    }
}

/// Records every callback; mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    /// Collected events.
    pub events: Vec<UnsolicitedEvent>,
}

impl CollectingHandler {
    /// Creates a new collecting handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all collected events, leaving the handler empty.
    pub fn take(&mut self) -> Vec<UnsolicitedEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ResponseHandler for CollectingHandler {
    fn on_exists(&mut self, count: u32) {
        self.events.push(UnsolicitedEvent::Exists(count));
    }

    fn on_recent(&mut self, count: u32) {
        self.events.push(UnsolicitedEvent::Recent(count));
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        self.events.push(UnsolicitedEvent::Expunge(seq));
    }

    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        self.events.push(UnsolicitedEvent::Fetch(seq, items.to_vec()));
    }

    fn on_flags(&mut self, flags: &Flags) {
        self.events.push(UnsolicitedEvent::Flags(flags.clone()));
    }

    fn on_bye(&mut self, text: &str) {
        self.events.push(UnsolicitedEvent::Bye(text.to_string()));
    }

    fn on_alert(&mut self, text: &str) {
        self.events.push(UnsolicitedEvent::Alert(text.to_string()));
    }

    fn on_other(&mut self, response: &UntaggedResponse) {
        self.events.push(UnsolicitedEvent::Other(response.clone()));
    }
}

/// An event recorded by [`CollectingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum UnsolicitedEvent {
    /// EXISTS
    Exists(u32),
    /// RECENT
    Recent(u32),
    /// EXPUNGE
    Expunge(SeqNum),
    /// FETCH
    Fetch(SeqNum, Vec<FetchItem>),
    /// FLAGS
    Flags(Flags),
    /// BYE
    Bye(String),
    /// ALERT
    Alert(String),
    /// Anything else.
    Other(UntaggedResponse),
}
