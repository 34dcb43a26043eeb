//! Per-command latency reporting.

use std::time::Duration;

use crate::types::Status;

/// How a command ended, as reported to a [`LatencyRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Tagged `OK`.
    Ok,
    /// Tagged `NO`.
    No,
    /// Tagged `BAD`.
    Bad,
    /// Server said `BYE` and hung up.
    Bye,
    /// Transport or parse failure before a completion arrived.
    Failed,
}

impl Outcome {
    /// Lower-case label for logs and metric tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::No => "no",
            Self::Bad => "bad",
            Self::Bye => "bye",
            Self::Failed => "failed",
        }
    }
}

impl From<Status> for Outcome {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok | Status::PreAuth => Self::Ok,
            Status::No => Self::No,
            Status::Bad => Self::Bad,
            Status::Bye => Self::Bye,
        }
    }
}

/// Receives the duration of every executed command.
pub trait LatencyRecorder: Send + Sync {
    /// Called once per command, after its completion (or failure).
    fn record(&self, verb: &str, elapsed: Duration, outcome: Outcome);
}

/// Emits one `tracing` debug event per command.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl LatencyRecorder for TracingRecorder {
    fn record(&self, verb: &str, elapsed: Duration, outcome: Outcome) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(verb, elapsed_ms, outcome = outcome.as_str(), "command completed");
    }
}
