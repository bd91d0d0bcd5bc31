//! Port for the oracle transcript.
//!
//! Records prompts, raw responses and applied turns to a machine-readable
//! log, separate from `tracing` diagnostics.

use serde_json::Value;

/// What happened during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEventKind {
    /// Prompt sent to the oracle
    OracleRequest,
    /// Raw oracle output, before validation
    OracleResponse,
    /// Decision applied to the interview state
    TurnApplied,
    /// Oracle call or validation failed; state untouched
    TurnFailed,
}

impl ConversationEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationEventKind::OracleRequest => "oracle_request",
            ConversationEventKind::OracleResponse => "oracle_response",
            ConversationEventKind::TurnApplied => "turn_applied",
            ConversationEventKind::TurnFailed => "turn_failed",
        }
    }
}

impl std::fmt::Display for ConversationEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript entry. The adapter stamps it with a UTC timestamp.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub kind: ConversationEventKind,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(kind: ConversationEventKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// Sink for transcript events.
///
/// Infallible from the caller's side: a transcript that cannot be written
/// never fails a turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
