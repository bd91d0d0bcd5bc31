//! Domain layer for lattia
//!
//! This crate contains the intake interview model: fields, turn statistics,
//! the turn decision protocol and the state transition that applies it.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Interview state
//!
//! An [`InterviewState`] is the ordered set of [`IntakeField`]s collected for a
//! profile plus per-domain [`TurnStats`]. Each assistant turn produces a
//! [`TurnDecision`] that is applied as a whole; items that reference unknown or
//! duplicate fields are skipped and reported in a [`TurnReport`].
//!
//! ## Contracts
//!
//! - **Interview**: fields may be requested, domains latched complete, and the
//!   interview marked done
//! - **Post-interview**: only value updates on existing fields

pub mod core;
pub mod intake;
pub mod pii;
pub mod prompt;
pub mod session;
pub mod util;

pub use core::error::DomainError;
pub use intake::{
    category::IntakeDomain,
    exemplar::{RelevantQuestion, dedup_exemplars},
    field::{FieldRequest, FieldSpec, IntakeField, NOT_SURE, PREFER_NOT_TO_SAY, TO_COLLECT, ValueType},
    health_data::{HealthData, HealthDataEntry},
    parsing::{TurnParseError, parse_turn_decision, parse_turn_decision_json},
    state::{InterviewState, TurnReport},
    stats::{DomainTurnStat, TurnStats},
    turn::{
        InterviewTurn, NextFieldSelection, PostInterviewTurn, TurnAnalysis, TurnContract,
        TurnDecision, ValueUpdate,
    },
};
pub use pii::{PiiCategory, PiiSpan, redact};
pub use prompt::{IntakePromptTemplate, OPENING_QUESTIONS, TurnPromptContext};
pub use session::entities::{Message, Role, history_window};
