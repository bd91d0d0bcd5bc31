//! Intake interview domain.
//!
//! - [`category::IntakeDomain`]: the fixed taxonomy of topical domains
//! - [`field`]: field specs, requests and collected fields
//! - [`stats::TurnStats`]: turn counters against soft targets
//! - [`turn`]: the per-turn decision protocol (interview / post-interview)
//! - [`parsing`]: boundary validation of oracle output
//! - [`state::InterviewState`]: the aggregate and its turn state machine
//! - [`exemplar::RelevantQuestion`]: retrieved question-bank exemplars
//! - [`health_data`]: read-only projection of collected fields

pub mod category;
pub mod exemplar;
pub mod field;
pub mod health_data;
pub mod parsing;
pub mod state;
pub mod stats;
pub mod turn;
