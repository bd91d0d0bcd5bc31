//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod intake_service;
pub mod run_interview_turn;
