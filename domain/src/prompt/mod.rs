//! Prompt templates for the intake oracle.

pub mod template;

pub use template::{IntakePromptTemplate, OPENING_QUESTIONS, TurnPromptContext};
