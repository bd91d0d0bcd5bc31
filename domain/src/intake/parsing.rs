//! Boundary validation of oracle output.
//!
//! Turns raw model text into a [`TurnDecision`] for the expected
//! [`TurnContract`]. Anything that does not fit the contract is a
//! [`TurnParseError`] and fails the whole turn.

use super::turn::{InterviewTurn, PostInterviewTurn, TurnContract, TurnDecision};
use serde_json::Value;
use thiserror::Error;

/// Schema validation failure of a decision payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnParseError {
    #[error("Response contains no JSON object")]
    NoJson,

    #[error("Response does not match {contract}: {message}")]
    Schema {
        contract: TurnContract,
        message: String,
    },

    #[error("Invalid decision: {0}")]
    Invalid(String),
}

/// Parse a decision from model response text.
///
/// Accepts either a bare JSON object or one inside a ` ```json ` fence.
pub fn parse_turn_decision(
    contract: TurnContract,
    response: &str,
) -> Result<TurnDecision, TurnParseError> {
    let json = extract_json(response).ok_or(TurnParseError::NoJson)?;
    parse_turn_decision_json(contract, json)
}

/// Parse a decision from an already-decoded JSON value.
pub fn parse_turn_decision_json(
    contract: TurnContract,
    json: Value,
) -> Result<TurnDecision, TurnParseError> {
    let schema_error = |e: serde_json::Error| TurnParseError::Schema {
        contract,
        message: e.to_string(),
    };

    let decision: TurnDecision = match contract {
        TurnContract::Interview => serde_json::from_value::<InterviewTurn>(json)
            .map_err(schema_error)?
            .into(),
        TurnContract::PostInterview => serde_json::from_value::<PostInterviewTurn>(json)
            .map_err(schema_error)?
            .into(),
    };

    validate(&decision)?;
    Ok(decision)
}

fn validate(decision: &TurnDecision) -> Result<(), TurnParseError> {
    if decision.followup().trim().is_empty() {
        return Err(TurnParseError::Invalid("followup cannot be empty".to_string()));
    }
    if decision.next_field().key.trim().is_empty() {
        return Err(TurnParseError::Invalid(
            "next_field_selection.key cannot be empty".to_string(),
        ));
    }
    if decision.value_updates().iter().any(|u| u.key.trim().is_empty()) {
        return Err(TurnParseError::Invalid(
            "value update key cannot be empty".to_string(),
        ));
    }
    if let TurnDecision::Interview(turn) = decision {
        for request in &turn.new_fields_to_collect {
            request
                .spec
                .validate()
                .map_err(|e| TurnParseError::Invalid(e.to_string()))?;
        }
    }
    Ok(())
}

fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // ```json ... ``` fenced block
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let line_trimmed = line.trim();
        if !in_block && (line_trimmed == "```json" || line_trimmed == "```") {
            in_block = true;
            block.clear();
        } else if in_block && line_trimmed == "```" {
            in_block = false;
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&block) {
                return Some(value);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    // Outermost braces as a last resort
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}
