//! Turn decision protocol
//!
//! The typed shape one oracle turn must produce. Two contracts exist:
//!
//! - [`InterviewTurn`] while the interview is active
//! - [`PostInterviewTurn`] once the interview is done; only value updates,
//!   the next field selection and the follow-up remain meaningful
//!
//! [`TurnContract::response_schema`] describes each shape as JSON Schema for
//! providers that support structured output.

use super::category::IntakeDomain;
use super::field::{FieldRequest, ValueType};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Turn-level reasoning block. Not interpreted mechanically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnAnalysis {
    pub response_interpretation: String,
    pub context_link: String,
    pub value_update_plan: Vec<String>,
    pub completeness_review: String,
    #[serde(alias = "next_fields_thoughs")]
    pub next_fields_thoughts: String,
    pub field_requests_to_create: Vec<String>,
}

/// Insert-or-update of one field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueUpdate {
    pub key: String,
    /// Always stored as a string; lists arrive comma-joined.
    #[serde(deserialize_with = "deserialize_field_value")]
    pub value: String,
}

impl ValueUpdate {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Accept the loose value shapes models tend to emit and normalize them.
fn deserialize_field_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("yes".to_string()),
            Value::Bool(false) => Some("no".to_string()),
            _ => None,
        }
    }

    let raw = Value::deserialize(deserializer)?;
    if let Value::Array(items) = &raw {
        let parts = items
            .iter()
            .map(scalar)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| D::Error::custom("list values must contain only scalars"))?;
        return Ok(parts.join(","));
    }
    scalar(&raw).ok_or_else(|| {
        D::Error::custom("value must be a string, number, boolean or list of strings")
    })
}

/// Which field to ask about next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextFieldSelection {
    #[serde(default)]
    pub note: String,
    pub key: String,
    pub domain: IntakeDomain,
}

impl NextFieldSelection {
    pub fn new(key: impl Into<String>, domain: IntakeDomain) -> Self {
        Self {
            note: String::new(),
            key: key.into(),
            domain,
        }
    }
}

/// Decision payload for one turn of the active interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewTurn {
    pub analysis: TurnAnalysis,
    #[serde(default)]
    pub domains_to_mark_complete: Vec<IntakeDomain>,
    #[serde(default)]
    pub mark_interview_complete: bool,
    #[serde(default)]
    pub new_fields_to_collect: Vec<FieldRequest>,
    #[serde(default)]
    pub value_updates: Vec<ValueUpdate>,
    pub next_field_selection: NextFieldSelection,
    pub followup: String,
}

impl InterviewTurn {
    pub fn new(next_field_selection: NextFieldSelection, followup: impl Into<String>) -> Self {
        Self {
            analysis: TurnAnalysis::default(),
            domains_to_mark_complete: Vec::new(),
            mark_interview_complete: false,
            new_fields_to_collect: Vec::new(),
            value_updates: Vec::new(),
            next_field_selection,
            followup: followup.into(),
        }
    }

    pub fn with_field(mut self, request: FieldRequest) -> Self {
        self.new_fields_to_collect.push(request);
        self
    }

    pub fn with_update(mut self, update: ValueUpdate) -> Self {
        self.value_updates.push(update);
        self
    }

    pub fn with_completed_domain(mut self, domain: IntakeDomain) -> Self {
        self.domains_to_mark_complete.push(domain);
        self
    }

    pub fn with_interview_complete(mut self) -> Self {
        self.mark_interview_complete = true;
        self
    }
}

/// Decision payload for turns after the interview is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInterviewTurn {
    #[serde(default)]
    pub response_interpretation: String,
    #[serde(default)]
    pub value_updates: Vec<ValueUpdate>,
    pub next_field_selection: NextFieldSelection,
    pub followup: String,
}

impl PostInterviewTurn {
    pub fn new(next_field_selection: NextFieldSelection, followup: impl Into<String>) -> Self {
        Self {
            response_interpretation: String::new(),
            value_updates: Vec::new(),
            next_field_selection,
            followup: followup.into(),
        }
    }

    pub fn with_update(mut self, update: ValueUpdate) -> Self {
        self.value_updates.push(update);
        self
    }
}

/// Which decision shape a turn is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnContract {
    Interview,
    PostInterview,
}

impl TurnContract {
    /// The contract is chosen strictly from the completion latch.
    pub fn for_completion(is_done: bool) -> Self {
        if is_done {
            TurnContract::PostInterview
        } else {
            TurnContract::Interview
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnContract::Interview => "intake_interview_turn",
            TurnContract::PostInterview => "post_interview_turn",
        }
    }

    /// JSON Schema of the expected decision payload.
    pub fn response_schema(&self) -> Value {
        match self {
            TurnContract::Interview => interview_schema(),
            TurnContract::PostInterview => post_interview_schema(),
        }
    }
}

impl std::fmt::Display for TurnContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn domain_enum() -> Value {
    json!({
        "type": "string",
        "enum": IntakeDomain::ALL.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
    })
}

fn value_updates_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "value": {
                    "type": "string",
                    "description": "Option code(s) comma-separated, 1-10 for scales, yes/no, or text. \
                                    Use prefer_not_to_say or not_sure alone for non-answers."
                }
            },
            "required": ["key", "value"]
        }
    })
}

fn next_field_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "note": { "type": "string" },
            "key": { "type": "string" },
            "domain": domain_enum()
        },
        "required": ["note", "key", "domain"]
    })
}

fn interview_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "analysis": {
                "type": "object",
                "properties": {
                    "response_interpretation": { "type": "string" },
                    "context_link": { "type": "string" },
                    "value_update_plan": { "type": "array", "items": { "type": "string" } },
                    "completeness_review": { "type": "string" },
                    "next_fields_thoughts": { "type": "string" },
                    "field_requests_to_create": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["response_interpretation", "completeness_review"]
            },
            "domains_to_mark_complete": { "type": "array", "items": domain_enum() },
            "mark_interview_complete": { "type": "boolean" },
            "new_fields_to_collect": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "spec": {
                            "type": "object",
                            "properties": {
                                "key": { "type": "string" },
                                "name": { "type": "string" },
                                "description": { "type": "string" },
                                "domain": domain_enum(),
                                "value_type": {
                                    "type": "string",
                                    "enum": ValueType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
                                },
                                "options": {
                                    "type": ["object", "null"],
                                    "additionalProperties": { "type": "string" }
                                },
                                "format_hint": { "type": ["string", "null"] }
                            },
                            "required": ["key", "name", "description", "domain", "value_type"]
                        },
                        "rationale": { "type": "string" }
                    },
                    "required": ["spec", "rationale"]
                }
            },
            "value_updates": value_updates_schema(),
            "next_field_selection": next_field_schema(),
            "followup": { "type": "string" }
        },
        "required": ["analysis", "next_field_selection", "followup"]
    })
}

fn post_interview_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "response_interpretation": { "type": "string" },
            "value_updates": value_updates_schema(),
            "next_field_selection": next_field_schema(),
            "followup": { "type": "string" }
        },
        "required": ["next_field_selection", "followup"]
    })
}

/// A validated decision under either contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnDecision {
    Interview(InterviewTurn),
    PostInterview(PostInterviewTurn),
}

impl TurnDecision {
    pub fn contract(&self) -> TurnContract {
        match self {
            TurnDecision::Interview(_) => TurnContract::Interview,
            TurnDecision::PostInterview(_) => TurnContract::PostInterview,
        }
    }

    pub fn followup(&self) -> &str {
        match self {
            TurnDecision::Interview(turn) => &turn.followup,
            TurnDecision::PostInterview(turn) => &turn.followup,
        }
    }

    pub fn next_field(&self) -> &NextFieldSelection {
        match self {
            TurnDecision::Interview(turn) => &turn.next_field_selection,
            TurnDecision::PostInterview(turn) => &turn.next_field_selection,
        }
    }

    pub fn value_updates(&self) -> &[ValueUpdate] {
        match self {
            TurnDecision::Interview(turn) => &turn.value_updates,
            TurnDecision::PostInterview(turn) => &turn.value_updates,
        }
    }
}

impl From<InterviewTurn> for TurnDecision {
    fn from(turn: InterviewTurn) -> Self {
        TurnDecision::Interview(turn)
    }
}

impl From<PostInterviewTurn> for TurnDecision {
    fn from(turn: PostInterviewTurn) -> Self {
        TurnDecision::PostInterview(turn)
    }
}
