//! Field catalog model
//!
//! - [`FieldSpec`]: immutable description of one collectible field
//! - [`FieldRequest`]: a spec plus the rationale for requesting it
//! - [`IntakeField`]: a requested field and its current value
//!
//! A field is pending while its value is the [`TO_COLLECT`] sentinel and
//! collected once any value update has targeted it.

use super::category::IntakeDomain;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a field that has not been answered yet.
pub const TO_COLLECT: &str = "to_collect";
/// The user declined to answer.
pub const PREFER_NOT_TO_SAY: &str = "prefer_not_to_say";
/// The user does not know the answer.
pub const NOT_SURE: &str = "not_sure";

/// Whether `value` is one of the deliberate non-answer sentinels.
pub fn is_non_answer(value: &str) -> bool {
    matches!(value.trim(), PREFER_NOT_TO_SAY | NOT_SURE)
}

/// How a field's value is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    SingleChoice,
    MultiChoice,
    BucketedChoice,
    YesNo,
    #[serde(rename = "scale_1_10")]
    Scale1To10,
    FreeText,
}

impl ValueType {
    pub const ALL: [ValueType; 6] = [
        ValueType::SingleChoice,
        ValueType::MultiChoice,
        ValueType::BucketedChoice,
        ValueType::YesNo,
        ValueType::Scale1To10,
        ValueType::FreeText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::SingleChoice => "single_choice",
            ValueType::MultiChoice => "multi_choice",
            ValueType::BucketedChoice => "bucketed_choice",
            ValueType::YesNo => "yes_no",
            ValueType::Scale1To10 => "scale_1_10",
            ValueType::FreeText => "free_text",
        }
    }

    /// Choice variants require a non-empty option map.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            ValueType::SingleChoice | ValueType::MultiChoice | ValueType::BucketedChoice
        )
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownValueType(s.to_string()))
    }
}

/// Specification of a single intake field (Value Object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Stable snake_case key, unique within a session.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// One-sentence statement of what the field represents.
    pub description: String,
    pub domain: IntakeDomain,
    pub value_type: ValueType,
    /// Canonical code -> human label, for choice value types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    /// Free-form format constraint, e.g. `time_hhmm_24h`.
    #[serde(
        default,
        alias = "additional_value_format_specification",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_hint: Option<String>,
}

impl FieldSpec {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        domain: IntakeDomain,
        value_type: ValueType,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            domain,
            value_type,
            options: None,
            format_hint: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_option(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.options
            .get_or_insert_with(BTreeMap::new)
            .insert(code.into(), label.into());
        self
    }

    pub fn with_format_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }

    /// Check the structural invariants of a spec.
    ///
    /// The key must be non-empty and free of whitespace, and choice value
    /// types must carry a non-empty option map.
    pub fn validate(&self) -> Result<(), DomainError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(DomainError::InvalidFieldSpec {
                key: self.key.clone(),
                reason: "key cannot be empty".to_string(),
            });
        }
        if key.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidFieldSpec {
                key: self.key.clone(),
                reason: "key cannot contain whitespace".to_string(),
            });
        }
        if self.value_type.is_choice() && self.options.as_ref().is_none_or(|o| o.is_empty()) {
            return Err(DomainError::InvalidFieldSpec {
                key: self.key.clone(),
                reason: format!("{} requires a non-empty options map", self.value_type),
            });
        }
        Ok(())
    }
}

/// Request to add one field to the session (Value Object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequest {
    pub spec: FieldSpec,
    /// Why the field is relevant to collect at this point.
    #[serde(default)]
    pub rationale: String,
}

impl FieldRequest {
    pub fn new(spec: FieldSpec, rationale: impl Into<String>) -> Self {
        Self {
            spec,
            rationale: rationale.into(),
        }
    }
}

/// A field being collected in a session, with its current value (Entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeField {
    spec: FieldSpec,
    rationale: String,
    value: String,
}

impl IntakeField {
    /// Instantiate a pending field from a request.
    pub fn from_request(request: FieldRequest) -> Self {
        Self {
            spec: request.spec,
            rationale: request.rationale,
            value: TO_COLLECT.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.spec.key
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn domain(&self) -> IntakeDomain {
        self.spec.domain
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_collected(&self) -> bool {
        self.value != TO_COLLECT
    }

    /// Overwrite the value (last write wins).
    ///
    /// Rejects empty values, the [`TO_COLLECT`] sentinel, and non-answer
    /// sentinels mixed with other selections.
    pub fn set_value(&mut self, value: &str) -> Result<(), DomainError> {
        let value = value.trim();
        let invalid = |reason: &str| DomainError::InvalidValue {
            key: self.spec.key.clone(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("value cannot be empty"));
        }
        if value == TO_COLLECT {
            return Err(invalid("a collected field cannot be reset to to_collect"));
        }
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        if parts.len() > 1 && parts.iter().any(|p| is_non_answer(p)) {
            return Err(invalid("non-answer tokens cannot be combined with other values"));
        }

        self.value = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep_spec() -> FieldSpec {
        FieldSpec::new(
            "sleep_hours",
            "Sleep hours",
            IntakeDomain::Sleep,
            ValueType::BucketedChoice,
        )
        .with_description("Average hours of sleep per night.")
        .with_option("lt4h", "<4h")
        .with_option("4to6h", "4-6h")
        .with_option("6to8h", "6-8h")
        .with_option("gt8h", ">8h")
    }

    #[test]
    fn test_value_type_serde_names() {
        let json = serde_json::to_string(&ValueType::Scale1To10).unwrap();
        assert_eq!(json, "\"scale_1_10\"");
        let parsed: ValueType = serde_json::from_str("\"bucketed_choice\"").unwrap();
        assert_eq!(parsed, ValueType::BucketedChoice);
        assert_eq!("yes_no".parse::<ValueType>().unwrap(), ValueType::YesNo);
        assert!("checkbox".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_validate_accepts_choice_with_options() {
        assert!(sleep_spec().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_choice_without_options() {
        let spec = FieldSpec::new(
            "diet_type",
            "Diet",
            IntakeDomain::Nutrition,
            ValueType::SingleChoice,
        );
        assert!(matches!(
            spec.validate(),
            Err(DomainError::InvalidFieldSpec { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let spec = FieldSpec::new(" ", "Blank", IntakeDomain::Sleep, ValueType::FreeText);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_free_text_needs_no_options() {
        let spec = FieldSpec::new("main_goal", "Goal", IntakeDomain::Lifestyle, ValueType::FreeText);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_format_hint_alias() {
        let json = serde_json::json!({
            "key": "bed_time",
            "name": "Bed time",
            "description": "Usual bed time.",
            "domain": "sleep",
            "value_type": "free_text",
            "additional_value_format_specification": "time_hhmm_24h"
        });
        let spec: FieldSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.format_hint.as_deref(), Some("time_hhmm_24h"));
    }

    #[test]
    fn test_field_starts_pending() {
        let field = IntakeField::from_request(FieldRequest::new(sleep_spec(), "asked about sleep"));
        assert!(!field.is_collected());
        assert_eq!(field.value(), TO_COLLECT);
        assert_eq!(field.domain(), IntakeDomain::Sleep);
    }

    #[test]
    fn test_set_value_collects_and_overwrites() {
        let mut field = IntakeField::from_request(FieldRequest::new(sleep_spec(), ""));
        field.set_value("4to6h").unwrap();
        assert!(field.is_collected());
        field.set_value("6to8h").unwrap();
        assert_eq!(field.value(), "6to8h");
    }

    #[test]
    fn test_set_value_accepts_lone_sentinel() {
        let mut field = IntakeField::from_request(FieldRequest::new(sleep_spec(), ""));
        field.set_value(PREFER_NOT_TO_SAY).unwrap();
        assert!(field.is_collected());
        assert!(is_non_answer(field.value()));
    }

    #[test]
    fn test_set_value_rejects_mixed_sentinel() {
        let mut field = IntakeField::from_request(FieldRequest::new(sleep_spec(), ""));
        let err = field.set_value("4to6h, not_sure").unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { .. }));
        assert!(!field.is_collected());
    }

    #[test]
    fn test_set_value_rejects_reset() {
        let mut field = IntakeField::from_request(FieldRequest::new(sleep_spec(), ""));
        field.set_value("4to6h").unwrap();
        assert!(field.set_value(TO_COLLECT).is_err());
        assert_eq!(field.value(), "4to6h");
    }
}
