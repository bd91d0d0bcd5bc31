//! User-facing projection of collected intake data.

use super::category::IntakeDomain;
use super::field::IntakeField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One collected piece of information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDataEntry {
    pub key: String,
    pub name: String,
    pub description: String,
    pub rationale: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
}

impl From<&IntakeField> for HealthDataEntry {
    fn from(field: &IntakeField) -> Self {
        let spec = field.spec();
        Self {
            key: spec.key.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            rationale: field.rationale().to_string(),
            value: field.value().to_string(),
            options: spec.options.clone(),
        }
    }
}

/// Collected entries grouped by domain, then by field key.
pub type HealthData = BTreeMap<IntakeDomain, BTreeMap<String, HealthDataEntry>>;
