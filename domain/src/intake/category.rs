//! Intake domains (Value Object)
//!
//! The fixed taxonomy every intake field belongs to. The oracle may create
//! new field keys at runtime, but never new domains.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Topical category of intake fields.
///
/// Declaration order is the display order used in progress reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeDomain {
    BasicInfo,
    Lifestyle,
    PhysicalActivity,
    Sleep,
    MentalHealth,
    Nutrition,
    SocialRelations,
    FamilyHistory,
    MedicalHistory,
    SubstanceUse,
    PersonalHygiene,
    CurrentHealthStatus,
}

impl IntakeDomain {
    /// Every domain, in display order.
    pub const ALL: [IntakeDomain; 12] = [
        IntakeDomain::BasicInfo,
        IntakeDomain::Lifestyle,
        IntakeDomain::PhysicalActivity,
        IntakeDomain::Sleep,
        IntakeDomain::MentalHealth,
        IntakeDomain::Nutrition,
        IntakeDomain::SocialRelations,
        IntakeDomain::FamilyHistory,
        IntakeDomain::MedicalHistory,
        IntakeDomain::SubstanceUse,
        IntakeDomain::PersonalHygiene,
        IntakeDomain::CurrentHealthStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeDomain::BasicInfo => "basic_info",
            IntakeDomain::Lifestyle => "lifestyle",
            IntakeDomain::PhysicalActivity => "physical_activity",
            IntakeDomain::Sleep => "sleep",
            IntakeDomain::MentalHealth => "mental_health",
            IntakeDomain::Nutrition => "nutrition",
            IntakeDomain::SocialRelations => "social_relations",
            IntakeDomain::FamilyHistory => "family_history",
            IntakeDomain::MedicalHistory => "medical_history",
            IntakeDomain::SubstanceUse => "substance_use",
            IntakeDomain::PersonalHygiene => "personal_hygiene",
            IntakeDomain::CurrentHealthStatus => "current_health_status",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IntakeDomain::BasicInfo => "Basic Info",
            IntakeDomain::Lifestyle => "Lifestyle",
            IntakeDomain::PhysicalActivity => "Physical Activity",
            IntakeDomain::Sleep => "Sleep",
            IntakeDomain::MentalHealth => "Mental Health",
            IntakeDomain::Nutrition => "Nutrition",
            IntakeDomain::SocialRelations => "Social Relations",
            IntakeDomain::FamilyHistory => "Family History",
            IntakeDomain::MedicalHistory => "Medical History",
            IntakeDomain::SubstanceUse => "Substance Use",
            IntakeDomain::PersonalHygiene => "Personal Hygiene",
            IntakeDomain::CurrentHealthStatus => "Current Health Status",
        }
    }

    /// Comma-separated list of every domain key, for prompts and schemas.
    pub fn joined() -> String {
        Self::ALL
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for IntakeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IntakeDomain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownDomain(s.to_string()))
    }
}
