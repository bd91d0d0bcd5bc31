//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised by the field catalog and the turn stats tracker. The
/// data-referential variants are tolerated by the interview state machine
/// and reported back instead of aborting a turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Field key '{0}' already exists in current state")]
    DuplicateField(String),

    #[error("Field key '{0}' not found in current state")]
    UnknownField(String),

    #[error("Invalid value for field '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown intake domain: {0}")]
    UnknownDomain(String),

    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    #[error("Invalid field spec '{key}': {reason}")]
    InvalidFieldSpec { key: String, reason: String },
}

impl DomainError {
    /// Whether this error refers to a field key that the oracle got wrong.
    ///
    /// These are swallowed by the turn state machine.
    pub fn is_referential(&self) -> bool {
        matches!(
            self,
            DomainError::DuplicateField(_)
                | DomainError::UnknownField(_)
                | DomainError::InvalidValue { .. }
        )
    }

    /// The field key this error refers to, if any.
    pub fn field_key(&self) -> Option<&str> {
        match self {
            DomainError::DuplicateField(key)
            | DomainError::UnknownField(key)
            | DomainError::InvalidValue { key, .. }
            | DomainError::InvalidFieldSpec { key, .. } => Some(key),
            DomainError::UnknownDomain(_) | DomainError::UnknownValueType(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_field_display() {
        let error = DomainError::DuplicateField("sleep_hours".to_string());
        assert_eq!(
            error.to_string(),
            "Field key 'sleep_hours' already exists in current state"
        );
    }

    #[test]
    fn test_is_referential() {
        assert!(DomainError::DuplicateField("a".to_string()).is_referential());
        assert!(DomainError::UnknownField("a".to_string()).is_referential());
        assert!(!DomainError::UnknownDomain("astrology".to_string()).is_referential());
    }

    #[test]
    fn test_field_key() {
        let error = DomainError::InvalidValue {
            key: "is_smoker".to_string(),
            reason: "empty".to_string(),
        };
        assert_eq!(error.field_key(), Some("is_smoker"));
        assert_eq!(DomainError::UnknownDomain("x".to_string()).field_key(), None);
    }
}
