//! PII detector port
//!
//! Detection only; span resolution and substitution live in the domain
//! ([`lattia_domain::redact`]).

use lattia_domain::{PiiSpan, redact};

pub trait PiiDetector: Send + Sync {
    /// Detected spans, as byte offsets into `text`. May overlap.
    fn detect(&self, text: &str) -> Vec<PiiSpan>;

    /// Replace every detected span with its category mask.
    fn redact(&self, text: &str) -> String {
        redact(text, self.detect(text))
    }
}

/// Detector that finds nothing.
pub struct NoPiiDetector;

impl PiiDetector for NoPiiDetector {
    fn detect(&self, _text: &str) -> Vec<PiiSpan> {
        Vec::new()
    }
}
