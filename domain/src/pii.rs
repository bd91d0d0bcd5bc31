//! PII span resolution and substitution.
//!
//! Detection is an external concern; this module only decides which of the
//! detected spans win and replaces them with category masks.

use serde::{Deserialize, Serialize};

/// Category of sensitive information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Person,
    Email,
    PhoneNumber,
    IdNumber,
    CreditCard,
    Date,
    Address,
    IpAddress,
}

impl PiiCategory {
    /// Replacement text, e.g. `[PHONE NUMBER]`.
    pub fn mask(&self) -> &'static str {
        match self {
            PiiCategory::Person => "[PERSON]",
            PiiCategory::Email => "[EMAIL]",
            PiiCategory::PhoneNumber => "[PHONE NUMBER]",
            PiiCategory::IdNumber => "[ID NUMBER]",
            PiiCategory::CreditCard => "[CREDIT CARD]",
            PiiCategory::Date => "[DATE]",
            PiiCategory::Address => "[ADDRESS]",
            PiiCategory::IpAddress => "[IP ADDRESS]",
        }
    }
}

/// A detected span, as byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiiSpan {
    pub start: usize,
    pub end: usize,
    pub category: PiiCategory,
}

impl PiiSpan {
    pub fn new(start: usize, end: usize, category: PiiCategory) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Resolve overlaps: scanning by start offset, an overlapping span replaces
/// the previously kept one only if it is strictly longer.
pub fn resolve_overlaps(text: &str, mut spans: Vec<PiiSpan>) -> Vec<PiiSpan> {
    spans.retain(|s| {
        !s.is_empty()
            && s.end <= text.len()
            && text.is_char_boundary(s.start)
            && text.is_char_boundary(s.end)
    });
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut merged: Vec<PiiSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(prev) if span.start < prev.end => {
                if span.len() > prev.len() {
                    *prev = span;
                }
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Replace detected spans with their masks.
///
/// Substitution runs right to left so earlier offsets stay valid.
pub fn redact(text: &str, spans: Vec<PiiSpan>) -> String {
    let merged = resolve_overlaps(text, spans);
    if merged.is_empty() {
        return text.to_string();
    }

    let mut cleaned = text.to_string();
    for span in merged.iter().rev() {
        cleaned.replace_range(span.start..span.end, span.category.mask());
    }
    cleaned
}
