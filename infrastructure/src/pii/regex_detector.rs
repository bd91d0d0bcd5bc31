//! Pattern-based PII detector
//!
//! Covers the structured categories (email, phone, id and card numbers,
//! dates, IPv4 addresses). Free-text names and addresses need an NER model
//! and are not detected here.

use lattia_application::ports::pii_detector::PiiDetector;
use lattia_domain::{PiiCategory, PiiSpan};
use regex::Regex;

/// Patterns in priority order: on equal-length overlaps the earlier
/// category wins, so the specific shapes precede the phone catch-all.
const PATTERNS: &[(PiiCategory, &str)] = &[
    (PiiCategory::Email, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
    (PiiCategory::IdNumber, r"\b\d{3}-\d{2}-\d{4}\b"),
    (PiiCategory::CreditCard, r"\b\d{4}[ -]\d{4}[ -]\d{4}[ -]\d{4}\b"),
    (PiiCategory::Date, r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{4}\b"),
    (PiiCategory::IpAddress, r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
    (
        PiiCategory::PhoneNumber,
        r"(?:\+\d{1,3}[\s.-]?(?:\(\d{1,4}\)[\s.-]?)?|\(\d{1,4}\)[\s.-]?|\b)\d{2,4}(?:[\s.-]\d{2,4}){1,4}\b",
    ),
];

const MIN_PHONE_DIGITS: usize = 9;

/// Numeric ranges ("8000-10000", "2010-2015") share the separators of a
/// phone number. A candidate needs enough digits and either a country
/// code, an area code in parentheses, or three digit groups.
fn is_phone_shaped(candidate: &str) -> bool {
    let digits = candidate.chars().filter(char::is_ascii_digit).count();
    let groups = candidate
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .count();
    let marked = candidate.starts_with('+') || candidate.contains('(');
    digits >= MIN_PHONE_DIGITS && (marked || groups >= 3)
}

pub struct RegexPiiDetector {
    patterns: Vec<(PiiCategory, Regex)>,
}

impl RegexPiiDetector {
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = PATTERNS
            .iter()
            .map(|(category, pattern)| Ok((*category, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }
}

impl PiiDetector for RegexPiiDetector {
    fn detect(&self, text: &str) -> Vec<PiiSpan> {
        self.patterns
            .iter()
            .flat_map(|(category, regex)| {
                regex
                    .find_iter(text)
                    .filter(move |m| {
                        *category != PiiCategory::PhoneNumber || is_phone_shaped(m.as_str())
                    })
                    .map(move |m| PiiSpan::new(m.start(), m.end(), *category))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RegexPiiDetector {
        RegexPiiDetector::new().unwrap()
    }

    #[test]
    fn test_redacts_email_and_phone() {
        let text = "Call me at +1 (555) 123-4567 or mail ana@example.com";
        assert_eq!(
            detector().redact(text),
            "Call me at [PHONE NUMBER] or mail [EMAIL]"
        );
    }

    #[test]
    fn test_phone_shapes() {
        let d = detector();
        assert_eq!(d.redact("ring (555) 123-4567"), "ring [PHONE NUMBER]");
        assert_eq!(d.redact("ring +44 20 7946 0958"), "ring [PHONE NUMBER]");
        assert_eq!(d.redact("ring 555.123.4567 today"), "ring [PHONE NUMBER] today");
    }

    #[test]
    fn test_date_is_not_a_phone() {
        let d = detector();
        let spans = d.detect("born 1990-01-01 here");
        assert!(spans.iter().all(|s| s.category == PiiCategory::Date));
        assert_eq!(d.redact("born 1990-01-01 here"), "born [DATE] here");
    }

    #[test]
    fn test_id_number_wins_over_phone_shape() {
        let d = detector();
        let spans = d.detect("SSN 123-45-6789");
        assert!(spans.iter().any(|s| s.category == PiiCategory::PhoneNumber));
        assert_eq!(d.redact("SSN 123-45-6789"), "SSN [ID NUMBER]");
    }

    #[test]
    fn test_card_and_ip() {
        let d = detector();
        assert_eq!(d.redact("card 4111 1111 1111 1111"), "card [CREDIT CARD]");
        assert_eq!(d.redact("from 192.168.1.10"), "from [IP ADDRESS]");
    }

    #[test]
    fn test_clean_text_is_unchanged() {
        let text = "I sleep about 6 hours and walk 2 km a day";
        assert!(detector().detect(text).is_empty());
        assert_eq!(detector().redact(text), text);
    }

    #[test]
    fn test_numeric_ranges_are_unchanged() {
        let d = detector();
        for text in [
            "I smoked from 2010-2015",
            "I walk 8000-10000 steps a day",
            "I take 500 - 1000 mg of vitamin C",
            "I sleep 6-8 hours, sometimes 10",
            "blood pressure around 120/80",
        ] {
            assert!(d.detect(text).is_empty(), "{text}");
            assert_eq!(d.redact(text), text);
        }
    }
}
