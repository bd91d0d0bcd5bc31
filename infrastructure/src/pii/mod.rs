//! PII detection adapters.

mod regex_detector;

pub use regex_detector::RegexPiiDetector;
