//! Example questions retrieved from the question bank.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A question from the reference bank, used as a phrasing exemplar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantQuestion {
    pub id: String,
    pub domain_title: String,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl RelevantQuestion {
    pub fn new(
        id: impl Into<String>,
        domain_title: impl Into<String>,
        key: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain_title: domain_title.into(),
            key: key.into(),
            label: label.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.insert(code.into(), label.into());
        self
    }
}

/// Merge several ranked lists, keeping the first occurrence of each id.
pub fn dedup_exemplars(lists: Vec<Vec<RelevantQuestion>>) -> Vec<RelevantQuestion> {
    let mut seen = std::collections::HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|q| seen.insert(q.id.clone()))
        .collect()
}
