//! `[retrieval]` section: question-bank exemplars via Qdrant

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    pub enabled: bool,
    pub qdrant_url: String,
    pub collection: String,
    pub embedding_model: String,
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            qdrant_url: "http://localhost:6333".to_string(),
            collection: "health_questions".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            top_k: 5,
            score_threshold: Some(0.3),
        }
    }
}
