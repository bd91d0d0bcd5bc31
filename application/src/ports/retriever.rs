//! Question retriever port
//!
//! Semantic search over the question bank. Results are exemplars used to
//! steer phrasing and options; they never change the interview state.

use async_trait::async_trait;
use futures::future::try_join_all;
use lattia_domain::RelevantQuestion;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Retriever unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait QuestionRetriever: Send + Sync {
    /// Ordered best-first.
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RelevantQuestion>, RetrieverError>;

    /// One result list per query, in query order.
    ///
    /// The default issues the single-query searches concurrently.
    async fn retrieve_many(
        &self,
        queries: &[String],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<Vec<RelevantQuestion>>, RetrieverError> {
        try_join_all(
            queries
                .iter()
                .map(|query| self.retrieve(query, top_k, score_threshold)),
        )
        .await
    }
}

/// Retriever that never finds anything; used when retrieval is disabled.
pub struct NoRetriever;

#[async_trait]
impl QuestionRetriever for NoRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _top_k: usize,
        _score_threshold: Option<f32>,
    ) -> Result<Vec<RelevantQuestion>, RetrieverError> {
        Ok(Vec::new())
    }
}
