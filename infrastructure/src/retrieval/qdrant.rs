//! Question-bank retriever: OpenAI embeddings + Qdrant REST search

use crate::config::{FileLlmConfig, FileRetrievalConfig};
use async_trait::async_trait;
use lattia_application::ports::retriever::{QuestionRetriever, RetrieverError};
use lattia_domain::RelevantQuestion;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchSearchResponse {
    result: Vec<Vec<ScoredPoint>>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl ScoredPoint {
    fn into_question(self) -> RelevantQuestion {
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let payload = self.payload.unwrap_or_default();
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let options: BTreeMap<String, String> = payload
            .get("options")
            .and_then(Value::as_object)
            .map(|o| {
                o.iter()
                    .map(|(code, label)| {
                        let label = label.as_str().map(str::to_string).unwrap_or_else(|| label.to_string());
                        (code.clone(), label)
                    })
                    .collect()
            })
            .unwrap_or_default();

        RelevantQuestion {
            id,
            domain_title: text("domain_title"),
            key: text("key"),
            label: text("label"),
            options,
        }
    }
}

pub struct QdrantRetriever {
    client: reqwest::Client,
    embeddings_url: String,
    api_key: String,
    embedding_model: String,
    qdrant_url: String,
    collection: String,
}

impl QdrantRetriever {
    pub fn new(
        llm: &FileLlmConfig,
        retrieval: &FileRetrievalConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, RetrieverError> {
        let client = reqwest::Client::builder()
            .timeout(llm.timeout())
            .build()
            .map_err(|e| RetrieverError::Unavailable(e.to_string()))?;

        info!(
            "QdrantRetriever initialized ({} / {})",
            retrieval.qdrant_url, retrieval.collection
        );

        Ok(Self {
            client,
            embeddings_url: format!("{}/embeddings", llm.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            embedding_model: retrieval.embedding_model.clone(),
            qdrant_url: retrieval.qdrant_url.trim_end_matches('/').to_string(),
            collection: retrieval.collection.clone(),
        })
    }

    /// Embed all inputs in one request, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RetrieverError> {
        let response = self
            .client
            .post(&self.embeddings_url)
            .bearer_auth(&self.api_key)
            .json(&json!({"model": self.embedding_model, "input": inputs}))
            .send()
            .await
            .map_err(|e| RetrieverError::Embedding(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RetrieverError::Embedding(e.to_string()))?;
        if !status.is_success() {
            return Err(RetrieverError::Embedding(format!("HTTP {}: {}", status, text)));
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&text)
            .map_err(|e| RetrieverError::Embedding(format!("Failed to parse response: {}", e)))?;
        order_embeddings(parsed, inputs.len())
    }

    async fn post_qdrant<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, RetrieverError> {
        let url = format!("{}/collections/{}/{}", self.qdrant_url, self.collection, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RetrieverError::Unavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RetrieverError::Search(e.to_string()))?;
        if !status.is_success() {
            return Err(RetrieverError::Search(format!("HTTP {}: {}", status, text)));
        }
        serde_json::from_str(&text)
            .map_err(|e| RetrieverError::Search(format!("Failed to parse response: {}", e)))
    }
}

fn order_embeddings(
    response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, RetrieverError> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(RetrieverError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

fn search_body(vector: Vec<f32>, top_k: usize, score_threshold: Option<f32>) -> Value {
    let mut body = json!({
        "vector": vector,
        "limit": top_k,
        "with_payload": true,
    });
    if let Some(threshold) = score_threshold {
        body["score_threshold"] = json!(threshold);
    }
    body
}

#[async_trait]
impl QuestionRetriever for QdrantRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RelevantQuestion>, RetrieverError> {
        let mut results = self
            .retrieve_many(&[query.to_string()], top_k, score_threshold)
            .await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// One embeddings call and one batch search for all queries.
    async fn retrieve_many(
        &self,
        queries: &[String],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<Vec<RelevantQuestion>>, RetrieverError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.embed(queries).await?;
        let searches: Vec<Value> = vectors
            .into_iter()
            .map(|v| search_body(v, top_k, score_threshold))
            .collect();

        let response: BatchSearchResponse = self
            .post_qdrant("points/search/batch", &json!({"searches": searches}))
            .await?;

        debug!(
            "Retrieved exemplars for {} queries: {:?}",
            queries.len(),
            response.result.iter().map(Vec::len).collect::<Vec<_>>()
        );

        Ok(response
            .result
            .into_iter()
            .map(|hits| hits.into_iter().map(ScoredPoint::into_question).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_payload_mapping() {
        let response: BatchSearchResponse = serde_json::from_str(
            r#"{"result": [[
                {"id": 17, "score": 0.8, "payload": {
                    "domain_title": "Sleep", "key": "sleepHours",
                    "label": "Hours of sleep", "options": {"a": "<4h", "b": 5}
                }},
                {"id": "uuid-1", "score": 0.5}
            ]], "status": "ok"}"#,
        )
        .unwrap();

        let questions: Vec<RelevantQuestion> = response
            .result
            .into_iter()
            .next()
            .unwrap()
            .into_iter()
            .map(ScoredPoint::into_question)
            .collect();

        assert_eq!(questions[0].id, "17");
        assert_eq!(questions[0].domain_title, "Sleep");
        assert_eq!(questions[0].options["a"], "<4h");
        assert_eq!(questions[0].options["b"], "5");
        assert_eq!(questions[1].id, "uuid-1");
        assert!(questions[1].options.is_empty());
        assert!(questions[1].label.is_empty());
    }

    #[test]
    fn test_embeddings_are_ordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"index": 1, "embedding": [2.0]}, {"index": 0, "embedding": [1.0]}]}"#,
        )
        .unwrap();
        let vectors = order_embeddings(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_embedding_count_mismatch() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#).unwrap();
        assert!(matches!(
            order_embeddings(response, 2),
            Err(RetrieverError::Embedding(_))
        ));
    }

    #[test]
    fn test_search_body_threshold_is_optional() {
        let body = search_body(vec![0.5], 5, None);
        assert_eq!(body["limit"], 5);
        assert!(body.get("score_threshold").is_none());

        let body = search_body(vec![0.5], 5, Some(0.25));
        assert_eq!(body["score_threshold"], 0.25);
    }

    #[tokio::test]
    async fn test_empty_queries_skip_network() {
        let retriever = QdrantRetriever::new(
            &FileLlmConfig::default(),
            &FileRetrievalConfig::default(),
            "key",
        )
        .unwrap();
        assert!(retriever.retrieve_many(&[], 5, None).await.unwrap().is_empty());
    }
}
