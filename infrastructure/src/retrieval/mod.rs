//! Exemplar retrieval from the question bank.

mod qdrant;

pub use qdrant::QdrantRetriever;
