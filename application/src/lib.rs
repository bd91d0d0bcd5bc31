//! Application layer for lattia
//!
//! This crate contains use cases, port definitions, and runtime parameters.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod rate_limit;
pub mod session_lock;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AgentParams, RateLimitParams};
pub use ports::{
    conversation_logger::{
        ConversationEvent, ConversationEventKind, ConversationLogger, NoConversationLogger,
    },
    llm_gateway::{CompletionRequest, GatewayError, LlmGateway},
    pii_detector::{NoPiiDetector, PiiDetector},
    retriever::{NoRetriever, QuestionRetriever, RetrieverError},
    session_store::{
        Profile, ProfileId, SessionStore, StoreError, StoredMessage, TurnCommit, VersionedState,
    },
};
pub use rate_limit::{RateLimiterRegistry, TokenBucket};
pub use session_lock::{SessionLease, SessionLocks};
pub use use_cases::intake_service::{IntakeService, IntakeServiceError, ProfileHistory};
pub use use_cases::run_interview_turn::{AgentReply, IntakeAgent, RunTurnError};
