//! Intake agent use case.
//!
//! One oracle call per inbound message:
//! 1. Pick the contract from `state.is_done()`
//! 2. Window the history and gather exemplars from the retriever
//! 3. Call the oracle and validate its decision
//! 4. Apply the decision to a copy of the state
//!
//! The caller's state is never touched; the caller decides whether the
//! returned state is persisted.

use crate::config::AgentParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationEventKind, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use crate::ports::retriever::{NoRetriever, QuestionRetriever};
use lattia_domain::util::preview;
use lattia_domain::{
    IntakeField, IntakePromptTemplate, InterviewState, Message, OPENING_QUESTIONS,
    RelevantQuestion, TurnContract, TurnParseError, TurnPromptContext, TurnReport,
    dedup_exemplars, history_window, parse_turn_decision,
};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const FALLBACK_OPENER: &str = "How have you been feeling lately?";

/// Errors that fail a turn. The input state stays valid.
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid turn decision: {0}")]
    Parse(#[from] TurnParseError),
}

/// Result of one applied turn.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub followup: String,
    pub state: InterviewState,
    /// Items of the decision that were skipped.
    pub report: TurnReport,
}

/// The agent orchestrator.
pub struct IntakeAgent {
    gateway: Arc<dyn LlmGateway>,
    retriever: Arc<dyn QuestionRetriever>,
    conversation_logger: Arc<dyn ConversationLogger>,
    params: AgentParams,
}

impl Clone for IntakeAgent {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            retriever: self.retriever.clone(),
            conversation_logger: self.conversation_logger.clone(),
            params: self.params.clone(),
        }
    }
}

impl IntakeAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, params: AgentParams) -> Self {
        Self {
            gateway,
            retriever: Arc::new(NoRetriever),
            conversation_logger: Arc::new(NoConversationLogger),
            params,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn QuestionRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    /// Greeting for a new session. Does not touch any state.
    pub fn open(&self, session_name: &str) -> String {
        self.open_with(session_name, &mut rand::thread_rng())
    }

    pub fn open_with<R: Rng + ?Sized>(&self, session_name: &str, rng: &mut R) -> String {
        let opener = OPENING_QUESTIONS
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_OPENER);
        IntakePromptTemplate::greeting(session_name, opener)
    }

    /// Run one turn against `state` and return the follow-up with the new state.
    pub async fn reply(
        &self,
        user_text: &str,
        history: &[Message],
        state: &InterviewState,
    ) -> Result<AgentReply, RunTurnError> {
        let contract = TurnContract::for_completion(state.is_done());
        let window = history_window(history, self.params.history_window);
        info!(
            "Running {} turn ({} of {} history messages): {}",
            contract,
            window.len(),
            history.len(),
            preview(user_text, 100)
        );

        let exemplars = self.exemplars(state, user_text).await;
        let context = TurnPromptContext {
            state,
            history: window,
            user_query: user_text,
            exemplars: &exemplars,
        };
        let request = CompletionRequest::new(
            IntakePromptTemplate::system_for(contract),
            IntakePromptTemplate::turn_prompt(&context),
            contract,
        );

        self.conversation_logger.log(ConversationEvent::new(
            ConversationEventKind::OracleRequest,
            serde_json::json!({
                "model": self.gateway.model_name(),
                "contract": contract.as_str(),
                "exemplars": exemplars.len(),
                "prompt": request.user_prompt,
            }),
        ));

        let raw = match self.gateway.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Oracle call failed: {}", e);
                self.log_failure(contract, &e.to_string());
                return Err(e.into());
            }
        };

        self.conversation_logger.log(ConversationEvent::new(
            ConversationEventKind::OracleResponse,
            serde_json::json!({
                "model": self.gateway.model_name(),
                "contract": contract.as_str(),
                "bytes": raw.len(),
                "text": raw,
            }),
        ));

        let decision = match parse_turn_decision(contract, &raw) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    "Rejected oracle output: {} ({})",
                    e,
                    preview(&raw, 200)
                );
                self.log_failure(contract, &e.to_string());
                return Err(e.into());
            }
        };

        let (new_state, report) = state.applied(&decision);
        for rejected in &report.rejected {
            warn!(
                "Skipped decision item for key {:?}: {}",
                rejected.field_key().unwrap_or(""),
                rejected
            );
        }
        debug!(
            "Turn applied: {} created, {} updated, {} skipped",
            report.created.len(),
            report.updated.len(),
            report.rejected.len()
        );

        self.conversation_logger.log(ConversationEvent::new(
            ConversationEventKind::TurnApplied,
            serde_json::json!({
                "contract": contract.as_str(),
                "created": report.created,
                "updated": report.updated,
                "rejected": report.rejected.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
                "recorded_domain": report.recorded_domain.map(|d| d.as_str()),
                "total_turns": new_state.stats().total_turns(),
                "is_done": new_state.is_done(),
            }),
        ));

        Ok(AgentReply {
            followup: decision.followup().to_string(),
            state: new_state,
            report,
        })
    }

    /// Exemplars for the latest collected and latest pending fields, or for
    /// the user text when the session has no fields yet. Retrieval failures
    /// only cost the exemplars.
    async fn exemplars(&self, state: &InterviewState, user_text: &str) -> Vec<RelevantQuestion> {
        let queries = exemplar_queries(state, user_text);
        if queries.is_empty() {
            return Vec::new();
        }
        match self
            .retriever
            .retrieve_many(&queries, self.params.top_k, self.params.score_threshold)
            .await
        {
            Ok(lists) => dedup_exemplars(lists),
            Err(e) => {
                warn!("Exemplar retrieval failed, continuing without: {}", e);
                Vec::new()
            }
        }
    }

    fn log_failure(&self, contract: TurnContract, error: &str) {
        self.conversation_logger.log(ConversationEvent::new(
            ConversationEventKind::TurnFailed,
            serde_json::json!({
                "contract": contract.as_str(),
                "error": error,
            }),
        ));
    }
}

fn exemplar_queries(state: &InterviewState, user_text: &str) -> Vec<String> {
    let mut queries: Vec<String> = [state.latest_collected(), state.latest_pending()]
        .into_iter()
        .flatten()
        .map(field_query)
        .collect();
    if queries.is_empty() && !user_text.trim().is_empty() {
        queries.push(user_text.trim().to_string());
    }
    queries
}

fn field_query(field: &IntakeField) -> String {
    let spec = field.spec();
    if spec.description.is_empty() {
        spec.name.clone()
    } else {
        format!("{}: {}", spec.name, spec.description)
    }
}
