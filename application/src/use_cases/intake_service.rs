//! Intake service use case.
//!
//! Session-level operations on top of [`IntakeAgent`]: profile CRUD, the
//! opening message, status changes and the turn pipeline.
//!
//! A posted message goes through:
//! 1. Rate limit check (rejects before any state is read)
//! 2. Session lease for the whole turn
//! 3. Load profile, versioned state and history
//! 4. PII redaction
//! 5. [`IntakeAgent::reply`]
//! 6. Atomic commit of both messages and the new state
//!
//! A failure at any step writes nothing.

use crate::ports::pii_detector::{NoPiiDetector, PiiDetector};
use crate::ports::session_store::{
    Profile, ProfileId, SessionStore, StoreError, StoredMessage, TurnCommit, VersionedState,
};
use crate::rate_limit::RateLimiterRegistry;
use crate::session_lock::SessionLocks;
use crate::use_cases::run_interview_turn::{IntakeAgent, RunTurnError};
use lattia_domain::{HealthData, Message, Role, ValueUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum IntakeServiceError {
    #[error("Rate limit exceeded for profile {0}")]
    RateLimited(ProfileId),

    #[error("Profile {0} not found")]
    NotFound(ProfileId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Profile name already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Turn failed: {0}")]
    Turn(#[from] RunTurnError),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IntakeServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => IntakeServiceError::NotFound(id),
            StoreError::AlreadyExists(name) => IntakeServiceError::AlreadyExists(name),
            e @ StoreError::Conflict { .. } => IntakeServiceError::Conflict(e.to_string()),
            other => IntakeServiceError::Store(other),
        }
    }
}

/// A profile with its message log.
#[derive(Debug, Clone)]
pub struct ProfileHistory {
    pub profile: Profile,
    pub messages: Vec<StoredMessage>,
}

pub struct IntakeService {
    agent: IntakeAgent,
    store: Arc<dyn SessionStore>,
    pii_detector: Arc<dyn PiiDetector>,
    rate_limiter: Arc<RateLimiterRegistry>,
    locks: SessionLocks,
}

impl IntakeService {
    pub fn new(agent: IntakeAgent, store: Arc<dyn SessionStore>) -> Self {
        Self {
            agent,
            store,
            pii_detector: Arc::new(NoPiiDetector),
            rate_limiter: Arc::new(RateLimiterRegistry::default()),
            locks: SessionLocks::new(),
        }
    }

    pub fn with_pii_detector(mut self, detector: Arc<dyn PiiDetector>) -> Self {
        self.pii_detector = detector;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiterRegistry>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiterRegistry> {
        &self.rate_limiter
    }

    // ==================== Profiles ====================

    pub async fn create_profile(&self, name: &str) -> Result<Profile, IntakeServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IntakeServiceError::InvalidInput(
                "name cannot be empty".to_string(),
            ));
        }
        let profile = self.store.create_profile(name).await?;
        info!("Created profile {} ({})", profile.id, profile.name);
        Ok(profile)
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, IntakeServiceError> {
        Ok(self.store.list_profiles().await?)
    }

    pub async fn get_profile(&self, id: ProfileId) -> Result<Profile, IntakeServiceError> {
        Ok(self.store.get_profile(id).await?)
    }

    pub async fn delete_profile(&self, id: ProfileId) -> Result<(), IntakeServiceError> {
        let _lease = self.locks.acquire(id).await;
        self.store.delete_profile(id).await?;
        self.rate_limiter.forget(id);
        info!("Deleted profile {}", id);
        Ok(())
    }

    pub async fn history(&self, id: ProfileId) -> Result<ProfileHistory, IntakeServiceError> {
        let profile = self.store.get_profile(id).await?;
        let messages = self.store.messages(id).await?;
        Ok(ProfileHistory { profile, messages })
    }

    pub async fn state(&self, id: ProfileId) -> Result<VersionedState, IntakeServiceError> {
        Ok(self.store.load_state(id).await?)
    }

    /// Collected fields grouped by domain.
    pub async fn health_data(&self, id: ProfileId) -> Result<HealthData, IntakeServiceError> {
        Ok(self.store.load_state(id).await?.state.to_health_data())
    }

    /// Manual edit of field values, keyed by field key. Every key must
    /// already exist. The edit is saved whole or not at all and is not
    /// counted as a turn.
    pub async fn update_health_data(
        &self,
        id: ProfileId,
        values: &BTreeMap<String, String>,
    ) -> Result<HealthData, IntakeServiceError> {
        if values.is_empty() {
            return Err(IntakeServiceError::InvalidInput(
                "no values to update".to_string(),
            ));
        }

        let _lease = self.locks.acquire(id).await;
        let VersionedState { mut state, version } = self.store.load_state(id).await?;
        for (key, value) in values {
            state
                .apply_value(&ValueUpdate::new(key.clone(), value.clone()))
                .map_err(|e| IntakeServiceError::InvalidInput(e.to_string()))?;
        }
        self.store.save_state(id, &state, version).await?;

        info!("Profile {}: {} value(s) edited", id, values.len());
        Ok(state.to_health_data())
    }

    // ==================== Interview ====================

    /// Opening message: the last assistant message if one exists, otherwise
    /// a fresh greeting, which is logged.
    pub async fn start(&self, id: ProfileId) -> Result<StoredMessage, IntakeServiceError> {
        let _lease = self.locks.acquire(id).await;
        let profile = self.store.get_profile(id).await?;
        let messages = self.store.messages(id).await?;

        if let Some(last) = messages.iter().rev().find(|m| m.role == Role::Assistant) {
            debug!("Profile {} already started; returning last assistant message", id);
            return Ok(last.clone());
        }

        let greeting = self.agent.open(&profile.name);
        Ok(self
            .store
            .append_message(id, Role::Assistant, &greeting)
            .await?)
    }

    /// Run one turn for `content` and return the assistant message.
    pub async fn post_message(
        &self,
        id: ProfileId,
        content: &str,
    ) -> Result<StoredMessage, IntakeServiceError> {
        if content.trim().is_empty() {
            return Err(IntakeServiceError::InvalidInput(
                "content cannot be empty".to_string(),
            ));
        }

        if !self.rate_limiter.try_acquire(id) {
            warn!("Rate limit exceeded for profile {}", id);
            return Err(IntakeServiceError::RateLimited(id));
        }

        let _lease = self.locks.acquire(id).await;

        // Existence check before any oracle call
        self.store.get_profile(id).await?;
        let VersionedState { state, version } = self.store.load_state(id).await?;
        let history: Vec<Message> = self
            .store
            .messages(id)
            .await?
            .iter()
            .map(StoredMessage::to_message)
            .collect();

        let redacted = self.pii_detector.redact(content.trim());
        if redacted != content.trim() {
            debug!("Redacted PII from message for profile {}", id);
        }

        let reply = match self.agent.reply(&redacted, &history, &state).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Turn failed for profile {}: {}", id, e);
                return Err(e.into());
            }
        };

        let assistant = self
            .store
            .commit_turn(
                id,
                TurnCommit {
                    user_message: &redacted,
                    assistant_message: &reply.followup,
                    state: &reply.state,
                    expected_version: version,
                },
            )
            .await?;

        info!(
            "Profile {}: turn {} committed (done: {})",
            id,
            reply.state.stats().total_turns(),
            reply.state.is_done()
        );
        Ok(assistant)
    }

    /// Latch the interview done. Reopening a done interview is rejected;
    /// `false` on an active interview changes nothing. Returns the
    /// resulting flag.
    pub async fn set_status(
        &self,
        id: ProfileId,
        is_done: bool,
    ) -> Result<bool, IntakeServiceError> {
        let _lease = self.locks.acquire(id).await;
        let VersionedState { mut state, version } = self.store.load_state(id).await?;

        match (state.is_done(), is_done) {
            (true, false) => Err(IntakeServiceError::Conflict(
                "a completed interview cannot be reopened".to_string(),
            )),
            (false, true) => {
                state.mark_done();
                self.store.save_state(id, &state, version).await?;
                info!("Profile {} marked done", id);
                Ok(true)
            }
            (current, _) => Ok(current),
        }
    }
}
