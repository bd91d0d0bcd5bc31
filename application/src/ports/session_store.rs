//! Session store port
//!
//! Persistence of profiles, their interview state and their message log.
//! State is versioned: every successful save bumps the version, and a save
//! against a stale version fails with [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lattia_domain::{InterviewState, Message, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ProfileId = i64;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Profile {0} not found")]
    NotFound(ProfileId),

    #[error("Profile {id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        id: ProfileId,
        expected: u64,
        actual: u64,
    },

    #[error("Profile name already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// An interview subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A logged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub profile_id: ProfileId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// State as loaded, with the version to pass back on save.
#[derive(Debug, Clone)]
pub struct VersionedState {
    pub state: InterviewState,
    pub version: u64,
}

/// Everything a successful turn writes.
pub struct TurnCommit<'a> {
    pub user_message: &'a str,
    pub assistant_message: &'a str,
    pub state: &'a InterviewState,
    pub expected_version: u64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a profile with an empty interview state at version 0.
    async fn create_profile(&self, name: &str) -> Result<Profile, StoreError>;

    /// All profiles, newest first.
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    async fn get_profile(&self, id: ProfileId) -> Result<Profile, StoreError>;

    /// Delete a profile with its state and messages.
    async fn delete_profile(&self, id: ProfileId) -> Result<(), StoreError>;

    async fn load_state(&self, id: ProfileId) -> Result<VersionedState, StoreError>;

    /// Save `state` if the stored version equals `expected_version`.
    /// Returns the new version.
    async fn save_state(
        &self,
        id: ProfileId,
        state: &InterviewState,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    async fn append_message(
        &self,
        id: ProfileId,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError>;

    /// Messages in insertion order.
    async fn messages(&self, id: ProfileId) -> Result<Vec<StoredMessage>, StoreError>;

    /// Append both messages and save the state as one unit. Nothing is
    /// written if the version check fails. Returns the assistant message.
    async fn commit_turn(
        &self,
        id: ProfileId,
        commit: TurnCommit<'_>,
    ) -> Result<StoredMessage, StoreError>;
}
