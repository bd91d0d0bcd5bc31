//! In-memory session store
//!
//! Process-local; everything is lost on exit. Selected with
//! `[database] path = ":memory:"` and used by `lattia chat`.

use async_trait::async_trait;
use chrono::Utc;
use lattia_application::ports::session_store::{
    Profile, ProfileId, SessionStore, StoreError, StoredMessage, TurnCommit, VersionedState,
};
use lattia_domain::{InterviewState, Role};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

struct Record {
    profile: Profile,
    state: InterviewState,
    version: u64,
    messages: Vec<StoredMessage>,
}

#[derive(Default)]
struct Inner {
    next_profile_id: ProfileId,
    next_message_id: i64,
    records: BTreeMap<ProfileId, Record>,
}

impl Inner {
    fn record_mut(&mut self, id: ProfileId) -> Result<&mut Record, StoreError> {
        self.records.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    fn record(&self, id: ProfileId) -> Result<&Record, StoreError> {
        self.records.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn push_message(
        &mut self,
        id: ProfileId,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        self.next_message_id += 1;
        let message = StoredMessage {
            id: self.next_message_id,
            profile_id: id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.record_mut(id)?.messages.push(message.clone());
        Ok(message)
    }
}

impl Record {
    fn check_version(&self, expected: u64) -> Result<(), StoreError> {
        if self.version != expected {
            return Err(StoreError::Conflict {
                id: self.profile.id,
                expected,
                actual: self.version,
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_profile(&self, name: &str) -> Result<Profile, StoreError> {
        let mut inner = self.lock();
        if inner.records.values().any(|r| r.profile.name == name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        inner.next_profile_id += 1;
        let profile = Profile {
            id: inner.next_profile_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        inner.records.insert(
            profile.id,
            Record {
                profile: profile.clone(),
                state: InterviewState::new(),
                version: 0,
                messages: Vec::new(),
            },
        );
        Ok(profile)
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self
            .lock()
            .records
            .values()
            .rev()
            .map(|r| r.profile.clone())
            .collect())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Profile, StoreError> {
        Ok(self.lock().record(id)?.profile.clone())
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<(), StoreError> {
        self.lock()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn load_state(&self, id: ProfileId) -> Result<VersionedState, StoreError> {
        let inner = self.lock();
        let record = inner.record(id)?;
        Ok(VersionedState {
            state: record.state.clone(),
            version: record.version,
        })
    }

    async fn save_state(
        &self,
        id: ProfileId,
        state: &InterviewState,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let record = inner.record_mut(id)?;
        record.check_version(expected_version)?;
        record.state = state.clone();
        record.version += 1;
        Ok(record.version)
    }

    async fn append_message(
        &self,
        id: ProfileId,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        self.lock().push_message(id, role, content)
    }

    async fn messages(&self, id: ProfileId) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .records
            .get(&id)
            .map(|r| r.messages.clone())
            .unwrap_or_default())
    }

    async fn commit_turn(
        &self,
        id: ProfileId,
        commit: TurnCommit<'_>,
    ) -> Result<StoredMessage, StoreError> {
        let mut inner = self.lock();
        inner.record(id)?.check_version(commit.expected_version)?;

        inner.push_message(id, Role::User, commit.user_message)?;
        let assistant = inner.push_message(id, Role::Assistant, commit.assistant_message)?;
        let record = inner.record_mut(id)?;
        record.state = commit.state.clone();
        record.version += 1;
        Ok(assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract_tests;

    #[tokio::test]
    async fn test_memory_store_contract() {
        contract_tests::run_all(&MemorySessionStore::new()).await;
    }
}
