//! Request and response bodies

use chrono::{DateTime, Utc};
use lattia_application::{Profile, ProfileHistory, ProfileId, StoredMessage, VersionedState};
use lattia_domain::{InterviewState, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusRequest {
    pub is_done: bool,
}

/// Field key to new value.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthUpdateRequest {
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: ProfileId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMessage> for MessageResponse {
    fn from(m: StoredMessage) -> Self {
        Self {
            id: m.id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub profile: ProfileResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<ProfileHistory> for HistoryResponse {
    fn from(h: ProfileHistory) -> Self {
        Self {
            profile: h.profile.into(),
            messages: h.messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Full interview state with its progress report.
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub version: u64,
    pub is_done: bool,
    pub progress: String,
    pub state: InterviewState,
}

impl From<VersionedState> for StateResponse {
    fn from(v: VersionedState) -> Self {
        Self {
            version: v.version,
            is_done: v.state.is_done(),
            progress: v.state.stats().summary(),
            state: v.state,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusResponse {
    pub is_done: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthzResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
