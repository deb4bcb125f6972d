//! Job correlation - one id per request, used to name every artifact

pub mod artifacts;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::ErrorKind;

pub use artifacts::{ArtifactPaths, ArtifactRole, ArtifactStore};

/// Opaque 128-bit random token rendered as 32 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Issue a fresh id. No registry; uniqueness comes from UUID v4 randomness.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "kind")]
pub enum JobState {
    Received,
    Decoded,
    Normalized,
    Admitted,
    Invoked,
    Encoded,
    Failed(ErrorKind),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Encoded | JobState::Failed(_))
    }
}

/// A single request's identity, progress, and artifact locations
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub artifacts: ArtifactPaths,
}

impl Job {
    pub fn new(store: &ArtifactStore) -> Self {
        let id = JobId::new();
        let artifacts = store.paths_for(&id);
        Self {
            id,
            state: JobState::Received,
            created_at: Utc::now(),
            artifacts,
        }
    }

    /// Move to `next`. Terminal states are sticky.
    pub fn advance(&mut self, next: JobState) {
        if !self.state.is_terminal() {
            self.state = next;
        }
    }
}
