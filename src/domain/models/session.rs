/// Domain model for one participant's run through a sequence of pairs.
///
/// A session moves `NotStarted -> InProgress -> Finished` and can be restarted
/// from any state with a freshly selected sequence.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pair::ImagePair;
use crate::domain::errors::{DomainError, DomainResult};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// Pairs selected, nothing shown yet
    NotStarted,
    /// At least one pair shown; `answered` judgments submitted so far
    InProgress { answered: usize },
    /// Every pair in the sequence was answered
    Finished,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress { .. } => "in_progress",
            Self::Finished => "finished",
        }
    }
}

/// A participant session over a fixed pair sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier
    pub id: Uuid,

    /// Ordered pairs to show
    pub pairs: Vec<ImagePair>,

    /// Requested sequence length; the effective length may be shorter
    pub target: usize,

    /// Judgments submitted in this run
    pub answered: usize,

    /// Current lifecycle state
    pub state: SessionState,

    /// Session creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(pairs: Vec<ImagePair>, target: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pairs,
            target,
            answered: 0,
            state: SessionState::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of judgments after which the session finishes.
    pub fn length(&self) -> usize {
        self.target.min(self.pairs.len())
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Pair awaiting a judgment, if any.
    pub fn current_pair(&self) -> Option<&ImagePair> {
        if self.is_finished() {
            None
        } else {
            self.pairs.get(self.answered)
        }
    }

    /// Move from `NotStarted` to `InProgress`. No-op once started.
    pub fn start(&mut self) {
        if self.state == SessionState::NotStarted {
            self.state = if self.length() == 0 {
                SessionState::Finished
            } else {
                SessionState::InProgress { answered: 0 }
            };
            self.updated_at = Utc::now();
        }
    }

    /// Count one submitted judgment.
    pub fn advance(&mut self) -> DomainResult<SessionState> {
        if self.is_finished() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: "in_progress".to_string(),
            });
        }
        self.start();
        if self.is_finished() {
            return Ok(self.state);
        }

        self.answered += 1;
        self.state = if self.answered >= self.length() {
            SessionState::Finished
        } else {
            SessionState::InProgress {
                answered: self.answered,
            }
        };
        self.updated_at = Utc::now();
        Ok(self.state)
    }

    /// Discard progress and begin again on a new sequence.
    pub fn restart(&mut self, pairs: Vec<ImagePair>) {
        self.pairs = pairs;
        self.answered = 0;
        self.state = SessionState::NotStarted;
        self.updated_at = Utc::now();
    }
}
