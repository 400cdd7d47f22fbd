use serde::{Deserialize, Serialize};

use crate::tracking::snapshot::ReviewState;

/// A review submitted (or edited, dismissed) on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub owner: String,
    pub repo: String,
    pub number: i64,
    pub action: String,
    pub state: ReviewState,
}

impl ReviewEvent {
    pub fn is_submitted(&self) -> bool {
        self.action == "submitted"
    }
}

/// Any `pull_request` delivery: close, reopen, edit, synchronize and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub owner: String,
    pub repo: String,
    pub number: i64,
    pub action: String,
    pub merged: bool,
    pub title: String,
}

impl StateChangeEvent {
    pub fn is_closed(&self) -> bool {
        self.action == "closed"
    }
}
