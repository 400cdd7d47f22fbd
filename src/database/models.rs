use serde::{Deserialize, Serialize};

/// Lifecycle of a tracker. Trackers are never deleted, only completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    Active,
    Completed,
}

impl TrackerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerStatus::Active => "active",
            TrackerStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TrackerStatus::Active),
            "completed" => Some(TrackerStatus::Completed),
            _ => None,
        }
    }
}

/// Canonical review status of a tracked pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrStatus {
    Open,
    Approved,
    ChangesRequested,
    Merged,
    Closed,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "open",
            PrStatus::Approved => "approved",
            PrStatus::ChangesRequested => "changes_requested",
            PrStatus::Merged => "merged",
            PrStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(PrStatus::Open),
            "approved" => Some(PrStatus::Approved),
            "changes_requested" => Some(PrStatus::ChangesRequested),
            "merged" => Some(PrStatus::Merged),
            "closed" => Some(PrStatus::Closed),
            _ => None,
        }
    }

    /// Merged and closed PRs never transition again on their own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PrStatus::Merged | PrStatus::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: i64,
    pub slack_channel_id: String,
    /// Empty until the first Slack post succeeds.
    pub slack_message_ts: String,
    pub status: TrackerStatus,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: i64,
    pub tracker_id: i64,
    pub github_owner: String,
    pub github_repo: String,
    pub github_pr_number: i64,
    pub github_pr_url: String,
    pub title: String,
    pub status: PrStatus,
    pub approvals_required: u32,
    pub approvals_current: u32,
}

impl PullRequest {
    /// `owner/repo#number`, used when no title has been synced yet.
    pub fn short_ref(&self) -> String {
        format!(
            "{}/{}#{}",
            self.github_owner, self.github_repo, self.github_pr_number
        )
    }
}

/// Insert payload for a pull request row.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub tracker_id: i64,
    pub github_owner: String,
    pub github_repo: String,
    pub github_pr_number: i64,
    pub github_pr_url: String,
    pub title: String,
    pub status: PrStatus,
    pub approvals_required: u32,
    pub approvals_current: u32,
}
