use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub merged: bool,
}

impl PullRequest {
    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub state: String,
    /// `None` for reviews left by deleted accounts.
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchProtection {
    pub required_pull_request_reviews: Option<RequiredReviews>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequiredReviews {
    pub required_approving_review_count: Option<u32>,
}

/// Body of `pull_request` and `pull_request_review` deliveries. Fields not
/// used by either event are left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
    pub review: Option<Review>,
}
