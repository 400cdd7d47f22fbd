pub mod client;
pub mod types;
pub mod webhooks;

use async_trait::async_trait;

use crate::error::RevueError;
use crate::tracking::status::ReviewSnapshot;

pub use client::GitHubClient;
pub use webhooks::{WebhookEvent, WebhookProcessor};

/// Read access to the code-hosting platform.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Approving reviews the base branch demands before merge. Returns 1 when
    /// the branch is unprotected or does not require reviews.
    async fn fetch_required_approvals(&self, owner: &str, repo: &str) -> Result<u32, RevueError>;

    /// Current title, merge state and reduced review state of one PR.
    async fn fetch_review_snapshot(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<ReviewSnapshot, RevueError>;
}
