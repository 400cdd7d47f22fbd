use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

use crate::error::RevueError;
use crate::github::types::{BranchProtection, PullRequest, Repository, Review};
use crate::github::HostingApi;
use crate::tracking::snapshot::{reduce_reviews, ReviewRecord, ReviewState};
use crate::tracking::status::ReviewSnapshot;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str) -> Result<Self, RevueError> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_url)
            .map_err(|e| RevueError::ConfigError(format!("Invalid GitHub API URL {}: {}", api_url, e)))?
            .build()
            .map_err(|e| RevueError::GitHubError(format!("Failed to create GitHub client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<PullRequest, RevueError> {
        let route = format!("/repos/{}/{}/pulls/{}", owner, repo, number);
        Ok(self.client.get(route, None::<&()>).await?)
    }

    /// First page of reviews, oldest first.
    pub async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<Vec<Review>, RevueError> {
        let route = format!("/repos/{}/{}/pulls/{}/reviews", owner, repo, number);
        Ok(self.client.get(route, Some(&[("per_page", "100")])).await?)
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, RevueError> {
        let route = format!("/repos/{}/{}", owner, repo);
        Ok(self.client.get(route, None::<&()>).await?)
    }

    /// `None` when the branch has no protection rule.
    pub async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<BranchProtection>, RevueError> {
        let route = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        match self.client.get(route, None::<&()>).await {
            Ok(protection) => Ok(Some(protection)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn fetch_required_approvals(&self, owner: &str, repo: &str) -> Result<u32, RevueError> {
        let repository = self.get_repository(owner, repo).await?;
        let branch = match repository.default_branch {
            Some(branch) if !branch.is_empty() => branch,
            _ => return Ok(1),
        };

        let required = self
            .get_branch_protection(owner, repo, &branch)
            .await?
            .and_then(|protection| protection.required_pull_request_reviews)
            .and_then(|reviews| reviews.required_approving_review_count)
            .unwrap_or(0);

        debug!(
            "{}/{}@{} requires {} approvals",
            owner, repo, branch, required
        );
        Ok(required.max(1))
    }

    async fn fetch_review_snapshot(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<ReviewSnapshot, RevueError> {
        let pr = self.get_pull_request(owner, repo, number).await?;
        let reviews = self.list_reviews(owner, repo, number).await?;

        let records: Vec<ReviewRecord> = reviews
            .into_iter()
            .filter_map(|review| {
                review.user.map(|user| ReviewRecord {
                    reviewer: user.login,
                    state: ReviewState::parse(&review.state),
                })
            })
            .collect();
        let tally = reduce_reviews(&records);

        Ok(ReviewSnapshot {
            closed: pr.is_closed(),
            title: pr.title,
            approval_count: tally.approvals,
            changes_requested: tally.changes_requested,
            merged: pr.merged,
        })
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => source.status_code.as_u16() == 404,
        _ => false,
    }
}
