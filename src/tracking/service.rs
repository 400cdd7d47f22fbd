//! Tracker create and edit flows
//!
//! GitHub is queried before any write so a submission's rows land in a single
//! transaction. Enrichment failures degrade to defaults; only storage errors
//! and validation errors abort a flow.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::database::{Database, NewPullRequest, PrStatus, Queries};
use crate::error::RevueError;
use crate::form::{FormField, FormLayout, ParsedPr, TrackSubmission};
use crate::github::HostingApi;
use crate::tracking::completion::complete_tracker_if_done;
use crate::tracking::publisher::MessagePublisher;
use crate::tracking::status::{derive_status, ReviewSnapshot};

const ALREADY_TRACKED: &str = "This pull request is already tracked by another tracker";

/// A submitted PR with everything needed to insert its row.
#[derive(Debug, Clone)]
struct SeededPr {
    pr: ParsedPr,
    approvals_required: u32,
    snapshot: ReviewSnapshot,
}

impl SeededPr {
    fn new_row(&self, tracker_id: i64) -> NewPullRequest {
        NewPullRequest {
            tracker_id,
            github_owner: self.pr.owner.clone(),
            github_repo: self.pr.repo.clone(),
            github_pr_number: self.pr.number,
            github_pr_url: self.pr.url.clone(),
            title: self.snapshot.title.clone(),
            status: derive_status(&self.snapshot, self.approvals_required),
            approvals_required: self.approvals_required,
            approvals_current: self.snapshot.approval_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTracker {
    pub tracker_id: i64,
    /// `None` when the first post failed; the rows are kept regardless.
    pub message_ts: Option<String>,
}

pub struct TrackerService {
    database: Database,
    hosting: Arc<dyn HostingApi>,
    publisher: Arc<MessagePublisher>,
}

impl TrackerService {
    pub fn new(
        database: Database,
        hosting: Arc<dyn HostingApi>,
        publisher: Arc<MessagePublisher>,
    ) -> Self {
        Self {
            database,
            hosting,
            publisher,
        }
    }

    pub async fn create_tracker(
        &self,
        channel_id: &str,
        submission: &TrackSubmission,
    ) -> Result<CreatedTracker, RevueError> {
        for (index, pr) in submission.prs.iter().enumerate() {
            self.ensure_untracked(pr, index, None).await?;
        }

        let seeded = self.seed(submission.prs.iter().cloned().collect()).await;

        let mut tx = self.database.begin().await?;
        let tracker_id = Queries::create_tracker(&mut *tx, channel_id, &submission.title).await?;
        for seed in &seeded {
            insert_seeded(&mut *tx, tracker_id, seed, &submission.reviewers).await?;
        }
        complete_tracker_if_done(&mut *tx, tracker_id).await?;
        tx.commit().await?;

        info!(
            "Created tracker {} in {} with {} PRs",
            tracker_id,
            channel_id,
            seeded.len()
        );

        let message_ts = match self.publisher.announce(tracker_id).await {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!("Failed to post tracker {}: {}", tracker_id, e);
                None
            }
        };

        Ok(CreatedTracker {
            tracker_id,
            message_ts,
        })
    }

    /// Applies an edit: title, added and removed PRs, and a wholesale
    /// reviewer replacement on every PR that remains.
    pub async fn edit_tracker(
        &self,
        tracker_id: i64,
        submission: &TrackSubmission,
    ) -> Result<(), RevueError> {
        let pool = self.database.pool();
        let tracker = Queries::get_tracker(pool, tracker_id)
            .await?
            .ok_or_else(|| RevueError::tracker_not_found(tracker_id))?;
        let existing = Queries::get_pull_requests_by_tracker(pool, tracker_id).await?;

        let existing_keys: HashSet<(String, String, i64)> = existing
            .iter()
            .map(|pr| (pr.github_owner.clone(), pr.github_repo.clone(), pr.github_pr_number))
            .collect();
        let submitted_keys: HashSet<(String, String, i64)> =
            submission.prs.iter().map(ParsedPr::key).collect();

        let mut added = Vec::new();
        for (index, pr) in submission.prs.iter().enumerate() {
            if !existing_keys.contains(&pr.key()) {
                self.ensure_untracked(pr, index, Some(tracker_id)).await?;
                added.push(pr.clone());
            }
        }
        let seeded = self.seed(added).await;

        let mut tx = self.database.begin().await?;
        if !Queries::claim_tracker(&mut *tx, tracker_id).await? {
            return Err(RevueError::tracker_not_found(tracker_id));
        }

        if submission.title != tracker.title {
            Queries::update_tracker_title(&mut *tx, tracker_id, &submission.title).await?;
        }

        for pr in &existing {
            let key = (pr.github_owner.clone(), pr.github_repo.clone(), pr.github_pr_number);
            if !submitted_keys.contains(&key) {
                Queries::delete_pull_request(&mut *tx, pr.id).await?;
            }
        }

        for seed in &seeded {
            Queries::create_pull_request(&mut *tx, &seed.new_row(tracker_id)).await?;
        }

        for pr in Queries::get_pull_requests_by_tracker(&mut *tx, tracker_id).await? {
            Queries::delete_reviewers_by_pr(&mut *tx, pr.id).await?;
            for reviewer in &submission.reviewers {
                Queries::create_reviewer(&mut *tx, pr.id, reviewer).await?;
            }
        }

        complete_tracker_if_done(&mut *tx, tracker_id).await?;
        tx.commit().await?;

        info!(
            "Edited tracker {}: {} PRs submitted, {} added",
            tracker_id,
            submission.prs.len(),
            seeded.len()
        );

        self.publisher.refresh_logged(tracker_id).await;
        Ok(())
    }

    /// The edit modal prefilled from stored state.
    pub async fn edit_form(&self, tracker_id: i64) -> Result<FormLayout, RevueError> {
        let pool = self.database.pool();
        let tracker = Queries::get_tracker(pool, tracker_id)
            .await?
            .ok_or_else(|| RevueError::tracker_not_found(tracker_id))?;
        let urls = Queries::get_pull_requests_by_tracker(pool, tracker_id)
            .await?
            .into_iter()
            .map(|pr| pr.github_pr_url)
            .collect();
        let reviewers = Queries::get_reviewers_by_tracker(pool, tracker_id).await?;

        Ok(FormLayout::new(tracker.title, urls, reviewers))
    }

    /// Rejects a PR that some tracker other than `own_tracker` already has.
    async fn ensure_untracked(
        &self,
        pr: &ParsedPr,
        slot: usize,
        own_tracker: Option<i64>,
    ) -> Result<(), RevueError> {
        let found =
            Queries::find_pull_request(self.database.pool(), &pr.owner, &pr.repo, pr.number).await?;
        match found {
            Some(existing) if Some(existing.tracker_id) != own_tracker => {
                Err(RevueError::validation(FormField::UrlSlot(slot), ALREADY_TRACKED))
            }
            _ => Ok(()),
        }
    }

    /// Fetches required approvals once per repository and a review snapshot
    /// per PR. Failures fall back to one required approval and an empty
    /// snapshot.
    async fn seed(&self, prs: Vec<ParsedPr>) -> Vec<SeededPr> {
        let mut required_by_repo: HashMap<(String, String), u32> = HashMap::new();
        let mut seeded = Vec::with_capacity(prs.len());

        for pr in prs {
            let repo_key = (pr.owner.clone(), pr.repo.clone());
            let approvals_required = match required_by_repo.get(&repo_key) {
                Some(required) => *required,
                None => {
                    let required = match self
                        .hosting
                        .fetch_required_approvals(&pr.owner, &pr.repo)
                        .await
                    {
                        Ok(required) => required.max(1),
                        Err(e) => {
                            warn!(
                                "Failed to fetch required approvals for {}/{}: {} (defaulting to 1)",
                                pr.owner, pr.repo, e
                            );
                            1
                        }
                    };
                    required_by_repo.insert(repo_key, required);
                    required
                }
            };

            let snapshot = match self
                .hosting
                .fetch_review_snapshot(&pr.owner, &pr.repo, pr.number)
                .await
            {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        "Failed to fetch review state for {}/{}#{}: {}",
                        pr.owner, pr.repo, pr.number, e
                    );
                    ReviewSnapshot::default()
                }
            };

            seeded.push(SeededPr {
                pr,
                approvals_required,
                snapshot,
            });
        }

        seeded
    }
}

async fn insert_seeded(
    conn: &mut SqliteConnection,
    tracker_id: i64,
    seed: &SeededPr,
    reviewers: &[String],
) -> Result<i64, RevueError> {
    let row = seed.new_row(tracker_id);
    let pr_id = Queries::create_pull_request(&mut *conn, &row).await?;
    for reviewer in reviewers {
        Queries::create_reviewer(&mut *conn, pr_id, reviewer).await?;
    }

    if row.status != PrStatus::Open {
        info!("Seeded {} as {}", seed.pr.url, row.status.as_str());
    }
    Ok(pr_id)
}
