//! Event reconciliation
//!
//! Applies one GitHub delivery to the stored pull request it refers to, then
//! re-renders the owning tracker. Deliveries for untracked pull requests are
//! dropped silently.
//!
//! Each reconciliation holds the pull request's lock across its
//! read-modify-write and commits its writes in a single transaction, so
//! concurrent deliveries for one PR never lose an approval. The transaction
//! opens with a write so it queues on SQLite's write lock rather than
//! failing when another connection commits first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::{Database, PrStatus, PullRequest, Queries};
use crate::error::RevueError;
use crate::tracking::completion::complete_tracker_if_done;
use crate::tracking::events::{ReviewEvent, StateChangeEvent};
use crate::tracking::locks::PrLocks;
use crate::tracking::publisher::MessagePublisher;
use crate::tracking::snapshot::ReviewState;
use crate::tracking::status::{derive_status, terminal_flags, ReviewSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// Nothing stored was touched and nothing was re-rendered.
    Ignored,
    /// The PR was updated. `tracker_completed` is true when this event
    /// left the tracker completed.
    Applied {
        tracker_id: i64,
        status: PrStatus,
        tracker_completed: bool,
    },
}

pub struct EventReconciler {
    database: Database,
    publisher: Arc<MessagePublisher>,
    locks: PrLocks,
}

impl EventReconciler {
    pub fn new(database: Database, publisher: Arc<MessagePublisher>) -> Self {
        Self {
            database,
            publisher,
            locks: PrLocks::new(),
        }
    }

    async fn find_tracked(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<PullRequest>, RevueError> {
        let pr = Queries::find_pull_request(self.database.pool(), owner, repo, number).await?;
        if pr.is_none() {
            debug!("{}/{}#{} is not tracked, ignoring", owner, repo, number);
        }
        Ok(pr)
    }

    pub async fn reconcile_review_event(
        &self,
        event: &ReviewEvent,
    ) -> Result<ReconcileOutcome, RevueError> {
        if !event.is_submitted() || !event.state.is_actionable() {
            debug!(
                "Ignoring review action {:?} with state {:?}",
                event.action, event.state
            );
            return Ok(ReconcileOutcome::Ignored);
        }

        let Some(found) = self.find_tracked(&event.owner, &event.repo, event.number).await? else {
            return Ok(ReconcileOutcome::Ignored);
        };

        let guard = self.locks.lock(found.id).await;
        let mut tx = self.database.begin().await?;
        if !Queries::claim_pull_request(&mut *tx, found.id).await? {
            return Ok(ReconcileOutcome::Ignored);
        }

        // Re-read under the lock; the row may have changed or been removed.
        let Some(pr) = Queries::get_pull_request(&mut *tx, found.id).await? else {
            return Ok(ReconcileOutcome::Ignored);
        };
        let (merged, closed) = terminal_flags(pr.status);

        let status = match event.state {
            ReviewState::Approved => {
                let approvals = pr.approvals_current + 1;
                Queries::update_pull_request_approvals(&mut *tx, pr.id, approvals).await?;

                let derived = derive_status(
                    &ReviewSnapshot {
                        approval_count: approvals,
                        changes_requested: false,
                        merged,
                        closed,
                        ..Default::default()
                    },
                    pr.approvals_required,
                );
                if derived != PrStatus::Open && derived != pr.status {
                    Queries::update_pull_request_status(&mut *tx, pr.id, derived).await?;
                    derived
                } else {
                    pr.status
                }
            }
            ReviewState::ChangesRequested => {
                Queries::update_pull_request_approvals(&mut *tx, pr.id, 0).await?;

                let derived = derive_status(
                    &ReviewSnapshot {
                        approval_count: 0,
                        changes_requested: true,
                        merged,
                        closed,
                        ..Default::default()
                    },
                    pr.approvals_required,
                );
                if derived != pr.status {
                    Queries::update_pull_request_status(&mut *tx, pr.id, derived).await?;
                }
                derived
            }
            ReviewState::Other(_) => return Ok(ReconcileOutcome::Ignored),
        };

        tx.commit().await?;
        drop(guard);

        info!(
            "Review {:?} on {} -> {}",
            event.state,
            pr.short_ref(),
            status.as_str()
        );

        self.publisher.refresh_logged(pr.tracker_id).await;
        Ok(ReconcileOutcome::Applied {
            tracker_id: pr.tracker_id,
            status,
            tracker_completed: false,
        })
    }

    pub async fn reconcile_state_change_event(
        &self,
        event: &StateChangeEvent,
    ) -> Result<ReconcileOutcome, RevueError> {
        let Some(found) = self.find_tracked(&event.owner, &event.repo, event.number).await? else {
            return Ok(ReconcileOutcome::Ignored);
        };

        let guard = self.locks.lock(found.id).await;
        let mut tx = self.database.begin().await?;
        if !Queries::claim_pull_request(&mut *tx, found.id).await? {
            return Ok(ReconcileOutcome::Ignored);
        }

        let Some(pr) = Queries::get_pull_request(&mut *tx, found.id).await? else {
            return Ok(ReconcileOutcome::Ignored);
        };

        let title = event.title.trim();
        if !title.is_empty() && title != pr.title {
            Queries::update_pull_request_title(&mut *tx, pr.id, title).await?;
        }

        let mut status = pr.status;
        let mut tracker_completed = false;
        if event.is_closed() {
            status = derive_status(
                &ReviewSnapshot {
                    approval_count: pr.approvals_current,
                    merged: event.merged,
                    closed: true,
                    ..Default::default()
                },
                pr.approvals_required,
            );
            Queries::update_pull_request_status(&mut *tx, pr.id, status).await?;
            tracker_completed = complete_tracker_if_done(&mut *tx, pr.tracker_id).await?;
        }

        tx.commit().await?;
        drop(guard);

        info!(
            "{} event on {} -> {}",
            event.action,
            pr.short_ref(),
            status.as_str()
        );

        self.publisher.refresh_logged(pr.tracker_id).await;
        Ok(ReconcileOutcome::Applied {
            tracker_id: pr.tracker_id,
            status,
            tracker_completed,
        })
    }
}
