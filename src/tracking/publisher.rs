use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::database::{Database, Queries, Tracker};
use crate::error::RevueError;
use crate::slack::blocks::tracker_message;
use crate::slack::ChatApi;
use crate::tracking::render::render_tracker;

/// Renders trackers from persisted rows and pushes them to the chat.
pub struct MessagePublisher {
    database: Database,
    chat: Arc<dyn ChatApi>,
}

impl MessagePublisher {
    pub fn new(database: Database, chat: Arc<dyn ChatApi>) -> Self {
        Self { database, chat }
    }

    async fn load(&self, tracker_id: i64) -> Result<(Tracker, String), RevueError> {
        let pool = self.database.pool();
        let tracker = Queries::get_tracker(pool, tracker_id)
            .await?
            .ok_or_else(|| RevueError::tracker_not_found(tracker_id))?;
        let pull_requests = Queries::get_pull_requests_by_tracker(pool, tracker_id).await?;
        let reviewers: BTreeSet<String> = Queries::get_reviewers_by_tracker(pool, tracker_id)
            .await?
            .into_iter()
            .collect();

        let text = render_tracker(&tracker, &pull_requests, &reviewers);
        Ok((tracker, text))
    }

    /// Current mrkdwn text of a tracker.
    pub async fn render_tracker_view(&self, tracker_id: i64) -> Result<String, RevueError> {
        let (_, text) = self.load(tracker_id).await?;
        Ok(text)
    }

    /// First post of a tracker. Stores the returned message timestamp.
    pub async fn announce(&self, tracker_id: i64) -> Result<String, RevueError> {
        let (tracker, text) = self.load(tracker_id).await?;
        let message = tracker_message(tracker_id, &text);

        let ts = self
            .chat
            .post_message(&tracker.slack_channel_id, &message)
            .await?;
        Queries::update_tracker_message_ts(self.database.pool(), tracker_id, &ts).await?;

        debug!("Posted tracker {} as {}", tracker_id, ts);
        Ok(ts)
    }

    /// Rewrites the tracker message in place. A tracker whose first post
    /// never went out has nothing to update.
    pub async fn refresh(&self, tracker_id: i64) -> Result<(), RevueError> {
        let (tracker, text) = self.load(tracker_id).await?;
        if tracker.slack_message_ts.is_empty() {
            debug!("Tracker {} has no message yet, skipping refresh", tracker_id);
            return Ok(());
        }

        let message = tracker_message(tracker_id, &text);
        self.chat
            .update_message(&tracker.slack_channel_id, &tracker.slack_message_ts, &message)
            .await
    }

    /// `refresh` for callers whose own work is already committed.
    pub async fn refresh_logged(&self, tracker_id: i64) {
        if let Err(e) = self.refresh(tracker_id).await {
            warn!("Failed to refresh tracker {} message: {}", tracker_id, e);
        }
    }
}
