use sqlx::SqliteConnection;
use tracing::info;

use crate::database::{Queries, TrackerStatus};
use crate::error::RevueError;

/// Marks the tracker completed once none of its pull requests is still open
/// for review. Returns whether the tracker is completed after the check.
///
/// Runs on a connection so it can share the caller's transaction.
pub async fn complete_tracker_if_done(
    conn: &mut SqliteConnection,
    tracker_id: i64,
) -> Result<bool, RevueError> {
    let tracker = Queries::get_tracker(&mut *conn, tracker_id)
        .await?
        .ok_or_else(|| RevueError::tracker_not_found(tracker_id))?;

    if tracker.status == TrackerStatus::Completed {
        return Ok(true);
    }

    let remaining = Queries::count_open_pull_requests(&mut *conn, tracker_id).await?;
    if remaining > 0 {
        return Ok(false);
    }

    Queries::update_tracker_status(&mut *conn, tracker_id, TrackerStatus::Completed).await?;
    info!("Tracker {} completed", tracker_id);
    Ok(true)
}
