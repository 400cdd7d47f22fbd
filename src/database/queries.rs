use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::database::models::*;

/// Point queries and updates over any SQLite executor: the pool for
/// stand-alone statements, or `&mut *tx` inside a transaction.
pub struct Queries;

const PULL_REQUEST_COLUMNS: &str = "id, tracker_id, github_owner, github_repo, github_pr_number, \
     github_pr_url, title, status, approvals_required, approvals_current";

impl Queries {
    pub async fn create_tracker<'e, E: SqliteExecutor<'e>>(
        executor: E,
        channel_id: &str,
        title: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO trackers (slack_channel_id, slack_message_ts, title)
            VALUES (?, '', ?)
            "#,
        )
        .bind(channel_id)
        .bind(title)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_tracker<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
    ) -> Result<Option<Tracker>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, slack_channel_id, slack_message_ts, status, title, created_at
            FROM trackers
            WHERE id = ?
            "#,
        )
        .bind(tracker_id)
        .fetch_optional(executor)
        .await?;

        row.map(|row| map_tracker_row(&row)).transpose()
    }

    pub async fn update_tracker_message_ts<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
        message_ts: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE trackers SET slack_message_ts = ? WHERE id = ?")
            .bind(message_ts)
            .bind(tracker_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_tracker_title<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
        title: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE trackers SET title = ? WHERE id = ?")
            .bind(title)
            .bind(tracker_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_tracker_status<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
        status: TrackerStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE trackers SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(tracker_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Pull requests under a tracker that are neither merged nor closed.
    pub async fn count_open_pull_requests<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS remaining
            FROM pull_requests
            WHERE tracker_id = ? AND status NOT IN ('merged', 'closed')
            "#,
        )
        .bind(tracker_id)
        .fetch_one(executor)
        .await?;

        row.try_get::<i64, _>("remaining")
    }

    pub async fn create_pull_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr: &NewPullRequest,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO pull_requests
            (tracker_id, github_owner, github_repo, github_pr_number, github_pr_url,
             title, status, approvals_required, approvals_current)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(pr.tracker_id)
        .bind(&pr.github_owner)
        .bind(&pr.github_repo)
        .bind(pr.github_pr_number)
        .bind(&pr.github_pr_url)
        .bind(&pr.title)
        .bind(pr.status.as_str())
        .bind(pr.approvals_required)
        .bind(pr.approvals_current)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Looks up a tracked PR by its GitHub identity. `None` means the PR is
    /// not tracked by anyone.
    pub async fn find_pull_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        owner: &str,
        repo: &str,
        pr_number: i64,
    ) -> Result<Option<PullRequest>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM pull_requests \
             WHERE github_owner = ? AND github_repo = ? AND github_pr_number = ?",
            PULL_REQUEST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(repo)
            .bind(pr_number)
            .fetch_optional(executor)
            .await?;

        row.map(|row| map_pull_request_row(&row)).transpose()
    }

    pub async fn get_pull_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
    ) -> Result<Option<PullRequest>, sqlx::Error> {
        let sql = format!("SELECT {} FROM pull_requests WHERE id = ?", PULL_REQUEST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(pr_id)
            .fetch_optional(executor)
            .await?;

        row.map(|row| map_pull_request_row(&row)).transpose()
    }

    /// No-op write on the PR row. Run first in a transaction so SQLite takes
    /// the write lock before any read; a read-first transaction that later
    /// writes fails with SQLITE_BUSY_SNAPSHOT instead of waiting.
    /// Returns false when the row no longer exists.
    pub async fn claim_pull_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE pull_requests SET approvals_current = approvals_current WHERE id = ?")
                .bind(pr_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Tracker counterpart of [`Queries::claim_pull_request`].
    pub async fn claim_tracker<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE trackers SET status = status WHERE id = ?")
            .bind(tracker_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_pull_requests_by_tracker<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
    ) -> Result<Vec<PullRequest>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM pull_requests WHERE tracker_id = ? ORDER BY id",
            PULL_REQUEST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tracker_id)
            .fetch_all(executor)
            .await?;

        rows.iter().map(map_pull_request_row).collect()
    }

    pub async fn update_pull_request_approvals<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
        approvals_current: u32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pull_requests SET approvals_current = ? WHERE id = ?")
            .bind(approvals_current)
            .bind(pr_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_pull_request_status<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
        status: PrStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pull_requests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(pr_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_pull_request_title<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
        title: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pull_requests SET title = ? WHERE id = ?")
            .bind(title)
            .bind(pr_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Deletes a pull request; its reviewer rows go with it.
    pub async fn delete_pull_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pr_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM pull_requests WHERE id = ?")
            .bind(pr_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create_reviewer<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pull_request_id: i64,
        slack_user_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO reviewers (pull_request_id, slack_user_id) VALUES (?, ?)")
                .bind(pull_request_id)
                .bind(slack_user_id)
                .execute(executor)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_reviewers_by_pr<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pull_request_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT slack_user_id FROM reviewers WHERE pull_request_id = ? ORDER BY id",
        )
        .bind(pull_request_id)
        .fetch_all(executor)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("slack_user_id"))
            .collect()
    }

    /// Reviewer user ids across every pull request of a tracker, deduplicated.
    pub async fn get_reviewers_by_tracker<'e, E: SqliteExecutor<'e>>(
        executor: E,
        tracker_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT r.slack_user_id
            FROM reviewers r
            JOIN pull_requests p ON p.id = r.pull_request_id
            WHERE p.tracker_id = ?
            ORDER BY r.slack_user_id
            "#,
        )
        .bind(tracker_id)
        .fetch_all(executor)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("slack_user_id"))
            .collect()
    }

    pub async fn delete_reviewers_by_pr<'e, E: SqliteExecutor<'e>>(
        executor: E,
        pull_request_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM reviewers WHERE pull_request_id = ?")
            .bind(pull_request_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

fn map_tracker_row(row: &SqliteRow) -> Result<Tracker, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = TrackerStatus::from_str(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("Invalid tracker status: {}", status).into()))?;

    Ok(Tracker {
        id: row.try_get("id")?,
        slack_channel_id: row.try_get("slack_channel_id")?,
        slack_message_ts: row.try_get("slack_message_ts")?,
        status,
        title: row.try_get("title")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_pull_request_row(row: &SqliteRow) -> Result<PullRequest, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = PrStatus::from_str(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("Invalid PR status: {}", status).into()))?;

    Ok(PullRequest {
        id: row.try_get("id")?,
        tracker_id: row.try_get("tracker_id")?,
        github_owner: row.try_get("github_owner")?,
        github_repo: row.try_get("github_repo")?,
        github_pr_number: row.try_get("github_pr_number")?,
        github_pr_url: row.try_get("github_pr_url")?,
        title: row.try_get("title")?,
        status,
        approvals_required: row.try_get("approvals_required")?,
        approvals_current: row.try_get("approvals_current")?,
    })
}
