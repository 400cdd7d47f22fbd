use thiserror::Error;

use crate::form::FormField;

impl From<serde_json::Error> for RevueError {
    fn from(err: serde_json::Error) -> Self {
        Self::WebhookError(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for RevueError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<octocrab::Error> for RevueError {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubError(err.to_string())
    }
}

impl From<reqwest::Error> for RevueError {
    fn from(err: reqwest::Error) -> Self {
        Self::SlackError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum RevueError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("GitHub API error: {0}")]
    GitHubError(String),

    #[error("Slack API error: {0}")]
    SlackError(String),

    #[error("Validation error on {field:?}: {message}")]
    ValidationError { field: FormField, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Webhook processing error: {0}")]
    WebhookError(String),
}

impl RevueError {
    pub fn validation(field: FormField, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }

    pub fn tracker_not_found(tracker_id: i64) -> Self {
        Self::NotFound(format!("tracker {}", tracker_id))
    }
}
