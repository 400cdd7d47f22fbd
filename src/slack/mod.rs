pub mod blocks;
pub mod client;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RevueError;

pub use blocks::SlackMessage;
pub use client::SlackClient;

/// Write access to the chat workspace.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Posts a message and returns its timestamp, the id later updates use.
    async fn post_message(&self, channel: &str, message: &SlackMessage) -> Result<String, RevueError>;

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), RevueError>;

    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), RevueError>;

    async fn update_view(&self, view_id: &str, view: &Value) -> Result<(), RevueError>;
}
