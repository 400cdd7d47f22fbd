//! Slack Web API client
//!
//! Every method is a JSON POST to `{api_url}/{method}` with the bot token.
//! Slack answers 200 even for failures, so `ok` is checked on every call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::RevueError;
use crate::slack::{ChatApi, SlackMessage};

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    http_client: Client,
    api_url: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(bot_token: String, api_url: String) -> Result<Self, RevueError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("revue/0.1")
            .build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    async fn call(&self, method: &str, body: &Value) -> Result<SlackResponse, RevueError> {
        let url = format!("{}/{}", self.api_url, method);
        debug!("Slack call: {}", method);

        let response: SlackResponse = self
            .http_client
            .post(url)
            .bearer_auth(&self.bot_token)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(RevueError::SlackError(format!(
                "{} failed: {}",
                method,
                response.error.as_deref().unwrap_or("unknown_error")
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn post_message(&self, channel: &str, message: &SlackMessage) -> Result<String, RevueError> {
        let response = self
            .call(
                "chat.postMessage",
                &json!({
                    "channel": channel,
                    "text": message.text,
                    "blocks": message.blocks,
                }),
            )
            .await?;

        response
            .ts
            .ok_or_else(|| RevueError::SlackError("chat.postMessage returned no ts".to_string()))
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), RevueError> {
        self.call(
            "chat.update",
            &json!({
                "channel": channel,
                "ts": ts,
                "text": message.text,
                "blocks": message.blocks,
            }),
        )
        .await?;
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), RevueError> {
        self.call(
            "views.open",
            &json!({ "trigger_id": trigger_id, "view": view }),
        )
        .await?;
        Ok(())
    }

    async fn update_view(&self, view_id: &str, view: &Value) -> Result<(), RevueError> {
        self.call(
            "views.update",
            &json!({ "view_id": view_id, "view": view }),
        )
        .await?;
        Ok(())
    }
}
