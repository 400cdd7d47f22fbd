use crate::error::RevueError;
use crate::github::types::WebhookPayload;
use crate::tracking::events::{ReviewEvent, StateChangeEvent};
use crate::tracking::snapshot::ReviewState;

pub struct WebhookProcessor;

impl WebhookProcessor {
    /// Decodes a delivery given its `X-GitHub-Event` name.
    pub fn process_webhook(event_name: &str, body: &[u8]) -> Result<WebhookEvent, RevueError> {
        match event_name {
            "pull_request_review" => {
                let payload: WebhookPayload = serde_json::from_slice(body)?;
                let (owner, repo, number) = pull_request_identity(&payload)?;
                let state = payload
                    .review
                    .as_ref()
                    .map(|review| ReviewState::parse(&review.state))
                    .ok_or_else(|| RevueError::WebhookError("Missing review".to_string()))?;

                Ok(WebhookEvent::Review(ReviewEvent {
                    owner,
                    repo,
                    number,
                    action: payload.action.unwrap_or_default(),
                    state,
                }))
            }
            "pull_request" => {
                let payload: WebhookPayload = serde_json::from_slice(body)?;
                let (owner, repo, number) = pull_request_identity(&payload)?;
                let (merged, title) = payload
                    .pull_request
                    .as_ref()
                    .map(|pr| (pr.merged, pr.title.clone()))
                    .unwrap_or_default();

                Ok(WebhookEvent::StateChange(StateChangeEvent {
                    owner,
                    repo,
                    number,
                    action: payload.action.unwrap_or_default(),
                    merged,
                    title,
                }))
            }
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unknown(other.to_string())),
        }
    }
}

fn pull_request_identity(payload: &WebhookPayload) -> Result<(String, String, i64), RevueError> {
    let repository = payload
        .repository
        .as_ref()
        .ok_or_else(|| RevueError::WebhookError("Missing repository".to_string()))?;
    let pull_request = payload
        .pull_request
        .as_ref()
        .ok_or_else(|| RevueError::WebhookError("Missing pull_request".to_string()))?;

    let number = i64::try_from(pull_request.number)
        .map_err(|_| RevueError::WebhookError(format!("PR number out of range: {}", pull_request.number)))?;

    Ok((
        repository.owner.login.clone(),
        repository.name.clone(),
        number,
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Review(ReviewEvent),
    StateChange(StateChangeEvent),
    Ping,
    Unknown(String),
}
