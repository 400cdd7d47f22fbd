use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::RevueError;
use crate::github::{WebhookEvent, WebhookProcessor};
use crate::tracking::ReconcileOutcome;
use crate::webhooks::AppState;

pub const GITHUB_EVENT_HEADER: &str = "x-github-event";

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let event_name = headers
        .get(GITHUB_EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let event = WebhookProcessor::process_webhook(event_name, &body).map_err(|e| {
        warn!("Failed to parse {} webhook: {}", event_name, e);
        StatusCode::BAD_REQUEST
    })?;

    let outcome = match event {
        WebhookEvent::Review(event) => {
            info!(
                "Received review {:?} for {}/{}#{}",
                event.state, event.owner, event.repo, event.number
            );
            state.reconciler.reconcile_review_event(&event).await
        }
        WebhookEvent::StateChange(event) => {
            info!(
                "Received pull_request {} for {}/{}#{}",
                event.action, event.owner, event.repo, event.number
            );
            state.reconciler.reconcile_state_change_event(&event).await
        }
        WebhookEvent::Ping => return Ok(Json(json!({ "status": "pong" }))),
        WebhookEvent::Unknown(name) => {
            debug!("Ignoring GitHub event type: {}", name);
            return Ok(Json(json!({ "status": "ignored" })));
        }
    };

    match outcome {
        Ok(ReconcileOutcome::Ignored) => Ok(Json(json!({ "status": "ignored" }))),
        Ok(ReconcileOutcome::Applied {
            tracker_id,
            status,
            tracker_completed,
        }) => Ok(Json(json!({
            "status": "applied",
            "tracker_id": tracker_id,
            "pr_status": status.as_str(),
            "tracker_completed": tracker_completed,
        }))),
        Err(RevueError::NotFound(what)) => {
            debug!("Reconciliation target vanished: {}", what);
            Ok(Json(json!({ "status": "ignored" })))
        }
        Err(e) => {
            error!("Failed to reconcile {} event: {}", event_name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
