use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::RevueError;
use crate::form::FormAction;
use crate::slack::blocks::{
    modal_view, validation_errors, ModalKind, ADD_URL_ACTION, EDIT_TRACKER_ACTION,
    REMOVE_URL_ACTION,
};
use crate::slack::types::{BlockAction, InteractionPayload, View};
use crate::webhooks::AppState;

#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    pub payload: String,
}

pub async fn handle_interaction(
    State(state): State<AppState>,
    Form(form): Form<InteractionForm>,
) -> Response {
    let payload: InteractionPayload = match serde_json::from_str(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to parse interaction payload: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload.kind.as_str() {
        "block_actions" => {
            if let Some(action) = payload.actions.first() {
                handle_block_action(&state, &payload, action).await;
            }
            StatusCode::OK.into_response()
        }
        "view_submission" => match &payload.view {
            Some(view) => handle_view_submission(&state, view).await,
            None => StatusCode::BAD_REQUEST.into_response(),
        },
        other => {
            debug!("Unhandled interaction type: {}", other);
            StatusCode::OK.into_response()
        }
    }
}

async fn handle_block_action(state: &AppState, payload: &InteractionPayload, action: &BlockAction) {
    match action.action_id.as_str() {
        ADD_URL_ACTION | REMOVE_URL_ACTION => {
            let Some(view) = &payload.view else {
                return;
            };
            let form_action = if action.action_id == ADD_URL_ACTION {
                FormAction::AddSlot
            } else {
                FormAction::RemoveSlot
            };
            let kind = ModalKind::from_callback_id(&view.callback_id).unwrap_or(ModalKind::Track);

            let layout = view.state.form_layout().apply(form_action);
            let next = modal_view(kind, &layout, &view.private_metadata);
            if let Err(e) = state.chat.update_view(&view.id, &next).await {
                warn!("Failed to update view {}: {}", view.id, e);
            }
        }
        EDIT_TRACKER_ACTION => {
            let Some(tracker_id) = action.value.as_deref().and_then(|v| v.parse::<i64>().ok())
            else {
                warn!("Invalid tracker id on edit button: {:?}", action.value);
                return;
            };
            let Some(trigger_id) = payload.trigger_id.as_deref() else {
                warn!("Edit button press without trigger_id");
                return;
            };

            let layout = match state.service.edit_form(tracker_id).await {
                Ok(layout) => layout,
                Err(e) => {
                    warn!("Failed to load tracker {} for editing: {}", tracker_id, e);
                    return;
                }
            };
            let view = modal_view(ModalKind::Edit, &layout, &tracker_id.to_string());
            if let Err(e) = state.chat.open_view(trigger_id, &view).await {
                warn!("Failed to open edit modal for tracker {}: {}", tracker_id, e);
            }
        }
        other => debug!("Ignoring block action {}", other),
    }
}

async fn handle_view_submission(state: &AppState, view: &View) -> Response {
    let Some(kind) = ModalKind::from_callback_id(&view.callback_id) else {
        debug!("Unhandled view submission callback: {}", view.callback_id);
        return StatusCode::OK.into_response();
    };

    let submission = match view.state.form_layout().submission(&state.config.github_host) {
        Ok(submission) => submission,
        Err(e) => return error_response(e),
    };

    let result = match kind {
        ModalKind::Track => state
            .service
            .create_tracker(&view.private_metadata, &submission)
            .await
            .map(|created| {
                info!("Tracker {} created from modal", created.tracker_id);
            }),
        ModalKind::Edit => match view.private_metadata.parse::<i64>() {
            Ok(tracker_id) => state.service.edit_tracker(tracker_id, &submission).await,
            Err(_) => {
                warn!("Invalid tracker id in edit submission: {:?}", view.private_metadata);
                return StatusCode::BAD_REQUEST.into_response();
            }
        },
    };

    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: RevueError) -> Response {
    match err {
        RevueError::ValidationError { field, message } => {
            Json(validation_errors(field, &message)).into_response()
        }
        RevueError::NotFound(what) => {
            debug!("Submission for missing {}", what);
            StatusCode::OK.into_response()
        }
        other => {
            error!("Failed to process submission: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
