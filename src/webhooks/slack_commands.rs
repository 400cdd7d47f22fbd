use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde_json::json;
use tracing::{error, info};

use crate::form::FormLayout;
use crate::slack::blocks::{modal_view, ModalKind};
use crate::slack::types::SlashCommand;
use crate::webhooks::AppState;

const USAGE: &str = "Usage: `/revue track` opens a form to start tracking pull requests.";

pub async fn handle_command(
    State(state): State<AppState>,
    Form(command): Form<SlashCommand>,
) -> Response {
    info!(
        "Received command {} {:?} from {} in {}",
        command.command, command.text, command.user_id, command.channel_id
    );

    if command.text.trim() != "track" {
        return Json(json!({ "response_type": "ephemeral", "text": USAGE })).into_response();
    }

    // The channel rides along so the submission knows where to post.
    let view = modal_view(ModalKind::Track, &FormLayout::empty(), &command.channel_id);
    match state.chat.open_view(&command.trigger_id, &view).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Failed to open track modal: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to open modal").into_response()
        }
    }
}
