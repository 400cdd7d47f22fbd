pub mod github;
pub mod signature;
pub mod slack_commands;
pub mod slack_interactions;

use std::sync::Arc;

use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::slack::ChatApi;
use crate::tracking::{EventReconciler, TrackerService};

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<TrackerService>,
    pub reconciler: Arc<EventReconciler>,
    pub chat: Arc<dyn ChatApi>,
}

pub fn router(state: AppState) -> Router {
    let slack = Router::new()
        .route("/slack/commands", post(slack_commands::handle_command))
        .route("/slack/interactions", post(slack_interactions::handle_interaction))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            signature::verify_slack_request,
        ));

    let github = Router::new()
        .route("/github/webhooks", post(github::handle_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            signature::verify_github_request,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(slack)
        .merge(github)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "revue",
        "timestamp": chrono::Utc::now()
    }))
}
