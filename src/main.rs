use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revue::config::AppConfig;
use revue::database::Database;
use revue::github::{GitHubClient, HostingApi};
use revue::slack::{ChatApi, SlackClient};
use revue::tracking::{EventReconciler, MessagePublisher, TrackerService};
use revue::webhooks::{self, AppState};

#[derive(Parser)]
#[command(name = "revue")]
#[command(about = "Tracks GitHub pull request reviews in a Slack message")]
struct Cli {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long, env = "REVUE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revue=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting revue");

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!("Configuration loaded");

    let database = Database::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    database
        .run_migrations()
        .await
        .context("Failed to apply database schema")?;
    info!("Database ready");

    let hosting: Arc<dyn HostingApi> = Arc::new(
        GitHubClient::new(&config.github_token, &config.github_api_url)
            .context("Failed to create GitHub client")?,
    );
    let chat: Arc<dyn ChatApi> = Arc::new(
        SlackClient::new(config.slack_bot_token.clone(), config.slack_api_url.clone())
            .context("Failed to create Slack client")?,
    );

    let publisher = Arc::new(MessagePublisher::new(database.clone(), chat.clone()));
    let service = Arc::new(TrackerService::new(
        database.clone(),
        hosting,
        publisher.clone(),
    ));
    let reconciler = Arc::new(EventReconciler::new(database, publisher));

    let addr = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        service,
        reconciler,
        chat,
    };
    let app = webhooks::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
