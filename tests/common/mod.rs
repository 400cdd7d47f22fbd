#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use revue::config::AppConfig;
use revue::database::{Database, NewPullRequest, PrStatus, Queries};
use revue::error::RevueError;
use revue::github::HostingApi;
use revue::slack::{ChatApi, SlackMessage};
use revue::tracking::{EventReconciler, MessagePublisher, ReviewSnapshot, TrackerService};
use revue::webhooks::AppState;

pub const SLACK_SIGNING_SECRET: &str = "test-slack-secret";
pub const GITHUB_WEBHOOK_SECRET: &str = "test-github-secret";

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory()
        .await
        .expect("Failed to create test database")
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        slack_bot_token: "xoxb-test".to_string(),
        slack_signing_secret: SLACK_SIGNING_SECRET.to_string(),
        github_token: "ghp_test".to_string(),
        github_webhook_secret: GITHUB_WEBHOOK_SECRET.to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        github_api_url: "https://api.github.com".to_string(),
        slack_api_url: "https://slack.com/api".to_string(),
        github_host: "github.com".to_string(),
    }
}

/// Hosting API double with canned answers. Unknown repositories require one
/// approval; unknown pull requests fail the snapshot fetch.
#[derive(Default)]
pub struct FakeHosting {
    required: Mutex<HashMap<(String, String), Result<u32, String>>>,
    snapshots: Mutex<HashMap<(String, String, i64), ReviewSnapshot>>,
    pub required_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required(self, owner: &str, repo: &str, required: u32) -> Self {
        self.required
            .lock()
            .unwrap()
            .insert((owner.to_string(), repo.to_string()), Ok(required));
        self
    }

    pub fn with_required_failure(self, owner: &str, repo: &str) -> Self {
        self.required.lock().unwrap().insert(
            (owner.to_string(), repo.to_string()),
            Err("503 Service Unavailable".to_string()),
        );
        self
    }

    pub fn with_snapshot(self, owner: &str, repo: &str, number: i64, snapshot: ReviewSnapshot) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .insert((owner.to_string(), repo.to_string(), number), snapshot);
        self
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn fetch_required_approvals(&self, owner: &str, repo: &str) -> Result<u32, RevueError> {
        self.required_calls.fetch_add(1, Ordering::SeqCst);
        match self
            .required
            .lock()
            .unwrap()
            .get(&(owner.to_string(), repo.to_string()))
        {
            Some(Ok(required)) => Ok(*required),
            Some(Err(message)) => Err(RevueError::GitHubError(message.clone())),
            None => Ok(1),
        }
    }

    async fn fetch_review_snapshot(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<ReviewSnapshot, RevueError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .get(&(owner.to_string(), repo.to_string(), number))
            .cloned()
            .ok_or_else(|| RevueError::GitHubError(format!("404 {}/{}#{}", owner, repo, number)))
    }
}

#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
    pub message: SlackMessage,
}

/// Chat API double that records every call.
#[derive(Default)]
pub struct RecordingChat {
    pub posts: Mutex<Vec<PostedMessage>>,
    pub updates: Mutex<Vec<PostedMessage>>,
    pub opened_views: Mutex<Vec<(String, Value)>>,
    pub updated_views: Mutex<Vec<(String, Value)>>,
    pub fail_posts: bool,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_posts: true,
            ..Self::default()
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last_update(&self) -> Option<PostedMessage> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn post_message(&self, channel: &str, message: &SlackMessage) -> Result<String, RevueError> {
        if self.fail_posts {
            return Err(RevueError::SlackError("channel_not_found".to_string()));
        }
        let mut posts = self.posts.lock().unwrap();
        let ts = format!("1700000000.{:06}", posts.len() + 1);
        posts.push(PostedMessage {
            channel: channel.to_string(),
            ts: ts.clone(),
            message: message.clone(),
        });
        Ok(ts)
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), RevueError> {
        self.updates.lock().unwrap().push(PostedMessage {
            channel: channel.to_string(),
            ts: ts.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), RevueError> {
        self.opened_views
            .lock()
            .unwrap()
            .push((trigger_id.to_string(), view.clone()));
        Ok(())
    }

    async fn update_view(&self, view_id: &str, view: &Value) -> Result<(), RevueError> {
        self.updated_views
            .lock()
            .unwrap()
            .push((view_id.to_string(), view.clone()));
        Ok(())
    }
}

/// Everything a test needs wired over one database.
pub struct TestApp {
    pub database: Database,
    pub hosting: Arc<FakeHosting>,
    pub chat: Arc<RecordingChat>,
    pub publisher: Arc<MessagePublisher>,
    pub service: Arc<TrackerService>,
    pub reconciler: Arc<EventReconciler>,
}

impl TestApp {
    pub async fn new(hosting: FakeHosting, chat: RecordingChat) -> Self {
        Self::with_database(setup_test_db().await, hosting, chat)
    }

    pub fn with_database(database: Database, hosting: FakeHosting, chat: RecordingChat) -> Self {
        let hosting = Arc::new(hosting);
        let chat = Arc::new(chat);

        let publisher = Arc::new(MessagePublisher::new(database.clone(), chat.clone()));
        let service = Arc::new(TrackerService::new(
            database.clone(),
            hosting.clone(),
            publisher.clone(),
        ));
        let reconciler = Arc::new(EventReconciler::new(database.clone(), publisher.clone()));

        Self {
            database,
            hosting,
            chat,
            publisher,
            service,
            reconciler,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            config: Arc::new(test_config()),
            service: self.service.clone(),
            reconciler: self.reconciler.clone(),
            chat: self.chat.clone(),
        }
    }
}

/// Inserts a tracker with one open PR and a posted message, bypassing
/// the service. Returns `(tracker_id, pr_id)`.
pub async fn seed_tracker(
    database: &Database,
    owner: &str,
    repo: &str,
    number: i64,
    approvals_required: u32,
) -> (i64, i64) {
    let pool = database.pool();
    let tracker_id = Queries::create_tracker(pool, "C123", "Sprint").await.unwrap();
    Queries::update_tracker_message_ts(pool, tracker_id, "1700000000.000001")
        .await
        .unwrap();

    let pr_id = Queries::create_pull_request(
        pool,
        &NewPullRequest {
            tracker_id,
            github_owner: owner.to_string(),
            github_repo: repo.to_string(),
            github_pr_number: number,
            github_pr_url: format!("https://github.com/{}/{}/pull/{}", owner, repo, number),
            title: String::new(),
            status: PrStatus::Open,
            approvals_required,
            approvals_current: 0,
        },
    )
    .await
    .unwrap();
    Queries::create_reviewer(pool, pr_id, "U1").await.unwrap();

    (tracker_id, pr_id)
}
