use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::RevueError;
use crate::form::DEFAULT_GITHUB_HOST;
use crate::github::client::DEFAULT_GITHUB_API_URL;
use crate::slack::client::DEFAULT_SLACK_API_URL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    pub github_token: String,
    pub github_webhook_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub github_api_url: String,
    pub slack_api_url: String,
    /// Host accepted in submitted PR URLs.
    pub github_host: String,
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then process environment
    /// (`SLACK_BOT_TOKEN`, `SERVER_PORT`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self, RevueError> {
        Self::load_with(path, Environment::default())
    }

    pub fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, RevueError> {
        let mut builder = Config::builder()
            .set_default("database_url", "sqlite://revue.db")
            .and_then(|b| b.set_default("slack_bot_token", ""))
            .and_then(|b| b.set_default("slack_signing_secret", ""))
            .and_then(|b| b.set_default("github_token", ""))
            .and_then(|b| b.set_default("github_webhook_secret", ""))
            .and_then(|b| b.set_default("server_host", "0.0.0.0"))
            .and_then(|b| b.set_default("server_port", 3000))
            .and_then(|b| b.set_default("github_api_url", DEFAULT_GITHUB_API_URL))
            .and_then(|b| b.set_default("slack_api_url", DEFAULT_SLACK_API_URL))
            .and_then(|b| b.set_default("github_host", DEFAULT_GITHUB_HOST))
            .map_err(|e| RevueError::ConfigError(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| RevueError::ConfigError(format!("Failed to load configuration: {}", e)))
    }

    pub fn validate(&self) -> Result<(), RevueError> {
        let required = [
            ("SLACK_BOT_TOKEN", &self.slack_bot_token),
            ("SLACK_SIGNING_SECRET", &self.slack_signing_secret),
            ("GITHUB_TOKEN", &self.github_token),
            ("GITHUB_WEBHOOK_SECRET", &self.github_webhook_secret),
            ("GITHUB_HOST", &self.github_host),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RevueError::ConfigError(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
