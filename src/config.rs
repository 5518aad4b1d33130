//! Configuration management for reachwatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `reachwatch.toml` file and merge it
//! with environment variables and command-line arguments.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::core::ChatId;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// View count a post must reach to trigger a notification. Shared by
    /// all channels. Defaults to 300.
    pub threshold: u64,
    /// Configuration for the polling loop.
    pub poll: PollConfig,
    /// Configuration for the channel feed gateway.
    pub feed: FeedConfig,
    /// Configuration for notification delivery.
    pub notify: NotifyConfig,
    /// Configuration for the notified-posts snapshot.
    pub state: StateConfig,
    /// Configuration for metrics reporting.
    pub metrics: MetricsConfig,
}

/// Configuration for the polling loop.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollConfig {
    /// Seconds to wait between two polling rounds.
    pub interval_seconds: u64,
    /// Number of most recent posts fetched per channel each round.
    pub window_size: usize,
}

/// Configuration for the channel feed gateway.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedConfig {
    /// Base URL of the feed gateway.
    pub gateway_url: String,
    /// Bearer token authenticating against the gateway.
    pub api_token: String,
    /// Names of the channels to monitor.
    pub channels: Vec<String>,
}

/// Configuration for notification delivery.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifyConfig {
    /// Base URL of the Bot API. Overridable for tests.
    pub api_url: String,
    /// Token of the bot that sends the notifications.
    pub bot_token: String,
    /// Chats that receive every notification.
    pub chat_ids: Vec<ChatId>,
}

/// Configuration for the notified-posts snapshot.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StateConfig {
    /// Path of the snapshot file.
    pub path: PathBuf,
    /// Most recent post ids kept per channel. Must be at least
    /// `poll.window_size`; ids older than the fetch window can never be
    /// fetched again, so dropping them cannot cause a duplicate.
    pub retain_per_channel: usize,
}

/// Configuration for metrics reporting.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Log all captured metrics periodically.
    pub log_metrics: bool,
    /// Seconds between metric log lines.
    pub log_aggregation_seconds: u64,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are layered, later ones winning: built-in defaults, the TOML
    /// file named by `--config`, `REACHWATCH_`-prefixed environment
    /// variables, and command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            // Allow overriding with environment variables, e.g. REACHWATCH_THRESHOLD=500
            .merge(Env::prefixed("REACHWATCH_"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the monitor cannot run with.
    ///
    /// Every missing required value is collected before failing, so one
    /// error message names the complete set.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.feed.gateway_url.is_empty() {
            missing.push("feed.gateway_url");
        }
        if self.feed.api_token.is_empty() {
            missing.push("feed.api_token");
        }
        if self.feed.channels.is_empty() {
            missing.push("feed.channels");
        }
        if self.notify.bot_token.is_empty() {
            missing.push("notify.bot_token");
        }
        if self.notify.chat_ids.is_empty() {
            missing.push("notify.chat_ids");
        }
        if !missing.is_empty() {
            anyhow::bail!("missing required configuration: {}", missing.join(", "));
        }

        if self.state.retain_per_channel < self.poll.window_size {
            anyhow::bail!(
                "state.retain_per_channel ({}) must be at least poll.window_size ({})",
                self.state.retain_per_channel,
                self.poll.window_size
            );
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup. The defaults
// alone do not pass `validate`: credentials, channels and chats have none.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            threshold: 300,
            poll: PollConfig {
                interval_seconds: 60,
                window_size: 100,
            },
            feed: FeedConfig {
                gateway_url: String::new(),
                api_token: String::new(),
                channels: vec![],
            },
            notify: NotifyConfig {
                api_url: "https://api.telegram.org".to_string(),
                bot_token: String::new(),
                chat_ids: vec![],
            },
            state: StateConfig {
                path: PathBuf::from("notified_posts.json"),
                retain_per_channel: 500,
            },
            metrics: MetricsConfig {
                log_metrics: false,
                log_aggregation_seconds: 60,
            },
        }
    }
}
