//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `reachwatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// A reach-threshold monitor for channel posts.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "reachwatch.toml")]
    pub config: PathBuf,

    /// View count a post must reach to trigger a notification.
    #[arg(long, value_name = "VIEWS")]
    pub threshold: Option<u64>,

    /// Seconds to wait between two polling rounds.
    #[arg(long, value_name = "SECONDS")]
    pub interval_seconds: Option<u64>,

    /// Path of the notified-posts snapshot file.
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Log all captured metrics periodically.
    #[arg(long)]
    pub log_metrics: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(threshold) = self.threshold {
            dict.insert("threshold".into(), Value::from(threshold));
        }

        // Nested keys have to be emitted as nested dicts; figment merges
        // them into the sections from the other providers.
        if let Some(interval) = self.interval_seconds {
            let mut poll = Dict::new();
            poll.insert("interval_seconds".into(), Value::from(interval));
            dict.insert("poll".into(), Value::Dict(Tag::Default, poll));
        }

        if let Some(path) = &self.state_file {
            let mut state = Dict::new();
            state.insert("path".into(), Value::from(path.display().to_string()));
            dict.insert("state".into(), Value::Dict(Tag::Default, state));
        }

        // The `--log-metrics` flag can only switch the setting on; leaving
        // it out falls back to the other providers.
        if self.log_metrics {
            let mut metrics = Dict::new();
            metrics.insert("log_metrics".into(), Value::from(true));
            dict.insert("metrics".into(), Value::Dict(Tag::Default, metrics));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
