//! reachwatch - a reach-threshold monitor for channel posts
//!
//! This library provides the core functionality for polling channels,
//! detecting posts whose view count crossed a configured threshold, and
//! announcing each of them to a set of chats exactly once.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod evaluator;
pub mod feed;
pub mod formatting;
pub mod metrics;
pub mod notify;
pub mod poller;
pub mod scheduler;
pub mod store;

// Re-export core types for convenience
pub use crate::core::*;
