//! Channel feed access.
//!
//! The feed gateway owns the account session; reachwatch only reads through
//! it. Everything here is behind the [`crate::core::ChannelFeed`] trait so
//! tests can swap the gateway for an in-memory feed.

pub mod http;

pub use http::HttpFeedClient;

use thiserror::Error;

/// Failure modes of the channel feed.
///
/// All of them are recoverable at the poller level: the affected channel
/// contributes zero posts that round and is retried on the next one.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The channel exists but the account is not allowed to read it.
    #[error("access to the channel is denied")]
    AccessDenied,

    /// The gateway answered with a non-success status.
    #[error("feed gateway error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// The gateway answered, but the payload did not match the contract.
    #[error("feed payload malformed: {0}")]
    Malformed(String),

    /// The gateway could not be reached.
    #[error("feed network error: {0}")]
    Network(String),
}
