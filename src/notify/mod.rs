//! Notification delivery to destination chats.

pub mod dispatcher;
pub mod telegram;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use telegram::TelegramNotifier;

use thiserror::Error;

/// Failure modes of a single destination send.
///
/// Always scoped to one chat; a failed send is logged and counted but never
/// escalated past the dispatch round it happened in.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The Bot API rejected the request.
    #[error("send rejected: status {status}: {description}")]
    Api { status: u16, description: String },

    /// The Bot API could not be reached.
    #[error("send transport error: {0}")]
    Network(String),
}
