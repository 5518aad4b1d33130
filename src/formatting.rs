// src/formatting.rs

use crate::core::NotificationEvent;

/// Longest post preview included in a notification, in characters.
const PREVIEW_MAX_CHARS: usize = 100;

/// Marker appended when the preview was cut off.
const ELLIPSIS: &str = "...";

/// Shown in place of the preview for posts without text.
const EMPTY_TEXT_PLACEHOLDER: &str = "(no text)";

/// Renders the message body sent to every chat for one qualifying post.
///
/// The body uses the Markdown emphasis subset the send transport supports.
/// Every destination chat receives this exact text.
pub fn format_notification(event: &NotificationEvent) -> String {
    format!(
        "📈 **New reach milestone!**\n**Channel:** {}\n**Post:** {}\n**Views:** {}",
        event.channel_title,
        preview(&event.text),
        event.views
    )
}

/// Truncates a post body to `PREVIEW_MAX_CHARS` characters. Counts
/// characters rather than bytes, so multi-byte text is never split.
fn preview(text: &str) -> String {
    if text.is_empty() {
        return EMPTY_TEXT_PLACEHOLDER.to_string();
    }
    if text.chars().count() <= PREVIEW_MAX_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
    format!("{truncated}{ELLIPSIS}")
}
