// src/formatting.rs

use crate::core::AlertEvent;

/// A trait for rendering an alert into the text of a chat message.
pub trait TextFormatter: Send + Sync {
    fn format(&self, alert: &AlertEvent) -> String;
}

/// A formatter for Discord-style webhooks using markdown emphasis.
pub struct WebhookTextFormatter;

impl TextFormatter for WebhookTextFormatter {
    fn format(&self, alert: &AlertEvent) -> String {
        format!(
            "\u{26a0}\u{fe0f} **Keyword match detected**\n**Domain:** `{}`\n**Time:** `{}`",
            alert.domain, alert.matched_at
        )
    }
}

/// A formatter producing a single unadorned line.
pub struct PlainTextFormatter;

impl TextFormatter for PlainTextFormatter {
    fn format(&self, alert: &AlertEvent) -> String {
        format!(
            "[{}] {} matched '{}'",
            alert.matched_at, alert.domain, alert.keyword
        )
    }
}
