use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::packer::Packable;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    #[default]
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Message body as queued: plain text is escaped on delivery, safe HTML is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageText {
    Plain(String),
    Safe(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: Level,
    pub text: MessageText,
}

impl FlashMessage {
    /// Wire form with the body escaped for safe embedding.
    pub fn to_message(&self) -> Message {
        let html = match &self.text {
            MessageText::Plain(t) => escape_html(t),
            MessageText::Safe(h) => h.clone(),
        };
        Message {
            level: self.level,
            html,
        }
    }
}

/// A delivered one-shot notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub html: String,
}

impl From<&Message> for Packable {
    fn from(m: &Message) -> Self {
        Packable::map([
            ("level", Packable::from(m.level.as_str())),
            ("html", Packable::from(m.html.clone())),
        ])
    }
}

/// Pack an ordered message list.
pub fn pack_messages(messages: &[Message]) -> Packable {
    Packable::List(messages.iter().map(Packable::from).collect())
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Source of pending flash messages for a request. Draining consumes: a
/// second drain for the same request returns nothing.
pub trait MessageStore: Send + Sync {
    fn drain(&self, parts: &http::request::Parts) -> Vec<Message>;
}

/// Per-request message queue, carried in the request extensions.
#[derive(Debug, Clone, Default)]
pub struct FlashMessages(Arc<Mutex<Vec<FlashMessage>>>);

impl FlashMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, level: Level, text: impl Into<String>) {
        self.push(FlashMessage {
            level,
            text: MessageText::Plain(text.into()),
        });
    }

    /// Queue pre-escaped HTML; it is delivered verbatim.
    pub fn add_safe(&self, level: Level, html: impl Into<String>) {
        self.push(FlashMessage {
            level,
            text: MessageText::Safe(html.into()),
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.add(Level::Info, text);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.add(Level::Success, text);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.add(Level::Warning, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.add(Level::Error, text);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every pending message, in the order queued.
    pub fn drain(&self) -> Vec<Message> {
        let pending = std::mem::take(&mut *self.lock());
        pending.iter().map(FlashMessage::to_message).collect()
    }

    fn push(&self, message: FlashMessage) {
        self.lock().push(message);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FlashMessage>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drains the [`FlashMessages`] queue found in the request extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMessageStore;

impl MessageStore for RequestMessageStore {
    fn drain(&self, parts: &http::request::Parts) -> Vec<Message> {
        parts
            .extensions
            .get::<FlashMessages>()
            .map(FlashMessages::drain)
            .unwrap_or_default()
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with(flash: &FlashMessages) -> http::request::Parts {
        let (mut parts, _) = http::Request::new(()).into_parts();
        parts.extensions.insert(flash.clone());
        parts
    }

    #[test]
    fn plain_text_is_escaped() {
        let flash = FlashMessages::new();
        flash.success("<script>alert(1)</script>");
        let msgs = flash.drain();
        assert_eq!(msgs[0].html, "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(msgs[0].level, Level::Success);
    }

    #[test]
    fn safe_html_is_verbatim() {
        let flash = FlashMessages::new();
        flash.add_safe(Level::Info, "<b>saved</b>");
        assert_eq!(flash.drain()[0].html, "<b>saved</b>");
    }

    #[test]
    fn drain_is_consuming_and_ordered() {
        let flash = FlashMessages::new();
        flash.info("one");
        flash.warning("two");
        let parts = parts_with(&flash);
        let store = RequestMessageStore;
        let first = store.drain(&parts);
        assert_eq!(
            first.iter().map(|m| m.html.as_str()).collect::<Vec<_>>(),
            ["one", "two"]
        );
        assert!(store.drain(&parts).is_empty());
        assert!(flash.is_empty());
    }

    #[test]
    fn missing_queue_drains_empty() {
        let (parts, _) = http::Request::new(()).into_parts();
        assert!(RequestMessageStore.drain(&parts).is_empty());
    }

    #[test]
    fn level_serializes_lowercase() {
        let m = Message {
            level: Level::Warning,
            html: "x".into(),
        };
        assert_eq!(serde_json::to_value(&m).unwrap()["level"], "warning");
    }
}
