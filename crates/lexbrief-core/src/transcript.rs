use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::markup::render_markup;

/// Placeholder text shown while the backend is working.
pub const PENDING_TEXT: &str = "Analyzing legal document with AI...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Summarizer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    /// Raw content as received; may carry `<br>` markup and may be partial
    /// while a stream is still running.
    pub content: String,
    pub attachment_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>, attachment_name: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment_name,
            timestamp: Utc::now(),
        }
    }

    /// Content as plain text, without attachment label or timestamp.
    pub fn plain_text(&self) -> String {
        render_markup(&self.content).trim().to_string()
    }

    /// Local wall-clock time, `HH:MM`.
    pub fn display_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Rendering capability the submitter and streaming decoder write through.
///
/// Implementations decide how entries are shown; callers only ever append,
/// rewrite the newest entry, or toggle the pending placeholder.
pub trait TranscriptSink {
    fn append(&mut self, role: Role, content: &str, attachment_name: Option<&str>);

    /// Overwrite the content of the newest entry.
    fn update_last(&mut self, content: &str);

    fn show_pending(&mut self);

    fn hide_pending(&mut self);

    fn reset(&mut self);

    fn scroll_to_latest(&mut self) {}
}

/// In-memory, append-only transcript.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    pending: bool,
    /// Lines scrolled up from the bottom; 0 follows the newest entry.
    scroll_back: u16,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn last_assistant(&self) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|e| e.role == Role::Assistant)
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }
}

impl TranscriptSink for Transcript {
    fn append(&mut self, role: Role, content: &str, attachment_name: Option<&str>) {
        self.entries.push(TranscriptEntry::new(
            role,
            content,
            attachment_name.map(String::from),
        ));
        self.scroll_to_latest();
    }

    fn update_last(&mut self, content: &str) {
        if let Some(last) = self.entries.last_mut() {
            last.content.clear();
            last.content.push_str(content);
        }
    }

    fn show_pending(&mut self) {
        self.pending = true;
        self.scroll_to_latest();
    }

    fn hide_pending(&mut self) {
        self.pending = false;
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.pending = false;
        self.scroll_back = 0;
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_back = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_order_and_attachment() {
        let mut t = Transcript::new();
        t.append(Role::User, "Summarize this order", Some("itat.pdf"));
        t.append(Role::Assistant, "The ITAT held...", None);
        assert_eq!(t.len(), 2);
        assert_eq!(t.entries()[0].role, Role::User);
        assert_eq!(t.entries()[0].attachment_name.as_deref(), Some("itat.pdf"));
        assert_eq!(t.entries()[1].role, Role::Assistant);
        assert!(t.entries()[0].timestamp <= t.entries()[1].timestamp);
    }

    #[test]
    fn update_last_overwrites_newest_only() {
        let mut t = Transcript::new();
        t.append(Role::User, "text", None);
        t.append(Role::Assistant, "", None);
        t.update_last("Hel");
        t.update_last("Hello");
        assert_eq!(t.entries()[0].content, "text");
        assert_eq!(t.last().unwrap().content, "Hello");
    }

    #[test]
    fn update_last_on_empty_is_noop() {
        let mut t = Transcript::new();
        t.update_last("orphan");
        assert!(t.is_empty());
    }

    #[test]
    fn pending_is_not_an_entry() {
        let mut t = Transcript::new();
        t.show_pending();
        assert!(t.is_pending());
        assert_eq!(t.len(), 0);
        t.hide_pending();
        assert!(!t.is_pending());
    }

    #[test]
    fn reset_clears_everything() {
        let mut t = Transcript::new();
        t.append(Role::User, "a", None);
        t.show_pending();
        t.scroll_up(5);
        t.reset();
        assert_eq!(t.len(), 0);
        assert!(!t.is_pending());
        assert_eq!(t.scroll_back(), 0);
    }

    #[test]
    fn append_follows_latest() {
        let mut t = Transcript::new();
        t.append(Role::User, "a", None);
        t.scroll_up(3);
        assert_eq!(t.scroll_back(), 3);
        t.append(Role::Assistant, "b", None);
        assert_eq!(t.scroll_back(), 0);
    }

    #[test]
    fn plain_text_renders_markup() {
        let e = TranscriptEntry::new(Role::Assistant, "Para one.<br><br>Para two. ", None);
        assert_eq!(e.plain_text(), "Para one.\n\nPara two.");
        assert_eq!(e.display_time().len(), 5);
    }

    #[test]
    fn last_assistant_skips_user_entries() {
        let mut t = Transcript::new();
        t.append(Role::Assistant, "first", None);
        t.append(Role::User, "second", None);
        assert_eq!(t.last_assistant().unwrap().content, "first");
    }
}
