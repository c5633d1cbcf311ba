use crate::attachment::Attachment;

/// `max_length` sent when the word-count setting is missing or unusable.
pub const DEFAULT_MAX_LENGTH: i64 = 500;

/// Text shown for the user's entry when only a file is submitted.
pub const FILE_ONLY_PROMPT: &str = "Please analyze this legal document using AI.";

/// Outbound payload for `POST /summarize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeRequest {
    /// Sent as `main_content` when present.
    pub main_content: Option<String>,
    /// Sent as the `file` part when present.
    pub attachment: Option<Attachment>,
    pub max_length: i64,
}

impl SummarizeRequest {
    pub fn display_text(&self) -> &str {
        self.main_content.as_deref().unwrap_or(FILE_ONLY_PROMPT)
    }

    pub fn attachment_name(&self) -> Option<&str> {
        self.attachment.as_ref().map(|a| a.name.as_str())
    }
}

/// Read the word-count setting leniently.
///
/// Takes the leading integer of the trimmed value (so `"300 words"` is 300);
/// anything without one, or zero, falls back to [`DEFAULT_MAX_LENGTH`].
pub fn parse_word_limit(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_MAX_LENGTH;
    };
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<i64>() {
        Ok(0) | Err(_) => DEFAULT_MAX_LENGTH,
        Ok(n) => sign * n,
    }
}
