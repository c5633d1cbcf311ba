use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded `data: ` payload from a streaming summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Terminal failure reported by the backend.
    Error(String),
    /// Terminal success marker.
    Done,
    /// Incremental text fragment.
    Content(String),
    /// Valid JSON carrying none of the known fields.
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    done: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl StreamEvent {
    /// Parse the JSON text after the `data: ` prefix.
    ///
    /// Fields are checked in the order error, done, content; the first one
    /// that is present and truthy decides the variant.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEvent = serde_json::from_str(payload)?;
        if let Some(error) = raw.error.filter(is_truthy) {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Ok(StreamEvent::Error(message));
        }
        if raw.done.as_ref().is_some_and(is_truthy) {
            return Ok(StreamEvent::Done);
        }
        match raw.content.filter(is_truthy) {
            Some(Value::String(s)) => Ok(StreamEvent::Content(s)),
            Some(other) => Ok(StreamEvent::Content(other.to_string())),
            None => Ok(StreamEvent::Ignored),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error(_) | StreamEvent::Done)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Body of a non-streaming `/summarize` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryResult {
    /// The text to show as the assistant's reply.
    pub fn message(&self) -> String {
        if self.success {
            self.summary.clone().unwrap_or_default()
        } else {
            format!(
                "❌ Error: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// Body of `GET /config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub api_provider: String,
    pub max_file_size: String,
    #[serde(default)]
    pub supported_formats: Vec<String>,
}
