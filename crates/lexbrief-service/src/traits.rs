use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use lexbrief_core::{SummarizeRequest, SummaryResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cannot read attachment: {0}")]
    Attachment(String),
}

/// Raw body of a streaming reply, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ServiceError>> + Send>>;

/// What the backend sent back for one submission.
pub enum SummaryReply {
    /// `text/event-stream` body, still unread.
    Stream(ByteStream),
    /// Any other content type, parsed as a one-shot result.
    Json(SummaryResult),
}

impl fmt::Debug for SummaryReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryReply::Stream(_) => f.write_str("SummaryReply::Stream(..)"),
            SummaryReply::Json(result) => f.debug_tuple("SummaryReply::Json").field(result).finish(),
        }
    }
}

/// Abstraction over the summarization backend.
///
/// `HttpService` talks to a real server; tests substitute in-memory fakes.
#[async_trait]
pub trait SummarizeService: Send + Sync {
    async fn summarize(&self, request: &SummarizeRequest) -> Result<SummaryReply, ServiceError>;
}
