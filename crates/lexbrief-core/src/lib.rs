pub mod attachment;
pub mod error;
pub mod event;
pub mod markup;
pub mod request;
pub mod transcript;

pub use attachment::{Attachment, FileCandidate, FileKind};
pub use error::InputError;
pub use event::{ServerInfo, StreamEvent, SummaryResult};
pub use request::SummarizeRequest;
pub use transcript::{Role, Transcript, TranscriptEntry, TranscriptSink};
