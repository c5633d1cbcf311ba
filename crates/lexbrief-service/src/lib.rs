mod http;
mod session;
mod sink;
pub mod stream;
mod traits;

pub use http::HttpService;
pub use session::{run_submission, ChatSession, SubmissionOutcome, SubmissionState};
pub use sink::{ChannelSink, TranscriptUpdate};
pub use stream::{decode_stream, DecodeState, StreamDecoder, StreamOutcome};
pub use traits::{ByteStream, ServiceError, SummarizeService, SummaryReply};
