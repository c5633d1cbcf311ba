use std::path::Path;

use lexbrief_core::request::parse_word_limit;
use lexbrief_core::{
    Attachment, FileCandidate, InputError, Role, SummarizeRequest, TranscriptSink,
};
use tracing::{info, warn};

use crate::stream::{decode_stream, DecodeState};
use crate::{SummarizeService, SummaryReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

/// How a submission ended, after everything was rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Completed,
    /// The backend or transport reported a failure; the message is what was shown.
    Failed(String),
}

/// Input state for one conversation: the staged file, the typed text, the
/// word-count setting, and the in-flight guard.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    attachment: Option<Attachment>,
    input: String,
    word_count: Option<String>,
    state: SubmissionState,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_word_count(word_count: Option<String>) -> Self {
        Self {
            word_count,
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn word_count(&self) -> Option<&str> {
        self.word_count.as_deref()
    }

    pub fn set_word_count(&mut self, word_count: Option<String>) {
        self.word_count = word_count;
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Stage a file, replacing any earlier one. Rejected candidates leave
    /// the current attachment untouched.
    pub fn select_file(&mut self, candidate: FileCandidate) -> Result<&Attachment, InputError> {
        let attachment = Attachment::validate(candidate)?;
        info!(name = %attachment.name, size = attachment.size_bytes, "attachment selected");
        Ok(self.attachment.insert(attachment))
    }

    pub fn select_path(&mut self, path: impl AsRef<Path>) -> Result<&Attachment, InputError> {
        let candidate = FileCandidate::from_path(path)?;
        self.select_file(candidate)
    }

    pub fn remove_file(&mut self) {
        self.attachment = None;
    }

    /// Freeze input and build the payload for one submission.
    ///
    /// The typed text is consumed immediately; the attachment stays staged
    /// until [`ChatSession::finish`].
    pub fn begin_submit(&mut self) -> Result<SummarizeRequest, InputError> {
        if self.is_submitting() {
            return Err(InputError::Busy);
        }
        let text = self.input.trim();
        if text.is_empty() && self.attachment.is_none() {
            return Err(InputError::EmptySubmission);
        }
        let main_content = (!text.is_empty()).then(|| text.to_string());
        let request = SummarizeRequest {
            main_content,
            attachment: self.attachment.clone(),
            max_length: parse_word_limit(self.word_count.as_deref()),
        };
        self.input.clear();
        self.state = SubmissionState::Submitting;
        Ok(request)
    }

    /// Release the guard and drop the staged file. Runs after every
    /// submission, whatever its outcome.
    pub fn finish(&mut self) {
        self.state = SubmissionState::Idle;
        self.attachment = None;
    }

    /// Reset the transcript to its welcome state and drop any staged input.
    pub fn clear<T: TranscriptSink + ?Sized>(&mut self, sink: &mut T) {
        sink.reset();
        self.remove_file();
        self.input.clear();
    }

    /// Run one full submission against `service`, rendering into `sink`.
    pub async fn submit<S, T>(
        &mut self,
        service: &S,
        sink: &mut T,
    ) -> Result<SubmissionOutcome, InputError>
    where
        S: SummarizeService + ?Sized,
        T: TranscriptSink + ?Sized,
    {
        let request = self.begin_submit()?;
        let outcome = run_submission(service, sink, &request).await;
        self.finish();
        Ok(outcome)
    }
}

/// Send `request` and render the reply.
///
/// Appends the user's entry, shows the pending placeholder, then renders
/// either the one-shot result, the stream, or the transport error as a new
/// assistant entry. Never fails: every error ends up in the transcript.
pub async fn run_submission<S, T>(
    service: &S,
    sink: &mut T,
    request: &SummarizeRequest,
) -> SubmissionOutcome
where
    S: SummarizeService + ?Sized,
    T: TranscriptSink + ?Sized,
{
    sink.append(Role::User, request.display_text(), request.attachment_name());
    sink.show_pending();

    match service.summarize(request).await {
        Ok(SummaryReply::Stream(body)) => {
            sink.hide_pending();
            sink.append(Role::Assistant, "", None);
            let outcome = decode_stream(body, sink).await;
            match outcome.state {
                DecodeState::Failed => {
                    SubmissionOutcome::Failed(outcome.error.unwrap_or_default())
                }
                _ => SubmissionOutcome::Completed,
            }
        }
        Ok(SummaryReply::Json(result)) => {
            sink.hide_pending();
            sink.append(Role::Assistant, &result.message(), None);
            if result.success {
                SubmissionOutcome::Completed
            } else {
                SubmissionOutcome::Failed(result.error.unwrap_or_default())
            }
        }
        Err(e) => {
            warn!("summarize request failed: {e}");
            sink.hide_pending();
            sink.append(Role::Assistant, &format!("❌ Error: {e}"), None);
            SubmissionOutcome::Failed(e.to_string())
        }
    }
}
