use thiserror::Error;

/// Rejections raised synchronously by the input controller.
///
/// None of these mutate session state; the message is shown to the user
/// as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please select a PDF, DOCX, or TXT file.")]
    UnsupportedFormat(String),

    #[error("File size exceeds 20MB limit.")]
    FileTooLarge(u64),

    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Please enter document text or attach a file for AI analysis.")]
    EmptySubmission,

    #[error("a summary is already in progress")]
    Busy,
}
