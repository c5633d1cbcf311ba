use lexbrief_core::{Role, TranscriptSink};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// A transcript mutation, queued for whoever owns the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    Append {
        role: Role,
        content: String,
        attachment_name: Option<String>,
    },
    UpdateLast(String),
    ShowPending,
    HidePending,
    Reset,
    ScrollToLatest,
}

impl TranscriptUpdate {
    pub fn apply<T: TranscriptSink + ?Sized>(self, sink: &mut T) {
        match self {
            TranscriptUpdate::Append {
                role,
                content,
                attachment_name,
            } => sink.append(role, &content, attachment_name.as_deref()),
            TranscriptUpdate::UpdateLast(content) => sink.update_last(&content),
            TranscriptUpdate::ShowPending => sink.show_pending(),
            TranscriptUpdate::HidePending => sink.hide_pending(),
            TranscriptUpdate::Reset => sink.reset(),
            TranscriptUpdate::ScrollToLatest => sink.scroll_to_latest(),
        }
    }
}

/// Sink that forwards every call over a channel.
///
/// Lets a submission run on a background task while the UI thread keeps
/// ownership of the transcript and applies updates in arrival order.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<TranscriptUpdate>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<TranscriptUpdate>) -> Self {
        Self { tx }
    }

    fn send(&self, update: TranscriptUpdate) {
        if self.tx.send(update).is_err() {
            debug!("transcript receiver dropped; update discarded");
        }
    }
}

impl TranscriptSink for ChannelSink {
    fn append(&mut self, role: Role, content: &str, attachment_name: Option<&str>) {
        self.send(TranscriptUpdate::Append {
            role,
            content: content.to_string(),
            attachment_name: attachment_name.map(String::from),
        });
    }

    fn update_last(&mut self, content: &str) {
        self.send(TranscriptUpdate::UpdateLast(content.to_string()));
    }

    fn show_pending(&mut self) {
        self.send(TranscriptUpdate::ShowPending);
    }

    fn hide_pending(&mut self) {
        self.send(TranscriptUpdate::HidePending);
    }

    fn reset(&mut self) {
        self.send(TranscriptUpdate::Reset);
    }

    fn scroll_to_latest(&mut self) {
        self.send(TranscriptUpdate::ScrollToLatest);
    }
}
