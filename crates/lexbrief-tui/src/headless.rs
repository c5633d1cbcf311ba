//! One-shot summarization without the terminal UI.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use lexbrief_core::markup::render_markup;
use lexbrief_core::transcript::PENDING_TEXT;
use lexbrief_core::{Role, TranscriptSink};
use lexbrief_service::{ChatSession, SubmissionOutcome, SummarizeService};
use tracing::{debug, info};

/// Sink that streams the assistant reply to a writer as plain text.
///
/// The user's entry is not echoed. Markup that may still be incomplete
/// (an open `<` or `&`) is held back until a later chunk closes it.
pub struct StdoutSink<W: Write> {
    out: W,
    reply: String,
    printed: String,
    error: Option<io::Error>,
}

impl<W: Write> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            reply: String::new(),
            printed: String::new(),
            error: None,
        }
    }

    /// Flush whatever was held back and end the output with a newline.
    pub fn finish(mut self) -> io::Result<W> {
        let rendered = render_markup(&self.reply);
        self.emit(&rendered);
        if !self.printed.is_empty() && !self.printed.ends_with('\n') {
            self.write("\n");
        }
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, rendered: &str) {
        match rendered.strip_prefix(self.printed.as_str()) {
            Some("") => {}
            Some(suffix) => {
                let suffix = suffix.to_string();
                self.write(&suffix);
                self.printed.push_str(&suffix);
            }
            None => {
                debug!("rendered reply diverged from printed output; reprinting");
                let full = format!("\n{rendered}");
                self.write(&full);
                self.printed = rendered.to_string();
            }
        }
    }

    fn write(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(s.as_bytes()).and_then(|_| self.out.flush()) {
            self.error = Some(e);
        }
    }
}

/// The longest prefix of `raw` that cannot change meaning when more text
/// arrives: everything before an unclosed `<` or `&`.
fn stable_prefix(raw: &str) -> &str {
    let mut end = raw.len();
    if let Some(lt) = raw.rfind('<') {
        if !raw[lt..].contains('>') {
            end = end.min(lt);
        }
    }
    if let Some(amp) = raw.rfind('&') {
        if !raw[amp..].contains(';') {
            end = end.min(amp);
        }
    }
    &raw[..end]
}

impl<W: Write> TranscriptSink for StdoutSink<W> {
    fn append(&mut self, role: Role, content: &str, _attachment_name: Option<&str>) {
        if role == Role::Assistant {
            self.reply = content.to_string();
            let rendered = render_markup(stable_prefix(content));
            self.emit(&rendered);
        }
    }

    fn update_last(&mut self, content: &str) {
        self.reply = content.to_string();
        let rendered = render_markup(stable_prefix(content));
        self.emit(&rendered);
    }

    fn show_pending(&mut self) {
        info!("{PENDING_TEXT}");
    }

    fn hide_pending(&mut self) {}

    fn reset(&mut self) {
        self.reply.clear();
        self.printed.clear();
    }
}

/// Submit `file` and/or `text` once, streaming the reply into `out`.
pub async fn run_summarize<S, W>(
    service: &S,
    file: Option<&Path>,
    text: Option<&str>,
    word_count: Option<String>,
    out: W,
) -> Result<W>
where
    S: SummarizeService + ?Sized,
    W: Write,
{
    let mut session = ChatSession::with_word_count(word_count);
    if let Some(path) = file {
        session.select_path(path)?;
    }
    if let Some(text) = text {
        session.set_input(text);
    }

    let mut sink = StdoutSink::new(out);
    let outcome = session.submit(service, &mut sink).await?;
    let out = sink.finish()?;
    match outcome {
        SubmissionOutcome::Completed => Ok(out),
        SubmissionOutcome::Failed(reason) => bail!("summarization failed: {reason}"),
    }
}
