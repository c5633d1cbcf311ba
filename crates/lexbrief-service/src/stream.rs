//! Incremental decoder for streamed summaries.
//!
//! The backend sends newline-delimited lines; lines starting with `data: `
//! carry a JSON payload with `content`, `done` or `error`. Bytes arrive in
//! arbitrary pieces, so both UTF-8 decoding and line framing keep state
//! across chunks.

use std::fmt;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use lexbrief_core::{StreamEvent, TranscriptSink};
use tracing::{debug, warn};

const EVENT_PREFIX: &str = "data: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for the first chunk.
    Reading,
    /// Text is being assembled across chunks.
    Accumulating,
    Completed,
    Failed,
}

impl DecodeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodeState::Completed | DecodeState::Failed)
    }
}

/// Result of decoding one streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub state: DecodeState,
    /// Everything accumulated from `content` events.
    pub content: String,
    /// Backend or transport failure message, when `state` is `Failed`.
    pub error: Option<String>,
}

/// UTF-8 decoder that holds an incomplete trailing sequence until the next
/// chunk. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut input = &buf[..];
        loop {
            match std::str::from_utf8(input) {
                Ok(s) => {
                    out.push_str(s);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&input[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &input[valid + len..];
                        }
                        None => {
                            input = &input[valid..];
                            break;
                        }
                    }
                }
            }
        }
        self.pending = input.to_vec();
        out
    }

    fn flush(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// State machine for one streamed reply, bound to the newest transcript entry.
#[derive(Debug)]
pub struct StreamDecoder {
    utf8: Utf8Decoder,
    line: String,
    accumulator: String,
    state: DecodeState,
    error: Option<String>,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            utf8: Utf8Decoder::default(),
            line: String::new(),
            accumulator: String::new(),
            state: DecodeState::Reading,
            error: None,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulator
    }

    /// Feed one chunk. Returns true once a terminal event has been seen;
    /// anything after it in the chunk is discarded.
    pub fn feed<T: TranscriptSink + ?Sized>(&mut self, chunk: &[u8], sink: &mut T) -> bool {
        if self.state.is_terminal() {
            return true;
        }
        self.state = DecodeState::Accumulating;
        let text = self.utf8.decode(chunk);
        self.line.push_str(&text);
        self.drain_lines(sink)
    }

    /// The byte stream ended. Processes any unterminated last line; if no
    /// terminal event arrived, the accumulated text stands as final.
    pub fn finish<T: TranscriptSink + ?Sized>(&mut self, sink: &mut T) {
        if self.state.is_terminal() {
            return;
        }
        let tail = self.utf8.flush();
        self.line.push_str(&tail);
        let last = std::mem::take(&mut self.line);
        self.handle_line(&last, sink);
        if !self.state.is_terminal() {
            warn!(
                chars = self.accumulator.len(),
                "stream ended without a done marker"
            );
            self.state = DecodeState::Completed;
        }
    }

    /// The underlying read failed before a terminal event.
    pub fn fail<T: TranscriptSink + ?Sized>(&mut self, reason: &str, sink: &mut T) {
        if self.state.is_terminal() {
            return;
        }
        sink.update_last(&format!("❌ Streaming error: {reason}"));
        self.state = DecodeState::Failed;
        self.error = Some(reason.to_string());
    }

    pub fn into_outcome(self) -> StreamOutcome {
        StreamOutcome {
            state: self.state,
            content: self.accumulator,
            error: self.error,
        }
    }

    fn drain_lines<T: TranscriptSink + ?Sized>(&mut self, sink: &mut T) -> bool {
        while let Some(pos) = self.line.find('\n') {
            let line: String = self.line.drain(..=pos).collect();
            self.handle_line(&line[..pos], sink);
            if self.state.is_terminal() {
                self.line.clear();
                return true;
            }
        }
        false
    }

    fn handle_line<T: TranscriptSink + ?Sized>(&mut self, line: &str, sink: &mut T) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(payload) = line.strip_prefix(EVENT_PREFIX) else {
            return;
        };
        let event = match StreamEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                debug!("ignoring malformed event line ({e}): {line}");
                return;
            }
        };
        match event {
            StreamEvent::Error(message) => {
                sink.update_last(&format!("❌ {message}"));
                self.state = DecodeState::Failed;
                self.error = Some(message);
            }
            StreamEvent::Done => {
                self.state = DecodeState::Completed;
            }
            StreamEvent::Content(fragment) => {
                self.accumulator.push_str(&fragment);
                sink.update_last(&self.accumulator);
                sink.scroll_to_latest();
            }
            StreamEvent::Ignored => {}
        }
    }
}

/// Read `stream` to the first terminal event (or its end) and render into
/// the newest entry of `sink`.
pub async fn decode_stream<S, E, T>(mut stream: S, sink: &mut T) -> StreamOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
    T: TranscriptSink + ?Sized,
{
    let mut decoder = StreamDecoder::new();
    loop {
        match stream.next().await {
            Some(Ok(chunk)) => {
                if decoder.feed(&chunk, sink) {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("stream read failed: {e}");
                decoder.fail(&e.to_string(), sink);
                break;
            }
            None => {
                decoder.finish(sink);
                break;
            }
        }
    }
    debug!(state = ?decoder.state(), "stream decode finished");
    decoder.into_outcome()
}
