//! State machine tests for the TUI App.
//!
//! Each test builds an App over a scripted `SummarizeService` running on its
//! own tokio runtime, simulates key events, and calls `tick()` the way the
//! event loop does until the submission settles.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::bail;
use async_trait::async_trait;
use bytes::Bytes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lexbrief_core::{Role, SummarizeRequest, SummaryResult};
use lexbrief_service::{ServiceError, SummarizeService, SummaryReply};
use lexbrief_tui::app::{App, Mode, StatusLine};
use lexbrief_tui::clipboard::ClipboardWriter;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;

enum Reply {
    Json(SummaryResult),
    Chunks(Vec<&'static str>),
    Status(u16),
    /// The backend call blows up inside the submission task.
    Panic,
}

struct FakeService {
    reply: Reply,
    /// When set, replies wait for a permit so tests can observe the busy state.
    gate: Option<Semaphore>,
    requests: Mutex<Vec<SummarizeRequest>>,
}

impl FakeService {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn gated(reply: Reply) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(reply)
        }
    }

    fn release(&self) {
        if let Some(ref gate) = self.gate {
            gate.add_permits(1);
        }
    }

    fn requests(&self) -> Vec<SummarizeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarizeService for FakeService {
    async fn summarize(&self, request: &SummarizeRequest) -> Result<SummaryReply, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(ref gate) = self.gate {
            gate.acquire().await.unwrap().forget();
        }
        match &self.reply {
            Reply::Json(result) => Ok(SummaryReply::Json(result.clone())),
            Reply::Chunks(chunks) => {
                let items: Vec<Result<Bytes, ServiceError>> = chunks
                    .iter()
                    .copied()
                    .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                    .collect();
                Ok(SummaryReply::Stream(Box::pin(futures::stream::iter(items))))
            }
            Reply::Status(code) => Err(ServiceError::Status(*code)),
            Reply::Panic => panic!("summarizer backend crashed"),
        }
    }
}

#[derive(Clone, Default)]
struct FakeClipboard {
    contents: Arc<Mutex<Option<String>>>,
    broken: bool,
}

impl ClipboardWriter for FakeClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        if self.broken {
            bail!("no display");
        }
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

struct Harness {
    app: App,
    service: Arc<FakeService>,
    _runtime: Runtime,
}

impl Harness {
    fn new(service: FakeService) -> Self {
        Self::with_clipboard(service, FakeClipboard::default())
    }

    fn with_clipboard(service: FakeService, clipboard: FakeClipboard) -> Self {
        let runtime = Runtime::new().unwrap();
        let service = Arc::new(service);
        let dyn_service: Arc<dyn SummarizeService> = service.clone();
        let app = App::new(dyn_service, runtime.handle().clone(), None)
            .with_clipboard(Box::new(clipboard));
        Self {
            app,
            service,
            _runtime: runtime,
        }
    }

    fn press(&mut self, key: KeyEvent) {
        self.app.handle_key(key);
        self.app.tick();
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(char_key(c));
        }
    }

    fn submit(&mut self, text: &str) {
        self.type_text(text);
        self.press(key(KeyCode::Enter));
    }

    /// Tick until the in-flight submission has been settled.
    fn settle(&mut self) {
        let start = Instant::now();
        while self.app.is_submitting() {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "submission did not settle"
            );
            std::thread::sleep(Duration::from_millis(5));
            self.app.tick();
        }
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn char_key(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn ok_reply(summary: &str) -> Reply {
    Reply::Json(SummaryResult {
        success: true,
        summary: Some(summary.into()),
        error: None,
    })
}

fn error_status(app: &App) -> Option<String> {
    match app.status() {
        Some(StatusLine::Error(msg)) => Some(msg.clone()),
        _ => None,
    }
}

// ---- Compose ----

#[test]
fn app_starts_in_compose_with_empty_transcript() {
    let h = Harness::new(FakeService::new(ok_reply("unused")));
    assert_eq!(*h.app.mode(), Mode::Compose);
    assert!(h.app.transcript().is_empty());
    assert!(!h.app.is_submitting());
}

#[test]
fn empty_submission_is_rejected_without_a_request() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.type_text("   ");
    h.press(key(KeyCode::Enter));
    assert_eq!(
        error_status(&h.app).as_deref(),
        Some("Please enter document text or attach a file for AI analysis.")
    );
    assert!(!h.app.is_submitting());
    assert!(h.service.requests().is_empty());
    assert!(h.app.transcript().is_empty());
}

#[test]
fn alt_enter_inserts_newline() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.type_text("WHEREAS");
    h.press(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
    h.type_text("the parties");
    assert_eq!(h.app.session().input(), "WHEREAS\nthe parties");
    assert!(h.service.requests().is_empty());
}

#[test]
fn function_keys_load_example_prompts() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.press(key(KeyCode::F(2)));
    assert_eq!(
        h.app.session().input(),
        "Summarize highlighting key dates and deadlines"
    );
    h.press(key(KeyCode::F(4)));
    assert_eq!(
        h.app.session().input(),
        "Summarize with focus on legal risks and compliance"
    );
}

// ---- Submission ----

#[test]
fn streamed_reply_lands_in_transcript() {
    let mut h = Harness::new(FakeService::new(Reply::Chunks(vec![
        "data: {\"content\": \"Hel\"}\n\n",
        "data: {\"content\": \"lo\"}\n\n",
        "data: {\"done\": true}\n\n",
    ])));
    h.submit("Summarize this order");
    h.settle();

    let transcript = h.app.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.entries()[0].role, Role::User);
    assert_eq!(transcript.entries()[0].content, "Summarize this order");
    assert_eq!(transcript.last().unwrap().content, "Hello");
    assert!(!transcript.is_pending());
    assert_eq!(h.app.session().input(), "");
}

#[test]
fn json_error_reply_is_rendered() {
    let mut h = Harness::new(FakeService::new(Reply::Json(SummaryResult {
        success: false,
        summary: None,
        error: Some("File too large".into()),
    })));
    h.submit("Summarize");
    h.settle();
    assert_eq!(
        h.app.transcript().last().unwrap().content,
        "❌ Error: File too large"
    );
}

#[test]
fn http_status_failure_is_rendered() {
    let mut h = Harness::new(FakeService::new(Reply::Status(500)));
    h.submit("Summarize");
    h.settle();
    assert_eq!(
        h.app.transcript().last().unwrap().content,
        "❌ Error: HTTP error! status: 500"
    );
    assert!(!h.app.transcript().is_pending());
}

#[test]
fn panicked_submission_renders_error_and_releases_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.pdf");
    std::fs::write(&path, b"%PDF-1.4 order").unwrap();

    let mut h = Harness::new(FakeService::new(Reply::Panic));
    h.app.handle_paste(path.to_str().unwrap());
    assert!(h.app.session().attachment().is_some());
    h.press(key(KeyCode::Enter));
    h.settle();

    let transcript = h.app.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.last().unwrap().role, Role::Assistant);
    assert!(transcript.last().unwrap().content.starts_with("❌ Error:"));
    assert!(!transcript.is_pending());
    assert!(!h.app.is_submitting());
    assert!(h.app.session().attachment().is_none());
}

#[test]
fn second_submission_while_busy_is_rejected() {
    let mut h = Harness::new(FakeService::gated(ok_reply("Done.")));
    h.submit("First");
    assert!(h.app.is_submitting());

    h.submit("Second");
    assert_eq!(
        error_status(&h.app).as_deref(),
        Some("a summary is already in progress")
    );
    // The rejected text stays in the box.
    assert_eq!(h.app.session().input(), "Second");

    h.service.release();
    h.settle();
    assert_eq!(h.service.requests().len(), 1);
    assert_eq!(h.app.transcript().len(), 2);
}

#[test]
fn pending_placeholder_shows_while_waiting() {
    let mut h = Harness::new(FakeService::gated(ok_reply("Done.")));
    h.submit("Summarize");

    let start = Instant::now();
    while !h.app.transcript().is_pending() {
        assert!(start.elapsed() < Duration::from_secs(5));
        std::thread::sleep(Duration::from_millis(5));
        h.app.tick();
    }
    assert_eq!(h.app.transcript().len(), 1);

    h.service.release();
    h.settle();
    assert!(!h.app.transcript().is_pending());
    assert_eq!(h.app.transcript().last().unwrap().content, "Done.");
}

#[test]
fn word_count_edit_sets_max_length() {
    let mut h = Harness::new(FakeService::new(ok_reply("Short.")));
    h.press(ctrl('w'));
    assert!(matches!(h.app.mode(), Mode::EditWordCount { .. }));
    h.type_text("250");
    h.press(key(KeyCode::Enter));
    assert_eq!(*h.app.mode(), Mode::Compose);
    assert_eq!(h.app.session().word_count(), Some("250"));

    h.submit("Summarize");
    h.settle();
    assert_eq!(h.service.requests()[0].max_length, 250);
}

#[test]
fn unusable_word_count_falls_back_to_default() {
    let mut h = Harness::new(FakeService::new(ok_reply("Short.")));
    h.press(ctrl('w'));
    h.type_text("lots");
    h.press(key(KeyCode::Enter));
    h.submit("Summarize");
    h.settle();
    assert_eq!(h.service.requests()[0].max_length, 500);
}

// ---- Attachments ----

#[test]
fn attach_path_stages_file_and_clears_after_submit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.pdf");
    std::fs::write(&path, b"%PDF-1.4 order").unwrap();

    let mut h = Harness::new(FakeService::new(ok_reply("The order directs ...")));
    h.press(ctrl('o'));
    assert!(matches!(h.app.mode(), Mode::AttachPath { .. }));
    h.type_text(path.to_str().unwrap());
    h.press(key(KeyCode::Enter));

    assert_eq!(*h.app.mode(), Mode::Compose);
    assert_eq!(h.app.session().attachment().unwrap().name, "order.pdf");

    h.press(key(KeyCode::Enter));
    h.settle();

    let request = &h.service.requests()[0];
    assert_eq!(request.main_content, None);
    assert_eq!(request.attachment.as_ref().unwrap().name, "order.pdf");
    let user = &h.app.transcript().entries()[0];
    assert_eq!(user.content, "Please analyze this legal document using AI.");
    assert_eq!(user.attachment_name.as_deref(), Some("order.pdf"));
    assert!(h.app.session().attachment().is_none());
}

#[test]
fn unsupported_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.xlsx");
    std::fs::write(&path, b"PK").unwrap();

    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.press(ctrl('o'));
    h.type_text(path.to_str().unwrap());
    h.press(key(KeyCode::Enter));

    assert_eq!(
        error_status(&h.app).as_deref(),
        Some("Please select a PDF, DOCX, or TXT file.")
    );
    assert!(h.app.session().attachment().is_none());
}

#[test]
fn escape_cancels_attach() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.press(ctrl('o'));
    h.type_text("/tmp/whatever.pdf");
    h.press(key(KeyCode::Esc));
    assert_eq!(*h.app.mode(), Mode::Compose);
    assert!(h.app.session().attachment().is_none());
    assert_eq!(h.app.session().input(), "");
}

#[test]
fn ctrl_r_removes_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deed.docx");
    std::fs::write(&path, b"deed").unwrap();

    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.app.handle_paste(path.to_str().unwrap());
    assert!(h.app.session().attachment().is_some());
    h.press(ctrl('r'));
    assert!(h.app.session().attachment().is_none());
}

#[test]
fn pasted_text_goes_to_input() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.app.handle_paste("IN THE INCOME TAX APPELLATE TRIBUNAL\nITA No. 1234");
    assert_eq!(
        h.app.session().input(),
        "IN THE INCOME TAX APPELLATE TRIBUNAL\nITA No. 1234"
    );
    assert!(h.app.session().attachment().is_none());
}

// ---- Clear ----

#[test]
fn clear_resets_transcript_and_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"notes").unwrap();

    let mut h = Harness::new(FakeService::new(ok_reply("Summary.")));
    h.submit("Summarize");
    h.settle();
    h.app.handle_paste(path.to_str().unwrap());
    assert_eq!(h.app.transcript().len(), 2);

    h.press(ctrl('l'));
    assert!(h.app.transcript().is_empty());
    assert!(h.app.session().attachment().is_none());
}

#[test]
fn clear_is_blocked_while_submitting() {
    let mut h = Harness::new(FakeService::gated(ok_reply("Summary.")));
    h.submit("Summarize");
    h.press(ctrl('l'));
    assert!(error_status(&h.app).is_some());

    h.service.release();
    h.settle();
    assert_eq!(h.app.transcript().len(), 2);
}

// ---- Clipboard ----

#[test]
fn copy_puts_rendered_reply_on_clipboard() {
    let clipboard = FakeClipboard::default();
    let contents = clipboard.contents.clone();
    let mut h = Harness::with_clipboard(
        FakeService::new(ok_reply("Held.<br><br>Appeal allowed.<br>")),
        clipboard,
    );

    h.submit("Summarize");
    h.settle();
    h.press(ctrl('y'));

    assert_eq!(
        contents.lock().unwrap().as_deref(),
        Some("Held.\n\nAppeal allowed.")
    );
    assert!(matches!(h.app.status(), Some(StatusLine::Info(_))));
}

#[test]
fn failed_copy_falls_back_to_manual_view() {
    let mut h = Harness::with_clipboard(
        FakeService::new(ok_reply("Held.")),
        FakeClipboard {
            broken: true,
            ..FakeClipboard::default()
        },
    );

    h.submit("Summarize");
    h.settle();
    h.press(ctrl('y'));

    assert_eq!(
        error_status(&h.app).as_deref(),
        Some("Please manually copy the text")
    );
    assert_eq!(
        *h.app.mode(),
        Mode::ManualCopy {
            text: "Held.".into(),
            scroll: 0
        }
    );
    h.press(key(KeyCode::Esc));
    assert_eq!(*h.app.mode(), Mode::Compose);
}

#[test]
fn copy_with_no_reply_does_nothing() {
    let mut h = Harness::new(FakeService::new(ok_reply("unused")));
    h.press(ctrl('y'));
    assert_eq!(*h.app.mode(), Mode::Compose);
    assert!(matches!(h.app.status(), Some(StatusLine::Info(_))));
}

// ---- Rendering ----

#[test]
fn renders_welcome_and_conversation() {
    let mut h = Harness::new(FakeService::new(ok_reply("The lease runs for 11 months.")));
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

    terminal.draw(|frame| h.app.render(frame)).unwrap();
    let screen = buffer_text(&terminal);
    assert!(screen.contains("Legal Document Summarizer"));
    assert!(screen.contains("Payment Focus"));

    h.submit("Summarize the lease");
    h.settle();
    terminal.draw(|frame| h.app.render(frame)).unwrap();
    let screen = buffer_text(&terminal);
    assert!(screen.contains("The lease runs for 11 months."));
    assert!(!screen.contains("Payment Focus"));
}

fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
