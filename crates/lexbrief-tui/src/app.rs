use std::path::Path;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::FutureExt;
use lexbrief_core::attachment::format_bytes;
use lexbrief_core::{Role, ServerInfo, Transcript, TranscriptSink};
use lexbrief_service::{
    run_submission, ChannelSink, ChatSession, SubmissionOutcome, SummarizeService,
    TranscriptUpdate,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clipboard::{ClipboardWriter, SystemClipboard};
use crate::components::transcript_view::{TranscriptView, EXAMPLE_PROMPTS};

const SCROLL_STEP: u16 = 5;

/// What the app is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Typing into the message box
    Compose,
    /// Typing the path of a file to attach
    AttachPath { input: String },
    /// Editing the target summary length
    EditWordCount { input: String },
    /// Clipboard was unavailable; the reply is shown for manual copying
    ManualCopy { text: String, scroll: u16 },
}

/// One-line feedback shown in place of the key hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

impl StatusLine {
    pub fn text(&self) -> &str {
        match self {
            StatusLine::Info(s) | StatusLine::Error(s) => s,
        }
    }
}

pub struct App {
    service: Arc<dyn SummarizeService>,
    runtime: Handle,
    session: ChatSession,
    transcript: Transcript,
    mode: Mode,
    status: Option<StatusLine>,
    updates_tx: UnboundedSender<TranscriptUpdate>,
    updates_rx: UnboundedReceiver<TranscriptUpdate>,
    in_flight: Option<JoinHandle<SubmissionOutcome>>,
    server_info: Option<ServerInfo>,
    clipboard: Box<dyn ClipboardWriter>,
    ticks: usize,
}

impl App {
    pub fn new(
        service: Arc<dyn SummarizeService>,
        runtime: Handle,
        word_count: Option<String>,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            service,
            runtime,
            session: ChatSession::with_word_count(word_count),
            transcript: Transcript::new(),
            mode: Mode::Compose,
            status: None,
            updates_tx,
            updates_rx,
            in_flight: None,
            server_info: None,
            clipboard: Box::new(SystemClipboard::default()),
            ticks: 0,
        }
    }

    pub fn with_server_info(mut self, info: ServerInfo) -> Self {
        self.server_info = Some(info);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardWriter>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_submitting(&self) -> bool {
        self.session.is_submitting()
    }

    /// Apply queued transcript updates and settle a finished submission.
    /// Called by the event loop between key events.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        // Sample completion first so every update the task sent is drained
        // before the session is released.
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished());

        while let Ok(update) = self.updates_rx.try_recv() {
            update.apply(&mut self.transcript);
        }

        if !finished {
            return;
        }
        if let Some(handle) = self.in_flight.take() {
            match handle.now_or_never() {
                Some(Ok(SubmissionOutcome::Completed)) => info!("submission completed"),
                Some(Ok(SubmissionOutcome::Failed(reason))) => {
                    info!(%reason, "submission failed")
                }
                Some(Err(e)) => {
                    error!("submission task aborted: {e}");
                    self.transcript.hide_pending();
                    self.transcript
                        .append(Role::Assistant, &format!("❌ Error: {e}"), None);
                }
                None => {}
            }
            self.session.finish();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status = None;

        match self.mode.clone() {
            Mode::Compose => self.handle_compose(key),
            Mode::AttachPath { input } => self.handle_attach_path(key, input),
            Mode::EditWordCount { input } => self.handle_edit_word_count(key, input),
            Mode::ManualCopy { text, scroll } => self.handle_manual_copy(key, text, scroll),
        }
    }

    /// Bracketed paste. A pasted path to an existing file is treated as a
    /// file drop; anything else goes into the message box.
    pub fn handle_paste(&mut self, text: &str) {
        self.status = None;
        if let Mode::AttachPath { input } | Mode::EditWordCount { input } = &mut self.mode {
            input.push_str(text.trim());
            return;
        }
        if self.mode != Mode::Compose {
            return;
        }

        let trimmed = text.trim().trim_matches(|c| c == '\'' || c == '"');
        if !trimmed.contains('\n') && Path::new(trimmed).is_file() && !self.is_submitting() {
            self.attach(trimmed);
        } else {
            let mut input = self.session.input().to_string();
            input.push_str(text);
            self.session.set_input(input);
        }
    }

    fn handle_compose(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.session.push_input('\n');
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('o') if ctrl => {
                if self.is_submitting() {
                    self.status = Some(StatusLine::Error(
                        "Wait for the current summary to finish".into(),
                    ));
                } else {
                    self.mode = Mode::AttachPath {
                        input: String::new(),
                    };
                }
            }
            KeyCode::Char('r') if ctrl => {
                if self.session.attachment().is_some() && !self.is_submitting() {
                    self.session.remove_file();
                    self.status = Some(StatusLine::Info("Attachment removed".into()));
                }
            }
            KeyCode::Char('l') if ctrl => {
                if self.is_submitting() {
                    self.status = Some(StatusLine::Error(
                        "Wait for the current summary to finish".into(),
                    ));
                } else {
                    self.session.clear(&mut self.transcript);
                    self.status = Some(StatusLine::Info("Chat cleared".into()));
                }
            }
            KeyCode::Char('w') if ctrl => {
                self.mode = Mode::EditWordCount {
                    input: self.session.word_count().unwrap_or_default().to_string(),
                };
            }
            KeyCode::Char('y') if ctrl => self.copy_latest(),
            KeyCode::F(n @ 1..=4) => {
                let (_, prompt) = EXAMPLE_PROMPTS[usize::from(n - 1)];
                self.session.set_input(prompt);
            }
            KeyCode::PageUp => self.transcript.scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.transcript.scroll_down(SCROLL_STEP),
            KeyCode::Backspace => self.session.pop_input(),
            KeyCode::Char(c) if !ctrl => self.session.push_input(c),
            _ => {}
        }
    }

    fn handle_attach_path(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Compose;
                let path = input.trim().to_string();
                if !path.is_empty() {
                    self.attach(&path);
                }
            }
            KeyCode::Esc => self.mode = Mode::Compose,
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::AttachPath { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::AttachPath { input };
            }
            _ => {}
        }
    }

    fn handle_edit_word_count(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Enter => {
                let value = input.trim();
                let word_count = (!value.is_empty()).then(|| value.to_string());
                self.session.set_word_count(word_count);
                self.mode = Mode::Compose;
            }
            KeyCode::Esc => self.mode = Mode::Compose,
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::EditWordCount { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::EditWordCount { input };
            }
            _ => {}
        }
    }

    fn handle_manual_copy(&mut self, key: KeyEvent, text: String, mut scroll: u16) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Compose,
            KeyCode::Down | KeyCode::PageDown => {
                scroll = scroll.saturating_add(1);
                self.mode = Mode::ManualCopy { text, scroll };
            }
            KeyCode::Up | KeyCode::PageUp => {
                scroll = scroll.saturating_sub(1);
                self.mode = Mode::ManualCopy { text, scroll };
            }
            _ => {}
        }
    }

    fn attach(&mut self, path: &str) {
        self.status = Some(match self.session.select_path(path) {
            Ok(attachment) => StatusLine::Info(format!(
                "Attached {} ({})",
                attachment.name,
                attachment.display_size()
            )),
            Err(e) => StatusLine::Error(e.to_string()),
        });
    }

    fn submit(&mut self) {
        let request = match self.session.begin_submit() {
            Ok(request) => request,
            Err(e) => {
                self.status = Some(StatusLine::Error(e.to_string()));
                return;
            }
        };
        info!(
            has_text = request.main_content.is_some(),
            attachment = request.attachment_name().unwrap_or("-"),
            max_length = request.max_length,
            "submitting"
        );

        let service = Arc::clone(&self.service);
        let mut sink = ChannelSink::new(self.updates_tx.clone());
        self.in_flight = Some(self.runtime.spawn(async move {
            run_submission(service.as_ref(), &mut sink, &request).await
        }));
    }

    fn copy_latest(&mut self) {
        let Some(entry) = self.transcript.last_assistant() else {
            self.status = Some(StatusLine::Info("Nothing to copy yet".into()));
            return;
        };
        let text = entry.plain_text();
        match self.clipboard.set_text(&text) {
            Ok(()) => self.status = Some(StatusLine::Info("Copied to clipboard!".into())),
            Err(e) => {
                info!("clipboard copy failed: {e:#}");
                self.status = Some(StatusLine::Error("Please manually copy the text".into()));
                self.mode = Mode::ManualCopy { text, scroll: 0 };
            }
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let input_lines = self.session.input().lines().count().clamp(1, 6);
        let input_height = u16::try_from(input_lines).unwrap_or(6) + 2;
        let attachment_height = u16::from(self.session.attachment().is_some());

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(attachment_height),
                Constraint::Length(input_height),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        TranscriptView::new(&self.transcript, self.ticks / 4).render(frame, layout[1]);
        self.render_attachment(frame, layout[2]);
        self.render_input_box(frame, layout[3]);
        self.render_status_bar(frame, layout[4]);

        // Overlays
        match &self.mode {
            Mode::Compose => {}
            Mode::AttachPath { input } => {
                self.render_input_bar(frame, " Attach file (PDF, DOCX, TXT): ", input, area)
            }
            Mode::EditWordCount { input } => {
                self.render_input_bar(frame, " Summary length (words): ", input, area)
            }
            Mode::ManualCopy { text, scroll } => {
                self.render_scrollable_text(frame, " Copy manually ", text, *scroll, area)
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" lexbrief ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            Span::styled(
                "Legal Document Summarizer",
                Style::default().fg(Color::Yellow),
            ),
        ];
        if let Some(ref info) = self.server_info {
            spans.push(Span::styled(
                format!(" ({})", info.api_provider),
                Style::default().fg(Color::DarkGray),
            ));
        }
        let words = self.session.word_count().unwrap_or("500");
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{words} words"),
            Style::default().fg(Color::Magenta),
        ));
        frame.render_widget(Line::from(spans), area);
    }

    fn render_attachment(&self, frame: &mut Frame, area: Rect) {
        let Some(attachment) = self.session.attachment() else {
            return;
        };
        let line = Line::from(vec![
            Span::styled(" 📄 ", Style::default().fg(Color::Magenta)),
            Span::raw(attachment.name.clone()),
            Span::styled(
                format!(" ({})", format_bytes(attachment.size_bytes)),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(line, area);
    }

    fn render_input_box(&self, frame: &mut Frame, area: Rect) {
        let (title, color) = if self.is_submitting() {
            (" Summarizing... ", Color::DarkGray)
        } else {
            (" Message ", Color::Cyan)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title);
        let paragraph = Paragraph::new(self.session.input())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref status) = self.status {
            let color = match status {
                StatusLine::Info(_) => Color::Green,
                StatusLine::Error(_) => Color::Red,
            };
            let line = Line::from(Span::styled(
                format!(" {}", status.text()),
                Style::default().fg(color),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints = match &self.mode {
            Mode::Compose => vec![
                ("Enter", "send"),
                ("Alt+Enter", "newline"),
                ("^O", "attach"),
                ("^R", "detach"),
                ("^W", "words"),
                ("^Y", "copy"),
                ("^L", "clear"),
                ("F1-F4", "examples"),
                ("^Q", "quit"),
            ],
            Mode::AttachPath { .. } | Mode::EditWordCount { .. } => {
                vec![("Enter", "confirm"), ("Esc", "cancel")]
            }
            Mode::ManualCopy { .. } => vec![("↑/↓", "scroll"), ("Esc", "close")],
        };

        let spans: Vec<Span> = hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }

    fn render_input_bar(&self, frame: &mut Frame, label: &str, input: &str, area: Rect) {
        let input_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(3),
            width: area.width,
            height: 3.min(area.height),
        };
        frame.render_widget(Clear, input_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(label);
        let paragraph = Paragraph::new(input).block(block);
        frame.render_widget(paragraph, input_area);
    }

    fn render_scrollable_text(
        &self,
        frame: &mut Frame,
        title: &str,
        content: &str,
        scroll: u16,
        area: Rect,
    ) {
        let popup = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let paragraph = Paragraph::new(content)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(paragraph, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
