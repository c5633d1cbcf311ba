use lexbrief_core::transcript::PENDING_TEXT;
use lexbrief_core::{Role, Transcript, TranscriptEntry};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Preset instructions offered on the welcome screen, bound to F1..F4.
pub const EXAMPLE_PROMPTS: &[(&str, &str)] = &[
    (
        "Payment Focus",
        "Summarize focusing on payment terms and financial obligations",
    ),
    (
        "Dates & Deadlines",
        "Summarize highlighting key dates and deadlines",
    ),
    (
        "Parties & Roles",
        "Summarize emphasizing parties and their roles",
    ),
    (
        "Risk Analysis",
        "Summarize with focus on legal risks and compliance",
    ),
];

const SPINNER: &[&str] = &["   ", ".  ", ".. ", "..."];

/// Scrollable view of the conversation.
///
/// Lines are wrapped here rather than by `Paragraph` so the total height is
/// known and the view can stay pinned to the newest entry.
pub struct TranscriptView<'a> {
    transcript: &'a Transcript,
    tick: usize,
}

impl<'a> TranscriptView<'a> {
    pub fn new(transcript: &'a Transcript, tick: usize) -> Self {
        Self { transcript, tick }
    }

    /// Wrapped lines for a viewport `width` columns wide.
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = usize::from(width.max(8));
        if self.transcript.is_empty() && !self.transcript.is_pending() {
            return welcome_lines(width);
        }

        let mut lines = Vec::new();
        for entry in self.transcript.entries() {
            push_entry(&mut lines, entry, width);
        }
        if self.transcript.is_pending() {
            let dots = SPINNER[self.tick % SPINNER.len()];
            lines.push(Line::from(Span::styled(
                format!("{} ", Role::Assistant.display_name()),
                role_style(Role::Assistant),
            )));
            lines.push(Line::from(Span::styled(
                format!("  {PENDING_TEXT}{dots}"),
                Style::default().fg(Color::DarkGray).italic(),
            )));
        }
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Conversation ({}) ", self.transcript.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        let lines = self.lines(inner.width);

        let offset = scroll_offset(lines.len(), inner.height, self.transcript.scroll_back());

        let paragraph = Paragraph::new(lines).block(block).scroll((offset, 0));
        frame.render_widget(paragraph, area);
    }
}

/// Top row to show so the newest line sits at the bottom, moved up by
/// `scroll_back` rows.
fn scroll_offset(total_lines: usize, height: u16, scroll_back: u16) -> u16 {
    let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
    total
        .saturating_sub(height)
        .saturating_sub(scroll_back)
}

fn push_entry(lines: &mut Vec<Line<'static>>, entry: &TranscriptEntry, width: usize) {
    lines.push(Line::from(vec![
        Span::styled(
            format!("{} ", entry.role.display_name()),
            role_style(entry.role),
        ),
        Span::styled(entry.display_time(), Style::default().fg(Color::DarkGray)),
    ]));
    if let Some(ref name) = entry.attachment_name {
        lines.push(Line::from(Span::styled(
            format!("  📄 {name}"),
            Style::default().fg(Color::Magenta),
        )));
    }

    let text = entry.plain_text();
    let style = if text.starts_with('❌') {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let body_width = width.saturating_sub(2).max(1);
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for wrapped in textwrap::wrap(paragraph, body_width) {
            lines.push(Line::from(Span::styled(format!("  {wrapped}"), style)));
        }
    }
    lines.push(Line::from(""));
}

fn welcome_lines(width: usize) -> Vec<Line<'static>> {
    let intro = "Upload or paste legal documents to get structured summaries of \
                 court orders, contracts, deeds, tax and regulatory documents.";
    let mut lines = vec![
        Line::from(Span::styled(
            "📄 Legal Document Summarizer",
            Style::default().bold().fg(Color::Cyan),
        )),
        Line::from(""),
    ];
    for wrapped in textwrap::wrap(intro, width) {
        lines.push(Line::from(wrapped.into_owned()));
    }
    lines.push(Line::from(""));
    for (i, (label, _)) in EXAMPLE_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" F{} ", i + 1), Style::default().fg(Color::Yellow).bold()),
            Span::raw(*label),
        ]));
    }
    lines
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green).bold(),
        Role::Assistant => Style::default().fg(Color::Cyan).bold(),
    }
}
