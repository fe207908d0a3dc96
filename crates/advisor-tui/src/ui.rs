use advisor_core::persona::THINKING_PLACEHOLDER;
use advisor_core::surface::LogEntry;
use advisor_core::{ChatRole, MessageLog, TurnOutcome};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Word-wrap one paragraph to `width` columns.
///
/// The paragraph's leading whitespace is kept on the first line and repeated
/// on continuation lines, so indented list items in a reply stay indented.
/// Words longer than the available width are left whole.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let body = text.trim_start();
    let mut indent = &text[..text.len() - body.len()];
    if indent.chars().count() >= width {
        indent = "";
    }
    let indent_len = indent.chars().count();

    let mut lines = Vec::new();
    let mut line = indent.to_string();
    let mut line_len = indent_len;

    for word in body.split_whitespace() {
        let word_len = word.chars().count();
        if line_len == indent_len {
            line.push_str(word);
            line_len += word_len;
        } else if line_len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut line, format!("{indent}{word}")));
            line_len = indent_len + word_len;
        }
    }

    if line_len > indent_len {
        lines.push(line);
    } else if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn sender_style(sender: &str) -> Style {
    let color = match ChatRole::from_label(sender) {
        Some(ChatRole::User) => Color::Cyan,
        Some(ChatRole::Assistant) => Color::Yellow,
        None => Color::Magenta,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Lines for one entry: the sender label, the wrapped text, a blank line.
fn entry_lines(entry: &LogEntry, width: usize, thinking_dots: Option<usize>) -> Vec<Line<'static>> {
    let rendered = &entry.entry;
    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", rendered.sender),
        sender_style(&rendered.sender),
    ))];

    match thinking_dots {
        Some(dots) => {
            // Animated ellipsis: cycles through ".", "..", "..."
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", ".".repeat(dots)),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        None => {
            for paragraph in rendered.text.split('\n') {
                for line in wrap_text_to_width(paragraph, width) {
                    lines.push(Line::from(line));
                }
            }
        }
    }

    lines.push(Line::default());
    lines
}

/// All chat lines, greeting first.
fn chat_lines(log: &MessageLog, width: usize, loading: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = wrap_text_to_width(log.greeting(), width)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::DarkGray))))
        .collect();
    lines.push(Line::default());

    let last = log.entries().len().saturating_sub(1);
    for (i, entry) in log.entries().iter().enumerate() {
        let is_placeholder = loading
            && i == last
            && entry.entry.text == THINKING_PLACEHOLDER
            && ChatRole::from_label(&entry.entry.sender) == Some(ChatRole::Assistant);
        let dots = is_placeholder.then_some(animation_frame as usize + 1);
        lines.extend(entry_lines(entry, width, dots));
    }

    lines
}

/// Top line offset so that `scroll_back` lines from the bottom are hidden.
fn scroll_offset(total_lines: usize, visible_height: u16, scroll_back: u16) -> u16 {
    let max_offset = total_lines.saturating_sub(visible_height as usize);
    let max_offset = u16::try_from(max_offset).unwrap_or(u16::MAX);
    max_offset.saturating_sub(scroll_back)
}

fn outcome_label(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Replied => "replied".to_string(),
        TurnOutcome::MissingReply => "no reply in response".to_string(),
        TurnOutcome::HttpFailure { status } => format!("HTTP {}", status),
        TurnOutcome::MalformedBody => "malformed response".to_string(),
        TurnOutcome::ServiceError { code } => format!("service error {}", code),
        TurnOutcome::TransportFailure => "network error".to_string(),
        TurnOutcome::Ignored | TurnOutcome::Busy => String::new(),
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Beauty Advisor ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let loading = app.is_loading();
    let animation_frame = app.animation_frame;
    let width = app.chat_width as usize;
    let height = app.chat_height;

    let (lines, offset) = {
        let mut log = app.log();
        let lines = chat_lines(&log, width, loading, animation_frame);
        let max_back = lines.len().saturating_sub(height as usize);
        log.clamp_scroll(u16::try_from(max_back).unwrap_or(u16::MAX));
        let offset = scroll_offset(lines.len(), height, log.scroll_back());
        (lines, offset)
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((offset, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let log = app.log();
    let enabled = log.is_input_enabled();

    let (border_color, title) = if enabled {
        (Color::Yellow, " Ask about L'Oréal products and routines ")
    } else {
        (Color::DarkGray, " Waiting for the advisor... ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = log.cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = log.input().chars().skip(scroll_offset).take(inner_width).collect();

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(visible_text).style(text_style).block(input_block);
    frame.render_widget(input, area);

    if enabled {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Enter ", Style::default().fg(Color::Black).bg(Color::Yellow)),
        Span::raw(" send  "),
        Span::styled(" ↑↓ PgUp PgDn ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" scroll  "),
        Span::styled(" Ctrl+S ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" save  "),
        Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" quit "),
    ];

    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Green)));
    } else if let Some(outcome) = &app.last_outcome {
        spans.push(Span::styled(
            format!(" last turn: {} ", outcome_label(outcome)),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
