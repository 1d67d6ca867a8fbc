//! UI rendering functions for the chat TUI.
//!
//! Transcript on the left, assistant info and sample questions on the
//! right, message input and shortcut bar along the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::{App, ChatEntry, Focus, Speaker};
use crate::demo::SAMPLE_QUESTIONS;

const THINKING_MARKER: &str = "AI agents analyzing your request...";

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Message input
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main_chunks[0]);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(app.mode().features().len() as u16 + 2),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(content_chunks[1]);

    render_transcript(frame, app, content_chunks[0]);
    render_mode_panel(frame, app, side_chunks[0]);
    render_stats(frame, app, side_chunks[1]);
    render_samples(frame, app, side_chunks[2]);
    render_input(frame, app, main_chunks[1]);
    render_shortcut_bar(frame, app, main_chunks[2]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Chat with Your AI Assistant")
        .border_style(border_style(app.focus() == Focus::Transcript));

    let mut text = Text::default();
    if app.messages().is_empty() && !app.is_thinking() {
        text.lines.push(Line::styled(
            "Ask about real estate, mortgages, or property analysis...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    for entry in app.messages() {
        push_entry(&mut text, entry);
        text.lines.push(Line::from(""));
    }

    if app.is_thinking() {
        text.lines.push(Line::styled(
            THINKING_MARKER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    let offset = transcript_offset(&paragraph, area, app.scrollback());

    frame.render_widget(paragraph.scroll((offset, 0)), area);
}

/// Top row that keeps the newest line in view, moved up by `scrollback`.
fn transcript_offset(paragraph: &Paragraph<'_>, area: Rect, scrollback: u16) -> u16 {
    let rows = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);
    rows.saturating_sub(area.height).saturating_sub(scrollback)
}

fn push_entry(text: &mut Text<'_>, entry: &ChatEntry) {
    let (name, style) = match entry.speaker {
        Speaker::User => ("You", Style::default().fg(Color::Cyan)),
        Speaker::Assistant => ("Assistant", Style::default().fg(Color::Green)),
        Speaker::Error => ("Error", Style::default().fg(Color::Red)),
    };

    let mut header = vec![Span::styled(
        format!("{name}:"),
        style.add_modifier(Modifier::BOLD),
    )];
    if let Some(label) = entry.label {
        header.push(Span::raw(" "));
        header.push(Span::styled(
            label,
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    text.lines.push(Line::from(header));

    let body_style = if entry.speaker == Speaker::Error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    for line in entry.content.lines() {
        text.lines.push(Line::styled(line.to_string(), body_style));
    }
}

fn render_mode_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mode = app.mode();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} (F2)", mode.title()));

    let lines: Vec<Line> = mode
        .features()
        .iter()
        .map(|(name, detail)| {
            Line::from(vec![
                Span::raw("- "),
                Span::styled(*name, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(": "),
                Span::raw(*detail),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("System Stats");
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(vec![
            Span::styled("Messages", bold),
            Span::raw(format!(": {}", app.messages().len())),
        ]),
        Line::from(vec![
            Span::styled("Agent Mode", bold),
            Span::raw(format!(": {}", app.mode().title())),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_samples(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus() == Focus::Samples;
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Try These Questions")
        .border_style(border_style(focused));

    let items: Vec<ListItem> = SAMPLE_QUESTIONS
        .iter()
        .map(|question| ListItem::new(Line::from(*question)))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(app.sample_index()));
    }

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus() == Focus::Input;
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Message")
        .border_style(border_style(focused));

    let mut content = app.input().to_string();
    if focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Shows keyboard shortcuts for the focused panel.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut shortcuts = vec![
        ("Ctrl+C", "quit"),
        ("F2", "mode"),
        ("Tab", "next panel"),
        ("Esc", "input"),
        ("Ctrl+L", "clear"),
    ];
    match app.focus() {
        Focus::Input => shortcuts.push(("Enter", "send")),
        Focus::Transcript => shortcuts.push(("j/k", "scroll")),
        Focus::Samples => {
            shortcuts.push(("j/k", "navigate"));
            shortcuts.push(("Enter", "ask"));
        }
    }

    let mut spans = Vec::new();
    for (i, (key, action)) in shortcuts.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
