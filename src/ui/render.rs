// src/ui/render.rs

//! Screen rendering
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Header (3 lines)                         │
//! ├──────────────────────────────────────────┤
//! │ Body (current screen)                    │
//! ├──────────────────────────────────────────┤
//! │ Key hints (1 line)                       │
//! └──────────────────────────────────────────┘
//! ```

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::state::{AppState, MENU, Screen};
use crate::theme::{COMMANDS, HOW_TO_ADD, Theme, Tone};

/// Render the whole UI for the current state
pub fn render_ui(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_header(frame, chunks[0], theme);

    match &state.screen {
        Screen::Menu => render_menu(frame, chunks[1], state, theme),
        Screen::Input { action } => render_input(
            frame,
            chunks[1],
            action.prompt().unwrap_or("Enter value"),
            &state.input,
            theme,
        ),
        Screen::Running { operation, log } => {
            render_running(frame, chunks[1], operation, log, state.spinner(), theme)
        }
        Screen::Result {
            success,
            message,
            details,
        } => render_result(frame, chunks[1], *success, message, details, theme),
        Screen::Found { entries, selected } => {
            let items: Vec<ListItem> = entries
                .iter()
                .map(|entry| {
                    ListItem::new(Line::from(vec![
                        Span::styled(entry.name.clone(), theme.style(Tone::Highlight)),
                        Span::raw(" -> "),
                        Span::styled(entry.url.clone(), theme.style(Tone::Muted)),
                    ]))
                })
                .collect();
            render_list(frame, chunks[1], "Search results", items, *selected, theme);
        }
        Screen::Help => {
            let lines = COMMANDS
                .iter()
                .map(|(command, description)| {
                    Line::from(vec![
                        Span::styled(format!("{:<20}", command), theme.style(Tone::Highlight)),
                        Span::raw(*description),
                    ])
                })
                .collect();
            render_text(frame, chunks[1], "Help", lines, theme);
        }
        Screen::HowToAdd => {
            let mut lines = vec![
                Line::from("To add your repository to zcr, add a line to library/repo-list.zcr:"),
                Line::from(Span::styled(
                    "  your-package -> https://github.com/you/your-package.git",
                    theme.style(Tone::Highlight),
                )),
                Line::from(""),
            ];
            lines.extend(HOW_TO_ADD.iter().map(|(label, url)| {
                Line::from(vec![
                    Span::styled(format!("{:<16}", label), theme.style(Tone::Subtitle)),
                    Span::raw(*url),
                ])
            }));
            render_text(frame, chunks[1], "How to add your repository", lines, theme);
        }
    }

    render_hints(frame, chunks[2], &state.screen, theme);
}

fn render_header(frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = Line::from(vec![
        Span::styled("zcr", theme.style(Tone::Title)),
        Span::raw("  "),
        Span::styled("Zenit Community Repository", theme.style(Tone::Subtitle)),
    ]);
    let header = Paragraph::new(title).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_menu(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let items: Vec<ListItem> = MENU
        .iter()
        .map(|action| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<12}", action.label()), theme.style(Tone::Highlight)),
                Span::styled(action.description(), theme.style(Tone::Muted)),
            ]))
        })
        .collect();
    render_list(frame, area, "Menu", items, state.menu_selected, theme);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem>,
    selected: usize,
    theme: &Theme,
) {
    let list = List::new(items)
        .block(block(title, theme))
        .highlight_symbol("➜ ")
        .highlight_style(theme.style(Tone::Subtitle));
    let mut list_state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_input(frame: &mut Frame, area: Rect, prompt: &str, input: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(prompt.to_string(), theme.style(Tone::Subtitle))),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", theme.style(Tone::Highlight)),
            Span::raw(input.to_string()),
            Span::styled("▏", theme.style(Tone::Highlight)),
        ]),
    ];
    render_text(frame, area, "Input", lines, theme);
}

fn render_running(
    frame: &mut Frame,
    area: Rect,
    operation: &str,
    log: &[String],
    spinner: char,
    theme: &Theme,
) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", spinner), theme.style(Tone::Highlight)),
            Span::raw(format!("Running {}", operation)),
        ]),
        Line::from(""),
    ];

    // Keep the most recent lines visible
    let visible = (area.height as usize).saturating_sub(4);
    let skip = log.len().saturating_sub(visible);
    lines.extend(log.iter().skip(skip).map(|entry| {
        let tone = if entry.starts_with("warning:") {
            Tone::Warning
        } else {
            Tone::Info
        };
        Line::from(Span::styled(entry.clone(), theme.style(tone)))
    }));

    render_text(frame, area, "Working", lines, theme);
}

fn render_result(
    frame: &mut Frame,
    area: Rect,
    success: bool,
    message: &str,
    details: &[String],
    theme: &Theme,
) {
    let (tone, marker) = if success {
        (Tone::Success, "✔ ")
    } else {
        (Tone::Error, "✖ ")
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(marker, theme.style(tone)),
        Span::raw(message.to_string()),
    ])];
    if !details.is_empty() {
        lines.push(Line::from(""));
        lines.extend(
            details
                .iter()
                .map(|detail| Line::from(Span::styled(detail.clone(), theme.style(Tone::Error)))),
        );
    }
    render_text(frame, area, "Result", lines, theme);
}

fn render_text(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, theme: &Theme) {
    let paragraph = Paragraph::new(lines)
        .block(block(title, theme))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_hints(frame: &mut Frame, area: Rect, screen: &Screen, theme: &Theme) {
    let hints = match screen {
        Screen::Menu => "↑/↓ move  Enter select  q quit",
        Screen::Input { .. } => "Enter confirm  Esc back",
        Screen::Running { .. } => "Please wait...  q quit",
        Screen::Found { .. } => "↑/↓ move  Enter install  Esc back",
        Screen::Result { .. } | Screen::Help | Screen::HowToAdd => "Enter/Esc back",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hints, theme.style(Tone::Muted))),
        area,
    );
}

fn block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", title), theme.style(Tone::Subtitle)))
}
