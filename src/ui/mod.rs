//! Main UI layout and rendering.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

pub mod components;

pub use components::*;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: [filter] [tree] [now playing]
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter
            Constraint::Min(5),    // Tree
            Constraint::Length(5), // Now playing
        ])
        .split(area);

    // Store layout areas for mouse detection
    app.layout.filter = main_chunks[0];
    app.layout.tree = main_chunks[1];

    render_filter(
        frame,
        main_chunks[0],
        &app.filter,
        app.model.root().file_count(),
    );

    let title = tree_title(&app.config.ui.root_label, app.model.music_dir());
    let filtering = !app.filter.applied().is_empty();
    render_tree(frame, main_chunks[1], &mut app.tree, &title, filtering);

    render_now_playing(frame, main_chunks[2], &mut app.now_playing);

    if app.show_help {
        render_help(frame, area);
    }

    if let Some(notice) = &app.notice {
        render_notice(frame, area, notice);
    }
}

/// Title of the tree panel.
fn tree_title(root_label: &str, music_dir: &str) -> String {
    if music_dir.is_empty() {
        root_label.to_string()
    } else {
        format!("{} ({})", root_label, music_dir)
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render the help overlay.
fn render_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Tree"),
        Line::from("  j/k or ↑/↓    Move up/down"),
        Line::from("  g/G           Jump to top/bottom"),
        Line::from("  Enter         Open folder / play track"),
        Line::from("  h/l or ←/→    Collapse/expand folder"),
        Line::from("  E/C           Expand/collapse all"),
        Line::from("  o             Reveal now playing"),
        Line::from("  /             Filter (Enter keeps, Esc clears)"),
        Line::from("  R             Reload library"),
        Line::from(""),
        section("Playback"),
        Line::from("  n/p           Next/Previous track"),
        Line::from("  s             Toggle shuffle"),
        Line::from("  +/-           Volume up/down"),
        Line::from(""),
        section("Other"),
        Line::from("  ?             Show this help"),
        Line::from("  x             Dismiss message"),
        Line::from("  q             Quit"),
        Line::from(""),
        section("Mouse"),
        Line::from("  Click         Select row"),
        Line::from("  Click again   Open folder / play track"),
        Line::from("  Click/drag    Set volume on the volume bar"),
        Line::from("  Scroll        Navigate tree"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Render a one-shot notice overlay.
fn render_notice(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(60, 20, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Notice (x to dismiss)")
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
