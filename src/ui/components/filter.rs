//! Keyword filter bar.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Filter input state.
///
/// Edits are debounced: the tree is only re-filtered once typing has paused
/// for the quiet period.
#[derive(Debug, Default)]
pub struct FilterState {
    /// Whether the input has focus
    pub active: bool,

    /// Current keyword
    pub query: String,

    /// Quiet period after the last edit
    quiet: Duration,

    /// Last time the query was modified (for debouncing)
    last_change: Option<Instant>,

    /// The keyword the tree currently reflects
    applied: String,
}

impl FilterState {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            ..Self::default()
        }
    }

    /// Focus the input, keeping the current keyword.
    pub fn open(&mut self) {
        self.active = true;
    }

    /// Leave the input, keeping the keyword applied.
    pub fn confirm(&mut self, now: Instant) {
        self.active = false;
        self.apply_now(now);
    }

    /// Leave the input and drop the keyword.
    pub fn clear(&mut self, now: Instant) {
        self.active = false;
        self.query.clear();
        self.apply_now(now);
    }

    /// Skip the quiet period for the current keyword.
    fn apply_now(&mut self, now: Instant) {
        if self.query != self.applied {
            self.last_change = Some(now.checked_sub(self.quiet).unwrap_or(now));
        }
    }

    /// Add character to query and mark as changed.
    pub fn input(&mut self, c: char, now: Instant) {
        self.query.push(c);
        self.last_change = Some(now);
    }

    /// Remove last character from query and mark as changed.
    pub fn backspace(&mut self, now: Instant) {
        if self.query.pop().is_some() {
            self.last_change = Some(now);
        }
    }

    /// Check if the debounced keyword should be applied now.
    pub fn should_apply(&self, now: Instant) -> bool {
        if self.query == self.applied {
            return false;
        }

        match self.last_change {
            Some(last_change) => now.saturating_duration_since(last_change) >= self.quiet,
            None => false,
        }
    }

    /// Record that the tree now reflects the current keyword.
    pub fn mark_applied(&mut self) -> &str {
        self.applied = self.query.clone();
        self.last_change = None;
        &self.applied
    }

    /// The keyword the tree currently reflects.
    pub fn applied(&self) -> &str {
        &self.applied
    }
}

/// Render the filter bar.
pub fn render_filter(frame: &mut Frame, area: Rect, state: &FilterState, file_count: usize) {
    let border_color = if state.active {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Filter ")
        .border_style(Style::default().fg(border_color));

    let line = if state.active || !state.query.is_empty() {
        let cursor = if state.active { "_" } else { "" };
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}{}", state.query, cursor),
                Style::default().fg(Color::White),
            ),
        ])
    } else {
        Line::from(Span::styled(
            format!("{} tracks  (press / to filter, ? for help)", file_count),
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}
