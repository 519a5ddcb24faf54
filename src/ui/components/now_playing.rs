//! Now playing bar component.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Label shown when no progress is known.
pub const EMPTY_PROGRESS: &str = "--:-- / --:--";

/// Now playing state, as last reported by the service.
#[derive(Debug, Clone)]
pub struct NowPlayingState {
    /// `rel` of the current track
    pub track: Option<String>,

    /// Elapsed / duration label
    pub progress_label: String,

    /// Progress (0-100)
    pub percent: u16,

    /// Playback paused
    pub paused: bool,

    /// Volume (0-100)
    pub volume: u8,

    /// Shuffle state, once known
    pub shuffle: Option<bool>,

    /// Volume bar area from the last render, for mouse input
    volume_area: Rect,
}

impl Default for NowPlayingState {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlayingState {
    pub fn new() -> Self {
        Self {
            track: None,
            progress_label: String::from(EMPTY_PROGRESS),
            percent: 0,
            paused: false,
            volume: 0,
            shuffle: None,
            volume_area: Rect::default(),
        }
    }

    /// File name of the current track.
    pub fn title(&self) -> Option<&str> {
        self.track
            .as_deref()
            .map(|rel| rel.rsplit('/').next().unwrap_or(rel))
    }

    /// Get play/pause symbol.
    pub fn state_symbol(&self) -> &'static str {
        match (&self.track, self.paused) {
            (None, _) => "■ ",
            (Some(_), true) => "⏸ ",
            (Some(_), false) => "▶ ",
        }
    }

    /// Get shuffle label.
    pub fn shuffle_label(&self) -> &'static str {
        match self.shuffle {
            Some(true) => "shuffle on",
            Some(false) => "shuffle off",
            None => "",
        }
    }

    /// Nothing is playing.
    pub fn clear(&mut self) {
        self.track = None;
        self.progress_label = String::from(EMPTY_PROGRESS);
        self.percent = 0;
        self.paused = false;
    }

    /// Volume for a click or drag at a terminal position on the volume bar.
    pub fn volume_at(&self, x: u16, y: u16) -> Option<u8> {
        let area = self.volume_area;
        if area.width == 0 || y < area.y || y >= area.y + area.height {
            return None;
        }
        if x < area.x || x >= area.x + area.width {
            return None;
        }
        let offset = (x - area.x) as u32;
        let span = area.width.saturating_sub(1).max(1) as u32;
        Some(((offset * 100 + span / 2) / span).min(100) as u8)
    }

    /// Whether a terminal row belongs to the volume bar.
    pub fn on_volume_row(&self, y: u16) -> bool {
        let area = self.volume_area;
        area.width > 0 && y >= area.y && y < area.y + area.height
    }

    /// Clamp an x coordinate to the volume bar and convert it.
    pub fn volume_at_clamped(&self, x: u16) -> Option<u8> {
        let area = self.volume_area;
        if area.width == 0 {
            return None;
        }
        let x = x.clamp(area.x, area.x + area.width - 1);
        self.volume_at(x, area.y)
    }
}

/// Render the now playing bar.
pub fn render_now_playing(frame: &mut Frame, area: Rect, state: &mut NowPlayingState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Now Playing ")
        .border_style(Style::default().fg(Color::Magenta));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 {
        state.volume_area = Rect::default();
        return;
    }

    // Layout: [track info] [progress] [volume]
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let info_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(2),  // Play state
            Constraint::Min(10),    // Track
            Constraint::Length(12), // Shuffle
        ])
        .split(chunks[0]);

    let symbol = Paragraph::new(state.state_symbol()).style(Style::default().fg(Color::Green));
    frame.render_widget(symbol, info_chunks[0]);

    let info = match (state.title(), state.track.as_deref()) {
        (Some(title), Some(rel)) => {
            let mut spans = vec![Span::styled(
                title.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )];
            // Full path only when it fits next to the title.
            if title.width() + 2 + rel.width() <= info_chunks[1].width as usize {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    rel.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
        _ => Line::from(Span::styled(
            "Not playing",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(info), info_chunks[1]);

    let shuffle = Paragraph::new(state.shuffle_label()).style(Style::default().fg(Color::Yellow));
    frame.render_widget(shuffle, info_chunks[2]);

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::DarkGray))
        .percent(state.percent.min(100))
        .label(state.progress_label.clone());
    frame.render_widget(progress, chunks[1]);

    let volume_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(8), Constraint::Min(10)])
        .split(chunks[2]);

    let label = Paragraph::new(format!("vol {:>3}", state.volume))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(label, volume_chunks[0]);

    let volume = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(u16::from(state.volume.min(100)))
        .label("");
    frame.render_widget(volume, volume_chunks[1]);
    state.volume_area = volume_chunks[1];
}
