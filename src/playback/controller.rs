//! Turns user intent into service commands.
//!
//! The controller never talks to the network itself: it decides whether a
//! command should be issued and hands it back as a value. The app spawns
//! [`dispatch`] for each one and feeds the outcome back through the action
//! channel.

use std::time::{Duration, Instant};

use crate::client::{ApiClientError, PlaybackService};
use crate::config::TimingConfig;
use crate::session::{PendingVolume, SessionState};

/// A single request to the playback service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play { rel: String },
    Previous,
    Next,
    Shuffle,
    SetVolume(u8),
}

impl Command {
    /// Short description used in notices and logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Command::Play { .. } => "play",
            Command::Previous => "previous",
            Command::Next => "next",
            Command::Shuffle => "shuffle",
            Command::SetVolume(_) => "volume",
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// New shuffle state reported by the service
    Shuffle(bool),
}

/// Rate-limits play requests and coalesces volume changes.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    play_guard: Duration,
    volume_quiet: Duration,
}

impl PlaybackController {
    pub fn new(timing: &TimingConfig) -> Self {
        Self::with_windows(timing.play_guard(), timing.volume_quiet())
    }

    pub fn with_windows(play_guard: Duration, volume_quiet: Duration) -> Self {
        Self {
            play_guard,
            volume_quiet,
        }
    }

    /// Request playback of `rel`.
    ///
    /// Rejected while an earlier play is still inside the guard window,
    /// whichever track it was for.
    pub fn play(&self, session: &mut SessionState, rel: &str, now: Instant) -> Option<Command> {
        if let Some(last) = session.last_play {
            if now.saturating_duration_since(last) < self.play_guard {
                tracing::debug!(rel, "Play ignored, too soon after the previous one");
                return None;
            }
        }

        session.last_play = Some(now);
        Some(Command::Play {
            rel: rel.to_string(),
        })
    }

    pub fn previous(&self) -> Command {
        Command::Previous
    }

    pub fn next(&self) -> Command {
        Command::Next
    }

    pub fn shuffle(&self) -> Command {
        Command::Shuffle
    }

    /// Record a new volume from the slider. Nothing is sent yet.
    pub fn slide_volume(&self, session: &mut SessionState, value: u8, now: Instant) {
        session.volume_dragging = true;
        session.pending_volume = Some(PendingVolume {
            value: value.min(100),
            last_slide: now,
        });
    }

    /// Emit the coalesced volume once the slider has been quiet long enough.
    ///
    /// Only one volume request is outstanding at a time; values arriving in
    /// the meantime wait for [`volume_settled`](Self::volume_settled).
    pub fn flush_volume(&self, session: &mut SessionState, now: Instant) -> Option<Command> {
        if session.volume_in_flight {
            return None;
        }

        let pending = session.pending_volume?;
        if now.saturating_duration_since(pending.last_slide) < self.volume_quiet {
            return None;
        }

        session.pending_volume = None;
        session.volume_in_flight = true;
        Some(Command::SetVolume(pending.value))
    }

    /// A volume request finished, successfully or not.
    pub fn volume_settled(&self, session: &mut SessionState) {
        session.volume_in_flight = false;
        if session.pending_volume.is_none() {
            session.volume_dragging = false;
        }
    }
}

/// Perform exactly one service request for a command.
pub async fn dispatch(
    service: &dyn PlaybackService,
    command: &Command,
) -> Result<CommandOutcome, ApiClientError> {
    match command {
        Command::Play { rel } => service.play(rel).await.map(|_| CommandOutcome::Done),
        Command::Previous => service.previous().await.map(|_| CommandOutcome::Done),
        Command::Next => service.next().await.map(|_| CommandOutcome::Done),
        Command::Shuffle => service.shuffle().await.map(CommandOutcome::Shuffle),
        Command::SetVolume(value) => service.set_volume(*value).await.map(|_| CommandOutcome::Done),
    }
}
