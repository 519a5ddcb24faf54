//! Status polling and reconciliation.
//!
//! [`PollSchedule`] decides when a status request may start; the request itself
//! runs on a spawned task and its result comes back as an action, where
//! [`StatusPoller::reconcile`] applies it to the UI state.

use std::time::{Duration, Instant};

use crate::client::models::{volume_percent, PlaybackStatus};
use crate::library::locator;
use crate::session::SessionState;
use crate::ui::components::now_playing::NowPlayingState;
use crate::ui::components::tree::TreeViewState;

/// Phase of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Waiting for the next tick
    Idle { next_at: Instant },
    /// A status request is outstanding
    Requesting,
    /// Polling has ended
    Stopped,
}

/// Fixed-interval schedule that never lets two requests overlap.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    phase: PollPhase,
    interval: Duration,
}

impl PollSchedule {
    pub fn new(now: Instant, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            phase: PollPhase::Idle {
                next_at: now + initial_delay,
            },
            interval,
        }
    }

    /// Start a request if one is due. Returns true when the caller should
    /// issue it.
    pub fn begin_if_due(&mut self, now: Instant) -> bool {
        match self.phase {
            PollPhase::Idle { next_at } if now >= next_at => {
                self.phase = PollPhase::Requesting;
                true
            }
            _ => false,
        }
    }

    /// The outstanding request finished; schedule the next one.
    pub fn settle(&mut self, now: Instant) {
        if self.phase == PollPhase::Requesting {
            self.phase = PollPhase::Idle {
                next_at: now + self.interval,
            };
        }
    }

    pub fn stop(&mut self) {
        self.phase = PollPhase::Stopped;
    }

    #[allow(dead_code)]
    pub fn is_stopped(&self) -> bool {
        self.phase == PollPhase::Stopped
    }
}

/// Format seconds as `m:ss`, or `--:--` when unknown.
pub fn format_clock(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => String::from("--:--"),
    }
}

/// Progress through the track, 0-100.
pub fn progress_percent(time: Option<f64>, duration: Option<f64>) -> u16 {
    match (time, duration) {
        (Some(time), Some(duration)) if duration.is_finite() && duration > 0.0 && time.is_finite() => {
            (time / duration * 100.0).clamp(0.0, 100.0) as u16
        }
        _ => 0,
    }
}

/// Drives status polling and applies each result.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    pub schedule: PollSchedule,
}

impl StatusPoller {
    pub fn new(now: Instant, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            schedule: PollSchedule::new(now, initial_delay, interval),
        }
    }

    /// Apply one poll result.
    ///
    /// A failed poll leaves everything as it was; the next tick tries again.
    pub fn reconcile(
        &self,
        outcome: &Result<PlaybackStatus, String>,
        session: &mut SessionState,
        tree: &mut TreeViewState,
        now_playing: &mut NowPlayingState,
    ) {
        let status = match outcome {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!("Status poll failed: {}", e);
                return;
            }
        };

        let Some(rel) = status.current_rel() else {
            tree.clear_highlight();
            now_playing.clear();
            return;
        };

        let mpv = status.mpv.clone().unwrap_or_default();
        now_playing.progress_label = format!(
            "{} / {}",
            format_clock(mpv.time),
            format_clock(mpv.duration)
        );
        now_playing.percent = progress_percent(mpv.time, mpv.duration);
        now_playing.paused = mpv.paused;

        // The user's slider wins over the service while it's being moved.
        if !session.volume_dragging {
            if let Some(volume) = mpv.volume {
                now_playing.volume = volume_percent(volume);
            }
        }

        if now_playing.track.as_deref() != Some(rel) {
            tracing::info!(rel, "Now playing");
        }
        now_playing.track = Some(rel.to_string());
        tree.set_highlight(rel);
        locator::expand_to(rel, session, tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::{MpvState, PlayingTrack};
    use crate::library::model::tests::sample_tree;

    fn status(rel: &str, time: f64, duration: f64, volume: f64) -> PlaybackStatus {
        PlaybackStatus {
            playing: Some(PlayingTrack {
                rel: rel.to_string(),
            }),
            mpv: Some(MpvState {
                time: Some(time),
                duration: Some(duration),
                paused: false,
                volume: Some(volume),
            }),
        }
    }

    struct Fixture {
        poller: StatusPoller,
        session: SessionState,
        tree: TreeViewState,
        now_playing: NowPlayingState,
    }

    impl Fixture {
        fn new() -> Self {
            let session = SessionState::new();
            let mut tree = TreeViewState::new();
            tree.set_view(sample_tree(), &session.collapse);
            Self {
                poller: StatusPoller::new(Instant::now(), Duration::ZERO, Duration::from_secs(2)),
                session,
                tree,
                now_playing: NowPlayingState::new(),
            }
        }

        fn apply(&mut self, outcome: Result<PlaybackStatus, String>) {
            self.poller
                .reconcile(&outcome, &mut self.session, &mut self.tree, &mut self.now_playing);
        }
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Some(0.0)), "0:00");
        assert_eq!(format_clock(Some(30.4)), "0:30");
        assert_eq!(format_clock(Some(125.9)), "2:05");
        assert_eq!(format_clock(Some(3600.0)), "60:00");
        assert_eq!(format_clock(None), "--:--");
        assert_eq!(format_clock(Some(f64::NAN)), "--:--");
        assert_eq!(format_clock(Some(f64::INFINITY)), "--:--");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(Some(30.0), Some(120.0)), 25);
        assert_eq!(progress_percent(Some(130.0), Some(120.0)), 100);
        assert_eq!(progress_percent(Some(30.0), Some(0.0)), 0);
        assert_eq!(progress_percent(Some(30.0), None), 0);
        assert_eq!(progress_percent(None, Some(120.0)), 0);
    }

    #[test]
    fn test_schedule_never_overlaps() {
        let t0 = Instant::now();
        let mut schedule =
            PollSchedule::new(t0, Duration::from_millis(1500), Duration::from_millis(2000));

        assert!(!schedule.begin_if_due(t0 + Duration::from_millis(1000)));
        assert!(schedule.begin_if_due(t0 + Duration::from_millis(1500)));
        // Slow request: ticks keep arriving but nothing new starts.
        assert!(!schedule.begin_if_due(t0 + Duration::from_millis(4000)));
        assert!(!schedule.begin_if_due(t0 + Duration::from_millis(9000)));

        schedule.settle(t0 + Duration::from_millis(9000));
        assert!(!schedule.begin_if_due(t0 + Duration::from_millis(10000)));
        assert!(schedule.begin_if_due(t0 + Duration::from_millis(11000)));
    }

    #[test]
    fn test_stopped_schedule_stays_stopped() {
        let t0 = Instant::now();
        let mut schedule = PollSchedule::new(t0, Duration::ZERO, Duration::from_millis(2000));
        assert!(schedule.begin_if_due(t0));
        schedule.stop();
        schedule.settle(t0);
        assert!(schedule.is_stopped());
        assert!(!schedule.begin_if_due(t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_reconcile_playing_track() {
        let mut f = Fixture::new();
        f.apply(Ok(status("A/Live/c.mp3", 30.0, 120.0, 64.6)));

        assert_eq!(f.now_playing.progress_label, "0:30 / 2:00");
        assert_eq!(f.now_playing.percent, 25);
        assert_eq!(f.now_playing.volume, 65);
        assert!(!f.now_playing.paused);
        assert_eq!(f.tree.highlight(), Some("A/Live/c.mp3"));
        assert!(f.tree.row_of("A/Live/c.mp3").is_some());
        assert_eq!(f.session.last_located.as_deref(), Some("A/Live/c.mp3"));
    }

    #[test]
    fn test_missing_mpv_fields_show_placeholders() {
        let mut f = Fixture::new();
        f.apply(Ok(PlaybackStatus {
            playing: Some(PlayingTrack {
                rel: String::from("top.wav"),
            }),
            mpv: None,
        }));
        assert_eq!(f.now_playing.progress_label, "--:-- / --:--");
        assert_eq!(f.now_playing.percent, 0);
        assert_eq!(f.tree.highlight(), Some("top.wav"));
    }

    #[test]
    fn test_not_playing_clears_highlight() {
        let mut f = Fixture::new();
        f.apply(Ok(status("top.wav", 10.0, 100.0, 50.0)));
        f.apply(Ok(PlaybackStatus::default()));

        assert_eq!(f.tree.highlight(), None);
        assert_eq!(f.now_playing.track, None);
        assert_eq!(f.now_playing.title(), None);
    }

    #[test]
    fn test_dragging_volume_wins() {
        let mut f = Fixture::new();
        f.now_playing.volume = 10;
        f.session.volume_dragging = true;
        f.apply(Ok(status("top.wav", 10.0, 100.0, 80.0)));
        assert_eq!(f.now_playing.volume, 10);

        f.session.volume_dragging = false;
        f.apply(Ok(status("top.wav", 12.0, 100.0, 80.0)));
        assert_eq!(f.now_playing.volume, 80);
    }

    #[test]
    fn test_failure_changes_nothing_then_recovers() {
        let mut f = Fixture::new();
        f.apply(Ok(status("A/b.mp3", 30.0, 120.0, 50.0)));

        f.apply(Err(String::from("connection refused")));
        assert_eq!(f.now_playing.progress_label, "0:30 / 2:00");
        assert_eq!(f.tree.highlight(), Some("A/b.mp3"));

        f.apply(Ok(status("Jazz/Blue in Green.mp3", 60.0, 240.0, 50.0)));
        assert_eq!(f.now_playing.progress_label, "1:00 / 4:00");
        assert_eq!(f.tree.highlight(), Some("Jazz/Blue in Green.mp3"));
        assert!(!f.session.collapse.is_collapsed("Jazz"));
    }

    #[test]
    fn test_same_track_does_not_reexpand() {
        let mut f = Fixture::new();
        f.apply(Ok(status("A/b.mp3", 1.0, 120.0, 50.0)));
        f.tree.toggle_dir("A", &mut f.session.collapse);

        f.apply(Ok(status("A/b.mp3", 3.0, 120.0, 50.0)));
        assert!(f.session.collapse.is_collapsed("A"));
        assert_eq!(f.tree.highlight(), Some("A/b.mp3"));
    }
}
