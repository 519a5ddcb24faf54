//! Main application state and logic.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use color_eyre::Result;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::client::models::BootData;
use crate::client::PlaybackService;
use crate::config::Config;
use crate::library::{locator, TreeModel};
use crate::playback::{dispatch, Command, CommandOutcome, PlaybackController, StatusPoller};
use crate::session::SessionState;
use crate::ui::{FilterState, NowPlayingState, TreeViewState};

/// Rows moved per mouse wheel step.
const SCROLL_AMOUNT: usize = 3;

/// UI layout areas for mouse click detection.
#[derive(Debug, Default, Clone)]
pub struct UiLayout {
    /// Filter bar area
    pub filter: Rect,
    /// Tree panel area
    pub tree: Rect,
}

/// Main application state.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,

    /// Configuration
    pub config: Config,

    /// Playback service
    service: Arc<dyn PlaybackService>,

    /// Action sender for async operations
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// Canonical library tree
    pub model: TreeModel,

    /// Interaction state for the session
    pub session: SessionState,

    /// Tree view state
    pub tree: TreeViewState,

    /// Filter input state
    pub filter: FilterState,

    /// Now playing state
    pub now_playing: NowPlayingState,

    controller: PlaybackController,

    poller: StatusPoller,

    /// Help overlay visible
    pub show_help: bool,

    /// One-shot message to display
    pub notice: Option<String>,

    /// UI layout areas for mouse detection
    pub layout: UiLayout,

    /// A mouse drag started on the volume bar
    dragging_volume_bar: bool,

    /// Cancels in-flight requests on quit
    cancel: CancellationToken,
}

impl App {
    /// Create a new application instance.
    pub fn new(
        config: Config,
        service: Arc<dyn PlaybackService>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let timing = &config.timing;
        let controller = PlaybackController::new(timing);
        let poller = StatusPoller::new(
            Instant::now(),
            timing.poll_initial_delay(),
            timing.poll_interval(),
        );
        let filter = FilterState::new(timing.filter_quiet());

        Self {
            should_quit: false,
            service,
            action_tx,
            model: TreeModel::default(),
            session: SessionState::new(),
            tree: TreeViewState::new(),
            filter,
            now_playing: NowPlayingState::new(),
            controller,
            poller,
            show_help: false,
            notice: None,
            layout: UiLayout::default(),
            dragging_volume_bar: false,
            cancel: CancellationToken::new(),
            config,
        }
    }

    /// Initialize the application.
    ///
    /// With boot data the tree is shown right away; otherwise it is fetched
    /// from the service. The current volume is read once.
    pub fn init(&mut self, boot: Option<BootData>) -> Result<()> {
        match boot {
            Some(boot) => self.apply_tree(boot),
            None => self.action_tx.send(Action::RefreshTree)?,
        }

        let service = Arc::clone(&self.service);
        self.spawn_request(async move {
            match service.volume().await {
                Ok(volume) => Action::VolumeFetched(volume),
                Err(e) => {
                    tracing::warn!("Failed to read volume: {}", e);
                    Action::None
                }
            }
        });

        Ok(())
    }

    /// Handle an action and update state.
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        let now = Instant::now();

        match action {
            Action::Quit => {
                self.should_quit = true;
                self.poller.schedule.stop();
                self.cancel.cancel();
            }

            Action::Tick => self.on_tick(now),

            Action::Resize(width, height) => {
                tracing::debug!(width, height, "Terminal resized");
            }

            // Tree navigation
            Action::NavigateUp => self.tree.select_previous(),
            Action::NavigateDown => self.tree.select_next(),
            Action::JumpToTop => self.tree.jump_to_top(),
            Action::JumpToBottom => self.tree.jump_to_bottom(),
            Action::Select => self.activate_selected(now),
            Action::CollapseSelected => self.tree.collapse_selected(&mut self.session.collapse),
            Action::ExpandSelected => self.tree.expand_selected(&mut self.session.collapse),
            Action::ExpandAll => self.tree.expand_all(&mut self.session.collapse),
            Action::CollapseAll => self.tree.collapse_all(&mut self.session.collapse),

            Action::RevealPlaying => match self.now_playing.track.clone() {
                Some(rel) => {
                    locator::jump_to(&rel, &mut self.session, &mut self.tree);
                }
                None => self.notice = Some(String::from("Nothing is playing")),
            },

            // Mouse
            Action::MouseClick(x, y) => self.on_click(x, y, now),

            Action::MouseDrag(x, _) => {
                if self.dragging_volume_bar {
                    if let Some(value) = self.now_playing.volume_at_clamped(x) {
                        self.slide_volume(value, now);
                    }
                }
            }

            Action::MouseRelease => self.dragging_volume_bar = false,

            Action::MouseScroll(delta, x, y) => {
                if self.now_playing.on_volume_row(y) {
                    let step = i16::from(self.config.ui.volume_step);
                    let change = if delta < 0 { step } else { -step };
                    let value = (i16::from(self.now_playing.volume) + change).clamp(0, 100) as u8;
                    self.slide_volume(value, now);
                } else if contains(self.layout.tree, x, y) {
                    for _ in 0..SCROLL_AMOUNT {
                        if delta > 0 {
                            self.tree.select_next();
                        } else {
                            self.tree.select_previous();
                        }
                    }
                }
            }

            // Filter
            Action::OpenFilter => self.filter.open(),
            Action::ConfirmFilter => self.filter.confirm(now),
            Action::CloseFilter => self.filter.clear(now),
            Action::FilterInput(c) => self.filter.input(c, now),
            Action::FilterBackspace => self.filter.backspace(now),

            // Playback controls
            Action::PreviousTrack => self.send_command(self.controller.previous()),
            Action::NextTrack => self.send_command(self.controller.next()),
            Action::ToggleShuffle => self.send_command(self.controller.shuffle()),

            Action::VolumeUp => {
                let value = self
                    .now_playing
                    .volume
                    .saturating_add(self.config.ui.volume_step)
                    .min(100);
                self.slide_volume(value, now);
            }

            Action::VolumeDown => {
                let value = self
                    .now_playing
                    .volume
                    .saturating_sub(self.config.ui.volume_step);
                self.slide_volume(value, now);
            }

            // Library
            Action::RefreshTree => self.load_tree(),
            Action::TreeLoaded(boot) => self.apply_tree(boot),

            // Service responses
            Action::CommandFinished { command, result } => {
                self.on_command_finished(command, result);
            }

            Action::StatusFetched(result) => {
                self.poller.schedule.settle(now);
                self.poller.reconcile(
                    &result,
                    &mut self.session,
                    &mut self.tree,
                    &mut self.now_playing,
                );
            }

            Action::VolumeFetched(volume) => {
                if !self.session.volume_dragging {
                    self.now_playing.volume = volume;
                }
            }

            // Overlays
            Action::ShowHelp => self.show_help = true,
            Action::HideHelp => self.show_help = false,

            // Notices
            Action::Notice(message) => self.notice = Some(message),
            Action::ClearNotice => self.notice = None,

            Action::None => {}
        }

        Ok(())
    }

    fn on_tick(&mut self, now: Instant) {
        if self.filter.should_apply(now) {
            let keyword = self.filter.mark_applied();
            tracing::debug!(keyword, "Applying filter");
            self.refresh_view();
        }

        if let Some(command) = self.controller.flush_volume(&mut self.session, now) {
            self.send_command(command);
        }

        if self.poller.schedule.begin_if_due(now) {
            let service = Arc::clone(&self.service);
            self.spawn_request(async move {
                Action::StatusFetched(service.status().await.map_err(|e| e.to_string()))
            });
        }
    }

    fn on_click(&mut self, x: u16, y: u16, now: Instant) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        if self.notice.take().is_some() {
            return;
        }

        if let Some(value) = self.now_playing.volume_at(x, y) {
            self.dragging_volume_bar = true;
            self.slide_volume(value, now);
        } else if contains(self.layout.filter, x, y) {
            self.filter.open();
        } else if let Some(index) = self.tree.row_at(x, y) {
            // A second click on the selected row activates it.
            if self.tree.list_state.selected() == Some(index) {
                self.activate_selected(now);
            } else {
                self.tree.select_row(index);
            }
        }
    }

    /// Toggle the selected directory or play the selected file.
    fn activate_selected(&mut self, now: Instant) {
        let Some(row) = self.tree.selected_row() else {
            return;
        };

        let (rel, is_dir) = (row.rel.clone(), row.is_dir());
        if is_dir {
            self.tree.toggle_dir(&rel, &mut self.session.collapse);
        } else {
            self.play(&rel, now);
        }
    }

    fn play(&mut self, rel: &str, now: Instant) {
        if let Some(command) = self.controller.play(&mut self.session, rel, now) {
            self.tree.set_highlight(rel);
            self.send_command(command);
        }
    }

    fn slide_volume(&mut self, value: u8, now: Instant) {
        self.controller.slide_volume(&mut self.session, value, now);
        self.now_playing.volume = value.min(100);
    }

    fn on_command_finished(&mut self, command: Command, result: Result<CommandOutcome, String>) {
        if let Command::SetVolume(value) = command {
            self.controller.volume_settled(&mut self.session);
            if let Err(e) = result {
                tracing::warn!(value, "Volume change failed: {}", e);
            }
            return;
        }

        match result {
            Ok(CommandOutcome::Shuffle(enabled)) => {
                tracing::info!(enabled, "Shuffle toggled");
                self.now_playing.shuffle = Some(enabled);
            }
            Ok(CommandOutcome::Done) => {
                tracing::debug!(?command, "Command completed");
            }
            Err(e) => {
                tracing::warn!(?command, "Command failed: {}", e);
                self.notice = Some(format!("Could not {}: {}", command.describe(), e));
            }
        }
    }

    /// Rebuild the tree view from the model and the applied filter.
    fn refresh_view(&mut self) {
        let view = self.model.filtered(self.filter.applied()).into_owned();
        self.tree.set_view(view, &self.session.collapse);
    }

    fn apply_tree(&mut self, boot: BootData) {
        self.model.replace(boot);
        if self.model.music_dir().is_empty() && !self.config.server.music_dir.is_empty() {
            self.model.set_music_dir(self.config.server.music_dir.clone());
        }
        if self.model.root().is_empty() {
            tracing::warn!("Library is empty");
        } else {
            tracing::info!(files = self.model.root().file_count(), "Library loaded");
        }
        self.refresh_view();

        if let Some(rel) = self.now_playing.track.clone() {
            locator::jump_to(&rel, &mut self.session, &mut self.tree);
        }
    }

    fn load_tree(&self) {
        let service = Arc::clone(&self.service);
        self.spawn_request(async move {
            match service.tree().await {
                Ok(tree) => Action::TreeLoaded(BootData {
                    tree,
                    music_dir: String::new(),
                }),
                Err(e) => {
                    tracing::warn!("Failed to load library: {}", e);
                    Action::Notice(format!("Could not load library: {}", e))
                }
            }
        });
    }

    fn send_command(&self, command: Command) {
        tracing::debug!(?command, "Sending command");
        let service = Arc::clone(&self.service);
        self.spawn_request(async move {
            let result = dispatch(service.as_ref(), &command)
                .await
                .map_err(|e| e.to_string());
            Action::CommandFinished { command, result }
        });
    }

    /// Run a request on its own task and report back through the action
    /// channel, unless the app is shutting down.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                action = request => {
                    let _ = tx.send(action);
                }
            }
        });
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::{PlaybackStatus, PlayingTrack};
    use crate::library::model::tests::sample_tree;
    use crate::playback::controller::tests::RecordingService;

    fn setup(service: Arc<RecordingService>) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::default(), service, tx);
        app.init(Some(BootData {
            tree: sample_tree(),
            music_dir: String::from("/srv/music"),
        }))
        .unwrap();
        (app, rx)
    }

    async fn next_command(rx: &mut mpsc::UnboundedReceiver<Action>) -> Action {
        loop {
            let action = rx.recv().await.unwrap();
            if matches!(action, Action::CommandFinished { .. }) {
                return action;
            }
        }
    }

    #[tokio::test]
    async fn test_boot_data_populates_tree() {
        let (app, _rx) = setup(Arc::new(RecordingService::default()));
        assert_eq!(app.model.music_dir(), "/srv/music");
        assert_eq!(app.tree.rows().len(), 4);
    }

    #[tokio::test]
    async fn test_select_file_plays_it() {
        let service = Arc::new(RecordingService::default());
        let (mut app, mut rx) = setup(service.clone());

        app.handle_action(Action::Select).unwrap(); // expand A
        app.handle_action(Action::NavigateDown).unwrap(); // A/Live
        app.handle_action(Action::NavigateDown).unwrap(); // A/b.mp3
        app.handle_action(Action::Select).unwrap();

        assert_eq!(app.tree.highlight(), Some("A/b.mp3"));
        let finished = next_command(&mut rx).await;
        app.handle_action(finished).unwrap();
        assert!(service.calls().contains(&String::from("play A/b.mp3")));
        assert_eq!(app.notice, None);

        // Inside the guard window nothing else is sent.
        app.handle_action(Action::JumpToBottom).unwrap(); // top.wav
        app.handle_action(Action::Select).unwrap();
        assert_eq!(app.tree.highlight(), Some("A/b.mp3"));
    }

    #[tokio::test]
    async fn test_failed_command_shows_notice() {
        let service = Arc::new(RecordingService::failing());
        let (mut app, mut rx) = setup(service);

        app.handle_action(Action::NextTrack).unwrap();
        let finished = next_command(&mut rx).await;
        app.handle_action(finished).unwrap();
        assert!(app.notice.as_deref().unwrap().starts_with("Could not next"));

        app.handle_action(Action::ClearNotice).unwrap();
        assert_eq!(app.notice, None);
    }

    #[tokio::test]
    async fn test_failed_volume_is_silent() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::failing()));
        app.session.volume_in_flight = true;
        app.session.volume_dragging = true;

        app.handle_action(Action::CommandFinished {
            command: Command::SetVolume(30),
            result: Err(String::from("timeout")),
        })
        .unwrap();
        assert_eq!(app.notice, None);
        assert!(!app.session.volume_dragging);
    }

    #[tokio::test]
    async fn test_shuffle_outcome_updates_state() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.handle_action(Action::CommandFinished {
            command: Command::Shuffle,
            result: Ok(CommandOutcome::Shuffle(true)),
        })
        .unwrap();
        assert_eq!(app.now_playing.shuffle, Some(true));
    }

    #[tokio::test]
    async fn test_volume_keys_slide_and_hold_status() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.now_playing.volume = 50;

        app.handle_action(Action::VolumeUp).unwrap();
        assert_eq!(app.now_playing.volume, 55);
        assert!(app.session.volume_dragging);

        app.handle_action(Action::VolumeFetched(10)).unwrap();
        assert_eq!(app.now_playing.volume, 55);
    }

    #[tokio::test]
    async fn test_status_reveals_track() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.handle_action(Action::StatusFetched(Ok(PlaybackStatus {
            playing: Some(PlayingTrack {
                rel: String::from("A/Live/c.mp3"),
            }),
            mpv: None,
        })))
        .unwrap();

        assert_eq!(app.tree.highlight(), Some("A/Live/c.mp3"));
        assert!(app.tree.row_of("A/Live/c.mp3").is_some());
    }

    #[tokio::test]
    async fn test_reveal_playing_without_track() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.handle_action(Action::RevealPlaying).unwrap();
        assert_eq!(app.notice.as_deref(), Some("Nothing is playing"));
    }

    #[tokio::test]
    async fn test_reload_keeps_collapse_state() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.handle_action(Action::Select).unwrap(); // expand A

        app.handle_action(Action::TreeLoaded(BootData {
            tree: sample_tree(),
            music_dir: String::new(),
        }))
        .unwrap();
        assert_eq!(app.model.music_dir(), "/srv/music");
        assert!(app.tree.row_of("A/b.mp3").is_some());
    }

    #[tokio::test]
    async fn test_quit_stops_polling() {
        let (mut app, _rx) = setup(Arc::new(RecordingService::default()));
        app.handle_action(Action::Quit).unwrap();
        assert!(app.should_quit);
        assert!(app.poller.schedule.is_stopped());
    }
}
