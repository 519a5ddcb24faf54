//! jukebox-tui - A terminal client for a remote jukebox service.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tokio::sync::mpsc;
use tracing_subscriber::prelude::*;

mod action;
mod app;
mod client;
mod config;
mod library;
mod playback;
mod session;
mod tui;
mod ui;

use action::Action;
use app::App;
use client::models::BootData;
use client::JukeboxClient;
use config::Config;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "jukebox-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service URL (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// JSON file with the library tree ({"tree": ..., "musicDir": ...})
    #[arg(short, long)]
    boot_data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install panic hooks
    tui::install_hooks()?;

    // Initialize logging
    let log_file = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jukebox-tui")
        .join("jukebox-tui.log");

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(std::fs::File::create(&log_file)?))
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(file_layer)
        .try_init()
        .ok();

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    // Apply command-line overrides
    if let Some(server) = args.server {
        config.server.url = server;
    }

    let boot = args.boot_data.as_deref().map(load_boot_data);

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    if !config.is_valid() {
        action_tx.send(Action::Notice(format!(
            "Invalid service URL {:?}. Set server.url in the config or pass --server.",
            config.server.url
        )))?;
    }

    let client = JukeboxClient::new(&config.server.url, config.timing.request_timeout())?;
    tracing::info!("Using jukebox service at {}", config.server.url);

    // Create application
    let mut app = App::new(config, Arc::new(client), action_tx.clone());

    // Initialize terminal
    let mut terminal = tui::init()?;

    // Initialize application
    app.init(boot)?;

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        // Render UI
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        // Handle events with timeout
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        let action = handle_key_event(key.code, key.modifiers, &app);
                        if action != Action::None {
                            action_tx.send(action)?;
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    let action = handle_mouse_event(mouse);
                    if action != Action::None {
                        action_tx.send(action)?;
                    }
                }
                Event::Resize(width, height) => {
                    action_tx.send(Action::Resize(width, height))?;
                }
                _ => {}
            }
        }

        // Send tick action
        action_tx.send(Action::Tick)?;

        // Process all pending actions
        while let Ok(action) = action_rx.try_recv() {
            app.handle_action(action)?;
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    tui::restore()?;

    Ok(())
}

/// Read the boot payload, falling back to an empty library.
fn load_boot_data(path: &Path) -> BootData {
    match std::fs::read_to_string(path) {
        Ok(text) => BootData::parse(&text),
        Err(e) => {
            tracing::warn!("Failed to read boot data {}: {}", path.display(), e);
            BootData::default()
        }
    }
}

/// Map key events to actions.
fn handle_key_event(code: KeyCode, modifiers: KeyModifiers, app: &App) -> Action {
    // Handle filter input separately
    if app.filter.active {
        return handle_filter_key(code);
    }

    // Handle help overlay
    if app.show_help {
        return match code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Action::HideHelp,
            _ => Action::None,
        };
    }

    // Global keys
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Action::Quit,
        KeyCode::Esc if app.notice.is_some() => return Action::ClearNotice,
        _ => {}
    }

    // Normal mode keys
    match code {
        // Navigation
        KeyCode::Up | KeyCode::Char('k') => Action::NavigateUp,
        KeyCode::Down | KeyCode::Char('j') => Action::NavigateDown,
        KeyCode::Left | KeyCode::Char('h') => Action::CollapseSelected,
        KeyCode::Right | KeyCode::Char('l') => Action::ExpandSelected,
        KeyCode::Enter => Action::Select,
        KeyCode::Char('g') => Action::JumpToTop,
        KeyCode::Char('G') => Action::JumpToBottom,

        // Tree
        KeyCode::Char('E') => Action::ExpandAll,
        KeyCode::Char('C') => Action::CollapseAll,
        KeyCode::Char('o') => Action::RevealPlaying,
        KeyCode::Char('/') => Action::OpenFilter,
        KeyCode::Esc if !app.filter.query.is_empty() => Action::CloseFilter,
        KeyCode::Char('R') => Action::RefreshTree,

        // Playback
        KeyCode::Char('n') => Action::NextTrack,
        KeyCode::Char('p') => Action::PreviousTrack,
        KeyCode::Char('s') => Action::ToggleShuffle,

        // Volume
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,

        // Help
        KeyCode::Char('?') => Action::ShowHelp,

        // Dismiss notice
        KeyCode::Char('x') => Action::ClearNotice,

        _ => Action::None,
    }
}

/// Handle key events while the filter input has focus.
fn handle_filter_key(code: KeyCode) -> Action {
    match code {
        KeyCode::Esc => Action::CloseFilter,
        KeyCode::Enter => Action::ConfirmFilter,
        KeyCode::Backspace => Action::FilterBackspace,
        KeyCode::Up => Action::NavigateUp,
        KeyCode::Down => Action::NavigateDown,
        KeyCode::Char(c) => Action::FilterInput(c),
        _ => Action::None,
    }
}

/// Handle mouse events.
fn handle_mouse_event(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::MouseClick(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => Action::MouseDrag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => Action::MouseRelease,
        MouseEventKind::ScrollUp => Action::MouseScroll(-1, mouse.column, mouse.row),
        MouseEventKind::ScrollDown => Action::MouseScroll(1, mouse.column, mouse.row),
        _ => Action::None,
    }
}
