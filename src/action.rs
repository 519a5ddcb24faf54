//! Application actions/events that drive state changes.

use crate::client::models::{BootData, PlaybackStatus};
use crate::playback::{Command, CommandOutcome};

/// Actions that can be dispatched to update application state.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum Action {
    // Application lifecycle
    Quit,
    Tick,
    Resize(u16, u16),

    // Tree navigation
    NavigateUp,
    NavigateDown,
    JumpToTop,
    JumpToBottom,
    Select,
    CollapseSelected,
    ExpandSelected,
    ExpandAll,
    CollapseAll,
    RevealPlaying,

    // Mouse
    MouseClick(u16, u16),
    MouseDrag(u16, u16),
    MouseRelease,
    MouseScroll(i16, u16, u16), // positive = down, negative = up

    // Filter
    OpenFilter,
    ConfirmFilter,
    CloseFilter,
    FilterInput(char),
    FilterBackspace,

    // Playback controls
    PreviousTrack,
    NextTrack,
    ToggleShuffle,
    VolumeUp,
    VolumeDown,

    // Library
    RefreshTree,
    TreeLoaded(BootData),

    // Service responses
    CommandFinished {
        command: Command,
        result: Result<CommandOutcome, String>,
    },
    StatusFetched(Result<PlaybackStatus, String>),
    VolumeFetched(u8),

    // Overlays
    ShowHelp,
    HideHelp,

    // Notices
    Notice(String),
    ClearNotice,

    // No-op
    None,
}
