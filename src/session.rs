//! Per-session UI interaction state shared by the reconciliation components.

use std::collections::HashMap;
use std::time::Instant;

/// Collapse flags for directories, keyed by `rel`.
///
/// Directories default to collapsed until expanded by the user or the locator.
#[derive(Debug, Clone, Default)]
pub struct CollapseFlags {
    flags: HashMap<String, bool>,
}

impl CollapseFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the directory is collapsed.
    pub fn is_collapsed(&self, rel: &str) -> bool {
        self.flags.get(rel).copied().unwrap_or(true)
    }

    pub fn expand(&mut self, rel: &str) {
        self.flags.insert(rel.to_string(), false);
    }

    pub fn collapse(&mut self, rel: &str) {
        self.flags.insert(rel.to_string(), true);
    }

    /// Flip the flag, returning the new collapsed state.
    pub fn toggle(&mut self, rel: &str) -> bool {
        let collapsed = !self.is_collapsed(rel);
        self.flags.insert(rel.to_string(), collapsed);
        collapsed
    }
}

/// A volume value waiting for its quiet period to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingVolume {
    pub value: u8,
    pub last_slide: Instant,
}

/// Interaction state that lives for the whole session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Expand/collapse flag per directory
    pub collapse: CollapseFlags,

    /// Last path revealed by the locator
    pub last_located: Option<String>,

    /// The volume control is being adjusted by the user
    pub volume_dragging: bool,

    /// Last accepted play command
    pub last_play: Option<Instant>,

    /// Coalesced volume value not yet sent
    pub pending_volume: Option<PendingVolume>,

    /// A volume request is on its way to the service
    pub volume_in_flight: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
