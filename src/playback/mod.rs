//! Playback commands and status reconciliation.

pub mod controller;
pub mod poller;

pub use controller::{dispatch, Command, CommandOutcome, PlaybackController};
pub use poller::StatusPoller;
