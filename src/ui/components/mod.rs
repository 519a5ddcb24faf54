//! UI components module.

pub mod filter;
pub mod now_playing;
pub mod tree;

pub use filter::{render_filter, FilterState};
pub use now_playing::{render_now_playing, NowPlayingState};
pub use tree::{render_tree, TreeViewState};
