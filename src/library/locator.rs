//! Reveals the playing track in the tree.

use crate::session::SessionState;
use crate::ui::components::tree::TreeViewState;

/// Expand the ancestors of `rel` and scroll its row into view.
///
/// Does nothing when `rel` is the last located path, so a track that keeps
/// playing doesn't fight the user's own navigation. Ancestors missing from the
/// current view are skipped. The path is recorded as located even when the
/// file itself isn't in the view.
pub fn expand_to(rel: &str, session: &mut SessionState, tree: &mut TreeViewState) -> bool {
    if session.last_located.as_deref() == Some(rel) {
        return false;
    }

    for prefix in ancestors(rel) {
        if tree.has_dir(prefix) {
            session.collapse.expand(prefix);
        }
    }
    tree.rebuild(&session.collapse);

    if !tree.has_file(rel) {
        tracing::debug!(rel, "Playing track is not in the current view");
    } else if tree.request_scroll(rel) {
        tracing::debug!(rel, "Revealed playing track");
    }

    session.last_located = Some(rel.to_string());
    true
}

/// Locate `rel` again even if it was already revealed.
pub fn jump_to(rel: &str, session: &mut SessionState, tree: &mut TreeViewState) -> bool {
    session.last_located = None;
    expand_to(rel, session, tree)
}

/// Directory prefixes of a relative path, outermost first.
///
/// `a/b/c.mp3` yields `a`, `a/b`.
fn ancestors(rel: &str) -> impl Iterator<Item = &str> {
    rel.match_indices('/').map(move |(i, _)| &rel[..i])
}
