//! Collapsible library tree component.

use std::collections::{HashMap, HashSet};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::client::models::TreeNode;
use crate::session::CollapseFlags;

/// Kind of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Dir { collapsed: bool },
    File,
}

/// A single visible row in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub kind: RowKind,
    pub name: String,
    pub rel: String,
    pub depth: usize,
}

impl TreeRow {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, RowKind::Dir { .. })
    }

    /// Label with the expand arrow for directories.
    pub fn label(&self) -> String {
        match self.kind {
            RowKind::Dir { collapsed: true } => format!("▶ {}", self.name),
            RowKind::Dir { collapsed: false } => format!("▼ {}", self.name),
            RowKind::File => self.name.clone(),
        }
    }
}

/// Presentation state of the library tree.
///
/// Rows are derived from the current (possibly filtered) view and the
/// session's collapse flags. Every directory and file of the view is indexed
/// by `rel`, whether or not it is currently visible.
#[derive(Debug, Default)]
pub struct TreeViewState {
    /// The view being displayed
    view: TreeNode,

    /// Visible rows, top to bottom
    rows: Vec<TreeRow>,

    /// `rel` -> visible row
    row_index: HashMap<String, usize>,

    /// Every directory in the view
    dirs: HashSet<String>,

    /// Every file in the view
    files: HashSet<String>,

    /// Now-playing file
    highlight: Option<String>,

    /// Selection state for UI
    pub list_state: ListState,

    /// Row to center on the next render
    scroll_target: Option<usize>,

    /// List area from the last render, for mouse hit-testing
    list_area: Rect,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a new view, keeping the selection on the same `rel` when it
    /// is still visible.
    pub fn set_view(&mut self, view: TreeNode, collapse: &CollapseFlags) {
        self.dirs.clear();
        self.files.clear();
        index_node(&view, &mut self.dirs, &mut self.files);
        self.view = view;
        self.rebuild(collapse);
    }

    /// Re-flatten the rows after collapse flags changed.
    pub fn rebuild(&mut self, collapse: &CollapseFlags) {
        let selected_rel = self.selected_row().map(|row| row.rel.clone());

        self.rows.clear();
        flatten_children(&self.view, 0, collapse, &mut self.rows);
        self.row_index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.rel.clone(), i))
            .collect();

        let selected = selected_rel
            .and_then(|rel| self.row_index.get(&rel).copied())
            .or_else(|| self.list_state.selected())
            .map(|i| i.min(self.rows.len().saturating_sub(1)));

        if self.rows.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(selected.or(Some(0)));
        }
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    /// Whether the current view contains this directory.
    pub fn has_dir(&self, rel: &str) -> bool {
        self.dirs.contains(rel)
    }

    /// Whether the current view contains this file.
    pub fn has_file(&self, rel: &str) -> bool {
        self.files.contains(rel)
    }

    /// Visible row of a `rel`.
    pub fn row_of(&self, rel: &str) -> Option<usize> {
        self.row_index.get(rel).copied()
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.list_state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn select_row(&mut self, index: usize) {
        if index < self.rows.len() {
            self.list_state.select(Some(index));
        }
    }

    // =========================================================================
    // Highlight
    // =========================================================================

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn set_highlight(&mut self, rel: &str) {
        self.highlight = Some(rel.to_string());
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    // =========================================================================
    // Expand / collapse
    // =========================================================================

    /// Toggle a directory. Returns false if it isn't in the view.
    pub fn toggle_dir(&mut self, rel: &str, collapse: &mut CollapseFlags) -> bool {
        if !self.has_dir(rel) {
            return false;
        }
        collapse.toggle(rel);
        self.rebuild(collapse);
        true
    }

    /// Expand the selected directory.
    pub fn expand_selected(&mut self, collapse: &mut CollapseFlags) {
        if let Some(row) = self.selected_row() {
            if row.kind == (RowKind::Dir { collapsed: true }) {
                let rel = row.rel.clone();
                collapse.expand(&rel);
                self.rebuild(collapse);
            }
        }
    }

    /// Collapse the selected directory, or jump to the parent directory.
    pub fn collapse_selected(&mut self, collapse: &mut CollapseFlags) {
        let Some(row) = self.selected_row() else {
            return;
        };

        if row.kind == (RowKind::Dir { collapsed: false }) {
            let rel = row.rel.clone();
            collapse.collapse(&rel);
            self.rebuild(collapse);
            return;
        }

        if let Some((parent, _)) = row.rel.rsplit_once('/') {
            if let Some(index) = self.row_of(parent) {
                self.list_state.select(Some(index));
            }
        }
    }

    /// Expand every directory in the view.
    pub fn expand_all(&mut self, collapse: &mut CollapseFlags) {
        for rel in &self.dirs {
            collapse.expand(rel);
        }
        self.rebuild(collapse);
    }

    /// Collapse every directory in the view.
    pub fn collapse_all(&mut self, collapse: &mut CollapseFlags) {
        for rel in &self.dirs {
            collapse.collapse(rel);
        }
        self.rebuild(collapse);
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Select a visible row and center it on the next render.
    pub fn request_scroll(&mut self, rel: &str) -> bool {
        match self.row_of(rel) {
            Some(index) => {
                self.list_state.select(Some(index));
                self.scroll_target = Some(index);
                true
            }
            None => false,
        }
    }

    /// Pending centered-scroll target, if any.
    #[allow(dead_code)]
    pub fn scroll_target(&self) -> Option<usize> {
        self.scroll_target
    }

    /// Row under a terminal position, from the last rendered layout.
    pub fn row_at(&self, x: u16, y: u16) -> Option<usize> {
        let area = self.list_area;
        if x < area.x || x >= area.x + area.width || y < area.y || y >= area.y + area.height {
            return None;
        }
        let index = self.list_state.offset() + (y - area.y) as usize;
        (index < self.rows.len()).then_some(index)
    }

    /// Move selection up.
    pub fn select_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i > 0 => i - 1,
            Some(_) => self.rows.len() - 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Move selection down.
    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn jump_to_top(&mut self) {
        if !self.rows.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn jump_to_bottom(&mut self) {
        if !self.rows.is_empty() {
            self.list_state.select(Some(self.rows.len() - 1));
        }
    }
}

fn dir_key(node: &TreeNode) -> String {
    node.rel.clone().unwrap_or_else(|| node.name.clone())
}

fn index_node(node: &TreeNode, dirs: &mut HashSet<String>, files: &mut HashSet<String>) {
    for dir in &node.dirs {
        dirs.insert(dir_key(dir));
        index_node(dir, dirs, files);
    }
    files.extend(node.files.iter().map(|f| f.rel.clone()));
}

fn flatten_children(node: &TreeNode, depth: usize, collapse: &CollapseFlags, rows: &mut Vec<TreeRow>) {
    for dir in &node.dirs {
        let rel = dir_key(dir);
        let collapsed = collapse.is_collapsed(&rel);
        rows.push(TreeRow {
            kind: RowKind::Dir { collapsed },
            name: dir.name.clone(),
            rel,
            depth,
        });
        if !collapsed {
            flatten_children(dir, depth + 1, collapse, rows);
        }
    }

    rows.extend(node.files.iter().map(|file| TreeRow {
        kind: RowKind::File,
        name: file.name.clone(),
        rel: file.rel.clone(),
        depth,
    }));
}

/// Render the library tree.
pub fn render_tree(
    frame: &mut Frame,
    area: Rect,
    state: &mut TreeViewState,
    title: &str,
    filtering: bool,
) {
    let border_color = if filtering { Color::Yellow } else { Color::Blue };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    state.list_area = inner;

    if state.rows.is_empty() {
        let message = if filtering {
            "No matching tracks"
        } else {
            "Library is empty"
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    if let Some(target) = state.scroll_target.take() {
        let height = inner.height as usize;
        let max_offset = state.rows.len().saturating_sub(height);
        *state.list_state.offset_mut() = target.saturating_sub(height / 2).min(max_offset);
    }

    let highlight = state.highlight.as_deref();
    let items: Vec<ListItem> = state
        .rows
        .iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let playing = !row.is_dir() && highlight == Some(row.rel.as_str());
            let style = if playing {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if row.is_dir() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if playing { "♫ " } else { "" };
            ListItem::new(Line::from(vec![
                Span::raw(indent),
                Span::styled(format!("{}{}", marker, row.label()), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, area, &mut state.list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::filter;
    use crate::library::model::tests::sample_tree;

    fn labels(state: &TreeViewState) -> Vec<String> {
        state.rows().iter().map(|r| r.label()).collect()
    }

    #[test]
    fn test_root_children_visible_dirs_collapsed() {
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &CollapseFlags::new());

        assert_eq!(labels(&state), vec!["▶ A", "▶ Jazz", "▶ Empty", "top.wav"]);
        assert!(state.has_dir("A/Live"));
        assert!(state.has_file("A/Live/c.mp3"));
        assert_eq!(state.row_of("A/Live/c.mp3"), None);
        assert_eq!(state.list_state.selected(), Some(0));
    }

    #[test]
    fn test_toggle_dir_by_rel() {
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &collapse);

        assert!(state.toggle_dir("A", &mut collapse));
        assert_eq!(
            labels(&state),
            vec!["▼ A", "▶ Live", "b.mp3", "Intro.flac", "▶ Jazz", "▶ Empty", "top.wav"]
        );
        assert_eq!(state.rows()[2].depth, 1);
        assert_eq!(state.row_of("A/b.mp3"), Some(2));

        assert!(!state.toggle_dir("Nope", &mut collapse));
    }

    #[test]
    fn test_collapse_state_survives_refilter() {
        let tree = sample_tree();
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(tree.clone(), &collapse);
        state.toggle_dir("A", &mut collapse);

        state.set_view(filter(&tree, "mp3").into_owned(), &collapse);
        assert_eq!(state.rows()[0].label(), "▼ A");
        assert!(state.row_of("A/b.mp3").is_some());

        state.set_view(filter(&tree, "jazz").into_owned(), &collapse);
        assert!(!state.has_dir("A"));

        state.set_view(filter(&tree, "b.mp3").into_owned(), &collapse);
        assert_eq!(state.rows()[0].label(), "▼ A");
    }

    #[test]
    fn test_selection_follows_rel_across_rebuild() {
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &collapse);
        state.select_row(1); // Jazz
        state.toggle_dir("A", &mut collapse);
        assert_eq!(state.selected_row().map(|r| r.rel.as_str()), Some("Jazz"));
    }

    #[test]
    fn test_collapse_selected_jumps_to_parent() {
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &collapse);
        state.toggle_dir("A", &mut collapse);
        let b = state.row_of("A/b.mp3").unwrap();
        state.select_row(b);

        state.collapse_selected(&mut collapse);
        assert_eq!(state.selected_row().map(|r| r.rel.as_str()), Some("A"));

        state.collapse_selected(&mut collapse);
        assert!(collapse.is_collapsed("A"));
        assert_eq!(state.rows().len(), 4);
    }

    #[test]
    fn test_expand_selected() {
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &collapse);
        state.select_row(1);
        state.expand_selected(&mut collapse);
        assert!(!collapse.is_collapsed("Jazz"));
        assert!(state.row_of("Jazz/Blue in Green.mp3").is_some());
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let mut collapse = CollapseFlags::new();
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &collapse);

        state.expand_all(&mut collapse);
        assert_eq!(state.rows().len(), 9);
        assert!(state.row_of("A/Live/c.mp3").is_some());

        state.collapse_all(&mut collapse);
        assert_eq!(state.rows().len(), 4);
    }

    #[test]
    fn test_highlight_is_explicit() {
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &CollapseFlags::new());
        assert_eq!(state.highlight(), None);

        state.set_highlight("top.wav");
        state.set_view(sample_tree(), &CollapseFlags::new());
        assert_eq!(state.highlight(), Some("top.wav"));

        state.clear_highlight();
        assert_eq!(state.highlight(), None);
    }

    #[test]
    fn test_request_scroll_only_for_visible_rows() {
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &CollapseFlags::new());

        assert!(!state.request_scroll("A/b.mp3"));
        assert_eq!(state.scroll_target(), None);

        assert!(state.request_scroll("top.wav"));
        assert_eq!(state.scroll_target(), Some(3));
        assert_eq!(state.list_state.selected(), Some(3));
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = TreeViewState::new();
        state.set_view(sample_tree(), &CollapseFlags::new());
        state.select_previous();
        assert_eq!(state.list_state.selected(), Some(3));
        state.select_next();
        assert_eq!(state.list_state.selected(), Some(0));
    }

    #[test]
    fn test_empty_view_has_no_selection() {
        let mut state = TreeViewState::new();
        state.set_view(TreeNode::empty_root(), &CollapseFlags::new());
        assert!(state.rows().is_empty());
        assert_eq!(state.list_state.selected(), None);
        state.select_next();
        assert_eq!(state.list_state.selected(), None);
    }
}
