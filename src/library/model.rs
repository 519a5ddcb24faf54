//! Canonical library tree and keyword filtering.

use std::borrow::Cow;

use crate::client::models::{BootData, FileEntry, TreeNode};

/// Holds the canonical library structure.
#[derive(Debug, Clone, Default)]
pub struct TreeModel {
    root: TreeNode,
    music_dir: String,
}

impl TreeModel {
    #[allow(dead_code)]
    pub fn new(boot: BootData) -> Self {
        Self {
            root: boot.tree,
            music_dir: boot.music_dir,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn music_dir(&self) -> &str {
        &self.music_dir
    }

    /// Replace the tree, keeping the known music directory when the new
    /// payload doesn't carry one.
    pub fn replace(&mut self, boot: BootData) {
        self.root = boot.tree;
        if !boot.music_dir.is_empty() {
            self.music_dir = boot.music_dir;
        }
    }

    pub fn set_music_dir(&mut self, music_dir: impl Into<String>) {
        self.music_dir = music_dir.into();
    }

    /// Filtered view of the canonical tree.
    pub fn filtered(&self, keyword: &str) -> Cow<'_, TreeNode> {
        filter(&self.root, keyword)
    }
}

/// Filter a tree by a case-insensitive keyword matched against each file's
/// name or relative path.
///
/// A blank keyword returns the tree itself. Otherwise directories are kept
/// only when something beneath them survives.
pub fn filter<'a>(root: &'a TreeNode, keyword: &str) -> Cow<'a, TreeNode> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Cow::Borrowed(root);
    }

    let needle = keyword.to_lowercase();
    // The root always materializes, even when nothing matched.
    let view = filter_node(root, &needle).unwrap_or_else(|| TreeNode {
        name: root.name.clone(),
        rel: root.rel.clone(),
        dirs: Vec::new(),
        files: Vec::new(),
    });
    Cow::Owned(view)
}

fn filter_node(node: &TreeNode, needle: &str) -> Option<TreeNode> {
    let dirs: Vec<TreeNode> = node
        .dirs
        .iter()
        .filter_map(|dir| filter_node(dir, needle))
        .collect();

    let files: Vec<FileEntry> = node
        .files
        .iter()
        .filter(|file| file_matches(file, needle))
        .cloned()
        .collect();

    if dirs.is_empty() && files.is_empty() {
        return None;
    }

    Some(TreeNode {
        name: node.name.clone(),
        rel: node.rel.clone(),
        dirs,
        files,
    })
}

/// `needle` must already be lowercase.
fn file_matches(file: &FileEntry, needle: &str) -> bool {
    file.name.to_lowercase().contains(needle) || file.rel.to_lowercase().contains(needle)
}
