//! Flattening of the folder hierarchy into display lines.

use std::collections::BTreeSet;

use crate::api::{FolderNode, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub kind: NodeKind,
    pub has_children: bool,
    pub collapsed: bool,
    pub selected: bool,
    pub file_count: u64,
}

/// Pre-order walk of `nodes`. Children of paths in `collapsed` are skipped;
/// the line whose path matches `current` is marked selected.
pub fn render_tree(
    nodes: &[FolderNode],
    depth: usize,
    current: &str,
    collapsed: &BTreeSet<String>,
) -> Vec<TreeLine> {
    let mut lines = Vec::new();
    push_lines(nodes, depth, normalize(current), collapsed, &mut lines);
    lines
}

fn push_lines(
    nodes: &[FolderNode],
    depth: usize,
    current: &str,
    collapsed: &BTreeSet<String>,
    out: &mut Vec<TreeLine>,
) {
    for node in nodes {
        let is_collapsed = collapsed.contains(normalize(&node.path));
        out.push(TreeLine {
            name: node.name.clone(),
            path: node.path.clone(),
            depth,
            kind: node.kind,
            has_children: !node.children.is_empty(),
            collapsed: is_collapsed,
            selected: !current.is_empty() && normalize(&node.path) == current,
            file_count: node.file_count,
        });
        if !is_collapsed {
            push_lines(&node.children, depth + 1, current, collapsed, out);
        }
    }
}

/// Folder paths compare equal with or without the trailing slash.
pub fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}
