//! Folder tree, file listing and selection state for the storage browser.

pub mod actions;
pub mod listing;
pub mod selection;
pub mod tree;

use std::collections::BTreeSet;

use crate::api::{FolderContents, FolderNode, FolderTree, TreeStatistics};

pub use actions::{BrowserError, BulkReport};
pub use listing::{merge_contents, EntryKind, FileEntry, Listing};
pub use selection::SelectionSet;
pub use tree::{render_tree, TreeLine};

#[derive(Debug, Clone, Default)]
pub struct BrowserState {
    pub tree: Vec<FolderNode>,
    pub statistics: TreeStatistics,
    /// Folder whose contents are listed; empty string is the bucket root.
    pub current_folder: String,
    pub listing: Listing,
    pub selection: SelectionSet,
    pub collapsed: BTreeSet<String>,
}

impl BrowserState {
    pub fn new(page_size: usize) -> Self {
        Self {
            listing: Listing::new(page_size),
            ..Self::default()
        }
    }

    pub fn apply_tree(&mut self, tree: FolderTree) {
        self.tree = tree.tree;
        self.statistics = tree.statistics;
    }

    /// Moves to `path`; the caller fetches its contents next.
    pub fn navigate(&mut self, path: &str) {
        self.current_folder = path.to_string();
        self.selection.clear();
    }

    pub fn apply_contents(&mut self, contents: FolderContents) {
        self.listing.replace(merge_contents(contents));
        self.selection.clear();
    }

    pub fn tree_lines(&self) -> Vec<TreeLine> {
        render_tree(&self.tree, 0, &self.current_folder, &self.collapsed)
    }

    pub fn toggle_collapsed(&mut self, path: &str) {
        let path = tree::normalize(path).to_string();
        if !self.collapsed.remove(&path) {
            self.collapsed.insert(path);
        }
    }

    /// Parent of the current folder, `None` at the root.
    pub fn parent_folder(&self) -> Option<String> {
        let trimmed = tree::normalize(&self.current_folder);
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.rfind('/') {
            Some(idx) => format!("{}/", &trimmed[..idx]),
            None => String::new(),
        })
    }

    pub fn select_all_checked(&self) -> bool {
        self.selection.all_selected(self.listing.filtered())
    }

    pub fn set_select_all(&mut self, checked: bool) {
        let entries: Vec<FileEntry> = self.listing.filtered().cloned().collect();
        self.selection.set_all(&entries, checked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RemoteFile, RemoteFolder};

    fn contents() -> FolderContents {
        FolderContents {
            folder_path: "docs/".into(),
            files: vec![RemoteFile {
                key: "docs/a.pdf".into(),
                filename: "a.pdf".into(),
                size: 3,
                last_modified: String::new(),
            }],
            folders: vec![RemoteFolder {
                path: "docs/sub/".into(),
                name: "sub".into(),
            }],
        }
    }

    #[test]
    fn loading_contents_clears_selection_and_resets_page() {
        let mut state = BrowserState::new(1);
        state.apply_contents(contents());
        state.listing.next_page();
        state.selection.toggle("docs/a.pdf");

        state.apply_contents(contents());
        assert!(state.selection.is_empty());
        assert_eq!(state.listing.page(), 1);
        assert_eq!(state.listing.entries().len(), 2);
    }

    #[test]
    fn parent_of_nested_folder() {
        let mut state = BrowserState::default();
        assert_eq!(state.parent_folder(), None);
        state.navigate("docs/sub/");
        assert_eq!(state.parent_folder().as_deref(), Some("docs/"));
        state.navigate("docs/");
        assert_eq!(state.parent_folder().as_deref(), Some(""));
    }

    #[test]
    fn select_all_skips_folders() {
        let mut state = BrowserState::default();
        state.apply_contents(contents());
        state.set_select_all(true);
        assert!(state.select_all_checked());
        assert_eq!(state.selection.keys(), vec!["docs/a.pdf"]);
    }
}
