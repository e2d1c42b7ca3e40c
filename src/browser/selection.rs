use std::collections::BTreeSet;

use super::listing::FileEntry;

/// Keys of the files the user has ticked. Folders are never selectable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    keys: BTreeSet<String>,
}

impl SelectionSet {
    /// Returns whether the key is selected after the toggle.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }

    /// Select-all checkbox handler: checking selects every file in
    /// `entries`, unchecking clears the selection.
    pub fn set_all<'a>(&mut self, entries: impl IntoIterator<Item = &'a FileEntry>, checked: bool) {
        if checked {
            self.keys.extend(
                entries
                    .into_iter()
                    .filter(|e| !e.is_folder())
                    .map(|e| e.key.clone()),
            );
        } else {
            self.clear();
        }
    }

    /// State of the select-all checkbox: checked only when there is at least
    /// one file and every file is selected.
    pub fn all_selected<'a>(&self, entries: impl IntoIterator<Item = &'a FileEntry>) -> bool {
        let mut any = false;
        for entry in entries.into_iter().filter(|e| !e.is_folder()) {
            any = true;
            if !self.keys.contains(&entry.key) {
                return false;
            }
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::listing::EntryKind;

    fn entry(key: &str, kind: EntryKind) -> FileEntry {
        FileEntry {
            key: key.into(),
            filename: key.rsplit('/').next().unwrap_or(key).into(),
            size: 0,
            last_modified: String::new(),
            kind,
        }
    }

    fn entries() -> Vec<FileEntry> {
        vec![
            entry("docs/sub/", EntryKind::Folder),
            entry("docs/a.pdf", EntryKind::File),
            entry("docs/b.pdf", EntryKind::File),
            entry("docs/c.pdf", EntryKind::File),
        ]
    }

    #[test]
    fn select_all_then_deselect_one_unchecks_select_all() {
        let entries = entries();
        let mut selection = SelectionSet::default();
        selection.set_all(&entries, true);
        assert!(selection.all_selected(&entries));
        assert_eq!(selection.len(), 3);
        assert!(!selection.contains("docs/sub/"));

        assert!(!selection.toggle("docs/b.pdf"));
        assert!(!selection.all_selected(&entries));

        selection.set_all(&entries, true);
        assert!(selection.all_selected(&entries));
        assert_eq!(
            selection.keys(),
            vec!["docs/a.pdf", "docs/b.pdf", "docs/c.pdf"]
        );
    }

    #[test]
    fn unchecking_select_all_clears() {
        let entries = entries();
        let mut selection = SelectionSet::default();
        selection.toggle("docs/a.pdf");
        selection.set_all(&entries, false);
        assert!(selection.is_empty());
    }

    #[test]
    fn folder_only_listing_never_reports_all_selected() {
        let entries = vec![entry("docs/sub/", EntryKind::Folder)];
        let selection = SelectionSet::default();
        assert!(!selection.all_selected(&entries));
    }
}
