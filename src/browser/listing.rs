//! One folder level of entries with a client-side filter and page window.

use crate::api::FolderContents;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub key: String,
    pub filename: String,
    pub size: u64,
    pub last_modified: String,
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Folders first (size forced to 0), then files; server order is kept
/// inside each group.
pub fn merge_contents(contents: FolderContents) -> Vec<FileEntry> {
    let folders = contents.folders.into_iter().map(|f| FileEntry {
        key: f.path,
        filename: f.name,
        size: 0,
        last_modified: String::new(),
        kind: EntryKind::Folder,
    });
    let files = contents.files.into_iter().map(|f| FileEntry {
        key: f.key,
        filename: f.filename,
        size: f.size,
        last_modified: f.last_modified,
        kind: EntryKind::File,
    });
    folders.chain(files).collect()
}

#[derive(Debug, Clone)]
pub struct Listing {
    entries: Vec<FileEntry>,
    filter: String,
    /// Indices into `entries` that pass the filter.
    visible: Vec<usize>,
    page: usize,
    page_size: usize,
}

impl Default for Listing {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Listing {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            filter: String::new(),
            visible: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Swaps in a freshly fetched folder level and returns to page 1.
    /// The current filter term stays applied.
    pub fn replace(&mut self, entries: Vec<FileEntry>) {
        self.entries = entries;
        self.recompute();
    }

    pub fn set_filter(&mut self, term: &str) {
        self.filter = term.to_string();
        self.recompute();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn recompute(&mut self) {
        let needle = self.filter.trim().to_lowercase();
        self.visible = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| needle.is_empty() || e.filename.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.page = 1;
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn filtered(&self) -> impl Iterator<Item = &FileEntry> + '_ {
        self.visible.iter().map(move |&i| &self.entries[i])
    }

    pub fn filtered_count(&self) -> usize {
        self.visible.len()
    }

    /// `ceil(filtered / page_size)`; zero when nothing matches.
    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(self.page_size)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.last_page());
    }

    pub fn next_page(&mut self) {
        self.go_to(self.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to(self.page.saturating_sub(1));
    }

    pub fn page_entries(&self) -> Vec<&FileEntry> {
        let start = (self.page - 1) * self.page_size;
        self.visible
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.entries[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RemoteFile, RemoteFolder};

    fn file(name: &str) -> FileEntry {
        FileEntry {
            key: format!("docs/{name}"),
            filename: name.to_string(),
            size: 10,
            last_modified: String::new(),
            kind: EntryKind::File,
        }
    }

    fn listing_of(n: usize) -> Listing {
        let mut listing = Listing::new(DEFAULT_PAGE_SIZE);
        listing.replace((0..n).map(|i| file(&format!("file-{i:03}.pdf"))).collect());
        listing
    }

    #[test]
    fn folders_come_first_with_zero_size() {
        let contents = FolderContents {
            folder_path: "docs/".into(),
            files: vec![
                RemoteFile {
                    key: "docs/b.pdf".into(),
                    filename: "b.pdf".into(),
                    size: 42,
                    last_modified: "2024-01-01T00:00:00".into(),
                },
                RemoteFile {
                    key: "docs/a.pdf".into(),
                    filename: "a.pdf".into(),
                    size: 7,
                    last_modified: String::new(),
                },
            ],
            folders: vec![RemoteFolder {
                path: "docs/sub/".into(),
                name: "sub".into(),
            }],
        };
        let merged = merge_contents(contents);
        let names: Vec<_> = merged.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["sub", "b.pdf", "a.pdf"]);
        assert!(merged[0].is_folder());
        assert_eq!(merged[0].size, 0);
    }

    #[test]
    fn total_pages_is_ceiling_of_filtered_count() {
        assert_eq!(listing_of(0).total_pages(), 0);
        assert_eq!(listing_of(1).total_pages(), 1);
        assert_eq!(listing_of(20).total_pages(), 1);
        assert_eq!(listing_of(21).total_pages(), 2);
        assert_eq!(listing_of(45).total_pages(), 3);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut listing = listing_of(45);
        listing.previous_page();
        assert_eq!(listing.page(), 1);
        for _ in 0..10 {
            listing.next_page();
        }
        assert_eq!(listing.page(), 3);
        assert_eq!(listing.page_entries().len(), 5);
        listing.go_to(0);
        assert_eq!(listing.page(), 1);

        let mut empty = listing_of(0);
        empty.next_page();
        assert_eq!(empty.page(), 1);
        assert!(empty.page_entries().is_empty());
    }

    #[test]
    fn filter_is_case_insensitive_and_idempotent() {
        let mut listing = Listing::new(DEFAULT_PAGE_SIZE);
        listing.replace(vec![file("Report.PDF"), file("notes.txt"), file("annual report.docx")]);

        listing.set_filter("REPORT");
        let first: Vec<_> = listing.filtered().cloned().collect();
        listing.set_filter("REPORT");
        let second: Vec<_> = listing.filtered().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        listing.set_filter("");
        assert_eq!(listing.filtered().cloned().collect::<Vec<_>>(), listing.entries().to_vec());
    }

    #[test]
    fn filter_resets_page_and_recounts() {
        let mut listing = listing_of(45);
        listing.go_to(3);
        listing.set_filter("file-04");
        assert_eq!(listing.page(), 1);
        assert_eq!(listing.filtered_count(), 5);
        assert_eq!(listing.total_pages(), 1);
    }
}
