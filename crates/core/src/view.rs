//! The results list state shown in the taskpane.
//!
//! `ResultsView` owns the authoritative file list. Everything the user sees is
//! derived from it on demand: search narrowing, then facet filters, then the
//! current page.

use crate::filter::FilterSelection;
use crate::paginate::Paginator;
use crate::types::FileRecord;
use std::collections::HashSet;

/// Extension of search hits that may be offered for reuse.
const SEARCHABLE_EXTENSION: &str = ".pptx";

/// Browsing state for one library listing.
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    files: Vec<FileRecord>,
    search: Option<HashSet<String>>,
    filter: FilterSelection,
    paginator: Paginator,
    page: usize,
}

impl ResultsView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view over a fetched list.
    pub fn with_files(files: Vec<FileRecord>) -> Self {
        let mut view = Self::new();
        view.set_files(files);
        view
    }

    /// Use a custom paginator.
    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self.reconcile_page();
        self
    }

    /// Replace the fetched list. Search narrowing is dropped, filters stay.
    pub fn set_files(&mut self, files: Vec<FileRecord>) {
        self.files = files;
        self.search = None;
        self.page = 0;
    }

    /// The full fetched list.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Narrow to files named by a drive search.
    ///
    /// Only `.pptx` hits count; a search with no such hits shows nothing.
    pub fn apply_search<I, S>(&mut self, hit_names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: HashSet<String> = hit_names
            .into_iter()
            .filter(|name| name.as_ref().ends_with(SEARCHABLE_EXTENSION))
            .map(|name| name.as_ref().to_string())
            .collect();
        log::debug!("Search narrowed to {} name(s)", names.len());
        self.search = Some(names);
        self.page = 0;
    }

    /// Remove search narrowing.
    pub fn reset_search(&mut self) {
        self.search = None;
        self.page = 0;
    }

    /// Whether a search currently narrows the list.
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Replace the facet selection.
    pub fn apply_filter(&mut self, selection: FilterSelection) {
        self.filter = selection;
        self.reconcile_page();
    }

    /// Back to "All" on every facet.
    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.reconcile_page();
    }

    /// The active facet selection.
    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    /// Files after search narrowing and facet filters.
    pub fn visible(&self) -> Vec<FileRecord> {
        let searched = self.files.iter().filter(|file| match &self.search {
            Some(names) => names.contains(&file.name),
            None => true,
        });
        self.filter.apply(searched)
    }

    /// Zero-based index of the page being shown.
    pub fn page_index(&self) -> usize {
        self.page
    }

    /// Number of pages in the visible list.
    pub fn page_count(&self) -> usize {
        self.paginator.page_count(self.visible().len())
    }

    /// Files on the current page.
    pub fn current_page(&self) -> Vec<FileRecord> {
        let visible = self.visible();
        self.paginator.page(&visible, self.page).to_vec()
    }

    /// Move to a page. Returns false and stays put if the page does not exist.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < self.page_count() {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Advance one page if possible.
    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page + 1)
    }

    /// Go back one page if possible.
    pub fn previous_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    fn reconcile_page(&mut self) {
        let total = self.visible().len();
        let clamped = self.paginator.clamp_offset(total, self.page);
        if clamped != self.page {
            log::debug!("Page {} out of range for {} item(s), moved to {}", self.page, total, clamped);
            self.page = clamped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FacetValue;

    fn files(n: usize) -> Vec<FileRecord> {
        (0..n)
            .map(|i| {
                let tag = if i % 2 == 0 { "Launch" } else { "Tech" };
                FileRecord::new(i.to_string(), format!("deck{}.pptx", i), "d", "s")
                    .with_facet("Tag", FacetValue::Choices(vec![tag.to_string()]))
            })
            .collect()
    }

    #[test]
    fn test_visible_is_projection_of_files() {
        let mut view = ResultsView::with_files(files(25));
        assert_eq!(view.visible().len(), 25);
        assert_eq!(view.page_count(), 3);

        view.apply_filter(FilterSelection::new().with("Tag", ["Launch"]));
        assert_eq!(view.visible().len(), 13);
        assert_eq!(view.files().len(), 25);

        view.clear_filter();
        assert_eq!(view.visible().len(), 25);
    }

    #[test]
    fn test_paging() {
        let mut view = ResultsView::with_files(files(25));
        assert_eq!(view.current_page().len(), 10);
        assert!(view.next_page());
        assert!(view.next_page());
        assert_eq!(view.current_page().len(), 5);
        assert!(!view.next_page());
        assert_eq!(view.page_index(), 2);
        assert!(view.previous_page());
        assert_eq!(view.page_index(), 1);
        assert!(!view.go_to_page(7));
    }

    #[test]
    fn test_page_clamped_when_filter_shrinks_list() {
        let mut view = ResultsView::with_files(files(40));
        assert!(view.go_to_page(3));

        // 20 Launch decks leave two pages.
        view.apply_filter(FilterSelection::new().with("Tag", ["Launch"]));
        assert_eq!(view.page_index(), 1);
        assert_eq!(view.current_page().len(), 10);
    }

    #[test]
    fn test_search_keeps_only_pptx_hits() {
        let mut view = ResultsView::with_files(files(5));
        view.apply_search(["deck1.pptx", "deck3.pptx", "deck4.docx", "other.pptx"]);

        let names: Vec<String> = view.visible().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["deck1.pptx", "deck3.pptx"]);
        assert!(view.is_searching());

        view.reset_search();
        assert_eq!(view.visible().len(), 5);
    }

    #[test]
    fn test_search_and_filter_combine() {
        let mut view = ResultsView::with_files(files(6));
        view.apply_search(["deck0.pptx", "deck1.pptx", "deck2.pptx"]);
        view.apply_filter(FilterSelection::new().with("Tag", ["Tech"]));

        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "deck1.pptx");
    }

    #[test]
    fn test_set_files_resets_search_and_page() {
        let mut view = ResultsView::with_files(files(30));
        view.go_to_page(2);
        view.apply_search(["deck0.pptx"]);
        view.set_files(files(3));
        assert!(!view.is_searching());
        assert_eq!(view.page_index(), 0);
        assert_eq!(view.visible().len(), 3);
    }
}
