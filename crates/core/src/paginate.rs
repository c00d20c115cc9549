//! Fixed-size client-side pages over an in-memory list.

/// Records shown per page in the results list.
pub const PAGE_SIZE: usize = 10;

/// Slices a list into consecutive pages of `page_size` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
        }
    }
}

impl Paginator {
    /// Create a paginator with the default page size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1); // At least 1 item per page
        self
    }

    /// Items per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `total` items.
    pub fn page_count(&self, total: usize) -> usize {
        (total + self.page_size - 1) / self.page_size
    }

    /// The items on zero-based page `offset`. Empty when past the end.
    pub fn page<'a, T>(&self, items: &'a [T], offset: usize) -> &'a [T] {
        let start = offset.saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    /// Iterate all pages in order.
    pub fn pages<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.page_size)
    }

    /// Pull an offset back onto the last page when the list has shrunk.
    pub fn clamp_offset(&self, total: usize, offset: usize) -> usize {
        offset.min(self.page_count(total).saturating_sub(1))
    }
}
