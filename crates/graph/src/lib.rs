//! Microsoft Graph access for slide reuse.
//!
//! Resolves the configured SharePoint library, lists its presentations joined
//! with their column values, and fetches slide previews.

pub mod client;
pub mod library;
pub mod models;
pub mod source;

pub use client::{GraphClient, GRAPH_BASE_URL};
pub use library::{
    facet_columns, fetch_thumbnails, list_library_files, load_library, merge_listings,
    resolve_library, search_library, LibrarySnapshot, ResolvedLibrary,
};
pub use source::DriveSource;
