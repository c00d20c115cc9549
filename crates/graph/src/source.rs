//! The Graph operations the library pipeline depends on.

use crate::models::{
    ColumnDefinition, Drive, DriveItem, ListItem, SharePointList, Site, ThumbnailSet,
};
use reuse_core::Result;

/// Read access to sites, drives, and library lists.
///
/// [`crate::GraphClient`] implements this over HTTP. The pipeline functions
/// in [`crate::library`] are written against the trait so they can run over
/// any source of these resources.
#[allow(async_fn_in_trait)]
pub trait DriveSource {
    /// All sites visible to the caller.
    async fn sites(&self) -> Result<Vec<Site>>;

    /// Drives (document libraries) of a site.
    async fn drives(&self, site_id: &str) -> Result<Vec<Drive>>;

    /// Lists of a site.
    async fn lists(&self, site_id: &str) -> Result<Vec<SharePointList>>;

    /// Rows of a list with their column values expanded.
    async fn list_items(&self, site_id: &str, list_id: &str) -> Result<Vec<ListItem>>;

    /// Column definitions of a list.
    async fn columns(&self, site_id: &str, list_id: &str) -> Result<Vec<ColumnDefinition>>;

    /// Items at the root of a drive.
    async fn root_children(&self, drive_id: &str) -> Result<Vec<DriveItem>>;

    /// Full-text search within a drive.
    async fn search(&self, site_id: &str, drive_id: &str, query: &str) -> Result<Vec<DriveItem>>;

    /// Rendered previews of a drive item.
    async fn thumbnails(&self, site_id: &str, drive_id: &str, item_id: &str)
        -> Result<Vec<ThumbnailSet>>;

    /// Raw content of a drive item.
    async fn download(&self, drive_id: &str, item_id: &str) -> Result<Vec<u8>>;
}
