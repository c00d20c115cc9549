//! Microsoft Graph resource shapes used by the library pipeline.
//!
//! Only the properties the add-in reads are modelled; Graph sends many more.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A page of a Graph collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// URL of the next page, when there is one.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// A SharePoint site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A document library exposed as a drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub drive_type: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A SharePoint list. Every document library is also a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointList {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Where a drive item lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
}

/// Marker present on file items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A file or folder in a drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub parent_reference: Option<ParentReference>,
    #[serde(default)]
    pub file: Option<FileFacet>,
}

impl DriveItem {
    /// Drive id from the parent reference.
    pub fn drive_id(&self) -> Option<&str> {
        self.parent_reference.as_ref()?.drive_id.as_deref()
    }

    /// Site id from the parent reference.
    pub fn site_id(&self) -> Option<&str> {
        self.parent_reference.as_ref()?.site_id.as_deref()
    }
}

/// A library row with its column values (`$expand=fields`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub parent_reference: Option<ParentReference>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ListItem {
    /// Field holding the file name of a library row.
    pub const FILE_NAME_FIELD: &'static str = "FileLeafRef";

    /// The file name this row describes.
    pub fn file_name(&self) -> Option<&str> {
        self.fields.get(Self::FILE_NAME_FIELD).and_then(Value::as_str)
    }
}

/// One rendered preview size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Preview sizes for a drive item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailSet {
    #[serde(default)]
    pub small: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub large: Option<Thumbnail>,
}

/// Choices offered by a choice column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceColumn {
    #[serde(default)]
    pub choices: Vec<String>,
}

/// A library column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub choice: Option<ChoiceColumn>,
}

/// Graph's error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
