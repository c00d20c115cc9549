//! Domain types for presentation files, facets, and slide references.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// File extensions the add-in treats as presentations.
const PRESENTATION_EXTENSIONS: &[&str] = &["ppt", "pptx"];

/// A value of a named classification field on a library item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    /// A single text value (choice, text, or resolved lookup column).
    Text(String),
    /// A multi-choice column.
    Choices(Vec<String>),
    /// A number column.
    Number(f64),
    /// A yes/no column.
    Flag(bool),
}

impl FacetValue {
    /// Convert a raw Graph `fields` value into a facet value.
    ///
    /// Lookup and managed-metadata columns arrive as objects; their label is
    /// used. Anything else that cannot be compared against a choice is skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(b) => Some(Self::Flag(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Array(items) => {
                let choices: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(_) => object_label(item),
                        _ => None,
                    })
                    .collect();
                if choices.is_empty() && !items.is_empty() {
                    None
                } else {
                    Some(Self::Choices(choices))
                }
            }
            Value::Object(_) => object_label(value).map(Self::Text),
            Value::Null => None,
        }
    }

    /// Whether this facet carries the given value.
    ///
    /// Text columns match when they contain the value, so a delimited
    /// `Launch;Tech` field matches `Launch`.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Text(text) => text.contains(value),
            Self::Choices(choices) => choices.iter().any(|c| c == value),
            Self::Number(_) | Self::Flag(_) => self.to_string() == value,
        }
    }

    /// All values carried by this facet, as strings.
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::Choices(choices) => choices.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Choices(choices) => f.write_str(&choices.join(", ")),
            Self::Number(n) => write!(f, "{}", n),
            Self::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Label of a lookup (`LookupValue`) or taxonomy (`Label`) object.
fn object_label(value: &Value) -> Option<String> {
    value
        .get("Label")
        .or_else(|| value.get("LookupValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// A presentation file in the configured library, joined with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Drive item id, used for thumbnails and downloads.
    pub id: String,

    /// Id of the matching list item in the document library.
    #[serde(default)]
    pub list_item_id: String,

    /// File name as stored in the library (`FileLeafRef`).
    pub name: String,

    /// Drive that holds the file.
    pub drive_id: String,

    /// Site that owns the drive.
    pub site_id: String,

    /// Browser URL of the file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// Custom library columns, keyed by internal column name.
    #[serde(default)]
    pub facets: BTreeMap<String, FacetValue>,

    /// Resolved preview image URL. None when the fetch failed or was skipped.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl FileRecord {
    /// Create a record with no facets and no thumbnail.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        drive_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            list_item_id: String::new(),
            name: name.into(),
            drive_id: drive_id.into(),
            site_id: site_id.into(),
            web_url: None,
            facets: BTreeMap::new(),
            thumbnail: None,
        }
    }

    /// Attach a facet value.
    pub fn with_facet(mut self, name: impl Into<String>, value: FacetValue) -> Self {
        self.facets.insert(name.into(), value);
        self
    }

    /// Look up a facet by name, ignoring ASCII case.
    ///
    /// Filter panels lowercase column names while the library reports them
    /// as declared, so both spellings must find the same column.
    pub fn facet(&self, name: &str) -> Option<&FacetValue> {
        self.facets.get(name).or_else(|| {
            self.facets
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Lowercased file extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// Whether the file is a PowerPoint presentation.
    pub fn is_presentation(&self) -> bool {
        self.extension()
            .map(|ext| PRESENTATION_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// A filterable library column and the values it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetDefinition {
    /// Internal column name, the key used in item fields.
    pub name: String,

    /// Human-readable column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Allowed values of the choice column.
    #[serde(rename = "choice", default, with = "choice_shape")]
    pub choices: Vec<String>,
}

impl FacetDefinition {
    /// Create a definition from a column name and its choices.
    pub fn new(name: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            choices,
        }
    }

    /// Label to show for this facet.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Columns describe their values as `"choice": { "choices": [...] }`.
mod choice_shape {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize, Default)]
    struct Choice {
        #[serde(default)]
        choices: Vec<String>,
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(choices: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
        Choice {
            choices: choices.to_vec(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Choice>::deserialize(deserializer)?
            .unwrap_or_default()
            .choices)
    }
}

/// Settings served to the taskpane: where to look and what to filter by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddinConfig {
    /// Display name of the SharePoint site.
    pub site_name: String,

    /// Name of the document library within the site.
    pub library_name: String,

    /// Facets offered in the filter panel.
    #[serde(default)]
    pub filter_configs: Vec<FacetDefinition>,
}

impl AddinConfig {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration document from disk.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// A slide's position in a source presentation and its package id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideReference {
    /// 1-based position in the slide-order list.
    pub index: usize,

    /// The `id` attribute from `p:sldId`.
    pub slide_id: String,
}

impl SlideReference {
    /// Create a slide reference.
    pub fn new(index: usize, slide_id: impl Into<String>) -> Self {
        Self {
            index,
            slide_id: slide_id.into(),
        }
    }

    /// Placeholder id for a slide entry without an `id` attribute.
    pub fn unknown(index: usize) -> Self {
        Self::new(index, format!("Unknown_{}", index))
    }
}
