//! Resolving the configured library and listing its presentations.
//!
//! The pipeline runs in order: resolve site and drive by name, list the drive,
//! join the listing with the library's column values, then fetch previews.
//! Misses at the resolve step are not errors; they mean the configuration
//! points at nothing and the caller shows an empty list.

use crate::models::{ColumnDefinition, Drive, DriveItem, ListItem, Site};
use crate::source::DriveSource;
use futures::future::join_all;
use reuse_core::{AddinConfig, FacetDefinition, FacetValue, FileRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The site and drive a configuration points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLibrary {
    pub site: Site,
    pub drive: Drive,
}

/// Everything the results list needs after a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub library: ResolvedLibrary,
    pub files: Vec<FileRecord>,
    pub facets: Vec<FacetDefinition>,
}

/// Find the site by exact display name, then its drive by name ignoring case.
pub async fn resolve_library<S: DriveSource>(
    source: &S,
    site_name: &str,
    library_name: &str,
) -> Result<Option<ResolvedLibrary>> {
    let sites = source.sites().await?;
    let Some(site) = sites
        .into_iter()
        .find(|site| site.display_name.as_deref() == Some(site_name))
    else {
        log::warn!("No site named '{}' is visible", site_name);
        return Ok(None);
    };

    let wanted = library_name.to_lowercase();
    let drives = source.drives(&site.id).await?;
    let Some(drive) = drives
        .into_iter()
        .find(|drive| drive.name.to_lowercase() == wanted)
    else {
        log::warn!("Site '{}' has no library named '{}'", site_name, library_name);
        return Ok(None);
    };

    log::debug!("Resolved '{}/{}' to drive {}", site_name, library_name, drive.id);
    Ok(Some(ResolvedLibrary { site, drive }))
}

/// Join a drive listing with library rows by file name.
///
/// Names are compared exactly. Drive items without a library row are left
/// out, so every record carries its column values. Output follows the order
/// of `plain`.
pub fn merge_listings(
    plain: &[DriveItem],
    expanded: &[ListItem],
    site_id: &str,
    drive_id: &str,
) -> Vec<FileRecord> {
    // Rows from subfolders can share a name; the first row wins.
    let mut rows: HashMap<&str, &ListItem> = HashMap::new();
    for row in expanded {
        if let Some(name) = row.file_name() {
            rows.entry(name).or_insert(row);
        }
    }

    let mut dropped = 0;
    let records: Vec<FileRecord> = plain
        .iter()
        .filter_map(|item| match rows.get(item.name.as_str()) {
            Some(row) => Some(file_record(item, row, site_id, drive_id)),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        log::debug!("{} item(s) had no library row and were left out", dropped);
    }
    records
}

fn file_record(item: &DriveItem, row: &ListItem, site_id: &str, drive_id: &str) -> FileRecord {
    let site_id = row
        .parent_reference
        .as_ref()
        .and_then(|p| p.site_id.as_deref())
        .or_else(|| item.site_id())
        .unwrap_or(site_id);

    FileRecord {
        id: item.id.clone(),
        list_item_id: row.id.clone(),
        name: item.name.clone(),
        drive_id: item.drive_id().unwrap_or(drive_id).to_string(),
        site_id: site_id.to_string(),
        web_url: item.web_url.clone().or_else(|| row.web_url.clone()),
        facets: facets_from_fields(row),
        thumbnail: None,
    }
}

/// Column values of a row, minus the file name and OData/system fields.
fn facets_from_fields(row: &ListItem) -> BTreeMap<String, FacetValue> {
    row.fields
        .iter()
        .filter(|(key, _)| {
            key.as_str() != ListItem::FILE_NAME_FIELD
                && !key.starts_with('@')
                && !key.starts_with('_')
        })
        .filter_map(|(key, value)| FacetValue::from_json(value).map(|facet| (key.clone(), facet)))
        .collect()
}

/// List the library's files joined with their column values.
pub async fn list_library_files<S: DriveSource>(
    source: &S,
    library: &ResolvedLibrary,
) -> Result<Vec<FileRecord>> {
    let plain = source.root_children(&library.drive.id).await?;
    let expanded = match find_list_id(source, library).await? {
        Some(list_id) => source.list_items(&library.site.id, &list_id).await?,
        None => {
            log::warn!("No list backs library '{}'", library.drive.name);
            Vec::new()
        }
    };

    let records = merge_listings(&plain, &expanded, &library.site.id, &library.drive.id);
    log::info!(
        "Listed {} of {} item(s) in '{}'",
        records.len(),
        plain.len(),
        library.drive.name
    );
    Ok(records)
}

/// The list behind a drive, matched by display name.
async fn find_list_id<S: DriveSource>(source: &S, library: &ResolvedLibrary) -> Result<Option<String>> {
    let lists = source.lists(&library.site.id).await?;
    Ok(lists
        .into_iter()
        .find(|list| list.display_name == library.drive.name)
        .map(|list| list.id))
}

/// Resolve the large preview URL of every presentation.
///
/// Requests run together and independently. A failed request leaves that
/// record without a thumbnail. Records that are not presentations are
/// dropped.
pub async fn fetch_thumbnails<S: DriveSource>(source: &S, records: Vec<FileRecord>) -> Vec<FileRecord> {
    let requests = records
        .into_iter()
        .filter(FileRecord::is_presentation)
        .map(|mut record| async move {
            record.thumbnail = match source
                .thumbnails(&record.site_id, &record.drive_id, &record.id)
                .await
            {
                Ok(sets) => sets
                    .into_iter()
                    .next()
                    .and_then(|set| set.large)
                    .and_then(|large| large.url),
                Err(e) => {
                    log::debug!("No thumbnail for '{}': {}", record.name, e);
                    None
                }
            };
            record
        });

    join_all(requests).await
}

/// Names of files in the library matching a search query.
pub async fn search_library<S: DriveSource>(
    source: &S,
    library: &ResolvedLibrary,
    query: &str,
) -> Result<Vec<String>> {
    let hits = source
        .search(&library.site.id, &library.drive.id, query)
        .await?;
    Ok(hits
        .into_iter()
        .filter(|hit| hit.file.is_some())
        .map(|hit| hit.name)
        .collect())
}

/// Visible choice columns as filter facets.
pub fn facet_columns(columns: &[ColumnDefinition]) -> Vec<FacetDefinition> {
    columns
        .iter()
        .filter(|column| !column.hidden)
        .filter_map(|column| {
            let choice = column.choice.as_ref()?;
            Some(FacetDefinition {
                name: column.name.clone(),
                display_name: column.display_name.clone(),
                choices: choice.choices.clone(),
            })
        })
        .collect()
}

/// Resolve, list, and fetch previews for a configuration.
///
/// Facets come from the configuration; when it names none, the library's
/// choice columns are offered instead.
pub async fn load_library<S: DriveSource>(
    source: &S,
    config: &AddinConfig,
) -> Result<Option<LibrarySnapshot>> {
    let Some(library) = resolve_library(source, &config.site_name, &config.library_name).await?
    else {
        return Ok(None);
    };

    let files = list_library_files(source, &library).await?;
    let files = fetch_thumbnails(source, files).await;

    let facets = if config.filter_configs.is_empty() {
        match find_list_id(source, &library).await? {
            Some(list_id) => facet_columns(&source.columns(&library.site.id, &list_id).await?),
            None => Vec::new(),
        }
    } else {
        config.filter_configs.clone()
    };

    Ok(Some(LibrarySnapshot {
        library,
        files,
        facets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoiceColumn, FileFacet, ParentReference, SharePointList, Thumbnail, ThumbnailSet};
    use reuse_core::{Error, FilterSelection};
    use serde_json::{json, Map, Value};
    use std::collections::HashSet;

    const SITE_ID: &str = "contoso.sharepoint.com,1,2";
    const DRIVE_ID: &str = "b!decks";
    const LIST_ID: &str = "list-decks";

    /// In-memory tenant with one site and one library.
    #[derive(Default)]
    struct FakeTenant {
        items: Vec<DriveItem>,
        rows: Vec<ListItem>,
        columns: Vec<ColumnDefinition>,
        broken_thumbnails: HashSet<String>,
    }

    impl FakeTenant {
        fn with_decks(total: usize, described: usize) -> Self {
            let mut tenant = Self::default();
            for i in 0..total {
                let name = format!("Deck {}.pptx", i);
                tenant.items.push(drive_item(&format!("item{}", i), &name));
                if i < described {
                    let tag = if i % 3 == 0 { vec!["Launch", "Tech"] } else { vec!["Sales"] };
                    tenant.rows.push(list_row(&i.to_string(), &name, json!(tag)));
                }
            }
            tenant
        }
    }

    fn drive_item(id: &str, name: &str) -> DriveItem {
        DriveItem {
            id: id.to_string(),
            name: name.to_string(),
            web_url: None,
            size: Some(1024),
            parent_reference: Some(ParentReference {
                id: None,
                drive_id: Some(DRIVE_ID.to_string()),
                site_id: None,
            }),
            file: Some(FileFacet::default()),
        }
    }

    fn list_row(id: &str, name: &str, tag: Value) -> ListItem {
        let mut fields = Map::new();
        fields.insert("@odata.etag".into(), json!("\"etag\""));
        fields.insert("FileLeafRef".into(), json!(name));
        fields.insert("_UIVersionString".into(), json!("1.0"));
        fields.insert("Tag".into(), tag);
        ListItem {
            id: id.to_string(),
            web_url: None,
            parent_reference: None,
            fields,
        }
    }

    impl DriveSource for FakeTenant {
        async fn sites(&self) -> Result<Vec<Site>> {
            Ok(vec![
                Site {
                    id: "other".into(),
                    display_name: Some("Marketing Archive".into()),
                    name: None,
                    web_url: None,
                },
                Site {
                    id: SITE_ID.into(),
                    display_name: Some("Marketing".into()),
                    name: None,
                    web_url: None,
                },
            ])
        }

        async fn drives(&self, site_id: &str) -> Result<Vec<Drive>> {
            assert_eq!(site_id, SITE_ID);
            Ok(vec![
                Drive {
                    id: "b!docs".into(),
                    name: "Documents".into(),
                    drive_type: None,
                    web_url: None,
                },
                Drive {
                    id: DRIVE_ID.into(),
                    name: "Decks".into(),
                    drive_type: Some("documentLibrary".into()),
                    web_url: None,
                },
            ])
        }

        async fn lists(&self, _site_id: &str) -> Result<Vec<SharePointList>> {
            Ok(vec![SharePointList {
                id: LIST_ID.into(),
                display_name: "Decks".into(),
                name: None,
            }])
        }

        async fn list_items(&self, _site_id: &str, list_id: &str) -> Result<Vec<ListItem>> {
            assert_eq!(list_id, LIST_ID);
            Ok(self.rows.clone())
        }

        async fn columns(&self, _site_id: &str, _list_id: &str) -> Result<Vec<ColumnDefinition>> {
            Ok(self.columns.clone())
        }

        async fn root_children(&self, drive_id: &str) -> Result<Vec<DriveItem>> {
            assert_eq!(drive_id, DRIVE_ID);
            Ok(self.items.clone())
        }

        async fn search(&self, _site_id: &str, _drive_id: &str, query: &str) -> Result<Vec<DriveItem>> {
            Ok(self
                .items
                .iter()
                .filter(|item| item.name.contains(query))
                .cloned()
                .collect())
        }

        async fn thumbnails(
            &self,
            site_id: &str,
            _drive_id: &str,
            item_id: &str,
        ) -> Result<Vec<ThumbnailSet>> {
            assert_eq!(site_id, SITE_ID);
            if self.broken_thumbnails.contains(item_id) {
                return Err(Error::Graph {
                    status: 503,
                    message: "serviceNotAvailable".into(),
                });
            }
            Ok(vec![ThumbnailSet {
                large: Some(Thumbnail {
                    url: Some(format!("https://thumbs.example.test/{}/large", item_id)),
                    width: Some(800),
                    height: Some(600),
                }),
                ..Default::default()
            }])
        }

        async fn download(&self, _drive_id: &str, _item_id: &str) -> Result<Vec<u8>> {
            Ok(b"PK\x03\x04".to_vec())
        }
    }

    fn config() -> AddinConfig {
        AddinConfig {
            site_name: "Marketing".into(),
            library_name: "decks".into(),
            filter_configs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_resolve_library() {
        let tenant = FakeTenant::default();
        let library = resolve_library(&tenant, "Marketing", "DECKS").await.unwrap().unwrap();
        assert_eq!(library.site.id, SITE_ID);
        assert_eq!(library.drive.id, DRIVE_ID);
    }

    #[tokio::test]
    async fn test_resolve_misses_are_none() {
        let tenant = FakeTenant::default();
        assert!(resolve_library(&tenant, "marketing", "Decks").await.unwrap().is_none());
        assert!(resolve_library(&tenant, "Marketing", "Slides").await.unwrap().is_none());
    }

    #[test]
    fn test_merge_drops_items_without_rows() {
        let plain = vec![
            drive_item("1", "Launch.pptx"),
            drive_item("2", "Orphan.pptx"),
            drive_item("3", "launch.pptx"),
        ];
        let expanded = vec![list_row("10", "Launch.pptx", json!(["Launch"]))];

        let merged = merge_listings(&plain, &expanded, SITE_ID, DRIVE_ID);

        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.id, "1");
        assert_eq!(record.list_item_id, "10");
        assert_eq!(record.drive_id, DRIVE_ID);
        assert_eq!(record.site_id, SITE_ID);
        assert_eq!(
            record.facet("Tag"),
            Some(&FacetValue::Choices(vec!["Launch".into()]))
        );
        assert!(record.facets.keys().all(|k| !k.starts_with('@') && !k.starts_with('_')));
        assert!(!record.facets.contains_key("FileLeafRef"));
    }

    #[test]
    fn test_merge_takes_first_row_for_shared_name() {
        let plain = vec![drive_item("1", "Deck.pptx")];
        let expanded = vec![
            list_row("10", "Deck.pptx", json!(["Root"])),
            list_row("11", "Deck.pptx", json!(["Archive"])),
        ];

        let merged = merge_listings(&plain, &expanded, SITE_ID, DRIVE_ID);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].list_item_id, "10");
        assert_eq!(
            merged[0].facet("Tag"),
            Some(&FacetValue::Choices(vec!["Root".into()]))
        );
    }

    #[tokio::test]
    async fn test_thumbnail_failures_degrade_to_none() {
        let mut tenant = FakeTenant::with_decks(3, 3);
        tenant.broken_thumbnails.insert("item1".into());
        let library = resolve_library(&tenant, "Marketing", "Decks").await.unwrap().unwrap();

        let files = list_library_files(&tenant, &library).await.unwrap();
        let files = fetch_thumbnails(&tenant, files).await;

        assert_eq!(files.len(), 3);
        assert_eq!(
            files[0].thumbnail.as_deref(),
            Some("https://thumbs.example.test/item0/large")
        );
        assert_eq!(files[1].thumbnail, None);
        assert!(files[2].thumbnail.is_some());
    }

    #[tokio::test]
    async fn test_thumbnails_skip_non_presentations() {
        let tenant = FakeTenant::default();
        let records = vec![
            FileRecord::new("a", "Deck.pptx", DRIVE_ID, SITE_ID),
            FileRecord::new("b", "Notes.docx", DRIVE_ID, SITE_ID),
        ];
        let files = fetch_thumbnails(&tenant, records).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "a");
    }

    #[tokio::test]
    async fn test_load_library_end_to_end() {
        let mut tenant = FakeTenant::with_decks(12, 9);
        tenant.broken_thumbnails.insert("item4".into());
        tenant.columns = vec![ColumnDefinition {
            name: "Tag".into(),
            display_name: Some("Tag".into()),
            hidden: false,
            choice: Some(ChoiceColumn {
                choices: vec!["Launch".into(), "Sales".into(), "Tech".into()],
            }),
        }];

        let snapshot = load_library(&tenant, &config()).await.unwrap().unwrap();

        assert_eq!(snapshot.files.len(), 9);
        assert_eq!(snapshot.files.iter().filter(|f| f.thumbnail.is_none()).count(), 1);
        assert_eq!(snapshot.facets.len(), 1);
        assert_eq!(snapshot.facets[0].choices.len(), 3);

        let launch = FilterSelection::new().with("Tag", ["Launch"]).apply(&snapshot.files);
        assert_eq!(launch.len(), 3);
        assert!(launch
            .iter()
            .all(|f| f.facet("Tag").map(|t| t.matches("Launch")).unwrap_or(false)));
    }

    #[tokio::test]
    async fn test_load_library_prefers_configured_facets() {
        let tenant = FakeTenant::with_decks(2, 2);
        let mut config = config();
        config.filter_configs = vec![FacetDefinition::new("Tag", vec!["Launch".into()])];

        let snapshot = load_library(&tenant, &config).await.unwrap().unwrap();
        assert_eq!(snapshot.facets, config.filter_configs);
    }

    #[tokio::test]
    async fn test_load_library_unknown_site() {
        let tenant = FakeTenant::with_decks(2, 2);
        let mut config = config();
        config.site_name = "Finance".into();
        assert!(load_library(&tenant, &config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_library_returns_file_names() {
        let tenant = FakeTenant::with_decks(12, 12);
        let library = resolve_library(&tenant, "Marketing", "Decks").await.unwrap().unwrap();
        let names = search_library(&tenant, &library, "Deck 1").await.unwrap();
        assert_eq!(names, vec!["Deck 1.pptx", "Deck 10.pptx", "Deck 11.pptx"]);
    }

    #[test]
    fn test_facet_columns_skip_hidden_and_non_choice() {
        let columns = vec![
            ColumnDefinition {
                name: "Tag".into(),
                display_name: None,
                hidden: false,
                choice: Some(ChoiceColumn {
                    choices: vec!["Launch".into()],
                }),
            },
            ColumnDefinition {
                name: "Title".into(),
                display_name: None,
                hidden: false,
                choice: None,
            },
            ColumnDefinition {
                name: "Internal".into(),
                display_name: None,
                hidden: true,
                choice: Some(ChoiceColumn::default()),
            },
        ];
        let facets = facet_columns(&columns);
        assert_eq!(facets, vec![FacetDefinition::new("Tag", vec!["Launch".into()])]);
    }
}
