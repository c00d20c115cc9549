//! HTTP implementation of [`DriveSource`] against Microsoft Graph.

use crate::models::{
    Collection, ColumnDefinition, Drive, DriveItem, ErrorEnvelope, ListItem, SharePointList,
    Site, ThumbnailSet,
};
use crate::source::DriveSource;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reuse_core::{Error, Result};
use serde::de::DeserializeOwned;

/// Graph v1.0 endpoint.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Upper bound on followed `@odata.nextLink` pages for one collection.
const MAX_PAGES: usize = 100;

/// Authenticated Graph client.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GraphClient {
    /// Create a client that sends `token` as a bearer credential.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GRAPH_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at another Graph root (national clouds, beta).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reuse an existing HTTP client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Absolute URL for a Graph path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send an authenticated GET and fail on non-success status.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        log::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Graph {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch every page of a collection.
    async fn get_collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path));
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page: Collection<T> = self.get_json(&url).await?;
            items.extend(page.value);
            pages += 1;
            if pages >= MAX_PAGES {
                log::warn!("Stopped after {} pages of {}", pages, path);
                break;
            }
            next = page.next_link;
        }

        Ok(items)
    }
}

impl DriveSource for GraphClient {
    async fn sites(&self) -> Result<Vec<Site>> {
        self.get_collection("sites?search=*").await
    }

    async fn drives(&self, site_id: &str) -> Result<Vec<Drive>> {
        self.get_collection(&format!("sites/{}/drives", site_id)).await
    }

    async fn lists(&self, site_id: &str) -> Result<Vec<SharePointList>> {
        self.get_collection(&format!("sites/{}/lists", site_id)).await
    }

    async fn list_items(&self, site_id: &str, list_id: &str) -> Result<Vec<ListItem>> {
        self.get_collection(&format!(
            "sites/{}/lists/{}/items?$expand=fields",
            site_id, list_id
        ))
        .await
    }

    async fn columns(&self, site_id: &str, list_id: &str) -> Result<Vec<ColumnDefinition>> {
        self.get_collection(&format!("sites/{}/lists/{}/columns", site_id, list_id))
            .await
    }

    async fn root_children(&self, drive_id: &str) -> Result<Vec<DriveItem>> {
        self.get_collection(&format!("drives/{}/root/children", drive_id))
            .await
    }

    async fn search(&self, site_id: &str, drive_id: &str, query: &str) -> Result<Vec<DriveItem>> {
        self.get_collection(&search_path(site_id, drive_id, query)).await
    }

    async fn thumbnails(
        &self,
        site_id: &str,
        drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<ThumbnailSet>> {
        let url = self.url(&format!(
            "sites/{}/drives/{}/items/{}/thumbnails",
            site_id, drive_id, item_id
        ));
        let page: Collection<ThumbnailSet> = self.get_json(&url).await?;
        Ok(page.value)
    }

    async fn download(&self, drive_id: &str, item_id: &str) -> Result<Vec<u8>> {
        let url = self.url(&format!("drives/{}/items/{}/content", drive_id, item_id));
        let response = self.get(&url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Path of a drive search; quotes are doubled for the OData string literal.
fn search_path(site_id: &str, drive_id: &str, query: &str) -> String {
    let literal = query.replace('\'', "''");
    format!(
        "sites/{}/drives/{}/root/search(q='{}')",
        site_id,
        drive_id,
        urlencoding::encode(&literal)
    )
}

/// Prefer Graph's own error message over the raw body.
fn error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            if envelope.error.code.is_empty() {
                envelope.error.message
            } else {
                format!("{}: {}", envelope.error.code, envelope.error.message)
            }
        }
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => fallback.to_string(),
    }
}
