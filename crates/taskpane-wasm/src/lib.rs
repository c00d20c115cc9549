//! WASM bindings for the slide reuse taskpane.
//!
//! This crate exposes slide-id extraction, facet filtering, paging, and the
//! insertion flow to the taskpane's JavaScript. The PowerPoint host itself
//! stays in JavaScript and is handed in as an object.

mod host;

use host::JsSlideHost;
use reuse_core::{
    insert_and_go_to_last, FileRecord, FilterSelection, InsertOutcome, InsertRequest, Paginator,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// One page of results.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Items on the requested page.
    pub files: Vec<T>,
    /// Zero-based page shown, pulled back onto the last page if needed.
    pub offset: usize,
    /// Number of pages.
    pub page_count: usize,
    /// Number of items across all pages.
    pub total: usize,
}

/// Read the slide references of a .pptx file.
///
/// # Arguments
/// * `data` - The raw bytes of the PPTX file
///
/// # Returns
/// An array of `{ index, slideId }`, or throws if the package is unreadable.
#[wasm_bindgen]
pub fn extract_slide_ids(data: &[u8]) -> Result<JsValue, JsValue> {
    let slides = reuse_pptx::SlideIdReader::new()
        .read_bytes(data)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&slides)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Encode a package in the base64 form the host's insert call takes.
#[wasm_bindgen]
pub fn encode_package(data: &[u8]) -> String {
    reuse_pptx::encode_package(data)
}

/// Narrow files by a `{ facet: [values] }` selection.
#[wasm_bindgen]
pub fn filter_files(files: JsValue, selection: JsValue) -> Result<JsValue, JsValue> {
    let files: Vec<FileRecord> = serde_wasm_bindgen::from_value(files)
        .map_err(|e| JsValue::from_str(&format!("Invalid files array: {}", e)))?;
    let selection: FilterSelection = serde_wasm_bindgen::from_value(selection)
        .map_err(|e| JsValue::from_str(&format!("Invalid filter selection: {}", e)))?;

    serde_wasm_bindgen::to_value(&selection.apply(&files))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Slice one page out of a file list.
#[wasm_bindgen]
pub fn paginate(files: JsValue, offset: usize, page_size: Option<usize>) -> Result<JsValue, JsValue> {
    let files: Vec<FileRecord> = serde_wasm_bindgen::from_value(files)
        .map_err(|e| JsValue::from_str(&format!("Invalid files array: {}", e)))?;

    serde_wasm_bindgen::to_value(&paginate_impl(files, offset, page_size))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn paginate_impl<T: Clone>(files: Vec<T>, offset: usize, page_size: Option<usize>) -> PageResult<T> {
    let paginator = match page_size {
        Some(size) => Paginator::new().with_page_size(size),
        None => Paginator::new(),
    };
    let offset = paginator.clamp_offset(files.len(), offset);
    PageResult {
        files: paginator.page(&files, offset).to_vec(),
        offset,
        page_count: paginator.page_count(files.len()),
        total: files.len(),
    }
}

/// Insert slides into the open presentation and go to the last new one.
///
/// `host` must provide `getSlideIds()`, `insertSlidesFromBase64(base64,
/// options)` and `goToSlide(id)`, each returning a promise. `request` is
/// `{ base64, targetSlideId, sourceSlideIds, formatting }`.
///
/// Host failures are written to the console and resolve to `undefined`;
/// otherwise the promise resolves to `{ status, slideId? }`.
#[wasm_bindgen]
pub async fn insert_slides(host: JsValue, request: JsValue) -> Result<JsValue, JsValue> {
    let request: InsertRequest = serde_wasm_bindgen::from_value(request)
        .map_err(|e| JsValue::from_str(&format!("Invalid insert request: {}", e)))?;

    let mut host = JsSlideHost::new(host);
    let outcome = match insert_and_go_to_last(&mut host, &request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("Insert slides error -> {}", e)));
            return Ok(JsValue::UNDEFINED);
        }
    };

    if outcome == InsertOutcome::NoNewSlide {
        web_sys::console::warn_1(&JsValue::from_str("Insert produced no new slide"));
    }
    serde_wasm_bindgen::to_value(&outcome)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
