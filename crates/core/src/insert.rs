//! Inserting slides from another presentation into the open one.
//!
//! The host reports nothing about what an insert created, so the orchestrator
//! reads the slide ids before and after the call and treats the new ids as
//! the inserted slides. The last of them becomes the current slide.

use crate::error::Result;
use crate::types::SlideReference;
use serde::{Deserialize, Serialize};

/// How inserted slides are themed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Formatting {
    /// Keep the source presentation's theme.
    #[default]
    KeepSourceFormatting,
    /// Restyle with the destination presentation's theme.
    UseDestinationTheme,
}

impl Formatting {
    /// Map the "Keep source formatting" checkbox.
    pub fn from_keep_source(keep: bool) -> Self {
        if keep {
            Self::KeepSourceFormatting
        } else {
            Self::UseDestinationTheme
        }
    }

    /// Name of the mode in the host API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepSourceFormatting => "KeepSourceFormatting",
            Self::UseDestinationTheme => "UseDestinationTheme",
        }
    }
}

/// What to insert and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    /// The source presentation package, base64-encoded.
    pub base64: String,

    /// Slide after which the new slides are placed.
    pub target_slide_id: String,

    /// Source slide ids (`p:sldId` ids) to insert.
    pub source_slide_ids: Vec<String>,

    /// Theme handling for inserted slides.
    #[serde(default)]
    pub formatting: Formatting,
}

impl InsertRequest {
    /// Insert a single source slide.
    pub fn single(
        base64: impl Into<String>,
        target_slide_id: impl Into<String>,
        source_slide_id: impl Into<String>,
        formatting: Formatting,
    ) -> Self {
        Self {
            base64: base64.into(),
            target_slide_id: target_slide_id.into(),
            source_slide_ids: vec![source_slide_id.into()],
            formatting,
        }
    }

    /// Insert every slide of the source presentation, in order.
    pub fn all_slides(
        base64: impl Into<String>,
        target_slide_id: impl Into<String>,
        slides: &[SlideReference],
        formatting: Formatting,
    ) -> Self {
        Self {
            base64: base64.into(),
            target_slide_id: target_slide_id.into(),
            source_slide_ids: slides.iter().map(|s| s.slide_id.clone()).collect(),
            formatting,
        }
    }
}

/// Result of an insertion that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "slideId", rename_all = "camelCase")]
pub enum InsertOutcome {
    /// New slides appeared; the view moved to this one.
    Navigated(String),
    /// The host reported no new slide ids. Nothing was navigated.
    NoNewSlide,
}

/// The presentation currently open in the host application.
#[allow(async_fn_in_trait)]
pub trait SlideHost {
    /// Ids of all slides, in presentation order.
    async fn slide_ids(&mut self) -> Result<Vec<String>>;

    /// Insert slides from a base64 package.
    ///
    /// Ids in `request` are package ids; use [`host_slide_ref`] when the host
    /// needs them in its own `nnn#` form.
    async fn insert_slides_from_base64(&mut self, request: &InsertRequest) -> Result<()>;

    /// Make the given slide the current one.
    async fn go_to_slide(&mut self, slide_id: &str) -> Result<()>;
}

/// Ids present in `after` but not in `before`, in `after` order.
pub fn new_slide_ids(before: &[String], after: &[String]) -> Vec<String> {
    after
        .iter()
        .filter(|id| !before.contains(id))
        .cloned()
        .collect()
}

/// The `nnn#` form the host uses to address a slide by package id.
pub fn host_slide_ref(slide_id: &str) -> String {
    if slide_id.contains('#') {
        slide_id.to_string()
    } else {
        format!("{}#", slide_id)
    }
}

/// The part of a host slide id that navigation accepts.
pub fn navigation_id(slide_id: &str) -> &str {
    slide_id.split('#').next().unwrap_or(slide_id)
}

/// Insert slides and move to the last one created.
///
/// The three steps run strictly in order: snapshot, insert, snapshot and
/// diff. When the diff is empty the host silently did nothing and
/// [`InsertOutcome::NoNewSlide`] is returned.
pub async fn insert_and_go_to_last<H: SlideHost>(
    host: &mut H,
    request: &InsertRequest,
) -> Result<InsertOutcome> {
    let before = host.slide_ids().await?;
    log::debug!(
        "Inserting {} slide(s) after {} into {} existing",
        request.source_slide_ids.len(),
        request.target_slide_id,
        before.len()
    );

    host.insert_slides_from_base64(request).await?;

    let after = host.slide_ids().await?;
    let created = new_slide_ids(&before, &after);

    let Some(last) = created.last() else {
        log::warn!("Insert produced no new slide ids");
        return Ok(InsertOutcome::NoNewSlide);
    };

    host.go_to_slide(navigation_id(last)).await?;
    log::info!("Inserted {} slide(s), now at {}", created.len(), last);
    Ok(InsertOutcome::Navigated(last.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use futures::executor::block_on;

    /// In-memory presentation that appends numbered slides on insert.
    #[derive(Default)]
    struct FakeHost {
        slides: Vec<String>,
        next_id: u32,
        calls: Vec<&'static str>,
        navigated: Option<String>,
        ignore_inserts: bool,
        fail_inserts: bool,
    }

    impl FakeHost {
        fn with_slides(ids: &[&str]) -> Self {
            Self {
                slides: ids.iter().map(|s| s.to_string()).collect(),
                next_id: 300,
                ..Default::default()
            }
        }
    }

    impl SlideHost for FakeHost {
        async fn slide_ids(&mut self) -> Result<Vec<String>> {
            self.calls.push("slide_ids");
            Ok(self.slides.clone())
        }

        async fn insert_slides_from_base64(&mut self, request: &InsertRequest) -> Result<()> {
            self.calls.push("insert");
            if self.fail_inserts {
                return Err(Error::Host("InvalidArgument".into()));
            }
            if self.ignore_inserts {
                return Ok(());
            }
            let position = self
                .slides
                .iter()
                .position(|s| navigation_id(s) == navigation_id(&request.target_slide_id))
                .map(|p| p + 1)
                .unwrap_or(self.slides.len());
            for (offset, _) in request.source_slide_ids.iter().enumerate() {
                self.next_id += 1;
                self.slides
                    .insert(position + offset, format!("{}#{}", self.next_id, 7000 + offset));
            }
            Ok(())
        }

        async fn go_to_slide(&mut self, slide_id: &str) -> Result<()> {
            self.calls.push("go_to_slide");
            self.navigated = Some(slide_id.to_string());
            Ok(())
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_slide_ids() {
        let before = ids(&["a", "b", "c"]);
        let after = ids(&["a", "b", "c", "d", "e"]);
        let created = new_slide_ids(&before, &after);
        assert_eq!(created, ids(&["d", "e"]));
        assert_eq!(created.last().map(String::as_str), Some("e"));
    }

    #[test]
    fn test_new_slide_ids_keeps_after_order() {
        let before = ids(&["a", "b"]);
        let after = ids(&["a", "x", "b", "y"]);
        assert_eq!(new_slide_ids(&before, &after), ids(&["x", "y"]));
    }

    #[test]
    fn test_host_slide_ref_and_navigation_id() {
        assert_eq!(host_slide_ref("256"), "256#");
        assert_eq!(host_slide_ref("256#"), "256#");
        assert_eq!(navigation_id("257#3141"), "257");
        assert_eq!(navigation_id("257"), "257");
    }

    #[test]
    fn test_formatting_flag() {
        assert_eq!(Formatting::from_keep_source(true).as_str(), "KeepSourceFormatting");
        assert_eq!(Formatting::from_keep_source(false).as_str(), "UseDestinationTheme");
    }

    #[test]
    fn test_insert_navigates_to_last_new_slide() {
        let mut host = FakeHost::with_slides(&["256#1", "257#2"]);
        let request = InsertRequest::all_slides(
            "UEsDBA==",
            "256#1",
            &[SlideReference::new(1, "256"), SlideReference::new(2, "258")],
            Formatting::KeepSourceFormatting,
        );

        let outcome = block_on(insert_and_go_to_last(&mut host, &request)).unwrap();

        assert_eq!(outcome, InsertOutcome::Navigated("302#7001".into()));
        assert_eq!(host.navigated.as_deref(), Some("302"));
        assert_eq!(host.calls, vec!["slide_ids", "insert", "slide_ids", "go_to_slide"]);
        assert_eq!(host.slides, ids(&["256#1", "301#7000", "302#7001", "257#2"]));
    }

    #[test]
    fn test_insert_without_new_slide_does_not_navigate() {
        let mut host = FakeHost::with_slides(&["256#1"]);
        host.ignore_inserts = true;
        let request = InsertRequest::single("UEsDBA==", "256#1", "256", Formatting::default());

        let outcome = block_on(insert_and_go_to_last(&mut host, &request)).unwrap();

        assert_eq!(outcome, InsertOutcome::NoNewSlide);
        assert!(host.navigated.is_none());
        assert_eq!(host.calls, vec!["slide_ids", "insert", "slide_ids"]);
    }

    #[test]
    fn test_insert_failure_stops_before_second_snapshot() {
        let mut host = FakeHost::with_slides(&["256#1"]);
        host.fail_inserts = true;
        let request = InsertRequest::single("UEsDBA==", "256#1", "256", Formatting::default());

        let result = block_on(insert_and_go_to_last(&mut host, &request));

        assert!(matches!(result, Err(Error::Host(_))));
        assert_eq!(host.calls, vec!["slide_ids", "insert"]);
    }
}
