//! Rendering presentations into per-slide PNG images.
//!
//! The conversion is done by external tools: LibreOffice turns the package
//! into a PDF, ImageMagick rasterises each PDF page.

use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Prefix of rendered slide image files.
const SLIDE_PREFIX: &str = "slide_";

/// Extension of rendered slide image files.
const SLIDE_EXTENSION: &str = ".png";

/// Errors from the conversion tools.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A tool could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A tool exited unsuccessfully.
    #[error("Error converting with {program}: {stderr}")]
    Failed { program: String, stderr: String },

    /// LibreOffice reported success but wrote no PDF.
    #[error("Converted PDF not found: {0}")]
    MissingPdf(PathBuf),

    /// Reading the output directory failed.
    #[error("Error reading rendered slides: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a presentation file into slide images.
pub trait SlideRenderer: Send + Sync + 'static {
    /// Render `presentation` into `out_dir`.
    ///
    /// Returns the image file names, ordered by slide number.
    fn render(
        &self,
        presentation: &Path,
        out_dir: &Path,
    ) -> impl Future<Output = Result<Vec<String>, ConvertError>> + Send;
}

/// Renderer that shells out to `soffice` and `magick`.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    soffice: PathBuf,
    magick: PathBuf,
    density: u32,
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self {
            soffice: PathBuf::from("soffice"),
            magick: PathBuf::from("magick"),
            density: 150,
        }
    }
}

impl CommandRenderer {
    /// Create a renderer using tools found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific LibreOffice binary.
    pub fn with_soffice(mut self, path: impl Into<PathBuf>) -> Self {
        self.soffice = path.into();
        self
    }

    /// Use a specific ImageMagick binary.
    pub fn with_magick(mut self, path: impl Into<PathBuf>) -> Self {
        self.magick = path.into();
        self
    }

    /// Rasterisation density in DPI.
    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density.max(1);
        self
    }

    async fn to_pdf(&self, presentation: &Path) -> Result<PathBuf, ConvertError> {
        let out_dir = presentation.parent().unwrap_or_else(|| Path::new("."));
        let mut command = Command::new(&self.soffice);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(presentation);
        run(&mut command, &self.soffice).await?;

        let pdf = presentation.with_extension("pdf");
        if !pdf.exists() {
            return Err(ConvertError::MissingPdf(pdf));
        }
        Ok(pdf)
    }

    async fn to_images(&self, pdf: &Path, out_dir: &Path) -> Result<(), ConvertError> {
        let pattern = out_dir.join(format!("{}%d{}", SLIDE_PREFIX, SLIDE_EXTENSION));
        let mut command = Command::new(&self.magick);
        command
            .arg("-density")
            .arg(self.density.to_string())
            .arg(pdf)
            .arg(pattern);
        run(&mut command, &self.magick).await
    }
}

impl SlideRenderer for CommandRenderer {
    async fn render(&self, presentation: &Path, out_dir: &Path) -> Result<Vec<String>, ConvertError> {
        tokio::fs::create_dir_all(out_dir).await?;
        let stale = clear_slide_images(out_dir).await?;
        if stale > 0 {
            log::debug!("Removed {} old slide image(s) from {}", stale, out_dir.display());
        }

        let pdf = self.to_pdf(presentation).await?;
        log::debug!("Converted {} to {}", presentation.display(), pdf.display());

        self.to_images(&pdf, out_dir).await?;
        let slides = list_slide_images(out_dir).await?;
        log::info!("Rendered {} slide(s) from {}", slides.len(), presentation.display());
        Ok(slides)
    }
}

/// Run a tool to completion, turning a failed exit into an error.
async fn run(command: &mut Command, program: &Path) -> Result<(), ConvertError> {
    let program = program.display().to_string();
    let output = command.output().await.map_err(|source| ConvertError::Spawn {
        program: program.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(ConvertError::Failed {
            program,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Rendered slide images in `dir`, ordered by slide number.
pub async fn list_slide_images(dir: &Path) -> Result<Vec<String>, ConvertError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut slides = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if let Some(number) = slide_number(name) {
                slides.push((number, name.to_string()));
            }
        }
    }
    slides.sort();
    Ok(slides.into_iter().map(|(_, name)| name).collect())
}

/// Remove rendered slide images left in `dir` by an earlier upload.
///
/// Returns how many were removed. Other files are left alone.
pub async fn clear_slide_images(dir: &Path) -> Result<usize, ConvertError> {
    let stale = list_slide_images(dir).await?;
    for name in &stale {
        tokio::fs::remove_file(dir.join(name)).await?;
    }
    Ok(stale.len())
}

/// Slide number of a file named like `slide_12.png`.
fn slide_number(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(SLIDE_EXTENSION)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("slide_0.png"), Some(0));
        assert_eq!(slide_number("slide_12.png"), Some(12));
        assert_eq!(slide_number("slide_x.png"), None);
        assert_eq!(slide_number("cover.png"), None);
        assert_eq!(slide_number("slide_1.jpg"), None);
    }

    #[tokio::test]
    async fn test_list_slide_images_orders_numerically() {
        let dir = tempdir().unwrap();
        for name in ["slide_10.png", "slide_2.png", "slide_0.png", "notes.txt", "slide_1.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let slides = list_slide_images(dir.path()).await.unwrap();
        assert_eq!(slides, vec!["slide_0.png", "slide_1.png", "slide_2.png", "slide_10.png"]);
    }

    #[tokio::test]
    async fn test_clear_slide_images_keeps_other_files() {
        let dir = tempdir().unwrap();
        for name in ["slide_0.png", "slide_1.png", "slide_4.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        assert_eq!(clear_slide_images(dir.path()).await.unwrap(), 3);
        assert!(list_slide_images(dir.path()).await.unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_render_discards_previous_slides() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("Deck.pptx");
        std::fs::write(&deck, b"PK\x03\x04").unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();
        for i in 0..5 {
            std::fs::write(out_dir.join(format!("slide_{}.png", i)), b"old").unwrap();
        }

        let renderer = CommandRenderer::new().with_soffice(dir.path().join("no-such-soffice"));
        assert!(renderer.render(&deck, &out_dir).await.is_err());
        assert!(list_slide_images(&out_dir).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tool_is_spawn_error() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("Deck.pptx");
        std::fs::write(&deck, b"PK\x03\x04").unwrap();

        let renderer = CommandRenderer::new().with_soffice(dir.path().join("no-such-soffice"));
        let err = renderer.render(&deck, &dir.path().join("out")).await.unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { .. }));
    }
}
