//! Server settings from the command line and environment.

use anyhow::{Context, Result};
use clap::Parser;
use reuse_core::AddinConfig;
use std::path::PathBuf;

/// Render uploaded presentations into slide previews for the reuse taskpane.
#[derive(Parser, Debug, Clone)]
#[command(name = "reuse-server")]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: String,

    /// Directory holding `uploads/` and `screenshots/`
    #[arg(short, long, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Add-in configuration file (JSON with siteName, libraryName, filterConfigs)
    #[arg(short, long, env = "ADDIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// SharePoint site display name, used when no configuration file is given
    #[arg(long, env = "SITE_NAME", requires = "library_name")]
    pub site_name: Option<String>,

    /// Document library name, used when no configuration file is given
    #[arg(long, env = "LIBRARY_NAME", requires = "site_name")]
    pub library_name: Option<String>,

    /// LibreOffice binary
    #[arg(long, env = "SOFFICE_PATH", default_value = "soffice")]
    pub soffice: PathBuf,

    /// ImageMagick binary
    #[arg(long, env = "MAGICK_PATH", default_value = "magick")]
    pub magick: PathBuf,

    /// Rasterisation density in DPI
    #[arg(long, default_value = "150")]
    pub density: u32,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Settings {
    /// Directory uploaded presentations are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory rendered slides are written to and served from.
    pub fn screenshots_dir(&self) -> PathBuf {
        self.data_dir.join("screenshots")
    }

    /// The add-in configuration, from file or from the name flags.
    pub fn addin_config(&self) -> Result<Option<AddinConfig>> {
        if let Some(path) = &self.config {
            let config = AddinConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            return Ok(Some(config));
        }

        Ok(match (&self.site_name, &self.library_name) {
            (Some(site_name), Some(library_name)) => Some(AddinConfig {
                site_name: site_name.clone(),
                library_name: library_name.clone(),
                filter_configs: Vec::new(),
            }),
            _ => None,
        })
    }
}
