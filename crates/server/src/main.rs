//! Companion server binary for the slide reuse taskpane.

use anyhow::{Context, Result};
use clap::Parser;
use reuse_server::{router, AppState, CommandRenderer, Settings};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    // Initialize logging
    if settings.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = settings.addin_config()?;
    if config.is_none() {
        log::warn!("No add-in configuration given; /config will answer 404");
    }

    let upload_dir = settings.upload_dir();
    let screenshots_dir = settings.screenshots_dir();
    for dir in [&upload_dir, &screenshots_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let renderer = CommandRenderer::new()
        .with_soffice(&settings.soffice)
        .with_magick(&settings.magick)
        .with_density(settings.density);

    let state = Arc::new(AppState {
        upload_dir,
        screenshots_dir,
        config,
        renderer,
    });

    let address = format!("{}:{}", settings.bind, settings.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Server is running on {}", address);

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
