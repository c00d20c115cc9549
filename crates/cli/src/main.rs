//! CLI tool for finding reusable slides in a SharePoint library.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use reuse_core::{AddinConfig, FileRecord, FilterSelection, Paginator, ResultsView, PAGE_SIZE};
use reuse_graph::{load_library, search_library, DriveSource, GraphClient, LibrarySnapshot};
use reuse_pptx::{encode_package, SlideIdReader};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Search, filter, and inspect presentations for slide reuse.
#[derive(Parser, Debug)]
#[command(name = "slide-reuse")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List presentations in the configured library
    List {
        #[command(flatten)]
        library: LibraryArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Search the configured library
    Search {
        /// Search text
        query: String,
        #[command(flatten)]
        library: LibraryArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the slide ids of a local .pptx file
    Slides {
        /// Presentation file
        input: PathBuf,
        /// Print the base64 package instead of slide ids
        #[arg(long)]
        base64: bool,
    },
    /// Download a presentation from a drive
    Download {
        /// Drive id
        drive_id: String,
        /// Item id
        item_id: String,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Graph access token
        #[arg(long, env = "GRAPH_TOKEN", hide_env_values = true)]
        token: String,
    },
}

/// Where to look.
#[derive(ClapArgs, Debug)]
struct LibraryArgs {
    /// Add-in configuration file (JSON with siteName, libraryName, filterConfigs)
    #[arg(short, long, env = "ADDIN_CONFIG")]
    config: Option<PathBuf>,

    /// SharePoint site display name (overrides the configuration)
    #[arg(long)]
    site: Option<String>,

    /// Document library name (overrides the configuration)
    #[arg(long)]
    library: Option<String>,

    /// Graph access token
    #[arg(long, env = "GRAPH_TOKEN", hide_env_values = true)]
    token: String,
}

/// How to show results.
#[derive(ClapArgs, Debug)]
struct ViewArgs {
    /// Facet filter as name=value; repeat to accept more values or facets
    #[arg(short, long = "filter", value_name = "FACET=VALUE")]
    filters: Vec<String>,

    /// Page to show, starting at 1
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Results per page
    #[arg(long, default_value_t = PAGE_SIZE)]
    page_size: usize,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::List { library, view } => {
            let (_, snapshot) = open_library(&library).await?;
            let results = ResultsView::with_files(snapshot.files.clone());
            show(results, &snapshot, &view)
        }
        Command::Search {
            query,
            library,
            view,
        } => {
            let (client, snapshot) = open_library(&library).await?;
            let names = search_library(&client, &snapshot.library, &query).await?;
            let mut results = ResultsView::with_files(snapshot.files.clone());
            results.apply_search(&names);
            show(results, &snapshot, &view)
        }
        Command::Slides { input, base64 } => print_slides(&input, base64),
        Command::Download {
            drive_id,
            item_id,
            output,
            token,
        } => {
            let client = GraphClient::new(token);
            let bytes = client.download(&drive_id, &item_id).await?;
            write_output(&output, &bytes)?;
            eprintln!("Written to: {}", output.display());
            Ok(())
        }
    }
}

/// Resolve and list the library named by the arguments.
async fn open_library(args: &LibraryArgs) -> Result<(GraphClient, LibrarySnapshot)> {
    let config = library_config(args)?;
    let client = GraphClient::new(args.token.clone());

    let snapshot = load_library(&client, &config).await?.ok_or_else(|| {
        anyhow!(
            "Configuration not found: no library '{}' in site '{}'",
            config.library_name,
            config.site_name
        )
    })?;
    log::debug!("Loaded {} file(s)", snapshot.files.len());
    Ok((client, snapshot))
}

/// Merge the configuration file with command line overrides.
fn library_config(args: &LibraryArgs) -> Result<AddinConfig> {
    let mut config = match &args.config {
        Some(path) => AddinConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AddinConfig {
            site_name: String::new(),
            library_name: String::new(),
            filter_configs: Vec::new(),
        },
    };

    if let Some(site) = &args.site {
        config.site_name = site.clone();
    }
    if let Some(library) = &args.library {
        config.library_name = library.clone();
    }
    if config.site_name.is_empty() || config.library_name.is_empty() {
        bail!("A site and library are required (--site/--library or --config)");
    }
    Ok(config)
}

/// Parse `name=value` filters into a selection.
fn parse_filters(filters: &[String]) -> Result<FilterSelection> {
    let mut selection = FilterSelection::new();
    for filter in filters {
        let (facet, value) = filter
            .split_once('=')
            .filter(|(facet, value)| !facet.trim().is_empty() && !value.trim().is_empty())
            .ok_or_else(|| anyhow!("Invalid filter '{}', expected FACET=VALUE", filter))?;
        if !selection
            .accepted(facet.trim())
            .map(|values| values.contains(value.trim()))
            .unwrap_or(false)
        {
            selection.toggle(facet.trim(), value.trim());
        }
    }
    Ok(selection)
}

/// Apply filters and paging, then print.
fn show(mut results: ResultsView, snapshot: &LibrarySnapshot, view: &ViewArgs) -> Result<()> {
    results = results.with_paginator(Paginator::new().with_page_size(view.page_size));
    results.apply_filter(parse_filters(&view.filters)?);

    let page_count = results.page_count();
    let wanted = view.page.max(1) - 1;
    if page_count > 0 && !results.go_to_page(wanted) {
        bail!("Page {} does not exist; there are {} page(s)", view.page, page_count);
    }

    let page = results.current_page();
    if view.json {
        let output = serde_json::json!({
            "page": results.page_index() + 1,
            "pageCount": page_count,
            "total": results.visible().len(),
            "files": page,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if page.is_empty() {
        println!("No results found");
        return Ok(());
    }

    for file in &page {
        println!("{}", describe(file));
    }
    println!();
    println!(
        "Page {}/{} ({} result(s))",
        results.page_index() + 1,
        page_count,
        results.visible().len()
    );
    if !snapshot.facets.is_empty() {
        let facets: Vec<String> = snapshot
            .facets
            .iter()
            .map(|facet| format!("{} [{}]", facet.name, facet.choices.join(", ")))
            .collect();
        println!("Facets: {}", facets.join("; "));
    }
    Ok(())
}

/// One line per file: name, facet values, preview.
fn describe(file: &FileRecord) -> String {
    let mut line = file.name.clone();
    for (name, value) in &file.facets {
        line.push_str(&format!("  {}={}", name, value));
    }
    match &file.thumbnail {
        Some(url) => line.push_str(&format!("  <{}>", url)),
        None => line.push_str("  <no preview>"),
    }
    line
}

/// Print slide references or the encoded package of a local file.
fn print_slides(input: &Path, base64: bool) -> Result<()> {
    if base64 {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        println!("{}", encode_package(&bytes));
        return Ok(());
    }

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let slides = SlideIdReader::new()
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read slides of {}", input.display()))?;

    if slides.is_empty() {
        eprintln!("No slides in {}", input.display());
    }
    for slide in &slides {
        println!("{}\t{}", slide.index, slide.slide_id);
    }
    Ok(())
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
