//! gsexport - Google Scholar profile exporter
//!
//! Works on profile pages saved from the browser; nothing is fetched.
//!
//! ## Usage
//!
//! ```bash
//! gsexport export --input profile.html --format all
//! gsexport bibtex-link --input profile.html
//! gsexport load-all --input page1.html --input page2.html
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use rustgsexport::config::{ConfigStore, ExportConfig};
use rustgsexport::orchestrator::{Orchestrator, OrchestratorConfig};
use rustgsexport::page::{HostPage, SnapshotPage};
use rustgsexport::record::{Enricher, QueryStamp};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Google Scholar profile exporter - CSV, PoP CSV and BibTeX link capture
#[derive(Parser)]
#[command(name = "gsexport")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file (default: ~/.gsexport.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Saved profile pages plus the overrides shared by every page command
#[derive(clap::Args)]
struct PageArgs {
    /// Saved profile page HTML; further files are the page after each "Show more"
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Origin used to absolutize relative links
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Raw table columns
    General,
    /// Publish or Perish columns (PoPCites.csv)
    Pop,
    /// Both files
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the publications table as CSV
    Export {
        #[command(flatten)]
        page: PageArgs,

        /// Which CSV to write
        #[arg(long, value_enum, default_value = "all")]
        format: Format,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture the BibTeX export link from the Export menu
    BibtexLink {
        #[command(flatten)]
        page: PageArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Walk the "Show more" states and report how many rows are loaded
    LoadAll {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the enriched records as JSON
    Inspect {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Export failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::resolve(cli.config)?;
    // `config init` must work before any file exists
    let config = match &cli.command {
        Commands::Config {
            action: ConfigAction::Init { .. },
        } => ExportConfig::default(),
        _ => store.load()?,
    };

    match cli.command {
        Commands::Export { page, format, output } => {
            run_export(&config, page, format, output).await
        }
        Commands::BibtexLink { page, output } => run_bibtex_link(&config, page, output).await,
        Commands::LoadAll { page } => run_load_all(&config, page).await,
        Commands::Inspect { page } => run_inspect(&config, page).await,
        Commands::Config { action } => handle_config(&store, &config, action),
    }
}

// ============================================================================
// Page Commands
// ============================================================================

/// Read the snapshots and build the page and orchestrator
fn open_page(config: &ExportConfig, args: &PageArgs) -> Result<(SnapshotPage, Orchestrator)> {
    let mut config = config.clone();
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    let base = config.base_url()?;

    let snapshots = args
        .inputs
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    info!(snapshots = snapshots.len(), base = %base, "Opened profile snapshots");

    let page = SnapshotPage::new(&snapshots, base)?;
    Ok((page, Orchestrator::new(OrchestratorConfig::from(&config))))
}

/// Load every supplied snapshot before reading rows
async fn load_snapshots(orchestrator: &Orchestrator, page: &mut SnapshotPage, inputs: usize) -> Result<()> {
    if inputs > 1 {
        orchestrator.load_all(page).await?;
    }
    Ok(())
}

fn output_dir(config: &ExportConfig, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| config.output_dir.clone())
}

async fn run_export(
    config: &ExportConfig,
    args: PageArgs,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    let (mut page, orchestrator) = open_page(config, &args)?;
    load_snapshots(&orchestrator, &mut page, args.inputs.len()).await?;

    let dir = output_dir(config, output);
    let now = Local::now();

    if matches!(format, Format::General | Format::All) {
        let file = orchestrator.export_general(&page, now)?;
        save(&file, &dir)?;
    }
    if matches!(format, Format::Pop | Format::All) {
        let file = orchestrator.export_pop(&page, now)?;
        save(&file, &dir)?;
    }
    Ok(())
}

async fn run_bibtex_link(config: &ExportConfig, args: PageArgs, output: Option<PathBuf>) -> Result<()> {
    let (mut page, orchestrator) = open_page(config, &args)?;
    load_snapshots(&orchestrator, &mut page, args.inputs.len()).await?;

    let file = orchestrator.export_bibtex_link(&mut page, Local::now()).await?;
    save(&file, &output_dir(config, output))?;
    if let Some(link) = file.contents.lines().find(|l| !l.starts_with('#')) {
        println!("BibTeX export link: {}", link);
    }
    Ok(())
}

async fn run_load_all(config: &ExportConfig, args: PageArgs) -> Result<()> {
    let (mut page, orchestrator) = open_page(config, &args)?;
    let clicks = orchestrator.load_all(&mut page).await?;
    println!(
        "Load all complete. Clicked 'Show more' {} time(s); {} row(s) loaded. You can export now.",
        clicks,
        page.rows().len()
    );
    Ok(())
}

async fn run_inspect(config: &ExportConfig, args: PageArgs) -> Result<()> {
    let (mut page, orchestrator) = open_page(config, &args)?;
    load_snapshots(&orchestrator, &mut page, args.inputs.len()).await?;

    let records = orchestrator.collect_records(&page)?;
    let enriched = Enricher::new(QueryStamp::now())?.enrich_all(&records);
    println!("{}", serde_json::to_string_pretty(&enriched)?);
    Ok(())
}

fn save(file: &rustgsexport::export::ExportFile, dir: &Path) -> Result<()> {
    let path = file
        .write_to(dir)
        .with_context(|| format!("Failed to write {}", file.file_name))?;
    println!("Saved: {}", path.display());
    Ok(())
}

// ============================================================================
// Config Management
// ============================================================================

fn handle_config(store: &ConfigStore, config: &ExportConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("Config file: {}", store.path().display());
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Init { force } => {
            if store.path().exists() && !force {
                warn!(path = %store.path().display(), "Config file exists");
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    store.path().display()
                );
            }
            store.save(&ExportConfig::default())?;
            println!("Wrote default config to {}", store.path().display());
        }
    }
    Ok(())
}
