//! CLI command definitions, routing, and tracing setup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use docshelf_scraper::build_scrapers;
use docshelf_server::AppState;
use docshelf_shared::{
    AppConfig, LogFormat, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_config,
};
use docshelf_storage::Storage;
use docshelf_sync::{LogSink, Supervisor};

/// Default database file name under the config directory.
const DB_FILE_NAME: &str = "docshelf.db";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docshelf — pull documentation from sources, serve it as HTML.
#[derive(Parser)]
#[command(
    name = "docshelf",
    version,
    about = "Periodically import documentation from configured sources and serve it over HTTP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the config file (defaults to ~/.docshelf/docshelf.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the document database (defaults to ~/.docshelf/docshelf.db).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log format: text or json (overrides the config file).
    #[arg(long, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format flag.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormatArg {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Poll every configured source on its interval until interrupted.
    Import,

    /// Serve stored documents as rendered HTML.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },

    /// List stored documents.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing from CLI flags and the loaded config.
fn init_tracing(cli: &Cli, config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docshelf=info",
        1 => "docshelf=debug",
        _ => "docshelf=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let format = match &cli.log_format {
        Some(LogFormatArg::Text) => LogFormat::Text,
        Some(LogFormatArg::Json) => LogFormat::Json,
        None => config.logging.format,
    };

    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    init_tracing(&cli, &config);

    match &cli.command {
        Command::Import => cmd_import(&cli, &config).await,
        Command::Serve { addr } => cmd_serve(&cli, *addr).await,
        Command::List => cmd_list(&cli).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Resolve the database path from flags or the default location.
fn db_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.db {
        Some(path) => Ok(path.clone()),
        None => Ok(config_dir()?.join(DB_FILE_NAME)),
    }
}

/// Cancel the token when the process receives ctrl-c.
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            cancel.cancel();
        }
    });
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(cli: &Cli, config: &AppConfig) -> Result<()> {
    validate_config(config)?;

    let db = db_path(cli)?;
    let storage = Storage::open(&db).await?;

    let scrapers = build_scrapers(&config.sources)?;
    info!(
        sources = scrapers.len(),
        skipped = config.sources.len() - scrapers.len(),
        db = %db.display(),
        "importer starting"
    );

    let supervisor = Supervisor::new(
        scrapers,
        Arc::new(storage),
        config.scraping.interval(),
        Arc::new(LogSink),
    )?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    supervisor.run(cancel).await?;
    Ok(())
}

async fn cmd_serve(cli: &Cli, addr: SocketAddr) -> Result<()> {
    let db = db_path(cli)?;
    let storage = Storage::open_readonly(&db).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    docshelf_server::serve(listener, AppState::new(Arc::new(storage)), cancel).await?;
    Ok(())
}

async fn cmd_list(cli: &Cli) -> Result<()> {
    let db = db_path(cli)?;
    let storage = Storage::open_readonly(&db).await?;

    let docs = storage.list_documents().await?;
    if docs.is_empty() {
        println!("no documents stored");
        return Ok(());
    }

    for doc in docs {
        println!(
            "{:<24} {:>8} bytes  fetched {}",
            doc.name,
            doc.content_len,
            doc.fetched_at.to_rfc3339()
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("created {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    println!("# {}", config_file_path()?.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
