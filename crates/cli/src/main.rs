use anyhow::{Context, Result};
use bizcard_core::{AppConfig, LanguageCode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod backends;
mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "bizcard",
    version,
    about = "Extract company, tax ID, owner, email and phone from business card photos"
)]
struct Cli {
    /// Configuration file (default: platform config dir / config.toml)
    #[arg(long, global = true, env = "BIZCARD_CONFIG")]
    config: Option<PathBuf>,

    /// OCR language, overrides the configuration (e.g. `ita`, `eng`)
    #[arg(long, global = true, env = "BIZCARD_LANG")]
    lang: Option<LanguageCode>,

    /// SQLite database, overrides the configuration
    #[arg(long, global = true, env = "BIZCARD_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan one business card image
    Scan(commands::ScanArgs),
    /// Show stored cards
    List {
        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Export every stored card to a file
    Export {
        #[arg(long, default_value = "csv")]
        format: bizcard_export::ExportFormat,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// List installed OCR languages
    Langs,
}

/// Platform directories: `(config_dir, data_dir)`.
fn project_dirs() -> Result<(PathBuf, PathBuf)> {
    let dirs = directories::ProjectDirs::from("com", "bizcard", "Bizcard")
        .context("Failed to resolve platform directories")?;
    Ok((dirs.config_dir().to_path_buf(), dirs.data_dir().to_path_buf()))
}

fn load_config(cli: &Cli) -> Result<(AppConfig, PathBuf)> {
    let (config_dir, data_dir) = project_dirs()?;
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(&config_dir.join("config.toml"))?,
    };
    if let Some(lang) = &cli.lang {
        config.language = lang.clone();
    }
    if let Some(db) = &cli.database {
        config.storage.database = Some(db.clone());
    }
    let database = match &config.storage.database {
        Some(path) => path.clone(),
        None => data_dir.join("cards.db"),
    };
    Ok((config, database))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (config, database) = load_config(&cli)?;
    tracing::debug!(language = %config.language, db = %database.display(), "Configuration loaded");

    match cli.command {
        Command::Scan(args) => commands::scan(&config, &database, args).await,
        Command::List { json } => commands::list(&config, &database, json).await,
        Command::Export { format, out } => commands::export(&config, &database, format, &out).await,
        Command::Langs => commands::langs(&config),
    }
}
