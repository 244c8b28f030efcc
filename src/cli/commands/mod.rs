//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `scan`: the scheduled scanner and one-off passes
//! - `catalog`: catalog reads and admin edits
//! - `setup`: writing the configuration file

mod catalog;
mod scan;
mod setup;

use clap::{Args, Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;
use crate::enrichment::{EnrichmentService, LyricsApiClient};

pub use catalog::{cmd_delete, cmd_edit, cmd_list, cmd_restore, cmd_search, cmd_show};
pub use scan::{cmd_run, cmd_scan};
pub use setup::cmd_init_config;

/// Melody Keeper CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings that override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Music root directory
    #[arg(long, global = true, env = "MUSIC_DIRECTORY")]
    pub music_dir: Option<PathBuf>,

    /// Minutes between scheduled scans
    #[arg(long, global = true, env = "MUSIC_SCAN_INTERVAL")]
    pub scan_interval: Option<u64>,

    /// Lyrics/cover lookup service base URL
    #[arg(long, global = true, env = "LYRICS_API_URL")]
    pub lyrics_api_url: Option<String>,

    /// SQLite database file
    #[arg(long, global = true, env = "DATABASE_PATH")]
    pub database: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.music_dir {
            config.library.music_dir = dir.clone();
        }
        if let Some(minutes) = self.scan_interval {
            config.library.scan_interval_minutes = minutes;
        }
        if let Some(url) = &self.lyrics_api_url {
            config.enrichment.base_url = url.clone();
        }
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the background scanner until Ctrl+C
    Run,
    /// Run one scan pass now
    Scan,
    /// List all songs in the catalog
    List,
    /// Search songs by title, artist or album
    Search {
        /// Substring to look for
        query: String,
    },
    /// Show one song
    Show {
        /// Song ID
        id: i64,
    },
    /// Edit a song's metadata and refresh its lyrics and cover
    Edit {
        /// Song ID
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        /// Keep the current album if omitted
        #[arg(long)]
        album: Option<String>,
        /// Duration in seconds; keep the current one if omitted
        #[arg(long)]
        duration: Option<i64>,
    },
    /// Hide songs from the catalog (the scanner will skip them)
    Delete {
        /// Song IDs
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
    /// Undo a delete
    Restore {
        /// Song ID
        id: i64,
    },
    /// Write the effective configuration to the config file
    InitConfig,
}

/// Run the specified CLI command.
///
/// Returns `Ok(true)` if a command was run, `Ok(false)` if no command was
/// specified (the caller prints help).
pub fn run_command(cli: &Cli) -> anyhow::Result<bool> {
    let Some(command) = &cli.command else {
        return Ok(false);
    };

    let rt = Runtime::new()?;
    let config = load_config(cli);

    match command {
        Commands::Run => cmd_run(&rt, &config)?,
        Commands::Scan => cmd_scan(&rt, &config)?,
        Commands::List => cmd_list(&rt, &config)?,
        Commands::Search { query } => cmd_search(&rt, &config, query)?,
        Commands::Show { id } => cmd_show(&rt, &config, *id)?,
        Commands::Edit {
            id,
            title,
            artist,
            album,
            duration,
        } => cmd_edit(
            &rt,
            &config,
            *id,
            title,
            artist,
            album.as_deref(),
            *duration,
        )?,
        Commands::Delete { ids } => cmd_delete(&rt, &config, ids)?,
        Commands::Restore { id } => cmd_restore(&rt, &config, *id)?,
        Commands::InitConfig => cmd_init_config(cli.config.as_deref(), &config)?,
    }

    Ok(true)
}

/// Config file plus command-line/environment overrides.
fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    cli.overrides.apply(&mut config);
    config
}

/// Prepare directories and open the catalog.
async fn open_pool(config: &Config) -> anyhow::Result<SqlitePool> {
    config::ensure_directories(config);
    let pool = db::init_db(
        &db::db_url(&config.database.path),
        config.database.max_connections,
    )
    .await?;
    Ok(pool)
}

/// The enrichment service, or `None` when disabled in the config.
fn build_enrichment(config: &Config) -> anyhow::Result<Option<EnrichmentService>> {
    if !config.enrichment.enabled {
        return Ok(None);
    }
    let client = LyricsApiClient::new(&config.enrichment.base_url, config.enrichment.timeout())?;
    Ok(Some(EnrichmentService::new(
        Arc::new(client),
        config.library.music_dir.clone(),
    )))
}
