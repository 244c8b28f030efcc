//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory unless a path is
//! given explicitly:
//! - Windows: %APPDATA%\melody-keeper\config.toml
//! - macOS: ~/Library/Application Support/melody-keeper/config.toml
//! - Linux: ~/.config/melody-keeper/config.toml
//!
//! Every section uses `#[serde(default)]`, so a partial file is fine.
//! Command-line flags and environment variables are layered on top by the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Music root and scan schedule
    pub library: LibraryConfig,

    /// Remote lyrics/cover lookup
    pub enrichment: EnrichmentConfig,

    /// Catalog database
    pub database: DatabaseConfig,
}

/// Audio extensions scanned when the config names none.
pub const DEFAULT_FORMATS: [&str; 6] = [".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg"];

/// Library scanning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root directory holding audio files and their sidecars
    pub music_dir: PathBuf,

    /// Minutes between scheduled passes
    pub scan_interval_minutes: u64,

    /// Extensions (with leading dot, case-insensitive) that count as audio
    pub allowed_formats: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            music_dir: PathBuf::from("./music"),
            scan_interval_minutes: 5,
            allowed_formats: DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LibraryConfig {
    /// Interval between scheduled passes, never shorter than one minute.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_minutes.max(1) * 60)
    }
}

/// Lyrics/cover lookup service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Base URL; `/lyrics` and `/cover` are appended
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Run the enrichment stage after each scan
    pub enabled: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.lrc.cx".to_string(),
            timeout_secs: 30,
            enabled: true,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/melody_keeper.db"),
            max_connections: 5,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("melody-keeper"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if file doesn't exist or can't be parsed.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!("Could not determine config directory, using defaults");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path.
///
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to `path`, creating its directory if needed.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Create the music root and the database's parent directory.
///
/// Failures are logged; the scanner copes with a missing root on its own.
pub fn ensure_directories(config: &Config) {
    if let Err(e) = std::fs::create_dir_all(&config.library.music_dir) {
        tracing::warn!(
            "Failed to create music directory {:?}: {}",
            config.library.music_dir,
            e
        );
    }

    if let Some(dir) = config
        .database
        .path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        tracing::warn!("Failed to create database directory {:?}: {}", dir, e);
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
