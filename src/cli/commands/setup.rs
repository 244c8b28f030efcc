//! Configuration file command.

use std::path::Path;

use crate::config::{self, Config};

/// Write `config` to `path`, or to the default location.
pub fn cmd_init_config(path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            config::save_to(config, path)?;
            println!("Wrote {}", path.display());
        }
        None => {
            config::save(config)?;
            if let Some(path) = config::config_path() {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
