//! Scheduled scanner and one-off scan commands.

use tokio::runtime::Runtime;
use tracing::info;

use super::{build_enrichment, open_pool};
use crate::config::Config;
use crate::scanner::{LibraryScanner, ScannerConfig};

/// Run the background scanner until Ctrl+C.
pub fn cmd_run(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        let scanner = LibraryScanner::new(
            pool,
            ScannerConfig::from_config(config),
            build_enrichment(config)?,
        );

        let handle = scanner.start();
        println!(
            "Watching {} (every {} min). Press Ctrl+C to stop.",
            config.library.music_dir.display(),
            config.library.scan_interval().as_secs() / 60
        );

        tokio::signal::ctrl_c().await?;
        info!(target: "scanner", "Shutdown requested");
        handle.stop().await;
        Ok(())
    })
}

/// Run a single pass now and print the report.
pub fn cmd_scan(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        let scanner = LibraryScanner::new(
            pool,
            ScannerConfig::from_config(config),
            build_enrichment(config)?,
        );

        println!("Scanning {}", config.library.music_dir.display());
        let report = scanner.scan_now().await?;
        println!("Scan complete: {report}");
        Ok(())
    })
}
