//! Scheduled library scanner.
//!
//! One background task runs the scan/enrich cycle:
//!
//! ```text
//! Idle -> Scanning -> Enriching -> Idle
//!   \________________________________-> Stopped (cancel)
//! ```
//!
//! A pass starts on a timer tick or an explicit trigger. Only one pass runs
//! at a time; a trigger that arrives mid-pass is dropped, not queued.
//! Cancellation is checked between files, so the file in hand always
//! finishes.
//!
//! # Usage
//!
//! ```ignore
//! let scanner = LibraryScanner::new(pool.clone(), ScannerConfig::from_config(&config), Some(service));
//! let handle = scanner.start();
//! handle.trigger();
//! // ...
//! handle.stop().await;
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures::StreamExt;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::{AudioExtensions, WalkItem, walk};
use crate::config::Config;
use crate::enrichment::EnrichmentService;
use crate::error::{Error, Result};
use crate::library::{self, Reconciled};
use crate::model::ScanRecord;

/// Scanner settings.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub music_root: PathBuf,
    /// Time between scheduled passes; the first pass waits one full interval
    pub scan_interval: Duration,
    pub extensions: AudioExtensions,
}

impl ScannerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            music_root: config.library.music_dir.clone(),
            scan_interval: config.library.scan_interval(),
            extensions: AudioExtensions::new(&config.library.allowed_formats),
        }
    }
}

/// Lifecycle state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScannerState {
    Idle = 0,
    Scanning = 1,
    Enriching = 2,
    Stopped = 3,
}

impl ScannerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scanning,
            2 => Self::Enriching,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Self::Scanning | Self::Enriching)
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub files_seen: usize,
    pub inserted: usize,
    pub updated: usize,
    pub already_existed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub walk_errors: usize,
    pub lyrics_enriched: usize,
    pub covers_enriched: usize,
    /// Stopped early by cancellation
    pub cancelled: bool,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} inserted, {} updated, {} already present, {} skipped, {} failed; \
             enriched {} lyrics, {} covers",
            self.files_seen,
            self.inserted,
            self.updated,
            self.already_existed,
            self.skipped,
            self.failed,
            self.lyrics_enriched,
            self.covers_enriched
        )?;
        if self.walk_errors > 0 {
            write!(f, "; {} unreadable paths", self.walk_errors)?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Events emitted by the scanner.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    PassStarted,
    FileProcessed { path: String, outcome: Reconciled },
    FileFailed { path: PathBuf, error: String },
    PassComplete(PassReport),
    Stopped,
}

/// Holds the single-flight slot for one pass and frees it on drop.
struct PassGuard {
    state: Arc<AtomicU8>,
}

impl PassGuard {
    fn acquire(state: &Arc<AtomicU8>) -> Option<Self> {
        state
            .compare_exchange(
                ScannerState::Idle as u8,
                ScannerState::Scanning as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()
            .map(|_| Self {
                state: Arc::clone(state),
            })
    }

    fn enter_enriching(&self) {
        let _ = self.state.compare_exchange(
            ScannerState::Scanning as u8,
            ScannerState::Enriching as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        // Stopped is terminal
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                ScannerState::from_u8(s)
                    .is_busy()
                    .then_some(ScannerState::Idle as u8)
            });
    }
}

/// Walks the music root, reconciles every file and enriches what was touched.
#[derive(Clone)]
pub struct LibraryScanner {
    pool: SqlitePool,
    config: ScannerConfig,
    enrichment: Option<EnrichmentService>,
    state: Arc<AtomicU8>,
    event_tx: Option<mpsc::Sender<ScanEvent>>,
}

impl LibraryScanner {
    /// Create a scanner. Without an enrichment service, passes stop after scanning.
    pub fn new(
        pool: SqlitePool,
        config: ScannerConfig,
        enrichment: Option<EnrichmentService>,
    ) -> Self {
        Self {
            pool,
            config,
            enrichment,
            state: Arc::new(AtomicU8::new(ScannerState::Idle as u8)),
            event_tx: None,
        }
    }

    /// Set the event sender for receiving progress updates.
    pub fn set_event_sender(&mut self, tx: mpsc::Sender<ScanEvent>) {
        self.event_tx = Some(tx);
    }

    pub fn state(&self) -> ScannerState {
        ScannerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state().is_busy()
    }

    /// Run one pass now, without cancellation.
    ///
    /// # Errors
    ///
    /// [`Error::ScanAlreadyRunning`] when another pass holds the slot.
    pub async fn scan_now(&self) -> Result<PassReport> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_pass(&cancel_rx)
            .await
            .ok_or(Error::ScanAlreadyRunning)
    }

    /// Run exactly one Scanning + Enriching pass.
    ///
    /// Returns `None` without touching any file when another pass holds the
    /// single-flight slot or the scanner has stopped.
    pub async fn run_pass(&self, cancel: &watch::Receiver<bool>) -> Option<PassReport> {
        let Some(guard) = PassGuard::acquire(&self.state) else {
            tracing::info!(target: "scanner", state = ?self.state(), "Scan already running, trigger dropped");
            return None;
        };

        self.emit(ScanEvent::PassStarted);
        let started = Instant::now();
        let mut report = PassReport::default();

        let root = &self.config.music_root;
        if !root.is_dir() {
            tracing::warn!(target: "scanner", root = %root.display(), "Music directory does not exist");
            self.emit(ScanEvent::PassComplete(report.clone()));
            return Some(report);
        }

        tracing::info!(target: "scanner", root = %root.display(), "Library scan started");
        let touched = self.scan_files(cancel, &mut report).await;

        if !report.cancelled {
            guard.enter_enriching();
            self.enrich_touched(touched, cancel, &mut report).await;
        }

        tracing::info!(
            target: "scanner",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Library scan finished: {}",
            report
        );
        self.emit(ScanEvent::PassComplete(report.clone()));
        drop(guard);

        Some(report)
    }

    /// Scanning stage. Returns the records written this pass.
    async fn scan_files(
        &self,
        cancel: &watch::Receiver<bool>,
        report: &mut PassReport,
    ) -> Vec<ScanRecord> {
        let root = &self.config.music_root;
        let mut touched = Vec::new();
        let items = walk(root.clone(), self.config.extensions.clone());
        futures::pin_mut!(items);

        while let Some(item) = items.next().await {
            if *cancel.borrow() {
                tracing::info!(target: "scanner", "Scan cancelled");
                report.cancelled = true;
                break;
            }

            let path = match item {
                WalkItem::Audio(path) => path,
                WalkItem::Error { path, message } => {
                    let err = Error::DirectoryWalk { path, message };
                    tracing::warn!(target: "scanner::walk", error = %err, "Skipping subtree");
                    report.walk_errors += 1;
                    continue;
                }
            };

            report.files_seen += 1;
            match library::process_file(&self.pool, root, &path).await {
                Ok(outcome) => {
                    match outcome.reconciled {
                        Reconciled::Inserted(_) => report.inserted += 1,
                        Reconciled::Updated => report.updated += 1,
                        Reconciled::AlreadyExists => report.already_existed += 1,
                        Reconciled::Skipped(_) => report.skipped += 1,
                    }
                    if let Some(record) = outcome.record {
                        self.emit(ScanEvent::FileProcessed {
                            path: record.rel_path.clone(),
                            outcome: outcome.reconciled,
                        });
                        if outcome.reconciled.is_touched() {
                            touched.push(record);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "scanner", path = %path.display(), error = %e, "Failed to process file");
                    report.failed += 1;
                    self.emit(ScanEvent::FileFailed {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        touched
    }

    /// Enriching stage over the records touched by this pass.
    async fn enrich_touched(
        &self,
        touched: Vec<ScanRecord>,
        cancel: &watch::Receiver<bool>,
        report: &mut PassReport,
    ) {
        let Some(service) = &self.enrichment else {
            return;
        };

        let pending: Vec<ScanRecord> = touched.into_iter().filter(|r| !r.is_collect()).collect();
        if pending.is_empty() {
            return;
        }
        tracing::info!(target: "scanner", count = pending.len(), "Enriching songs with missing lyrics or cover");

        for mut record in pending {
            if *cancel.borrow() {
                report.cancelled = true;
                break;
            }

            let outcome = service.enrich_record(&mut record).await;
            if !outcome.any() {
                continue;
            }
            report.lyrics_enriched += usize::from(outcome.lyrics);
            report.covers_enriched += usize::from(outcome.cover);

            if let Err(e) = library::apply_enrichment(&self.pool, &record).await {
                tracing::warn!(target: "scanner", path = %record.rel_path, error = %e, "Failed to store enrichment");
            }
        }
    }

    /// Start the background task.
    ///
    /// Returns immediately; the first scheduled pass runs after one interval.
    pub fn start(self) -> ScannerHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            self.run(trigger_rx, cancel_rx).await;
        });

        ScannerHandle {
            trigger_tx,
            cancel_tx,
            state,
            task,
        }
    }

    /// Main run loop.
    async fn run(&self, mut trigger_rx: mpsc::Receiver<()>, mut cancel: watch::Receiver<bool>) {
        let period = self.config.scan_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            target: "scanner",
            interval_secs = period.as_secs(),
            root = %self.config.music_root.display(),
            "Library scanner started"
        );

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }

                Some(()) = trigger_rx.recv() => {
                    self.run_pass(&cancel).await;
                }

                _ = ticker.tick() => {
                    self.run_pass(&cancel).await;
                }
            }
        }

        self.state
            .store(ScannerState::Stopped as u8, Ordering::SeqCst);
        self.emit(ScanEvent::Stopped);
        tracing::info!(target: "scanner", "Library scanner stopped");
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.event_tx
            && tx.try_send(event).is_err()
        {
            tracing::debug!(target: "scanner", "Scan event dropped");
        }
    }
}

/// Control handle for a started [`LibraryScanner`].
pub struct ScannerHandle {
    trigger_tx: mpsc::Sender<()>,
    cancel_tx: watch::Sender<bool>,
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl ScannerHandle {
    /// Ask for a pass now.
    ///
    /// Returns `false` when a pass is already running or queued; the
    /// request is dropped in that case.
    pub fn trigger(&self) -> bool {
        if self.is_running() {
            tracing::info!(target: "scanner", "Scan already running, trigger dropped");
            return false;
        }
        match self.trigger_tx.try_send(()) {
            Ok(()) => true,
            Err(_) => {
                tracing::info!(target: "scanner", "Scan already queued, trigger dropped");
                false
            }
        }
    }

    pub fn state(&self) -> ScannerState {
        ScannerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state().is_busy()
    }

    /// Cancel and wait for the task to finish. A file in progress completes first.
    pub async fn stop(self) {
        let _ = self.cancel_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(target: "scanner", error = %e, "Scanner task failed");
        }
    }
}
