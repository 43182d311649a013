//! File watcher for auto-rebuild.
//!
//! Polls modification times instead of subscribing to OS file events:
//! every `serve.poll_interval_ms` the watcher scans the source,
//! template and component trees (plus the config file) for the newest
//! mtime and triggers a full rebuild when it advances. Polling trades
//! latency for portability and has no per-platform event quirks.
//!
//! Rebuild failures are logged and the loop keeps running; a broken
//! edit should not take the server down.

use crate::{config::SiteConfig, log, pipeline::build_site};
use anyhow::Result;
use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use walkdir::WalkDir;

// =============================================================================
// Mtime Scanning
// =============================================================================

/// Roots the watcher polls. The output directory is deliberately
/// absent: the build writes there, and watching it would rebuild
/// forever.
fn watched_roots(config: &SiteConfig) -> Vec<PathBuf> {
    vec![
        config.build.src.clone(),
        config.build.templates.clone(),
        config.build.components.clone(),
        config.config_path.clone(),
    ]
}

/// Newest mtime under a single file or directory tree.
fn latest_mtime_under(root: &Path) -> Option<SystemTime> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter_map(|meta| meta.modified().ok())
        .max()
}

/// Newest mtime across all watched roots. Missing roots are skipped;
/// `None` means nothing watchable exists yet.
fn scan_latest_mtime(roots: &[PathBuf]) -> Option<SystemTime> {
    roots
        .iter()
        .filter(|root| root.exists())
        .filter_map(|root| latest_mtime_under(root))
        .max()
}

// =============================================================================
// Public API
// =============================================================================

/// Start the blocking poll-and-rebuild loop.
pub fn watch_for_changes_blocking(config: &'static SiteConfig) -> Result<()> {
    let roots = watched_roots(config);
    let interval = Duration::from_millis(config.serve.poll_interval_ms);

    let root = config.get_root();
    let shown: Vec<String> = roots
        .iter()
        .filter(|p| p.exists())
        .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
        .collect();
    log!("watch"; "polling {} every {}ms", shown.join(", "), interval.as_millis());

    let mut last_seen = scan_latest_mtime(&roots);

    loop {
        std::thread::sleep(interval);

        let current = scan_latest_mtime(&roots);
        if current > last_seen {
            last_seen = current;
            log!("watch"; "change detected, rebuilding...");
            match build_site(config) {
                Ok(()) => {}
                Err(e) => log!("watch"; "rebuild failed: {e}"),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
