//! Janitor: reclaims abandoned staging-area files.
//!
//! Two sweep modes. At process start everything goes — a fresh process has
//! nothing mid-flight. The periodic sweep only removes files older than the
//! age threshold; that threshold is the sole mechanism keeping the sweep
//! away from files a concurrent upload is still transferring, so it must
//! stay far above the longest plausible transfer.

use cursus_core::constants;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::sync::mpsc;

/// Whether a file of the given age is past the reclamation threshold.
/// Strictly greater: a file aged exactly at the threshold survives.
pub fn is_expired(age: Duration, threshold: Duration) -> bool {
    age > threshold
}

#[derive(Debug, Clone)]
pub struct Janitor {
    dir: PathBuf,
    max_age: Duration,
    interval: Duration,
}

/// Shuts the background sweep loop down when dropped or told to.
pub struct JanitorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl JanitorHandle {
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Janitor {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            interval,
        }
    }

    /// Janitor with the standard thresholds (2 h age cutoff, hourly sweep).
    pub fn with_defaults(dir: impl Into<PathBuf>) -> Self {
        Self::new(
            dir,
            Duration::from_secs(constants::STAGED_FILE_MAX_AGE_SECS),
            Duration::from_secs(constants::JANITOR_SWEEP_INTERVAL_SECS),
        )
    }

    /// Cold-start sweep: remove every file, regardless of age.
    pub async fn sweep_all(&self) -> usize {
        self.sweep(None).await
    }

    /// Periodic sweep: remove files whose age exceeds `threshold`.
    pub async fn sweep_older_than(&self, threshold: Duration) -> usize {
        self.sweep(Some(threshold)).await
    }

    async fn sweep(&self, min_age: Option<Duration>) -> usize {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    dir = %self.dir.display(),
                    "Janitor cannot read staging directory"
                );
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0usize;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Janitor failed to read directory entry");
                    break;
                }
            };

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %entry.path().display(),
                        "Janitor skipping unreadable entry"
                    );
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            if let Some(threshold) = min_age {
                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();
                if !is_expired(age, threshold) {
                    continue;
                }
            }

            // Per-file failures are logged and skipped; the sweep goes on.
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %entry.path().display(), "Janitor removed staged file");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %entry.path().display(),
                        "Janitor failed to remove staged file"
                    );
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                removed = removed,
                dir = %self.dir.display(),
                "Janitor sweep complete"
            );
        }
        removed
    }

    /// Run the cold-start sweep, then spawn the periodic loop.
    pub async fn start(self) -> JanitorHandle {
        let removed = self.sweep_all().await;
        tracing::info!(removed = removed, "Janitor startup sweep complete");

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let janitor = self.clone();

        tokio::spawn(async move {
            // First periodic tick fires one interval from now, not
            // immediately; the startup sweep already ran.
            let start = tokio::time::Instant::now() + janitor.interval;
            let mut interval = tokio::time::interval_at(start, janitor.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        janitor.sweep_older_than(janitor.max_age).await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Janitor shutting down");
                        break;
                    }
                }
            }
        });

        JanitorHandle { shutdown_tx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(h: f64) -> Duration {
        Duration::from_secs_f64(h * 3600.0)
    }

    #[test]
    fn age_threshold_matrix() {
        let threshold = hours(2.0);
        // Only files aged strictly over two hours are reclaimed.
        assert!(!is_expired(hours(0.0), threshold));
        assert!(!is_expired(hours(1.0), threshold));
        assert!(!is_expired(hours(1.9), threshold));
        assert!(is_expired(hours(2.1), threshold));
        assert!(is_expired(hours(5.0), threshold));
    }

    async fn write_files(dir: &std::path::Path, names: &[&str]) {
        for name in names {
            tokio::fs::write(dir.join(name), b"staged").await.unwrap();
        }
    }

    #[tokio::test]
    async fn startup_sweep_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &["a.mp4", "b.pdf", "c.bin"]).await;

        let janitor = Janitor::with_defaults(dir.path());
        let removed = janitor.sweep_all().await;

        assert_eq!(removed, 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn periodic_sweep_spares_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &["fresh.mp4"]).await;

        let janitor = Janitor::with_defaults(dir.path());
        // Just-written files are far below the 2 h threshold.
        let removed = janitor.sweep_older_than(hours(2.0)).await;

        assert_eq!(removed, 0);
        assert!(dir.path().join("fresh.mp4").exists());
    }

    #[tokio::test]
    async fn periodic_sweep_removes_aged_files() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &["old.mp4", "older.pdf"]).await;

        let janitor = Janitor::with_defaults(dir.path());
        // A zero threshold makes any observable age count as expired.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = janitor.sweep_older_than(Duration::ZERO).await;

        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn sweep_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();
        write_files(dir.path(), &["file.mp4"]).await;

        let janitor = Janitor::with_defaults(dir.path());
        let removed = janitor.sweep_all().await;

        assert_eq!(removed, 1);
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn sweep_of_missing_directory_is_harmless() {
        let janitor = Janitor::with_defaults("/nonexistent/staging/dir");
        assert_eq!(janitor.sweep_all().await, 0);
    }
}
