//! Crawl progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How many files pass between two progress broadcasts.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Progress information during a crawl.
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    /// Number of files encountered so far.
    pub files_seen: u64,
    /// Number of directories encountered so far.
    pub directories_seen: u64,
    /// Total size of the files encountered so far.
    pub bytes_seen: u64,
    /// Number of files and directories deleted (or dry-run deleted).
    pub deletions: u64,
    /// Bytes freed by file deletions.
    pub bytes_deleted: u64,
    /// Number of errors reported and continued past.
    pub errors_count: u64,
    /// Path most recently visited.
    pub current_path: PathBuf,
    /// Time elapsed since the crawl started.
    pub elapsed: Duration,
}

impl CrawlProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_seen: 0,
            directories_seen: 0,
            bytes_seen: 0,
            deletions: 0,
            bytes_deleted: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate crawl rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_seen as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items encountered (files + directories).
    pub fn total_items(&self) -> u64 {
        self.files_seen + self.directories_seen
    }
}

impl Default for CrawlProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters for one crawl.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files_seen: u64,
    directories_seen: u64,
    bytes_seen: u64,
    deletions: u64,
    bytes_deleted: u64,
    errors_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files_seen: 0,
            directories_seen: 0,
            bytes_seen: 0,
            deletions: 0,
            bytes_deleted: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
        }
    }

    /// Count a file; returns `true` when a progress broadcast is due.
    pub fn record_file(&mut self, path: &Path, size: Option<u64>) -> bool {
        let due = self.files_seen % PROGRESS_INTERVAL == 0;
        self.files_seen += 1;
        self.bytes_seen += size.unwrap_or(0);
        self.set_current_path(path);
        due
    }

    pub fn record_dir(&mut self, path: &Path) {
        self.directories_seen += 1;
        self.set_current_path(path);
    }

    pub fn record_deletion(&mut self, bytes: u64) {
        self.deletions += 1;
        self.bytes_deleted += bytes;
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }

    pub fn files_seen(&self) -> u64 {
        self.files_seen
    }

    pub fn directories_seen(&self) -> u64 {
        self.directories_seen
    }

    pub fn deletions(&self) -> u64 {
        self.deletions
    }

    pub fn bytes_deleted(&self) -> u64 {
        self.bytes_deleted
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn set_current_path(&mut self, path: &Path) {
        self.current_path.clear();
        self.current_path.push(path);
    }

    pub fn snapshot(&self) -> CrawlProgress {
        CrawlProgress {
            files_seen: self.files_seen,
            directories_seen: self.directories_seen,
            bytes_seen: self.bytes_seen,
            deletions: self.deletions,
            bytes_deleted: self.bytes_deleted,
            errors_count: self.errors_count,
            current_path: self.current_path.clone(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
