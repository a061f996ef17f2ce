//! Result of a finished crawl.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use horseshoe_core::{CrawlWarning, StatisticsSummary, TraversalStatistics};

/// Outcome of one crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Canonical root that was crawled.
    pub root: PathBuf,

    /// Visited-node log, when statistics were enabled.
    pub statistics: Option<TraversalStatistics>,

    /// Errors reported and continued past.
    pub warnings: Vec<CrawlWarning>,

    /// A hook stopped the crawl early.
    pub aborted: bool,

    /// Files encountered, filtered ones included.
    pub files_visited: u64,

    /// Directories encountered, the root and filtered ones included.
    pub directories_visited: u64,

    /// Files and directories deleted (or dry-run deleted).
    pub deletions: u64,

    /// Bytes freed by file deletions.
    pub bytes_deleted: u64,

    /// Duration of the crawl.
    pub duration: Duration,
}

impl CrawlReport {
    /// Check if there were any warnings during the crawl.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Grouped statistics, when statistics were enabled.
    pub fn summary(&self) -> Option<StatisticsSummary> {
        self.statistics.as_ref().map(TraversalStatistics::summarize)
    }
}
