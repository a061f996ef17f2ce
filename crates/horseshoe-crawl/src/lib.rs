//! Directory crawl driver for horseshoe.
//!
//! # Overview
//!
//! `horseshoe-crawl` walks a directory tree depth-first. For every directory
//! it evaluates the directory filter, raises the hello hook, visits the files
//! (file filter, hello hook, then process or delete), recurses into
//! subdirectories and finally raises the goodbye hook, removing the directory
//! when the crawl mode asks for it.
//!
//! Hooks steer the crawl by returning a [`Directive`]:
//!
//! - `Skip` leaves the node (and, for a directory, its subtree) alone
//! - `Delete` removes the node, honouring dry-run
//! - `Abort` stops the crawl; the report is returned with `aborted` set
//!
//! # Example
//!
//! ```rust,no_run
//! use horseshoe_crawl::{CrawlOptions, DirectoryCrawler, FilterMode, NameFilter, NoHooks};
//!
//! let options = CrawlOptions::builder()
//!     .file_filter(NameFilter::glob(["*.tmp"], FilterMode::IncludeAny).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let report = DirectoryCrawler::new(options)
//!     .crawl("/path/to/crawl", &mut NoHooks)
//!     .unwrap();
//!
//! if let Some(summary) = report.summary() {
//!     println!("{summary}");
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use horseshoe_crawl::{CrawlOptions, DirectoryCrawler, NoHooks};
//!
//! let crawler = DirectoryCrawler::new(CrawlOptions::default());
//! let mut progress_rx = crawler.subscribe();
//! crawler.crawl(".", &mut NoHooks).unwrap();
//!
//! while let Ok(progress) = progress_rx.try_recv() {
//!     println!("Seen {} files", progress.files_seen);
//! }
//! ```

mod crawler;
mod delete;
mod hooks;
mod progress;
mod report;

pub use crawler::DirectoryCrawler;
pub use hooks::{CrawlHooks, NoHooks, ProcessFiles};
pub use progress::{CrawlProgress, PROGRESS_INTERVAL};
pub use report::CrawlReport;

// Re-export core types for convenience
pub use horseshoe_core::{
    ClientAction, CrawlError, CrawlMode, CrawlOptions, CrawlOptionsBuilder, CrawlWarning,
    Directive, DirectoryNameFilter, DirectoryTraversalMetadata, Entry, EntryInfo,
    ExtensionFilter, FileNameFilter, FileTraversalMetadata, Filter, FilterGroup, FilterMode,
    NameFilter, ObjectType, PatternKind, SizeFilter, StatisticsSummary, TraversalAction,
    TraversalOptimizations, TraversalStatistics, WarningKind,
};
