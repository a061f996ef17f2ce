//! Core types for horseshoe.
//!
//! This crate provides the data structures shared by the crawl driver and
//! the CLI: crawl options, node filters, per-node traversal metadata and the
//! statistics log a crawl accumulates.

mod config;
mod error;
mod filter;
mod metadata;
mod stats;

pub use config::{CrawlMode, CrawlOptions, CrawlOptionsBuilder, TraversalOptimizations};
pub use error::{CrawlError, CrawlWarning, WarningKind};
pub use filter::{
    DirectoryNameFilter, EntryInfo, ExtensionFilter, FileNameFilter, Filter, FilterGroup,
    FilterMode, NameFilter, PatternKind, SizeFilter,
};
pub use metadata::{
    ClientAction, DirectoryTraversalMetadata, Directive, FileTraversalMetadata, virtual_path,
};
pub use stats::{
    Entry, ObjectType, StatisticsSummary, SummaryRow, TraversalAction, TraversalStatistics,
};
