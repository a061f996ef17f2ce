//! Crawl configuration types.

use std::sync::Arc;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::filter::Filter;

/// What the crawler does with the nodes that pass its filters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrawlMode {
    /// Visit and report only.
    #[default]
    Browse,
    /// Delete every file that passes the file filter.
    DeleteFiles,
    /// Delete files, then every non-root directory left empty.
    DeleteContents,
    /// Delete files and empty directories, including the root.
    DeleteAll,
}

impl CrawlMode {
    /// Whether files are deleted without a client request.
    pub fn deletes_files(self) -> bool {
        !matches!(self, Self::Browse)
    }

    /// Whether emptied directories are removed.
    pub fn deletes_directories(self) -> bool {
        matches!(self, Self::DeleteContents | Self::DeleteAll)
    }

    /// Whether the root itself may be removed.
    pub fn deletes_root(self) -> bool {
        matches!(self, Self::DeleteAll)
    }
}

/// Ways to prune a crawl before filters are even consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalOptimizations {
    /// Directories deeper than this are not entered (root = depth 0).
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Include entries whose name starts with a dot.
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Descend into symlinked directories.
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Do not enumerate files at all.
    #[serde(default)]
    pub skip_files: bool,

    /// Visit directory entries in name order.
    #[serde(default = "default_true")]
    pub sort_entries: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TraversalOptimizations {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_hidden: true,
            follow_symlinks: false,
            skip_files: false,
            sort_entries: true,
        }
    }
}

impl TraversalOptimizations {
    /// Check if a name should be skipped as hidden.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if a directory at `depth` may be entered.
    pub fn may_enter(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }
}

/// Configuration for a crawl. Immutable once handed to the crawler.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CrawlOptions {
    /// What to do with nodes that pass the filters.
    #[builder(default)]
    pub mode: CrawlMode,

    /// Keep a statistics log of every visited node.
    #[builder(default = "true")]
    pub statistics: bool,

    /// Filter applied to every file.
    #[builder(setter(custom), default)]
    pub file_filter: Option<Arc<dyn Filter>>,

    /// Filter applied to every non-root directory.
    #[builder(setter(custom), default)]
    pub directory_filter: Option<Arc<dyn Filter>>,

    /// Record deletions without touching the filesystem.
    #[builder(default = "false")]
    pub dry_run: bool,

    /// Log per-node errors and carry on instead of aborting.
    #[builder(default = "false")]
    pub report_errors_and_continue: bool,

    /// Move deleted items to the platform trash.
    #[builder(default = "false")]
    pub use_trash: bool,

    /// Traversal pruning.
    #[builder(default)]
    pub optimizations: TraversalOptimizations,
}

impl CrawlOptionsBuilder {
    /// Set the filter applied to every file.
    pub fn file_filter(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.file_filter = Some(Some(Arc::new(filter)));
        self
    }

    /// Set the filter applied to every non-root directory.
    pub fn directory_filter(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.directory_filter = Some(Some(Arc::new(filter)));
        self
    }

    /// Set a shared file filter.
    pub fn shared_file_filter(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.file_filter = Some(Some(filter));
        self
    }

    /// Set a shared directory filter.
    pub fn shared_directory_filter(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.directory_filter = Some(Some(filter));
        self
    }

    fn validate(&self) -> Result<(), String> {
        let mode = self.mode.unwrap_or_default();
        let skip_files = self
            .optimizations
            .as_ref()
            .is_some_and(|o| o.skip_files);
        if mode.deletes_directories() && skip_files {
            return Err(format!(
                "Crawl mode '{mode}' cannot empty directories when files are not enumerated"
            ));
        }
        Ok(())
    }
}

impl CrawlOptions {
    /// Create a new options builder.
    pub fn builder() -> CrawlOptionsBuilder {
        CrawlOptionsBuilder::default()
    }

    /// Copy-construct from another instance.
    pub fn from_other(other: &CrawlOptions) -> Self {
        other.clone()
    }

    /// Browse-only options with statistics enabled.
    pub fn new() -> Self {
        Self {
            mode: CrawlMode::Browse,
            statistics: true,
            file_filter: None,
            directory_filter: None,
            dry_run: false,
            report_errors_and_continue: false,
            use_trash: false,
            optimizations: TraversalOptimizations::default(),
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterMode, NameFilter};

    #[test]
    fn test_options_builder() {
        let options = CrawlOptions::builder()
            .mode(CrawlMode::DeleteFiles)
            .dry_run(true)
            .file_filter(NameFilter::exact(["a.txt"], FilterMode::IncludeAny))
            .build()
            .unwrap();

        assert_eq!(options.mode, CrawlMode::DeleteFiles);
        assert!(options.dry_run);
        assert!(options.statistics);
        assert!(options.file_filter.is_some());
        assert!(options.directory_filter.is_none());
        assert!(!options.report_errors_and_continue);
    }

    #[test]
    fn test_options_defaults() {
        let options = CrawlOptions::default();
        assert_eq!(options.mode, CrawlMode::Browse);
        assert!(options.optimizations.include_hidden);
        assert!(options.optimizations.sort_entries);
        assert!(options.optimizations.max_depth.is_none());
    }

    #[test]
    fn test_copy_construction_shares_filters() {
        let options = CrawlOptions::builder()
            .file_filter(NameFilter::exact(["x"], FilterMode::IncludeAny))
            .build()
            .unwrap();
        let copy = CrawlOptions::from_other(&options);
        let (a, b) = (
            options.file_filter.as_ref().unwrap(),
            copy.file_filter.as_ref().unwrap(),
        );
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_validation_rejects_emptying_without_files() {
        let result = CrawlOptions::builder()
            .mode(CrawlMode::DeleteContents)
            .optimizations(TraversalOptimizations {
                skip_files: true,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("delete-all".parse::<CrawlMode>().unwrap(), CrawlMode::DeleteAll);
        assert_eq!(CrawlMode::DeleteContents.to_string(), "delete-contents");
        assert!(CrawlMode::DeleteFiles.deletes_files());
        assert!(!CrawlMode::DeleteFiles.deletes_directories());
    }

    #[test]
    fn test_optimizations() {
        let opts = TraversalOptimizations {
            max_depth: Some(1),
            include_hidden: false,
            ..Default::default()
        };
        assert!(opts.should_skip_hidden(".git"));
        assert!(!opts.should_skip_hidden("src"));
        assert!(opts.may_enter(1));
        assert!(!opts.may_enter(2));
    }
}
