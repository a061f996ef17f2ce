//! Optional TOML settings file.
//!
//! ```toml
//! [crawl]
//! mode = "delete-files"
//! dry_run = true
//! include = ["*.tmp", "*.bak"]
//! exclude_dirs = [".git"]
//! include_dirs = ["src*", "build*"]
//!
//! [snowball]
//! extra_payment = 150
//! order = "highest-rate-first"
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use color_eyre::eyre::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use horseshoe_core::{
    CrawlMode, CrawlOptions, Filter, FilterGroup, FilterMode, NameFilter, PatternKind,
    TraversalOptimizations,
};
use horseshoe_finance::{Money, SnowballConfig, SnowballOrder};

use crate::cli::{CrawlArgs, SnowballArgs};

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "horseshoe.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub crawl: CrawlSettings,
    pub snowball: SnowballSettings,
}

impl Settings {
    /// Load `path`, or `horseshoe.toml` when no path is given and it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_SETTINGS_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_SETTINGS_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = toml::from_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

/// The `[crawl]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlSettings {
    pub mode: CrawlMode,
    pub dry_run: bool,
    pub statistics: bool,
    pub report_errors_and_continue: bool,
    pub use_trash: bool,
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// File name globs; a file must match one of them.
    pub include: Vec<String>,
    /// File name globs; a file matching any of them is filtered out.
    pub exclude: Vec<String>,
    /// Directory name globs; below the root only matching directories are entered.
    pub include_dirs: Vec<String>,
    /// Directory name globs; matching directories are not entered.
    pub exclude_dirs: Vec<String>,
    /// Match globs without regard to case.
    pub ignore_case: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            mode: CrawlMode::default(),
            dry_run: false,
            statistics: true,
            report_errors_and_continue: false,
            use_trash: false,
            max_depth: None,
            include_hidden: true,
            follow_symlinks: false,
            include: Vec::new(),
            exclude: Vec::new(),
            include_dirs: Vec::new(),
            exclude_dirs: Vec::new(),
            ignore_case: false,
        }
    }
}

impl CrawlSettings {
    /// Layer command-line flags over the file's values.
    pub fn merge(mut self, args: &CrawlArgs) -> Self {
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        if args.max_depth.is_some() {
            self.max_depth = args.max_depth;
        }
        self.dry_run |= args.dry_run;
        self.report_errors_and_continue |= args.continue_on_error;
        self.use_trash |= args.trash;
        self.include_hidden &= !args.no_hidden;
        self.include.extend(args.include.iter().cloned());
        self.exclude.extend(args.exclude.iter().cloned());
        self.include_dirs.extend(args.include_dir.iter().cloned());
        self.exclude_dirs.extend(args.exclude_dir.iter().cloned());
        self
    }

    pub fn to_options(&self) -> Result<CrawlOptions> {
        let mut builder = CrawlOptions::builder();
        builder
            .mode(self.mode)
            .statistics(self.statistics)
            .dry_run(self.dry_run)
            .report_errors_and_continue(self.report_errors_and_continue)
            .use_trash(self.use_trash)
            .optimizations(TraversalOptimizations {
                max_depth: self.max_depth,
                include_hidden: self.include_hidden,
                follow_symlinks: self.follow_symlinks,
                ..Default::default()
            });

        if let Some(filter) = self.glob_filter(&self.include, &self.exclude)? {
            builder.shared_file_filter(filter);
        }
        if let Some(filter) = self.glob_filter(&self.include_dirs, &self.exclude_dirs)? {
            builder.shared_directory_filter(filter);
        }

        builder.build().context("Invalid crawl settings")
    }

    /// Match one of `include` (when given) and none of `exclude`.
    fn glob_filter(
        &self,
        include: &[String],
        exclude: &[String],
    ) -> Result<Option<Arc<dyn Filter>>> {
        let mut group = FilterGroup::new(FilterMode::IncludeAll);
        if !include.is_empty() {
            group.push(Arc::new(self.globs(include, FilterMode::IncludeAny)?));
        }
        if !exclude.is_empty() {
            group.push(Arc::new(self.globs(exclude, FilterMode::ExcludeAny)?));
        }
        Ok((!group.is_empty()).then(|| Arc::new(group) as Arc<dyn Filter>))
    }

    fn globs(&self, patterns: &[String], mode: FilterMode) -> Result<NameFilter> {
        Ok(NameFilter::new(
            PatternKind::Glob,
            patterns,
            mode,
            self.ignore_case,
        )?)
    }
}

/// The `[snowball]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnowballSettings {
    pub extra_payment: Money,
    pub order: SnowballOrder,
    pub max_months: u32,
    /// `YYYY-MM-DD`; the current month when unset.
    pub start: Option<NaiveDate>,
    pub roll_over_payments: bool,
}

impl Default for SnowballSettings {
    fn default() -> Self {
        Self {
            extra_payment: Money::ZERO,
            order: SnowballOrder::default(),
            max_months: 600,
            start: None,
            roll_over_payments: true,
        }
    }
}

impl SnowballSettings {
    /// Layer command-line flags over the file's values.
    pub fn merge(mut self, args: &SnowballArgs) -> Self {
        if let Some(extra) = args.extra {
            self.extra_payment = extra;
        }
        if let Some(order) = args.order {
            self.order = order;
        }
        if let Some(max_months) = args.max_months {
            self.max_months = max_months;
        }
        if args.start.is_some() {
            self.start = args.start;
        }
        self.roll_over_payments &= !args.no_roll_over;
        self
    }

    pub fn to_config(&self) -> Result<SnowballConfig> {
        let mut builder = SnowballConfig::builder();
        builder
            .extra_payment(self.extra_payment)
            .order(self.order)
            .max_months(self.max_months)
            .roll_over_payments(self.roll_over_payments);
        if let Some(start) = self.start {
            builder.start(start);
        }
        builder.build().context("Invalid snowball settings")
    }
}
