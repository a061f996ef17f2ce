//! Node filters evaluated per file and per directory during a crawl.
//!
//! Every filter implements [`Filter`]. Simple filters test one kind of
//! criterion (names, extensions, sizes); [`FilterGroup`] composes filters.
//! Both apply a [`FilterMode`] to decide how the individual criterion results
//! combine into a single include/exclude decision.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CrawlError;
use crate::stats::ObjectType;

/// The view of a node a filter is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo<'a> {
    /// Full path of the node.
    pub path: &'a Path,
    /// File or directory name.
    pub name: &'a str,
    /// Path relative to the crawl root, `/`-separated and rooted at `/`.
    pub virtual_path: &'a str,
    /// Whether the node is a file or a directory.
    pub object_type: ObjectType,
    /// Size in bytes (files only).
    pub size: Option<u64>,
    /// Depth below the crawl root (root = 0).
    pub depth: usize,
}

/// A predicate over crawl nodes.
pub trait Filter: Send + Sync + fmt::Debug {
    /// Returns `true` when the node passes the filter.
    fn is_match(&self, entry: &EntryInfo<'_>) -> bool;
}

/// How the results of a filter's criteria combine.
///
/// A filter with no criteria passes everything regardless of mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FilterMode {
    /// Pass when every criterion matches.
    IncludeAll,
    /// Pass when at least one criterion matches.
    #[default]
    IncludeAny,
    /// Reject when every criterion matches.
    ExcludeAll,
    /// Reject when at least one criterion matches.
    ExcludeAny,
}

impl FilterMode {
    /// Combine criterion results, short-circuiting as soon as the outcome is known.
    pub fn evaluate(self, results: impl IntoIterator<Item = bool>) -> bool {
        let mut results = results.into_iter().peekable();
        if results.peek().is_none() {
            return true;
        }
        match self {
            Self::IncludeAll => results.all(|m| m),
            Self::IncludeAny => results.any(|m| m),
            Self::ExcludeAll => !results.all(|m| m),
            Self::ExcludeAny => !results.any(|m| m),
        }
    }

    /// Whether this mode excludes matching nodes.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::ExcludeAll | Self::ExcludeAny)
    }
}

/// Kind of pattern held by a [`NameFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PatternKind {
    /// Whole-name equality.
    Exact,
    /// Shell-style glob (`*.log`, `target`, `build-?`).
    Glob,
    /// Regular expression, unanchored.
    Regex,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, candidate: &str, ignore_case: bool) -> bool {
        match self {
            Self::Exact(name) if ignore_case => candidate.to_lowercase() == *name,
            Self::Exact(name) => candidate == name,
            Self::Glob(glob) => glob.is_match(candidate),
            Self::Regex(regex) => regex.is_match(candidate),
        }
    }
}

/// Filters nodes by name using exact names, globs or regular expressions.
#[derive(Debug, Clone)]
pub struct NameFilter {
    kind: PatternKind,
    matchers: Vec<Matcher>,
    mode: FilterMode,
    ignore_case: bool,
    match_virtual_path: bool,
}

/// A [`NameFilter`] applied to files.
pub type FileNameFilter = NameFilter;

/// A [`NameFilter`] applied to directories.
pub type DirectoryNameFilter = NameFilter;

impl NameFilter {
    /// Compile a name filter.
    ///
    /// Fails with [`CrawlError::InvalidPattern`] when a glob or regex does not
    /// compile or a pattern is empty.
    pub fn new<I, S>(
        kind: PatternKind,
        patterns: I,
        mode: FilterMode,
        ignore_case: bool,
    ) -> Result<Self, CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matchers = patterns
            .into_iter()
            .map(|p| compile(kind, p.as_ref(), ignore_case))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind,
            matchers,
            mode,
            ignore_case,
            match_virtual_path: false,
        })
    }

    /// Case-sensitive exact names.
    pub fn exact<I, S>(names: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            kind: PatternKind::Exact,
            matchers: names
                .into_iter()
                .map(|n| Matcher::Exact(n.as_ref().to_string()))
                .collect(),
            mode,
            ignore_case: false,
            match_virtual_path: false,
        }
    }

    /// Case-sensitive glob patterns.
    pub fn glob<I, S>(patterns: I, mode: FilterMode) -> Result<Self, CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(PatternKind::Glob, patterns, mode, false)
    }

    /// Case-sensitive regular expressions.
    pub fn regex<I, S>(patterns: I, mode: FilterMode) -> Result<Self, CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(PatternKind::Regex, patterns, mode, false)
    }

    /// Match against the node's virtual path instead of its name.
    pub fn match_virtual_path(mut self) -> Self {
        self.match_virtual_path = true;
        self
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

fn compile(kind: PatternKind, pattern: &str, ignore_case: bool) -> Result<Matcher, CrawlError> {
    if pattern.is_empty() {
        return Err(CrawlError::InvalidPattern {
            pattern: String::new(),
            message: "pattern cannot be empty".to_string(),
        });
    }
    let invalid = |message: String| CrawlError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    };

    match kind {
        PatternKind::Exact if ignore_case => Ok(Matcher::Exact(pattern.to_lowercase())),
        PatternKind::Exact => Ok(Matcher::Exact(pattern.to_string())),
        PatternKind::Glob => GlobBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .literal_separator(true)
            .build()
            .map(|g| Matcher::Glob(g.compile_matcher()))
            .map_err(|e| invalid(e.to_string())),
        PatternKind::Regex => RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map(Matcher::Regex)
            .map_err(|e| invalid(e.to_string())),
    }
}

impl Filter for NameFilter {
    fn is_match(&self, entry: &EntryInfo<'_>) -> bool {
        let candidate = if self.match_virtual_path {
            entry.virtual_path
        } else {
            entry.name
        };
        self.mode.evaluate(
            self.matchers
                .iter()
                .map(|m| m.is_match(candidate, self.ignore_case)),
        )
    }
}

/// Filters files by extension. Comparison ignores case and a leading dot.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    mode: FilterMode,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            mode,
        }
    }
}

impl Filter for ExtensionFilter {
    fn is_match(&self, entry: &EntryInfo<'_>) -> bool {
        let ext = Path::new(entry.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        self.mode.evaluate(
            self.extensions
                .iter()
                .map(|wanted| ext.as_deref() == Some(wanted.as_str())),
        )
    }
}

/// Filters files by an inclusive size range.
///
/// Entries without a size never fall inside the range.
#[derive(Debug, Clone, Copy)]
pub struct SizeFilter {
    min: Option<u64>,
    max: Option<u64>,
    mode: FilterMode,
}

impl SizeFilter {
    pub fn new(min: Option<u64>, max: Option<u64>, mode: FilterMode) -> Self {
        Self { min, max, mode }
    }

    /// Files of at least `min` bytes.
    pub fn at_least(min: u64) -> Self {
        Self::new(Some(min), None, FilterMode::IncludeAny)
    }

    /// Files of at most `max` bytes.
    pub fn at_most(max: u64) -> Self {
        Self::new(None, Some(max), FilterMode::IncludeAny)
    }

    fn in_range(&self, size: Option<u64>) -> bool {
        size.is_some_and(|s| {
            self.min.is_none_or(|min| s >= min) && self.max.is_none_or(|max| s <= max)
        })
    }
}

impl Filter for SizeFilter {
    fn is_match(&self, entry: &EntryInfo<'_>) -> bool {
        self.mode.evaluate([self.in_range(entry.size)])
    }
}

/// Combines child filters under a [`FilterMode`].
///
/// `IncludeAll` is a logical AND, `IncludeAny` a logical OR; the exclusive
/// modes negate those.
#[derive(Debug, Clone, Default)]
pub struct FilterGroup {
    mode: FilterMode,
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterGroup {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            filters: Vec::new(),
        }
    }

    /// All children must pass.
    pub fn and(filters: impl IntoIterator<Item = Arc<dyn Filter>>) -> Self {
        Self {
            mode: FilterMode::IncludeAll,
            filters: filters.into_iter().collect(),
        }
    }

    /// At least one child must pass.
    pub fn or(filters: impl IntoIterator<Item = Arc<dyn Filter>>) -> Self {
        Self {
            mode: FilterMode::IncludeAny,
            filters: filters.into_iter().collect(),
        }
    }

    /// Add a child filter.
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for FilterGroup {
    fn is_match(&self, entry: &EntryInfo<'_>) -> bool {
        self.mode
            .evaluate(self.filters.iter().map(|f| f.is_match(entry)))
    }
}
