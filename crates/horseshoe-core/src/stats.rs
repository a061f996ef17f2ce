//! Traversal statistics: an append-only log of visited nodes.

use std::fmt;
use std::path::PathBuf;

use humansize::{BINARY, format_size};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of node recorded in the statistics log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ObjectType {
    File,
    Directory,
}

/// What the crawl did with a node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalAction {
    /// Visited normally.
    #[strum(serialize = "browsed")]
    Browsed,
    /// Rejected by a file or directory filter.
    #[strum(serialize = "filtered")]
    Filtered,
    /// Skipped on client request.
    #[strum(serialize = "skipped")]
    Skipped,
    /// Removed from the filesystem.
    #[strum(serialize = "deleted")]
    Deleted,
    /// Would have been removed, but the crawl is a dry run.
    #[strum(serialize = "deleted (dry run)")]
    DryRunDeleted,
    /// An error occurred and the crawl continued.
    #[strum(serialize = "failed")]
    Failed,
}

impl TraversalAction {
    /// Deleted for real or in a dry run.
    pub fn is_deletion(self) -> bool {
        matches!(self, Self::Deleted | Self::DryRunDeleted)
    }
}

/// One visited node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: PathBuf,
    pub virtual_path: String,
    pub object_type: ObjectType,
    /// File size in bytes; `None` for directories and unreadable files.
    pub size: Option<u64>,
    pub action: TraversalAction,
}

impl Entry {
    pub fn new(
        path: impl Into<PathBuf>,
        virtual_path: impl Into<String>,
        object_type: ObjectType,
        size: Option<u64>,
        action: TraversalAction,
    ) -> Self {
        Self {
            path: path.into(),
            virtual_path: virtual_path.into(),
            object_type,
            size,
            action,
        }
    }
}

/// Ordered log of the nodes a crawl visited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraversalStatistics {
    entries: Vec<Entry>,
}

impl TraversalStatistics {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// All entries, in visit order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given type and action.
    pub fn count(&self, object_type: ObjectType, action: TraversalAction) -> usize {
        self.entries
            .iter()
            .filter(|e| e.object_type == object_type && e.action == action)
            .count()
    }

    /// File entries, in visit order.
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.object_type == ObjectType::File)
    }

    /// Directory entries, in visit order.
    pub fn directories(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.object_type == ObjectType::Directory)
    }

    /// Sum of all known file sizes.
    pub fn total_file_size(&self) -> u64 {
        self.files().filter_map(|e| e.size).sum()
    }

    /// Look up the entry recorded for a virtual path.
    pub fn find(&self, virtual_path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.virtual_path == virtual_path)
    }

    /// Group entries by type and action, in first-seen order.
    pub fn summarize(&self) -> StatisticsSummary {
        let mut rows: IndexMap<(ObjectType, TraversalAction), SummaryRow> = IndexMap::new();
        for entry in &self.entries {
            let row = rows
                .entry((entry.object_type, entry.action))
                .or_insert_with(|| SummaryRow {
                    object_type: entry.object_type,
                    action: entry.action,
                    count: 0,
                    total_size: 0,
                });
            row.count += 1;
            row.total_size += entry.size.unwrap_or(0);
        }

        StatisticsSummary {
            rows: rows.into_values().collect(),
            total_entries: self.entries.len(),
            total_file_size: self.total_file_size(),
        }
    }
}

/// One group of a [`StatisticsSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub object_type: ObjectType,
    pub action: TraversalAction,
    pub count: usize,
    pub total_size: u64,
}

/// Statistics grouped by object type and action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub rows: Vec<SummaryRow>,
    pub total_entries: usize,
    pub total_file_size: u64,
}

impl StatisticsSummary {
    /// Find the row for a type and action.
    pub fn row(&self, object_type: ObjectType, action: TraversalAction) -> Option<&SummaryRow> {
        self.rows
            .iter()
            .find(|r| r.object_type == object_type && r.action == action)
    }
}

impl fmt::Display for StatisticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            write!(f, " {:<10} {:<18} {:>8}", row.object_type, row.action, row.count)?;
            if row.object_type == ObjectType::File {
                write!(f, "  {:>10}", format_size(row.total_size, BINARY))?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            " {} entries, {} in files",
            self.total_entries,
            format_size(self.total_file_size, BINARY)
        )
    }
}
