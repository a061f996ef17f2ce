//! Depth-first directory crawler.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use horseshoe_core::{
    ClientAction, CrawlError, CrawlOptions, CrawlWarning, Directive, DirectoryTraversalMetadata,
    Entry, EntryInfo, FileTraversalMetadata, Filter, ObjectType, TraversalAction,
    TraversalStatistics, WarningKind, virtual_path,
};

use crate::delete::{remove_directory, remove_file};
use crate::hooks::CrawlHooks;
use crate::progress::{CrawlProgress, ProgressTracker};
use crate::report::CrawlReport;

/// Walks a directory tree, applying filters, hooks and the configured crawl mode.
pub struct DirectoryCrawler {
    options: CrawlOptions,
    progress_tx: broadcast::Sender<CrawlProgress>,
}

impl DirectoryCrawler {
    /// Create a new crawler.
    pub fn new(options: CrawlOptions) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            options,
            progress_tx,
        }
    }

    /// The options this crawler was created with.
    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Subscribe to crawl progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlProgress> {
        self.progress_tx.subscribe()
    }

    /// Crawl the tree below `root`.
    ///
    /// Errors on the root itself always fail the crawl. Errors on nodes below
    /// it fail the crawl unless `report_errors_and_continue` is set.
    pub fn crawl<H>(&self, root: impl AsRef<Path>, hooks: &mut H) -> Result<CrawlReport, CrawlError>
    where
        H: CrawlHooks + ?Sized,
    {
        let root = root.as_ref();
        let root_path = root.canonicalize().map_err(|e| CrawlError::io(root, e))?;

        if !root_path.is_dir() {
            return Err(CrawlError::NotADirectory { path: root_path });
        }

        let mut session = Session {
            options: &self.options,
            root: root_path.clone(),
            hooks,
            statistics: self.options.statistics.then(TraversalStatistics::new),
            warnings: Vec::new(),
            tracker: ProgressTracker::new(),
            file_meta: FileTraversalMetadata::new(),
            visited_dirs: HashSet::new(),
            progress_tx: &self.progress_tx,
        };

        let outcome = session.visit_directory(&root_path, 0)?;
        let _ = self.progress_tx.send(session.tracker.snapshot());

        let Session {
            statistics,
            warnings,
            tracker,
            ..
        } = session;

        let report = CrawlReport {
            root: root_path,
            statistics,
            warnings,
            aborted: outcome == Outcome::Aborted,
            files_visited: tracker.files_seen(),
            directories_visited: tracker.directories_seen(),
            deletions: tracker.deletions(),
            bytes_deleted: tracker.bytes_deleted(),
            duration: tracker.elapsed(),
        };

        info!(
            root = %report.root.display(),
            files = report.files_visited,
            directories = report.directories_visited,
            deletions = report.deletions,
            warnings = report.warnings.len(),
            aborted = report.aborted,
            dry_run = self.options.dry_run,
            "crawl finished"
        );

        Ok(report)
    }
}

/// What happened to a node, as seen by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// The node is still on disk.
    Kept,
    /// The node was deleted, or would have been in a dry run.
    Removed,
    /// A hook asked to stop.
    Aborted,
}

/// Children of a directory, split by kind.
#[derive(Default)]
struct Listing {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    /// Entries left on disk without being visited.
    ignored: usize,
    errors: Vec<CrawlError>,
}

/// State of one crawl invocation.
struct Session<'a, H: CrawlHooks + ?Sized> {
    options: &'a CrawlOptions,
    root: PathBuf,
    hooks: &'a mut H,
    statistics: Option<TraversalStatistics>,
    warnings: Vec<CrawlWarning>,
    tracker: ProgressTracker,
    file_meta: FileTraversalMetadata,
    visited_dirs: HashSet<PathBuf>,
    progress_tx: &'a broadcast::Sender<CrawlProgress>,
}

impl<H: CrawlHooks + ?Sized> Session<'_, H> {
    fn visit_directory(&mut self, path: &Path, depth: usize) -> Result<Outcome, CrawlError> {
        if self.options.optimizations.follow_symlinks && !self.first_visit(path) {
            debug!(path = %path.display(), "directory already visited, not following again");
            return Ok(Outcome::Kept);
        }

        let mut dir = DirectoryTraversalMetadata::new(&self.root, path, depth);
        self.tracker.record_dir(path);

        if !dir.is_root && !passes(self.options.directory_filter.as_ref(), &dir.entry_info()) {
            self.record_directory(&dir, TraversalAction::Filtered);
            self.hooks.on_directory_skipped(&dir);
            return Ok(Outcome::Kept);
        }

        debug!(path = %path.display(), depth, "entering directory");

        let directive = match self.hooks.on_directory_hello(&dir) {
            Ok(directive) => directive,
            Err(e) => {
                self.fail(path, ObjectType::Directory, None, e, WarningKind::HookError)?;
                return Ok(Outcome::Kept);
            }
        };
        dir.apply(directive);

        match directive {
            Directive::Abort => {
                self.record_directory(&dir, TraversalAction::Browsed);
                return Ok(Outcome::Aborted);
            }
            Directive::Skip => {
                self.record_directory(&dir, TraversalAction::Skipped);
                self.hooks.on_directory_skipped(&dir);
                return Ok(Outcome::Kept);
            }
            Directive::Delete => return self.delete_directory(&dir, true),
            Directive::Continue => {}
        }

        let Listing {
            files,
            dirs,
            ignored,
            errors,
        } = match self.list(path) {
            Ok(listing) => listing,
            Err(e) => {
                self.fail(path, ObjectType::Directory, None, e, WarningKind::ReadError)?;
                return Ok(Outcome::Kept);
            }
        };

        for error in errors {
            self.fail(path, ObjectType::Directory, None, error, WarningKind::ReadError)?;
        }

        let mut emptied = ignored == 0;
        let mut aborted = false;

        if self.options.optimizations.skip_files {
            emptied &= files.is_empty();
        } else {
            for file in &files {
                match self.visit_file(file, depth + 1)? {
                    Outcome::Aborted => {
                        aborted = true;
                        break;
                    }
                    Outcome::Kept => emptied = false,
                    Outcome::Removed => {}
                }
            }
        }

        if !aborted {
            for sub in &dirs {
                if !self.options.optimizations.may_enter(depth + 1) {
                    emptied = false;
                    continue;
                }
                match self.visit_directory(sub, depth + 1)? {
                    Outcome::Aborted => {
                        aborted = true;
                        break;
                    }
                    Outcome::Kept => emptied = false,
                    Outcome::Removed => {}
                }
            }
        }

        if aborted {
            self.record_directory(&dir, TraversalAction::Browsed);
            return Ok(Outcome::Aborted);
        }

        if let Err(e) = self.hooks.on_directory_goodbye(&dir) {
            self.fail(path, ObjectType::Directory, None, e, WarningKind::HookError)?;
            return Ok(Outcome::Kept);
        }

        let mode = self.options.mode;
        let removable = mode.deletes_directories()
            && (!dir.is_root || mode.deletes_root())
            && !path.is_symlink();
        if removable && emptied {
            return self.delete_directory(&dir, false);
        }

        self.record_directory(&dir, TraversalAction::Browsed);
        Ok(Outcome::Kept)
    }

    fn visit_file(&mut self, path: &Path, depth: usize) -> Result<Outcome, CrawlError> {
        let metadata = fs::metadata(path).or_else(|_| fs::symlink_metadata(path));
        let size = metadata.as_ref().ok().map(fs::Metadata::len);

        if self.tracker.record_file(path, size) {
            let _ = self.progress_tx.send(self.tracker.snapshot());
        }

        if let Err(e) = metadata {
            self.fail(
                path,
                ObjectType::File,
                None,
                CrawlError::io(path, e),
                WarningKind::MetadataError,
            )?;
            return Ok(Outcome::Kept);
        }

        self.file_meta.reset(&self.root, path, size, depth);

        if !passes(self.options.file_filter.as_ref(), &self.file_meta.entry_info()) {
            self.record_file(TraversalAction::Filtered);
            self.hooks.on_file_skipped(&self.file_meta);
            return Ok(Outcome::Kept);
        }

        let directive = match self.hooks.on_file_hello(&self.file_meta) {
            Ok(directive) => directive,
            Err(e) => {
                self.fail(path, ObjectType::File, size, e, WarningKind::HookError)?;
                return Ok(Outcome::Kept);
            }
        };
        self.file_meta.apply(directive);

        match directive {
            Directive::Abort => {
                self.record_file(TraversalAction::Browsed);
                Ok(Outcome::Aborted)
            }
            Directive::Skip => self.skip_file(),
            Directive::Delete => self.delete_file(),
            Directive::Continue if self.options.mode.deletes_files() => {
                self.file_meta.action = ClientAction::Delete;
                self.delete_file()
            }
            Directive::Continue => self.process_file(),
        }
    }

    fn process_file(&mut self) -> Result<Outcome, CrawlError> {
        match self.hooks.on_process_file(&self.file_meta) {
            Ok(Directive::Continue) => {
                self.record_file(TraversalAction::Browsed);
                Ok(Outcome::Kept)
            }
            Ok(Directive::Abort) => {
                self.record_file(TraversalAction::Browsed);
                Ok(Outcome::Aborted)
            }
            Ok(Directive::Skip) => {
                self.file_meta.apply(Directive::Skip);
                self.skip_file()
            }
            Ok(Directive::Delete) => {
                self.file_meta.apply(Directive::Delete);
                self.delete_file()
            }
            Err(e) => {
                let path = self.file_meta.path.clone();
                let size = self.file_meta.size;
                self.fail(&path, ObjectType::File, size, e, WarningKind::HookError)?;
                Ok(Outcome::Kept)
            }
        }
    }

    fn skip_file(&mut self) -> Result<Outcome, CrawlError> {
        self.record_file(TraversalAction::Skipped);
        self.hooks.on_file_skipped(&self.file_meta);
        Ok(Outcome::Kept)
    }

    fn delete_file(&mut self) -> Result<Outcome, CrawlError> {
        self.hooks.on_deleting_file(&self.file_meta);

        let action = if self.options.dry_run {
            TraversalAction::DryRunDeleted
        } else {
            if let Err(e) = remove_file(&self.file_meta.path, self.options.use_trash) {
                let path = self.file_meta.path.clone();
                let size = self.file_meta.size;
                self.fail(
                    &path,
                    ObjectType::File,
                    size,
                    CrawlError::io(&path, e),
                    WarningKind::DeleteError,
                )?;
                return Ok(Outcome::Kept);
            }
            TraversalAction::Deleted
        };

        debug!(
            path = %self.file_meta.path.display(),
            dry_run = self.options.dry_run,
            "file deleted"
        );
        self.tracker.record_deletion(self.file_meta.size.unwrap_or(0));
        self.record_file(action);
        self.hooks.on_file_deleted(&self.file_meta, action);
        Ok(Outcome::Removed)
    }

    fn delete_directory(
        &mut self,
        dir: &DirectoryTraversalMetadata,
        recursive: bool,
    ) -> Result<Outcome, CrawlError> {
        self.hooks.on_deleting_directory(dir);

        let action = if self.options.dry_run {
            TraversalAction::DryRunDeleted
        } else {
            if let Err(e) = remove_directory(&dir.path, recursive, self.options.use_trash) {
                self.fail(
                    &dir.path,
                    ObjectType::Directory,
                    None,
                    CrawlError::io(&dir.path, e),
                    WarningKind::DeleteError,
                )?;
                return Ok(Outcome::Kept);
            }
            TraversalAction::Deleted
        };

        debug!(
            path = %dir.path.display(),
            recursive,
            dry_run = self.options.dry_run,
            "directory deleted"
        );
        self.tracker.record_deletion(0);
        self.record_directory(dir, action);
        self.hooks.on_directory_deleted(dir, action);
        Ok(Outcome::Removed)
    }

    fn list(&self, path: &Path) -> Result<Listing, CrawlError> {
        let read_dir = fs::read_dir(path).map_err(|e| CrawlError::io(path, e))?;
        let optimizations = &self.options.optimizations;
        let mut listing = Listing::default();

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    listing.errors.push(CrawlError::io(path, e));
                    listing.ignored += 1;
                    continue;
                }
            };

            let entry_path = entry.path();
            if optimizations.should_skip_hidden(&entry.file_name().to_string_lossy()) {
                listing.ignored += 1;
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    listing.errors.push(CrawlError::io(&entry_path, e));
                    listing.ignored += 1;
                    continue;
                }
            };

            if file_type.is_dir() {
                listing.dirs.push(entry_path);
            } else if file_type.is_symlink() {
                match fs::metadata(&entry_path) {
                    Ok(target) if target.is_dir() => {
                        if optimizations.follow_symlinks {
                            listing.dirs.push(entry_path);
                        } else {
                            listing.ignored += 1;
                        }
                    }
                    _ => listing.files.push(entry_path),
                }
            } else {
                listing.files.push(entry_path);
            }
        }

        if optimizations.sort_entries {
            listing.files.sort();
            listing.dirs.sort();
        }

        Ok(listing)
    }

    /// Report a node error: propagate it, or log it and carry on.
    fn fail(
        &mut self,
        path: &Path,
        object_type: ObjectType,
        size: Option<u64>,
        error: CrawlError,
        kind: WarningKind,
    ) -> Result<(), CrawlError> {
        if !self.options.report_errors_and_continue {
            return Err(error);
        }

        warn!(path = %path.display(), error = %error, "continuing after error");
        self.tracker.record_error();
        self.warnings.push(CrawlWarning::from_error(path, &error, kind));
        if let Some(stats) = self.statistics.as_mut() {
            stats.record(Entry::new(
                path,
                virtual_path(&self.root, path),
                object_type,
                size,
                TraversalAction::Failed,
            ));
        }
        self.hooks.on_error(path, &error);
        Ok(())
    }

    fn record_file(&mut self, action: TraversalAction) {
        if let Some(stats) = self.statistics.as_mut() {
            let meta = &self.file_meta;
            stats.record(Entry::new(
                meta.path.clone(),
                meta.virtual_path.clone(),
                ObjectType::File,
                meta.size,
                action,
            ));
        }
    }

    fn record_directory(&mut self, dir: &DirectoryTraversalMetadata, action: TraversalAction) {
        if let Some(stats) = self.statistics.as_mut() {
            stats.record(Entry::new(
                dir.path.clone(),
                dir.virtual_path.clone(),
                ObjectType::Directory,
                None,
                action,
            ));
        }
    }

    /// Track directories by canonical path so symlink cycles are entered once.
    fn first_visit(&mut self, path: &Path) -> bool {
        match path.canonicalize() {
            Ok(canonical) => self.visited_dirs.insert(canonical),
            Err(_) => true,
        }
    }
}

fn passes(filter: Option<&Arc<dyn Filter>>, entry: &EntryInfo<'_>) -> bool {
    filter.is_none_or(|f| f.is_match(entry))
}
