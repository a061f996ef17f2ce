use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use horseshoe_crawl::{
    CrawlError, CrawlHooks, CrawlMode, CrawlOptions, Directive, DirectoryCrawler,
    DirectoryTraversalMetadata, ExtensionFilter, FileTraversalMetadata, Filter, FilterGroup,
    FilterMode, NameFilter, NoHooks, ObjectType, ProcessFiles, SizeFilter, TraversalAction,
    TraversalOptimizations, WarningKind,
};
use tempfile::TempDir;

/// root/
///   .hidden      (1 byte)
///   a.txt        (4)
///   b.log        (2)
///   cache/
///     e.tmp      (5)
///     nested/
///       f.tmp    (1)
///   keep/
///     c.txt      (3)
///     d.log      (1)
fn create_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("keep")).unwrap();
    fs::create_dir_all(root.join("cache/nested")).unwrap();

    fs::write(root.join("a.txt"), "aaaa").unwrap();
    fs::write(root.join("b.log"), "bb").unwrap();
    fs::write(root.join(".hidden"), "h").unwrap();
    fs::write(root.join("keep/c.txt"), "ccc").unwrap();
    fs::write(root.join("keep/d.log"), "d").unwrap();
    fs::write(root.join("cache/e.tmp"), "eeeee").unwrap();
    fs::write(root.join("cache/nested/f.tmp"), "f").unwrap();

    temp
}

fn all_paths(root: &Path) -> Vec<PathBuf> {
    [
        "a.txt",
        "b.log",
        ".hidden",
        "keep",
        "keep/c.txt",
        "keep/d.log",
        "cache",
        "cache/e.tmp",
        "cache/nested",
        "cache/nested/f.tmp",
    ]
    .iter()
    .map(|p| root.join(p))
    .collect()
}

#[derive(Default)]
struct Recorder {
    dirs_entered: Vec<String>,
    dirs_left: Vec<String>,
    files_hello: Vec<String>,
    processed: Vec<String>,
    skipped: Vec<String>,
    deleted: Vec<(String, TraversalAction)>,
    errors: Vec<PathBuf>,

    skip: Option<&'static str>,
    delete: Option<&'static str>,
    abort: Option<&'static str>,
    fail: Option<&'static str>,
}

impl Recorder {
    fn directive_for(&self, virtual_path: &str) -> Directive {
        if self.abort == Some(virtual_path) {
            Directive::Abort
        } else if self.skip == Some(virtual_path) {
            Directive::Skip
        } else if self.delete == Some(virtual_path) {
            Directive::Delete
        } else {
            Directive::Continue
        }
    }
}

impl CrawlHooks for Recorder {
    fn on_directory_hello(
        &mut self,
        dir: &DirectoryTraversalMetadata,
    ) -> Result<Directive, CrawlError> {
        self.dirs_entered.push(dir.virtual_path.clone());
        Ok(self.directive_for(&dir.virtual_path))
    }

    fn on_directory_goodbye(&mut self, dir: &DirectoryTraversalMetadata) -> Result<(), CrawlError> {
        self.dirs_left.push(dir.virtual_path.clone());
        Ok(())
    }

    fn on_directory_skipped(&mut self, dir: &DirectoryTraversalMetadata) {
        self.skipped.push(dir.virtual_path.clone());
    }

    fn on_directory_deleted(&mut self, dir: &DirectoryTraversalMetadata, action: TraversalAction) {
        self.deleted.push((dir.virtual_path.clone(), action));
    }

    fn on_file_hello(&mut self, file: &FileTraversalMetadata) -> Result<Directive, CrawlError> {
        self.files_hello.push(file.virtual_path.clone());
        Ok(self.directive_for(&file.virtual_path))
    }

    fn on_process_file(&mut self, file: &FileTraversalMetadata) -> Result<Directive, CrawlError> {
        self.processed.push(file.virtual_path.clone());
        if self.fail == Some(file.virtual_path.as_str()) {
            return Err(CrawlError::hook(&file.path, "processing failed"));
        }
        Ok(Directive::Continue)
    }

    fn on_file_skipped(&mut self, file: &FileTraversalMetadata) {
        self.skipped.push(file.virtual_path.clone());
    }

    fn on_file_deleted(&mut self, file: &FileTraversalMetadata, action: TraversalAction) {
        self.deleted.push((file.virtual_path.clone(), action));
    }

    fn on_error(&mut self, path: &Path, _error: &CrawlError) {
        self.errors.push(path.to_path_buf());
    }
}

fn crawl(
    temp: &TempDir,
    options: CrawlOptions,
    hooks: &mut Recorder,
) -> horseshoe_crawl::CrawlReport {
    DirectoryCrawler::new(options).crawl(temp.path(), hooks).unwrap()
}

#[test]
fn test_statistics_match_visited_nodes() {
    let temp = create_tree();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    let stats = report.statistics.as_ref().unwrap();
    assert_eq!(stats.files().count(), 7);
    assert_eq!(stats.directories().count(), 4);
    assert_eq!(report.files_visited, 7);
    assert_eq!(report.directories_visited, 4);
    assert_eq!(hooks.files_hello.len(), 7);
    assert_eq!(hooks.processed.len(), 7);
    assert_eq!(hooks.dirs_entered.len(), 4);
    assert_eq!(hooks.dirs_left, vec!["/cache/nested", "/cache", "/keep", "/"]);
    assert_eq!(stats.total_file_size(), 17);
    assert!(!report.has_warnings());
}

#[test]
fn test_file_filter_includes_matching_files() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .file_filter(NameFilter::glob(["*.log"], FilterMode::IncludeAny).unwrap())
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    let stats = report.statistics.unwrap();
    assert_eq!(hooks.processed, vec!["/b.log", "/keep/d.log"]);
    assert_eq!(stats.count(ObjectType::File, TraversalAction::Browsed), 2);
    assert_eq!(stats.count(ObjectType::File, TraversalAction::Filtered), 5);
    assert_eq!(hooks.skipped.len(), 5);
}

#[test]
fn test_file_filter_excludes_matching_files() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .file_filter(NameFilter::glob(["*.log", "*.tmp"], FilterMode::ExcludeAny).unwrap())
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    crawl(&temp, options, &mut hooks);

    assert_eq!(hooks.processed, vec!["/.hidden", "/a.txt", "/keep/c.txt"]);
}

#[test]
fn test_filter_group_combines_criteria() {
    let temp = create_tree();
    let group = FilterGroup::and([
        Arc::new(ExtensionFilter::new(["txt"], FilterMode::IncludeAny)) as Arc<dyn Filter>,
        Arc::new(SizeFilter::at_least(4)) as Arc<dyn Filter>,
    ]);
    let options = CrawlOptions::builder().file_filter(group).build().unwrap();
    let mut hooks = Recorder::default();
    crawl(&temp, options, &mut hooks);

    assert_eq!(hooks.processed, vec!["/a.txt"]);
}

#[test]
fn test_directory_filter_prunes_subtree_but_not_root() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .directory_filter(NameFilter::exact(["keep"], FilterMode::IncludeAny))
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    let stats = report.statistics.unwrap();
    assert_eq!(
        stats.find("/cache").map(|e| e.action),
        Some(TraversalAction::Filtered)
    );
    assert!(stats.find("/cache/e.tmp").is_none());
    assert!(stats.find("/cache/nested").is_none());
    assert_eq!(
        stats.find("/").map(|e| e.action),
        Some(TraversalAction::Browsed)
    );
    assert_eq!(hooks.dirs_entered, vec!["/", "/keep"]);
}

#[test]
fn test_hidden_entries_and_depth_limit() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .optimizations(TraversalOptimizations {
            max_depth: Some(1),
            include_hidden: false,
            ..Default::default()
        })
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    let stats = report.statistics.unwrap();
    assert!(stats.find("/.hidden").is_none());
    assert!(stats.find("/cache/e.tmp").is_some());
    assert!(stats.find("/cache/nested").is_none());
    assert!(stats.find("/cache/nested/f.tmp").is_none());
}

#[test]
fn test_dry_run_never_mutates_filesystem() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteAll)
        .dry_run(true)
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    for path in all_paths(temp.path()) {
        assert!(path.exists(), "{} was removed", path.display());
    }

    let stats = report.statistics.unwrap();
    assert_eq!(stats.len(), 11);
    assert!(
        stats
            .entries()
            .iter()
            .all(|e| e.action == TraversalAction::DryRunDeleted)
    );
    assert_eq!(report.deletions, 11);
    assert_eq!(report.bytes_deleted, 17);
    assert!(
        hooks
            .deleted
            .iter()
            .all(|(_, action)| *action == TraversalAction::DryRunDeleted)
    );
}

#[test]
fn test_delete_files_mode_respects_filter() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteFiles)
        .file_filter(ExtensionFilter::new(["tmp"], FilterMode::IncludeAny))
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    let root = temp.path();
    assert!(!root.join("cache/e.tmp").exists());
    assert!(!root.join("cache/nested/f.tmp").exists());
    assert!(root.join("cache/nested").is_dir());
    assert!(root.join("a.txt").exists());
    assert!(root.join("keep/d.log").exists());
    assert_eq!(report.bytes_deleted, 6);
    assert!(hooks.processed.is_empty());
}

#[test]
fn test_delete_contents_removes_emptied_directories() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteContents)
        .file_filter(ExtensionFilter::new(["tmp"], FilterMode::IncludeAny))
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    crawl(&temp, options, &mut hooks);

    let root = temp.path();
    assert!(!root.join("cache").exists());
    assert!(root.join("keep/c.txt").exists());
    assert!(root.exists());
    assert_eq!(
        hooks.deleted,
        vec![
            ("/cache/e.tmp".to_string(), TraversalAction::Deleted),
            ("/cache/nested/f.tmp".to_string(), TraversalAction::Deleted),
            ("/cache/nested".to_string(), TraversalAction::Deleted),
            ("/cache".to_string(), TraversalAction::Deleted),
        ]
    );
}

#[test]
fn test_delete_all_removes_root() {
    let temp = create_tree();
    let target = temp.path().join("cache");
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteAll)
        .build()
        .unwrap();
    let report = DirectoryCrawler::new(options)
        .crawl(&target, &mut NoHooks)
        .unwrap();

    assert!(!target.exists());
    assert!(temp.path().join("keep").exists());
    assert_eq!(report.deletions, 4);
}

#[test]
fn test_client_skip_affects_only_that_file() {
    let temp = create_tree();
    let mut hooks = Recorder {
        skip: Some("/keep/c.txt"),
        ..Default::default()
    };
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    let stats = report.statistics.unwrap();
    assert_eq!(
        stats.find("/keep/c.txt").map(|e| e.action),
        Some(TraversalAction::Skipped)
    );
    assert_eq!(
        stats.find("/keep/d.log").map(|e| e.action),
        Some(TraversalAction::Browsed)
    );
    assert!(!hooks.processed.contains(&"/keep/c.txt".to_string()));
    assert_eq!(hooks.processed.len(), 6);
}

#[test]
fn test_client_skip_directory_skips_subtree() {
    let temp = create_tree();
    let mut hooks = Recorder {
        skip: Some("/cache"),
        ..Default::default()
    };
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    let stats = report.statistics.unwrap();
    assert_eq!(
        stats.find("/cache").map(|e| e.action),
        Some(TraversalAction::Skipped)
    );
    assert!(stats.find("/cache/e.tmp").is_none());
    assert!(!hooks.dirs_entered.contains(&"/cache/nested".to_string()));
    assert!(!hooks.dirs_left.contains(&"/cache".to_string()));
}

#[test]
fn test_client_delete_file_in_browse_mode() {
    let temp = create_tree();
    let mut hooks = Recorder {
        delete: Some("/a.txt"),
        ..Default::default()
    };
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    assert!(!temp.path().join("a.txt").exists());
    assert!(temp.path().join("b.log").exists());
    assert_eq!(report.deletions, 1);
    assert_eq!(report.bytes_deleted, 4);
    assert_eq!(
        hooks.deleted,
        vec![("/a.txt".to_string(), TraversalAction::Deleted)]
    );
}

#[test]
fn test_client_delete_directory_is_recursive() {
    let temp = create_tree();
    let mut hooks = Recorder {
        delete: Some("/cache"),
        ..Default::default()
    };
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    assert!(!temp.path().join("cache").exists());
    assert!(temp.path().join("keep/c.txt").exists());
    assert!(!hooks.dirs_entered.contains(&"/cache/nested".to_string()));
    let stats = report.statistics.unwrap();
    assert_eq!(
        stats.find("/cache").map(|e| e.action),
        Some(TraversalAction::Deleted)
    );
}

#[test]
fn test_client_delete_honours_dry_run() {
    let temp = create_tree();
    let options = CrawlOptions::builder().dry_run(true).build().unwrap();
    let mut hooks = Recorder {
        delete: Some("/cache"),
        ..Default::default()
    };
    crawl(&temp, options, &mut hooks);

    assert!(temp.path().join("cache/nested/f.tmp").exists());
    assert_eq!(
        hooks.deleted,
        vec![("/cache".to_string(), TraversalAction::DryRunDeleted)]
    );
}

#[test]
fn test_abort_stops_crawl() {
    let temp = create_tree();
    let mut hooks = Recorder {
        abort: Some("/keep/c.txt"),
        ..Default::default()
    };
    let report = crawl(&temp, CrawlOptions::default(), &mut hooks);

    assert!(report.aborted);
    assert_eq!(
        hooks.files_hello,
        vec![
            "/.hidden",
            "/a.txt",
            "/b.log",
            "/cache/e.tmp",
            "/cache/nested/f.tmp",
            "/keep/c.txt",
        ]
    );
    let stats = report.statistics.unwrap();
    assert!(stats.find("/keep/d.log").is_none());
    assert!(!hooks.dirs_left.contains(&"/".to_string()));
}

#[test]
fn test_hook_error_aborts_by_default() {
    let temp = create_tree();
    let mut hooks = Recorder {
        fail: Some("/b.log"),
        ..Default::default()
    };
    let err = DirectoryCrawler::new(CrawlOptions::default())
        .crawl(temp.path(), &mut hooks)
        .unwrap_err();

    assert!(matches!(err, CrawlError::Hook { .. }));
    assert!(!hooks.processed.contains(&"/keep/c.txt".to_string()));
}

#[test]
fn test_hook_error_reported_and_continued() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .report_errors_and_continue(true)
        .build()
        .unwrap();
    let mut hooks = Recorder {
        fail: Some("/b.log"),
        ..Default::default()
    };
    let report = crawl(&temp, options, &mut hooks);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::HookError);
    assert_eq!(hooks.errors.len(), 1);
    assert!(hooks.errors[0].ends_with("b.log"));

    let stats = report.statistics.unwrap();
    assert_eq!(
        stats.find("/b.log").map(|e| e.action),
        Some(TraversalAction::Failed)
    );
    assert_eq!(stats.count(ObjectType::File, TraversalAction::Browsed), 6);
}

/// Removes each file just before the crawler does, so every deletion fails.
#[derive(Default)]
struct Vanishing {
    deleted: usize,
    errors: Vec<PathBuf>,
}

impl CrawlHooks for Vanishing {
    fn on_deleting_file(&mut self, file: &FileTraversalMetadata) {
        let _ = fs::remove_file(&file.path);
    }

    fn on_file_deleted(&mut self, _file: &FileTraversalMetadata, _action: TraversalAction) {
        self.deleted += 1;
    }

    fn on_error(&mut self, path: &Path, _error: &CrawlError) {
        self.errors.push(path.to_path_buf());
    }
}

fn create_vanishing_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();
    fs::write(temp.path().join("sub/c.txt"), "c").unwrap();
    temp
}

#[test]
fn test_delete_failure_aborts_by_default() {
    let temp = create_vanishing_tree();
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteContents)
        .build()
        .unwrap();
    let mut hooks = Vanishing::default();
    let err = DirectoryCrawler::new(options)
        .crawl(temp.path(), &mut hooks)
        .unwrap_err();

    assert!(matches!(err, CrawlError::NotFound { .. }));
    assert_eq!(hooks.deleted, 0);
    assert!(hooks.errors.is_empty());
    // The crawl stopped at the first file.
    assert!(temp.path().join("b.txt").exists());
}

#[test]
fn test_delete_failure_reported_and_continued() {
    let temp = create_vanishing_tree();
    let options = CrawlOptions::builder()
        .mode(CrawlMode::DeleteContents)
        .report_errors_and_continue(true)
        .build()
        .unwrap();
    let mut hooks = Vanishing::default();
    let report = DirectoryCrawler::new(options)
        .crawl(temp.path(), &mut hooks)
        .unwrap();

    assert_eq!(hooks.deleted, 0);
    assert_eq!(hooks.errors.len(), 3);
    assert_eq!(report.warnings.len(), 3);
    assert!(report.warnings.iter().all(|w| w.kind == WarningKind::DeleteError));
    assert_eq!(report.bytes_deleted, 0);

    let stats = report.statistics.unwrap();
    assert_eq!(stats.count(ObjectType::File, TraversalAction::Failed), 3);
    for path in ["/a.txt", "/b.txt", "/sub/c.txt"] {
        assert_eq!(stats.find(path).map(|e| e.action), Some(TraversalAction::Failed));
    }
    // A failed child keeps its directory.
    assert_eq!(
        stats.find("/sub").map(|e| e.action),
        Some(TraversalAction::Browsed)
    );
    assert!(temp.path().join("sub").is_dir());
}

#[test]
fn test_skip_files_crawls_directories_only() {
    let temp = create_tree();
    let options = CrawlOptions::builder()
        .optimizations(TraversalOptimizations {
            skip_files: true,
            ..Default::default()
        })
        .build()
        .unwrap();
    let mut hooks = Recorder::default();
    let report = crawl(&temp, options, &mut hooks);

    assert!(hooks.files_hello.is_empty());
    let stats = report.statistics.unwrap();
    assert_eq!(stats.files().count(), 0);
    assert_eq!(stats.directories().count(), 4);
}

#[test]
fn test_process_files_closure() {
    let temp = create_tree();
    let mut total = 0u64;
    let mut hooks = ProcessFiles(|file: &FileTraversalMetadata| -> Result<Directive, CrawlError> {
        total += file.size.unwrap_or(0);
        Ok(Directive::Continue)
    });
    DirectoryCrawler::new(CrawlOptions::default())
        .crawl(temp.path(), &mut hooks)
        .unwrap();

    assert_eq!(total, 17);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_not_followed_by_default() {
    let temp = create_tree();
    std::os::unix::fs::symlink(temp.path().join("keep"), temp.path().join("link")).unwrap();

    let report = DirectoryCrawler::new(CrawlOptions::default())
        .crawl(temp.path(), &mut NoHooks)
        .unwrap();
    let stats = report.statistics.unwrap();
    assert!(stats.find("/link").is_none());
    assert!(stats.find("/link/c.txt").is_none());

    let options = CrawlOptions::builder()
        .optimizations(TraversalOptimizations {
            follow_symlinks: true,
            ..Default::default()
        })
        .build()
        .unwrap();
    let report = DirectoryCrawler::new(options)
        .crawl(temp.path(), &mut NoHooks)
        .unwrap();
    let stats = report.statistics.unwrap();
    // `keep` and `link` resolve to the same directory; it is entered once.
    assert_eq!(stats.files().count(), 7);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycles_to_ancestors_terminate() {
    let temp = create_tree();
    let root = temp.path();
    std::os::unix::fs::symlink(root, root.join("keep/loop")).unwrap();
    std::os::unix::fs::symlink(root.join("cache"), root.join("cache/nested/up")).unwrap();

    let options = CrawlOptions::builder()
        .optimizations(TraversalOptimizations {
            follow_symlinks: true,
            ..Default::default()
        })
        .build()
        .unwrap();
    let report = DirectoryCrawler::new(options)
        .crawl(root, &mut NoHooks)
        .unwrap();
    let stats = report.statistics.as_ref().unwrap();

    assert_eq!(stats.files().count(), 7);
    let mut files: Vec<_> = stats.files().map(|e| e.virtual_path.clone()).collect();
    files.sort();
    files.dedup();
    assert_eq!(files.len(), 7);
    assert!(stats.find("/keep/loop/a.txt").is_none());
    assert!(stats.find("/cache/nested/up/e.tmp").is_none());
    assert!(!report.has_warnings());
}
