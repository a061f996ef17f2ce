//! Client hooks invoked by the crawler.
//!
//! Hooks steer the crawl by returning a [`Directive`] rather than by
//! unwinding. Every method has a default so implementors only override
//! the events they care about.

use std::path::Path;

use horseshoe_core::{
    CrawlError, Directive, DirectoryTraversalMetadata, FileTraversalMetadata, TraversalAction,
};

/// Callbacks raised during a crawl.
#[allow(unused_variables)]
pub trait CrawlHooks {
    /// A directory passed its filter and is about to be entered.
    fn on_directory_hello(
        &mut self,
        dir: &DirectoryTraversalMetadata,
    ) -> Result<Directive, CrawlError> {
        Ok(Directive::Continue)
    }

    /// All children of a directory have been processed.
    fn on_directory_goodbye(&mut self, dir: &DirectoryTraversalMetadata) -> Result<(), CrawlError> {
        Ok(())
    }

    /// A directory was rejected by its filter or skipped by a hook.
    fn on_directory_skipped(&mut self, dir: &DirectoryTraversalMetadata) {}

    /// A directory is about to be deleted.
    fn on_deleting_directory(&mut self, dir: &DirectoryTraversalMetadata) {}

    /// A directory was deleted (`Deleted` or `DryRunDeleted`).
    fn on_directory_deleted(&mut self, dir: &DirectoryTraversalMetadata, action: TraversalAction) {}

    /// A file passed its filter.
    fn on_file_hello(&mut self, file: &FileTraversalMetadata) -> Result<Directive, CrawlError> {
        Ok(Directive::Continue)
    }

    /// A file is processed in browse mode.
    fn on_process_file(&mut self, file: &FileTraversalMetadata) -> Result<Directive, CrawlError> {
        Ok(Directive::Continue)
    }

    /// A file was rejected by its filter or skipped by a hook.
    fn on_file_skipped(&mut self, file: &FileTraversalMetadata) {}

    /// A file is about to be deleted.
    fn on_deleting_file(&mut self, file: &FileTraversalMetadata) {}

    /// A file was deleted (`Deleted` or `DryRunDeleted`).
    fn on_file_deleted(&mut self, file: &FileTraversalMetadata, action: TraversalAction) {}

    /// An error was reported and the crawl is continuing.
    fn on_error(&mut self, path: &Path, error: &CrawlError) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl CrawlHooks for NoHooks {}

/// Adapts a closure into a [`CrawlHooks::on_process_file`] hook.
pub struct ProcessFiles<F>(pub F);

impl<F> CrawlHooks for ProcessFiles<F>
where
    F: FnMut(&FileTraversalMetadata) -> Result<Directive, CrawlError>,
{
    fn on_process_file(&mut self, file: &FileTraversalMetadata) -> Result<Directive, CrawlError> {
        (self.0)(file)
    }
}
