//! Filesystem removal used by the crawler.

use std::fs;
use std::io;
use std::path::Path;

/// Remove a single file, permanently or to the trash.
pub(crate) fn remove_file(path: &Path, use_trash: bool) -> io::Result<()> {
    if use_trash {
        to_trash(path)
    } else {
        fs::remove_file(path)
    }
}

/// Remove a directory. A non-recursive removal fails unless the directory is empty.
pub(crate) fn remove_directory(path: &Path, recursive: bool, use_trash: bool) -> io::Result<()> {
    if use_trash {
        if !recursive && fs::read_dir(path)?.next().is_some() {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                "directory is not empty",
            ));
        }
        to_trash(path)
    } else if recursive {
        fs::remove_dir_all(path)
    } else {
        fs::remove_dir(path)
    }
}

fn to_trash(path: &Path) -> io::Result<()> {
    trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
}
