//! Local traversal of a staged directory tree.
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::UtilResult;

/// A file discovered beneath the traversal root.
#[derive(Clone, Debug, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative: PathBuf,
}

/// Pseudo `Iterator` over every regular file beneath a root directory.
///
/// Directories are read lazily, one at a time, with their entries sorted
/// by name so uploads happen in a stable order. Symbolic links to
/// directories are not followed.
pub struct FileWalker {
    root: PathBuf,
    pending: VecDeque<PathBuf>,
    buffer: VecDeque<PathBuf>,
}

impl FileWalker {
    /// Construct a new `FileWalker` rooted at the provided directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut pending = VecDeque::new();
        pending.push_back(root.clone());

        Self {
            root,
            pending,
            buffer: VecDeque::new(),
        }
    }

    /// Attempts to fetch the next `FileEntry` beneath the root.
    pub fn next(&mut self) -> UtilResult<Option<FileEntry>> {
        loop {
            if let Some(path) = self.buffer.pop_front() {
                let relative = path.strip_prefix(&self.root)?.to_path_buf();
                return Ok(Some(FileEntry { path, relative }));
            }

            let dir = match self.pending.pop_front() {
                Some(dir) => dir,
                None => return Ok(None),
            };

            let mut children = fs::read_dir(&dir)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()?;

            children.sort();

            for child in children {
                let file_type = fs::symlink_metadata(&child)?.file_type();

                if file_type.is_dir() {
                    self.pending.push_back(child);
                } else if file_type.is_file() || child.is_file() {
                    self.buffer.push_back(child);
                }
            }
        }
    }
}
