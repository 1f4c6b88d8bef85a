use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use tracing::debug;
use walkdir::WalkDir;

/// Local directory tree to be mirrored.
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Walks the tree lazily, parents before children, siblings by name.
    ///
    /// Symlinks are followed, so a link to a file shows up as a file.
    pub fn traverse_dir(&self) -> impl Iterator<Item = Result<Entry, walkdir::Error>> {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                entry.map(|entry| {
                    let file_type = entry.file_type();
                    let kind = if file_type.is_file() {
                        EntryType::File
                    } else if file_type.is_dir() {
                        EntryType::Dir
                    } else {
                        EntryType::Other
                    };

                    Entry {
                        kind,
                        local_source: entry.into_path(),
                    }
                })
            })
    }

    /// Only the regular files of [`LocalTree::traverse_dir`].
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
        self.traverse_dir().filter_map(|entry| match entry {
            Ok(entry) if entry.kind == EntryType::File => Some(Ok(entry.local_source)),
            Ok(entry) if entry.kind == EntryType::Other => {
                debug!(%entry, "skipping special file");
                None
            }
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub kind: EntryType,
    pub local_source: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    File,
    Dir,
    Other,
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}", self.kind, self.local_source.display())
    }
}

/// Modification time of a local file in whole seconds since the Unix epoch.
///
/// Times before the epoch read as 0.
pub fn modified_secs(path: &Path) -> io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;

    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs())
        .unwrap_or(0))
}
