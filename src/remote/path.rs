use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

use crate::profile::SyncProfile;

pub const SEPARATOR: char = '/';

/// A path on the remote host. Always `/`-separated, whatever the local platform uses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// Trailing separators are dropped, except for the filesystem root itself.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_end_matches(SEPARATOR);

        if trimmed.is_empty() && path.starts_with(SEPARATOR) {
            Self(SEPARATOR.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, relative: &str) -> Self {
        let relative = relative.trim_matches(SEPARATOR);
        if relative.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return Self::new(relative);
        }
        if self.0.ends_with(SEPARATOR) {
            return Self::new(format!("{}{}", self.0, relative));
        }
        Self::new(format!("{}{}{}", self.0, SEPARATOR, relative))
    }

    /// Directory part of the path. The parent of a single relative segment is
    /// the empty path (the session's working directory).
    pub fn parent(&self) -> Self {
        match self.0.rfind(SEPARATOR) {
            Some(0) => Self(SEPARATOR.to_string()),
            Some(idx) => Self(self.0[..idx].to_string()),
            None => Self(String::new()),
        }
    }

    /// Segments of `self` below `root`, in root-to-leaf order.
    ///
    /// Returns `None` when `self` is not `root` or inside it.
    pub fn segments_below<'a>(&'a self, root: &RemotePath) -> Option<Vec<&'a str>> {
        let rest = if root.0.is_empty() {
            self.0.as_str()
        } else {
            let rest = self.0.strip_prefix(root.0.as_str())?;
            if !rest.is_empty() && !rest.starts_with(SEPARATOR) && !root.0.ends_with(SEPARATOR) {
                return None;
            }
            rest
        };

        Some(rest.split(SEPARATOR).filter(|seg| !seg.is_empty()).collect())
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where one local file lands on the remote side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemotePathRecord {
    pub local_path: PathBuf,
    pub remote_path: RemotePath,
    pub remote_parent_dir: RemotePath,
}

#[derive(Debug, Error)]
pub enum PathMapError {
    #[error("{} is not inside the local root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{} is not valid UTF-8 and cannot be named on the remote host", .path.display())]
    NotUnicode { path: PathBuf },
    #[error("{} does not name a file below the local root", .path.display())]
    NotAFile { path: PathBuf },
}

/// Maps a local file to its remote counterpart:
/// `remote_root` + (`local_file` with `local_root` stripped).
pub fn map(local_file: &Path, profile: &SyncProfile) -> Result<RemotePathRecord, PathMapError> {
    let relative = local_file
        .strip_prefix(&profile.local_root)
        .map_err(|_| PathMapError::OutsideRoot {
            path: local_file.to_path_buf(),
            root: profile.local_root.clone(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment.to_str().ok_or_else(|| PathMapError::NotUnicode {
                    path: local_file.to_path_buf(),
                })?;
                segments.push(segment);
            }
            Component::CurDir => {}
            _ => {
                return Err(PathMapError::OutsideRoot {
                    path: local_file.to_path_buf(),
                    root: profile.local_root.clone(),
                })
            }
        }
    }

    if segments.is_empty() {
        return Err(PathMapError::NotAFile {
            path: local_file.to_path_buf(),
        });
    }

    let remote_path = profile.remote_root.join(&segments.join("/"));
    let remote_parent_dir = remote_path.parent();

    Ok(RemotePathRecord {
        local_path: local_file.to_path_buf(),
        remote_path,
        remote_parent_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Mode;

    fn profile(local: &str, remote: &str) -> SyncProfile {
        SyncProfile {
            local_root: PathBuf::from(local),
            remote_root: RemotePath::new(remote),
            directory_mode: Mode::new(0o755).unwrap(),
            file_mode: Mode::new(0o644).unwrap(),
        }
    }

    #[test]
    fn normalizes_trailing_separators() {
        assert_eq!(RemotePath::new("/srv/www/").as_str(), "/srv/www");
        assert_eq!(RemotePath::new("///").as_str(), "/");
        assert_eq!(RemotePath::new("site").as_str(), "site");
    }

    #[test]
    fn joins_and_splits() {
        let root = RemotePath::new("/srv/www");
        let file = root.join("sub/dir/b.txt");

        assert_eq!(file.as_str(), "/srv/www/sub/dir/b.txt");
        assert_eq!(file.parent().as_str(), "/srv/www/sub/dir");
        assert_eq!(RemotePath::new("/").join("a").as_str(), "/a");
        assert_eq!(RemotePath::new("/a").parent().as_str(), "/");
        assert_eq!(RemotePath::new("a").parent().as_str(), "");
    }

    #[test]
    fn segments_below_root() {
        let root = RemotePath::new("/srv/www");

        assert_eq!(
            RemotePath::new("/srv/www/sub/dir").segments_below(&root),
            Some(vec!["sub", "dir"])
        );
        assert_eq!(RemotePath::new("/srv/www").segments_below(&root), Some(vec![]));
        assert_eq!(RemotePath::new("/srv/wwwx/sub").segments_below(&root), None);
        assert_eq!(
            RemotePath::new("/x/y").segments_below(&RemotePath::new("/")),
            Some(vec!["x", "y"])
        );
    }

    #[test]
    fn maps_top_level_file() {
        let record = map(Path::new("/home/me/site/a.txt"), &profile("/home/me/site", "/srv/www")).unwrap();

        assert_eq!(record.remote_path.as_str(), "/srv/www/a.txt");
        assert_eq!(record.remote_parent_dir.as_str(), "/srv/www");
        assert_eq!(record.local_path, PathBuf::from("/home/me/site/a.txt"));
    }

    #[test]
    fn maps_nested_file_with_trailing_slash_root() {
        let record = map(
            Path::new("./site/sub/dir/b.txt"),
            &profile("./site", "/srv/www/"),
        )
        .unwrap();

        assert_eq!(record.remote_path.as_str(), "/srv/www/sub/dir/b.txt");
        assert_eq!(record.remote_parent_dir.as_str(), "/srv/www/sub/dir");
    }

    #[test]
    fn relative_remote_root() {
        let record = map(Path::new("site/a.txt"), &profile("site", "public_html")).unwrap();

        assert_eq!(record.remote_path.as_str(), "public_html/a.txt");
    }

    #[test]
    fn rejects_paths_outside_root() {
        let err = map(Path::new("/etc/passwd"), &profile("/home/me/site", "/srv/www")).unwrap_err();
        assert!(matches!(err, PathMapError::OutsideRoot { .. }));

        let err = map(Path::new("/home/me/site"), &profile("/home/me/site", "/srv/www")).unwrap_err();
        assert!(matches!(err, PathMapError::NotAFile { .. }));
    }
}
