use std::path::Path;

use async_trait::async_trait;

use crate::profile::Mode;

pub mod directory;
pub mod error;
pub mod maintenance;
#[cfg(test)]
pub mod memory;
pub mod path;
pub mod transfer;

pub use error::{RemoteError, RemoteErrorKind, RemoteOp};
pub use path::RemotePath;

/// Remote metadata the sync logic needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteStat {
    /// Seconds since the Unix epoch. `None` when the server did not report it.
    pub modified: Option<u64>,
}

/// File-transfer operations the sync core issues against the remote host.
///
/// Every call goes over one session, one at a time, so implementations are
/// not required to be `Send`.
#[async_trait(?Send)]
pub trait RemoteFs {
    async fn list_entries(&self, dir: &RemotePath) -> Result<Vec<String>, RemoteError>;

    async fn create_dir(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError>;

    async fn stat_file(&self, path: &RemotePath) -> Result<RemoteStat, RemoteError>;

    async fn upload(&self, local: &Path, remote: &RemotePath) -> Result<(), RemoteError>;

    async fn set_permissions(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError>;

    /// Deletes `path` and, if it is a directory, everything below it.
    async fn delete_tree(&self, path: &RemotePath) -> Result<(), RemoteError>;
}
