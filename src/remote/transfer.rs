use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{adapter::fs::modified_secs, profile::SyncProfile};

use super::{RemoteError, RemoteFs, RemotePath};

/// What happened to one file during a sync run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Skipped,
    Updated,
    Created,
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileOutcome::Skipped => "skipped",
            FileOutcome::Updated => "updated",
            FileOutcome::Created => "created",
        })
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not read modification time of {}", .path.display())]
    LocalStat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Pushes `local_file` to `remote_file` when the remote copy is missing or older.
///
/// Timestamps are compared in whole seconds and only a strictly newer local
/// file is re-sent. `profile.file_mode` is applied only when the remote file
/// is created; updates leave its permissions alone.
pub async fn sync_file<R: RemoteFs + ?Sized>(
    remote: &R,
    local_file: &Path,
    remote_file: &RemotePath,
    profile: &SyncProfile,
) -> Result<FileOutcome, TransferError> {
    match remote.stat_file(remote_file).await {
        Ok(stat) => {
            let local_modified =
                modified_secs(local_file).map_err(|source| TransferError::LocalStat {
                    path: local_file.to_path_buf(),
                    source,
                })?;
            let remote_modified = stat.modified.unwrap_or(0);

            if local_modified > remote_modified {
                remote.upload(local_file, remote_file).await?;
                info!(remote = %remote_file, local_modified, remote_modified, "updated file");
                Ok(FileOutcome::Updated)
            } else {
                debug!(remote = %remote_file, "up to date");
                Ok(FileOutcome::Skipped)
            }
        }
        Err(err) if err.is_not_found() => {
            remote.upload(local_file, remote_file).await?;
            remote
                .set_permissions(remote_file, profile.file_mode)
                .await?;
            info!(remote = %remote_file, mode = %profile.file_mode, "created file");
            Ok(FileOutcome::Created)
        }
        Err(err) => Err(err.into()),
    }
}
