use tracing::{debug, info};

use crate::profile::{Mode, SyncProfile};

use super::{RemoteError, RemoteFs, RemotePath};

/// Makes sure `remote_dir` exists on the remote side, creating missing
/// ancestors between the sync root and `remote_dir` root-to-leaf.
///
/// The directory is probed by listing it. Only a not-found probe leads to
/// creation; any other probe failure is returned untouched. Every mkdir that
/// fails with "already exists" counts as done, since an earlier run or another
/// writer may have created the directory in the meantime.
pub async fn ensure_dir<R: RemoteFs + ?Sized>(
    remote: &R,
    remote_dir: &RemotePath,
    profile: &SyncProfile,
) -> Result<(), RemoteError> {
    match remote.list_entries(remote_dir).await {
        Ok(_) => {
            debug!(remote = %remote_dir, "directory exists");
            return Ok(());
        }
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }

    let mode = profile.directory_mode;

    // A directory outside the sync root cannot come out of the path mapping,
    // but if it ever does, build its chain from the path's own start.
    let (base, segments) = match remote_dir.segments_below(&profile.remote_root) {
        Some(segments) => (profile.remote_root.clone(), segments),
        None => (
            outer_base(remote_dir),
            remote_dir.segments_below(&outer_base(remote_dir)).unwrap_or_default(),
        ),
    };

    if segments.len() <= 1 {
        return create_idempotent(remote, remote_dir, mode).await;
    }

    let mut current = base;
    for segment in segments {
        current = current.join(segment);
        create_idempotent(remote, &current, mode).await?;
    }

    Ok(())
}

/// Creates the sync root itself. An existing root is fine.
pub async fn ensure_root<R: RemoteFs + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
) -> Result<(), RemoteError> {
    create_idempotent(remote, &profile.remote_root, profile.directory_mode).await
}

async fn create_idempotent<R: RemoteFs + ?Sized>(
    remote: &R,
    path: &RemotePath,
    mode: Mode,
) -> Result<(), RemoteError> {
    match remote.create_dir(path, mode).await {
        Ok(()) => {
            info!(remote = %path, %mode, "created directory");
            Ok(())
        }
        Err(err) if err.is_already_exists() => {
            debug!(remote = %path, "directory already present");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn outer_base(path: &RemotePath) -> RemotePath {
    if path.as_str().starts_with('/') {
        RemotePath::new("/")
    } else {
        RemotePath::new("")
    }
}
