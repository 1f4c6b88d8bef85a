use tracing::{info, warn};

use crate::profile::SyncProfile;

use super::{RemoteError, RemoteFs};

/// Deletes everything inside `remote_root`, keeping the directory itself.
///
/// Returns how many top-level entries were removed. A missing root has
/// nothing to clean and yields 0.
pub async fn clean<R: RemoteFs + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
) -> Result<usize, RemoteError> {
    let root = &profile.remote_root;
    let entries = match remote.list_entries(root).await {
        Ok(entries) => entries,
        Err(err) if err.is_not_found() => {
            warn!(remote = %root, "remote root does not exist, nothing to clean");
            return Ok(0);
        }
        Err(err) => return Err(err),
    };

    for name in &entries {
        let target = root.join(name);
        remote.delete_tree(&target).await?;
        info!(remote = %target, "deleted");
    }

    Ok(entries.len())
}

/// [`clean`], then deletes `remote_root` itself.
pub async fn remove<R: RemoteFs + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
) -> Result<usize, RemoteError> {
    let removed = clean(remote, profile).await?;

    match remote.delete_tree(&profile.remote_root).await {
        Ok(()) => {
            info!(remote = %profile.remote_root, "deleted remote root");
            Ok(removed)
        }
        Err(err) if err.is_not_found() => Ok(removed),
        Err(err) => Err(err),
    }
}
