use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::Configuration,
    profile::ServerTarget,
    progress::ProgressView,
    remote::maintenance,
};

use super::sync::{upload, SyncReport};

/// `clean` command: empties the remote root. Irreversible.
pub async fn clean(config: &Configuration, server: &ServerTarget) -> Result<usize> {
    let profile = config.profile();
    let session = super::connect(server)?;

    let mut progress = ProgressView::new(format!("Cleaning {}", profile.remote_root));
    progress.start();
    let removed = maintenance::clean(&session, &profile).await;
    finish(&mut progress, &removed);

    let removed =
        removed.with_context(|| format!("Could not clean {}", profile.remote_root))?;
    info!(remote = %profile.remote_root, removed, "cleaned");
    Ok(removed)
}

/// `remove` command: empties the remote root and deletes it. Irreversible.
pub async fn remove(config: &Configuration, server: &ServerTarget) -> Result<usize> {
    let profile = config.profile();
    let session = super::connect(server)?;

    let mut progress = ProgressView::new(format!("Removing {}", profile.remote_root));
    progress.start();
    let removed = maintenance::remove(&session, &profile).await;
    finish(&mut progress, &removed);

    let removed =
        removed.with_context(|| format!("Could not remove {}", profile.remote_root))?;
    info!(remote = %profile.remote_root, removed, "removed");
    Ok(removed)
}

/// `reupload` command: [`clean`] then [`upload`], each over its own session.
pub async fn reupload(config: &Configuration, server: &ServerTarget) -> Result<SyncReport> {
    clean(config, server).await?;
    upload(config, server).await
}

fn finish<E>(progress: &mut ProgressView, result: &Result<usize, E>) {
    match result {
        Ok(removed) => progress.success(Some(&format!("{} entries removed", removed))),
        Err(_) => progress.failure(None),
    }
}
