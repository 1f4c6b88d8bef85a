use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::{
    adapter::fs::LocalTree,
    config::Configuration,
    profile::{ServerTarget, SyncProfile},
    progress::ProgressView,
    remote::{
        directory::{ensure_dir, ensure_root},
        path::{map, PathMapError, RemotePathRecord},
        transfer::{sync_file, FileOutcome, TransferError},
        RemoteError, RemoteFs, RemotePath,
    },
};

/// Tally of one sync run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Created => self.created += 1,
            FileOutcome::Updated => self.updated += 1,
            FileOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not create the remote root")]
    Root(#[source] RemoteError),
    #[error("could not walk the local tree")]
    Walk(#[source] walkdir::Error),
    #[error(transparent)]
    Map(#[from] PathMapError),
    #[error("could not create remote directory {dir} for {}", .local.display())]
    Directory {
        dir: RemotePath,
        local: PathBuf,
        #[source]
        source: RemoteError,
    },
    #[error("could not sync {}", .local.display())]
    File {
        local: PathBuf,
        #[source]
        source: TransferError,
    },
}

/// A run that stopped at its first fatal error, with what it got done before.
#[derive(Debug, Error)]
#[error("sync aborted after {report}")]
pub struct SyncFailure {
    pub report: SyncReport,
    #[source]
    pub error: SyncError,
}

/// One full sync pass: makes sure the remote root exists, then for every
/// local file maps it, ensures its remote parent directory and pushes it if
/// needed. Files are handled one at a time and the first error ends the run.
///
/// `on_file` is called after each file with its outcome and the running tally.
pub async fn run<R, I, F>(
    remote: &R,
    profile: &SyncProfile,
    files: I,
    mut on_file: F,
) -> Result<SyncReport, SyncFailure>
where
    R: RemoteFs + ?Sized,
    I: IntoIterator<Item = Result<PathBuf, walkdir::Error>>,
    F: FnMut(&RemotePathRecord, FileOutcome, &SyncReport),
{
    let mut report = SyncReport::default();

    match run_files(remote, profile, files, &mut report, &mut on_file).await {
        Ok(()) => Ok(report),
        Err(error) => Err(SyncFailure { report, error }),
    }
}

async fn run_files<R, I, F>(
    remote: &R,
    profile: &SyncProfile,
    files: I,
    report: &mut SyncReport,
    on_file: &mut F,
) -> Result<(), SyncError>
where
    R: RemoteFs + ?Sized,
    I: IntoIterator<Item = Result<PathBuf, walkdir::Error>>,
    F: FnMut(&RemotePathRecord, FileOutcome, &SyncReport),
{
    ensure_root(remote, profile).await.map_err(SyncError::Root)?;

    for file in files {
        let local_file = file.map_err(SyncError::Walk)?;
        let record = map(&local_file, profile)?;

        ensure_dir(remote, &record.remote_parent_dir, profile)
            .await
            .map_err(|source| SyncError::Directory {
                dir: record.remote_parent_dir.clone(),
                local: record.local_path.clone(),
                source,
            })?;

        let outcome = sync_file(remote, &record.local_path, &record.remote_path, profile)
            .await
            .map_err(|source| SyncError::File {
                local: record.local_path.clone(),
                source,
            })?;

        report.record(outcome);
        on_file(&record, outcome, report);
    }

    Ok(())
}

/// Runs [`run`] over the local tree with a progress spinner.
pub async fn sync_tree<R: RemoteFs + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
) -> Result<SyncReport, SyncFailure> {
    let mut progress = ProgressView::new("Synchronizing files");
    progress.start();

    let tree = LocalTree::new(&profile.local_root);
    let result = run(remote, profile, tree.files(), |record, outcome, report| {
        progress.report_intermediate(report, Some(&progress_label(record, outcome)));
    })
    .await;

    match &result {
        Ok(report) => progress.success(Some(&report.to_string())),
        Err(failure) => progress.failure(Some(&failure.report.to_string())),
    }

    result
}

/// Spinner text for the file just handled.
fn progress_label(record: &RemotePathRecord, outcome: FileOutcome) -> String {
    format!("{} {}", outcome, record.remote_path)
}

/// `upload` command: one session, one sync run.
pub async fn upload(config: &Configuration, server: &ServerTarget) -> Result<SyncReport> {
    let profile = config.profile();
    info!(
        local = %profile.local_root.display(),
        remote = %profile.remote_root,
        "starting upload"
    );

    let session = super::connect(server)?;
    let report = sync_tree(&session, &profile)
        .await
        .with_context(|| format!("Upload to {} failed", profile.remote_root))?;
    drop(session);

    info!(files = report.processed(), "upload finished");
    Ok(report)
}
