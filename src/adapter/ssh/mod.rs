use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ssh2::{DisconnectCode, FileStat, Session, Sftp};
use ssh2_config::HostParams;
use tracing::{debug, info};

use crate::{
    profile::{Mode, ServerTarget},
    progress::ProgressView,
    remote::{RemoteError, RemoteErrorKind, RemoteFs, RemoteOp, RemotePath, RemoteStat},
};

use self::{
    connect::{authenticate, configure_session, resolve_address, try_connection},
    status::{is_generic_failure, translate},
};

mod connect;
mod status;

pub(crate) use self::connect::split_host_port;

/// An authenticated SSH connection with its SFTP channel.
///
/// Dropping it disconnects, whichever way the caller leaves.
pub struct SSHSession {
    session: Session,
    sftp: Sftp,
}

impl SSHSession {
    pub fn open(server: &ServerTarget, params: Option<&HostParams>) -> Result<Self> {
        let host = resolve_address(server, params);

        let stream = ProgressView::with("Connecting to the host...", |mut progress| {
            match try_connection(&host) {
                Ok(stream) => {
                    progress.success(Some(&format!(
                        "👋 Connected to {}",
                        stream
                            .peer_addr()
                            .map(|addr| addr.to_string())
                            .unwrap_or(host.clone())
                    )));
                    Ok(stream)
                }
                Err(err) => {
                    progress.failure(None);
                    Err(err)
                }
            }
        })?;

        let mut session = Session::new().context("Could not create session")?;
        if let Some(params) = params {
            configure_session(&mut session, params);
        }
        session.set_tcp_stream(stream);
        session
            .handshake()
            .with_context(|| format!("SSH handshake with {} failed", host))?;

        authenticate(&session, server)?;
        info!(host = %host, user = server.username(), "authenticated");

        if let Some(banner) = session.banner() {
            println!("----------------------------------");
            println!("{}", banner);
            println!("----------------------------------");
        }

        let sftp = session
            .sftp()
            .context("Could not open the sftp subsystem")?;

        Ok(Self { session, sftp })
    }

    fn remove_recursive(&self, path: &Path) -> Result<(), RemoteError> {
        let remote = remote_name(path);
        let stat = self
            .sftp
            .lstat(path)
            .map_err(|err| translate(RemoteOp::DeleteTree, &remote, err))?;

        if stat.file_type().is_dir() {
            let children = self
                .sftp
                .readdir(path)
                .map_err(|err| translate(RemoteOp::DeleteTree, &remote, err))?;
            for (child, _) in children {
                self.remove_recursive(&child)?;
            }
            self.sftp
                .rmdir(path)
                .map_err(|err| translate(RemoteOp::DeleteTree, &remote, err))?;
        } else {
            self.sftp
                .unlink(path)
                .map_err(|err| translate(RemoteOp::DeleteTree, &remote, err))?;
        }

        debug!(remote = %remote, "removed");
        Ok(())
    }
}

impl Drop for SSHSession {
    fn drop(&mut self) {
        info!("Disconnecting from remote server");
        if let Err(err) =
            self.session
                .disconnect(Some(DisconnectCode::ByApplication), "done", None)
        {
            debug!(%err, "disconnect failed");
        }
    }
}

fn remote_name(path: &Path) -> RemotePath {
    RemotePath::new(path.to_string_lossy().into_owned())
}

fn local_failure(op: RemoteOp, path: &RemotePath, err: io::Error) -> RemoteError {
    RemoteError::new(op, path, RemoteErrorKind::Other).with_source(err)
}

#[async_trait(?Send)]
impl RemoteFs for SSHSession {
    async fn list_entries(&self, dir: &RemotePath) -> Result<Vec<String>, RemoteError> {
        let entries = self
            .sftp
            .readdir(Path::new(dir.as_str()))
            .map_err(|err| translate(RemoteOp::ListEntries, dir, err))?;

        Ok(entries
            .into_iter()
            .filter_map(|(path, _)| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect())
    }

    async fn create_dir(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError> {
        let target = Path::new(path.as_str());

        match self.sftp.mkdir(target, mode.bits() as i32) {
            Ok(()) => Ok(()),
            Err(err)
                if is_generic_failure(&err)
                    && self.sftp.stat(target).is_ok_and(|stat| stat.is_dir()) =>
            {
                Err(RemoteError::new(RemoteOp::CreateDir, path, RemoteErrorKind::AlreadyExists)
                    .with_source(err))
            }
            Err(err) => Err(translate(RemoteOp::CreateDir, path, err)),
        }
    }

    async fn stat_file(&self, path: &RemotePath) -> Result<RemoteStat, RemoteError> {
        let stat = self
            .sftp
            .stat(Path::new(path.as_str()))
            .map_err(|err| translate(RemoteOp::Stat, path, err))?;

        if stat.is_dir() {
            return Err(local_failure(
                RemoteOp::Stat,
                path,
                io::Error::new(io::ErrorKind::Other, "remote path is a directory"),
            ));
        }

        Ok(RemoteStat {
            modified: stat.mtime,
        })
    }

    async fn upload(&self, local: &Path, remote: &RemotePath) -> Result<(), RemoteError> {
        let mut source =
            File::open(local).map_err(|err| local_failure(RemoteOp::Upload, remote, err))?;
        let mut dest = self
            .sftp
            .create(Path::new(remote.as_str()))
            .map_err(|err| translate(RemoteOp::Upload, remote, err))?;

        let sent = io::copy(&mut source, &mut dest)
            .map_err(|err| local_failure(RemoteOp::Upload, remote, err))?;
        debug!(remote = %remote, bytes = sent, "sent");

        Ok(())
    }

    async fn set_permissions(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError> {
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: Some(mode.bits()),
            atime: None,
            mtime: None,
        };

        self.sftp
            .setstat(Path::new(path.as_str()), stat)
            .map_err(|err| translate(RemoteOp::SetPermissions, path, err))
    }

    async fn delete_tree(&self, path: &RemotePath) -> Result<(), RemoteError> {
        self.remove_recursive(&PathBuf::from(path.as_str()))
    }
}
