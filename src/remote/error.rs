use std::{error::Error as StdError, fmt};

use thiserror::Error;

use super::path::RemotePath;

/// What went wrong, as far as the sync logic cares.
///
/// Transport adapters translate their protocol status codes into one of these
/// once; nothing above the adapter looks at raw codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RemoteErrorKind {
    #[error("no such file or directory")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("remote operation failed")]
    Other,
}

/// Remote operation that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    ListEntries,
    CreateDir,
    Stat,
    Upload,
    SetPermissions,
    DeleteTree,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RemoteOp::ListEntries => "list",
            RemoteOp::CreateDir => "mkdir",
            RemoteOp::Stat => "stat",
            RemoteOp::Upload => "upload",
            RemoteOp::SetPermissions => "chmod",
            RemoteOp::DeleteTree => "delete",
        })
    }
}

#[derive(Debug, Error)]
#[error("{op} `{path}`: {kind}")]
pub struct RemoteError {
    pub op: RemoteOp,
    pub path: RemotePath,
    pub kind: RemoteErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl RemoteError {
    pub fn new(op: RemoteOp, path: &RemotePath, kind: RemoteErrorKind) -> Self {
        Self {
            op,
            path: path.clone(),
            kind,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == RemoteErrorKind::AlreadyExists
    }
}
