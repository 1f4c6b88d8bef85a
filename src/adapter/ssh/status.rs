//! SFTP status codes, mapped onto [`RemoteErrorKind`].

use ssh2::ErrorCode;

use crate::remote::{RemoteError, RemoteErrorKind, RemoteOp, RemotePath};

pub(super) const SSH_FX_NO_SUCH_FILE: i32 = 2;
pub(super) const SSH_FX_FAILURE: i32 = 4;
pub(super) const SSH_FX_NO_SUCH_PATH: i32 = 10;
pub(super) const SSH_FX_FILE_ALREADY_EXISTS: i32 = 11;

pub(super) fn kind_of(err: &ssh2::Error) -> RemoteErrorKind {
    match err.code() {
        ErrorCode::SFTP(SSH_FX_NO_SUCH_FILE | SSH_FX_NO_SUCH_PATH) => RemoteErrorKind::NotFound,
        ErrorCode::SFTP(SSH_FX_FILE_ALREADY_EXISTS) => RemoteErrorKind::AlreadyExists,
        _ => RemoteErrorKind::Other,
    }
}

/// Protocol v3 servers answer a mkdir on an existing path with a bare failure.
pub(super) fn is_generic_failure(err: &ssh2::Error) -> bool {
    matches!(err.code(), ErrorCode::SFTP(SSH_FX_FAILURE))
}

pub(super) fn translate(op: RemoteOp, path: &RemotePath, err: ssh2::Error) -> RemoteError {
    RemoteError::new(op, path, kind_of(&err)).with_source(err)
}
