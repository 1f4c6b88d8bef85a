use std::{fmt, path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::remote::path::RemotePath;

/// Unix permission bits, written and parsed in octal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode(u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeParseError {
    #[error("permission mode is empty")]
    Empty,
    #[error("`{0}` is not an octal permission mode")]
    NotOctal(String),
    #[error("permission mode {0:o} exceeds 7777")]
    OutOfRange(u32),
}

impl Mode {
    pub const MAX: u32 = 0o7777;

    pub fn new(bits: u32) -> Result<Self, ModeParseError> {
        if bits > Self::MAX {
            return Err(ModeParseError::OutOfRange(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0o")
            .or_else(|| digits.strip_prefix("0O"))
            .unwrap_or(digits);

        if digits.is_empty() {
            return Err(ModeParseError::Empty);
        }
        if !digits.bytes().all(|byte| matches!(byte, b'0'..=b'7')) {
            return Err(ModeParseError::NotOctal(s.to_string()));
        }

        let bits =
            u32::from_str_radix(digits, 8).map_err(|_| ModeParseError::NotOctal(s.to_string()))?;

        Self::new(bits)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Password used to authenticate against the remote host.
/// Never printed: there is no `Display`, and `Debug` shows a placeholder.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The remote endpoint a run talks to.
#[derive(Debug, Clone)]
pub struct ServerTarget {
    host: String,
    port: Option<u16>,
    username: String,
    credential: Credential,
}

impl ServerTarget {
    pub fn new(
        host: impl Into<String>,
        port: Option<u16>,
        username: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            credential,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Mapping rules and permission policy for one sync run.
#[derive(Debug, Clone)]
pub struct SyncProfile {
    pub local_root: PathBuf,
    pub remote_root: RemotePath,
    pub directory_mode: Mode,
    pub file_mode: Mode,
}
