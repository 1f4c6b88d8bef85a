use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ssh2_config::{HostParams, ParseRule};
use tracing::{debug, warn};

use crate::{adapter::ssh::SSHSession, profile::ServerTarget};

/// Per-host settings from the user's `~/.ssh/config`, if there is one.
pub struct SSHConfig {
    config: Option<HostParams>,
}

impl SSHConfig {
    /// Never fails: a missing or unreadable config only means no overrides.
    pub fn new(hostname: &str) -> Self {
        match Self::user_config_path().filter(|path| path.is_file()) {
            Some(path) => Self::from_file(&path, hostname),
            None => {
                debug!("no ssh client config found");
                Self { config: None }
            }
        }
    }

    fn from_file(path: &Path, hostname: &str) -> Self {
        match Self::parse(path) {
            Ok(config) => {
                debug!(path = %path.display(), hostname, "loaded ssh client config");
                Self {
                    config: Some(config.query(hostname)),
                }
            }
            Err(err) => {
                warn!(path = %path.display(), "ignoring ssh client config: {:#}", err);
                Self { config: None }
            }
        }
    }

    fn parse(path: &Path) -> Result<ssh2_config::SshConfig> {
        let file =
            File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        ssh2_config::SshConfig::default()
            .parse(
                &mut reader,
                ParseRule::ALLOW_UNKNOWN_FIELDS | ParseRule::ALLOW_UNSUPPORTED_FIELDS,
            )
            .with_context(|| format!("Could not parse {}", path.display()))
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ssh").join("config"))
    }

    pub fn open(&self, server: &ServerTarget) -> Result<SSHSession> {
        SSHSession::open(server, self.config.as_ref())
    }
}
