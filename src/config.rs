use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::PathBuf,
};

use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

use crate::{
    profile::{Credential, Mode, ServerTarget, SyncProfile},
    remote::RemotePath,
};

pub mod ssh;

pub const DEFAULT_CONFIG_FILE: &str = "./config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    Missing(PathBuf),
    #[error("could not read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("local_path {} is not a directory", .0.display())]
    LocalRoot(PathBuf),
}

pub fn read_config(path: Option<PathBuf>) -> Result<ConfigContext, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_FILE.into());
    let file = File::open(&path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::Missing(path.clone()),
        _ => ConfigError::Read {
            path: path.clone(),
            source,
        },
    })?;

    let mut content = String::new();
    BufReader::new(file)
        .read_to_string(&mut content)
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

    let config = Configuration::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    config.validate()?;

    Ok(ConfigContext {
        config,
        config_file: path,
    })
}

pub struct ConfigContext {
    pub config_file: PathBuf,
    pub config: Configuration,
}

#[derive(Debug, Deserialize)]
pub struct Configuration {
    pub host_url: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    pub local_path: PathBuf,
    pub remote_path: String,
    #[serde(deserialize_with = "octal_mode")]
    pub dir_perm: Mode,
    #[serde(deserialize_with = "octal_mode")]
    pub file_perm: Mode,
}

impl Configuration {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_url.trim().is_empty() {
            return Err(ConfigError::Empty("host_url"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Empty("username"));
        }
        if self.remote_path.trim().is_empty() {
            return Err(ConfigError::Empty("remote_path"));
        }
        if !self.local_path.is_dir() {
            return Err(ConfigError::LocalRoot(self.local_path.clone()));
        }

        Ok(())
    }

    pub fn profile(&self) -> SyncProfile {
        SyncProfile {
            local_root: self.local_path.clone(),
            remote_root: RemotePath::new(self.remote_path.trim()),
            directory_mode: self.dir_perm,
            file_mode: self.file_perm,
        }
    }

    pub fn server_target(&self, credential: Credential) -> ServerTarget {
        ServerTarget::new(
            self.host_url.trim(),
            self.port,
            self.username.trim(),
            credential,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMode {
    Text(String),
    Number(u64),
}

/// Reads `"755"`, `"0755"` and bare `755` alike as octal permission bits.
fn octal_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Mode, D::Error> {
    let digits = match RawMode::deserialize(deserializer)? {
        RawMode::Text(text) => text,
        RawMode::Number(number) => number.to_string(),
    };

    digits.parse().map_err(de::Error::custom)
}
