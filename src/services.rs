use anyhow::Result;

use crate::{
    adapter::ssh::{split_host_port, SSHSession},
    config::ssh::SSHConfig,
    profile::ServerTarget,
};

pub mod maintenance;
pub mod sync;

/// Opens one authenticated session; it is closed when the value is dropped.
pub fn connect(server: &ServerTarget) -> Result<SSHSession> {
    println!("Connecting to remote server");
    let (alias, _) = split_host_port(server.host());
    SSHConfig::new(alias).open(server)
}
