use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use ssh2::{MethodType, Session};
use ssh2_config::HostParams;
use tracing::{debug, warn};

use crate::profile::ServerTarget;

pub(super) const DEFAULT_PORT: u16 = 22;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// `host:port` to dial. An explicit port in the host string wins, then the
/// configured port, then the ssh config entry, then 22. A `HostName` from the
/// ssh config only replaces the host part.
pub(super) fn resolve_address(server: &ServerTarget, params: Option<&HostParams>) -> String {
    let (alias, explicit_port) = split_host_port(server.host());
    let host = params
        .and_then(|params| params.host_name.as_deref())
        .unwrap_or(alias);

    if let (Some(explicit), Some(configured)) = (explicit_port, server.port()) {
        warn!(
            explicit,
            configured, "port in host_url overrides the configured port"
        );
    }

    let port = explicit_port
        .or(server.port())
        .or_else(|| params.and_then(|params| params.port))
        .unwrap_or(DEFAULT_PORT);
    format!("{}:{}", host, port)
}

/// Splits `host:port`. Anything without exactly one `:` followed by a valid
/// port is returned whole.
pub(crate) fn split_host_port(host: &str) -> (&str, Option<u16>) {
    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        _ => (host, None),
    }
}

pub(super) fn try_connection(host: &str) -> Result<TcpStream> {
    let mut last_error = None;

    for addr in host
        .to_socket_addrs()
        .with_context(|| format!("Could not resolve {}", host))?
    {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(%addr, %err, "connection attempt failed");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) => Err(err).with_context(|| format!("Could not connect to {}", host)),
        None => bail!("{} did not resolve to any address", host),
    }
}

pub(super) fn authenticate(session: &Session, server: &ServerTarget) -> Result<()> {
    session
        .userauth_password(server.username(), server.credential().expose())
        .with_context(|| {
            format!(
                "Authentication failed for {}@{}",
                server.username(),
                server.host()
            )
        })?;

    if !session.authenticated() {
        return Err(anyhow!(
            "Authentication failed for {}@{}",
            server.username(),
            server.host()
        ));
    }

    Ok(())
}

// Used mostly the same logic to https://github.com/veeso/ssh2-config/blob/main/examples/client.rs
pub(super) fn configure_session(session: &mut Session, params: &HostParams) {
    if let Some(compress) = params.compression {
        session.set_compress(compress);
    }
    if params.tcp_keep_alive.unwrap_or(false) {
        if let Some(interval) = params.server_alive_interval {
            session.set_keepalive(true, interval.as_secs() as u32);
        }
    }

    macro_rules! report_if_fail {
        ($op: expr, $err: expr) => {{
            if let Err(err) = $op {
                warn!("{}: {}", $err, err);
            }
        }};
    }

    // algos
    if let Some(algos) = params.kex_algorithms.as_deref() {
        report_if_fail!(
            session.method_pref(MethodType::Kex, algos.join(",").as_str()),
            "Could not set KEX algorithms"
        );
    }
    if let Some(algos) = params.host_key_algorithms.as_deref() {
        report_if_fail!(
            session.method_pref(MethodType::HostKey, algos.join(",").as_str()),
            "Could not set host key algorithms"
        );
    }
    if let Some(algos) = params.ciphers.as_deref() {
        report_if_fail!(
            session.method_pref(MethodType::CryptCs, algos.join(",").as_str()),
            "Could not set crypt algorithms (client-server)"
        );
        report_if_fail!(
            session.method_pref(MethodType::CryptSc, algos.join(",").as_str()),
            "Could not set crypt algorithms (server-client)"
        );
    }
    if let Some(algos) = params.mac.as_deref() {
        report_if_fail!(
            session.method_pref(MethodType::MacCs, algos.join(",").as_str()),
            "Could not set MAC algorithms (client-server)"
        );
        report_if_fail!(
            session.method_pref(MethodType::MacSc, algos.join(",").as_str()),
            "Could not set MAC algorithms (server-client)"
        )
    }
}
