use std::io;

use crate::profile::Credential;

/// Asks for the SSH/SFTP password of `username` without echoing it.
pub fn prompt_credential(username: &str) -> io::Result<Credential> {
    rpassword::prompt_password(format!("[{}] SSH/SFTP password: ", username)).map(Credential::new)
}
