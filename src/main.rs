mod adapter;
mod config;
mod profile;
mod progress;
mod remote;
mod services;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{read_config, DEFAULT_CONFIG_FILE},
    services::{maintenance, sync},
    util::prompt_credential,
};

/// Mirrors a local directory onto a remote host over SFTP.
#[derive(Parser, Debug)]
#[command(name = "upmirror", version, about)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Uploads new and changed files of the local directory.
    Upload,
    /// Deletes all content of the remote directory.
    Clean,
    /// Deletes the remote directory and all its content.
    Remove,
    /// Cleans the remote directory, then uploads everything again.
    Reupload,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("upmirror={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("Loading config...");
    let ctx = read_config(Some(cli.config))?;
    let config = &ctx.config;
    info!(file = %ctx.config_file.display(), host = %config.host_url, "config loaded");

    let credential = prompt_credential(&config.username).context("Could not read password")?;
    let server = config.server_target(credential);

    match cli.command {
        Command::Upload => {
            let report = sync::upload(config, &server).await?;
            println!("File transfer complete: {}", report);
        }
        Command::Clean => {
            let removed = maintenance::clean(config, &server).await?;
            println!("Removed {} entries from {}", removed, config.remote_path);
        }
        Command::Remove => {
            maintenance::remove(config, &server).await?;
            println!("Removed {}", config.remote_path);
        }
        Command::Reupload => {
            let report = maintenance::reupload(config, &server).await?;
            println!("File transfer complete: {}", report);
        }
    }

    Ok(())
}
