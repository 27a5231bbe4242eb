//! wrend - Wren IRC Daemon
//!
//! A small IRC server implementing an RFC 1459/2812 subset over TCP,
//! with an optional mutually-authenticated TLS listener.

mod config;
mod error;
mod handlers;
mod network;
mod state;
mod util;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_PORT, DEFAULT_TLS_PORT};
use crate::handlers::Registry;
use crate::network::Gateway;
use crate::state::Directory;

/// Wren IRC daemon.
#[derive(Debug, Parser)]
#[command(name = "wrend", version, about)]
struct Cli {
    /// Port to listen on (default 6667, or 6697 with --ssl).
    #[arg(long)]
    port: Option<u16>,

    /// Serve TLS with mutual certificate verification. Requires a [tls]
    /// section in the config file.
    #[arg(long)]
    ssl: bool,

    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load config");
            e
        })?,
        None => Config::default(),
    };

    // --ssl is only valid with configured certificate material.
    let tls_config = if cli.ssl {
        match &config.tls {
            Some(tls) => Some(tls.clone()),
            None => {
                eprintln!("wrend: --ssl requires a [tls] section (cert_path, key_path, ca_path)");
                eprintln!("usage: wrend [--port <n>] [--ssl] [--config <file>]");
                std::process::exit(2);
            }
        }
    } else {
        None
    };

    let port = cli
        .port
        .or(config.listen.port)
        .unwrap_or(if cli.ssl { DEFAULT_TLS_PORT } else { DEFAULT_PORT });
    let addr = SocketAddr::new(config.listen.address, port);

    info!(
        server = %config.server.name,
        network = %config.server.network,
        %addr,
        ssl = cli.ssl,
        "Starting wrend"
    );

    let directory = Arc::new(Directory::new(&config));
    let registry = Arc::new(Registry::new());

    let gateway = Gateway::bind(
        addr,
        tls_config.as_ref(),
        config.liveness.clone(),
        directory,
        registry,
    )
    .await?;

    gateway.run().await
}
