//! h2-fingerprint server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use h2_fingerprint::{Server, ServerConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "h2-fingerprint",
    version,
    about = "Fingerprint HTTP/2 client preambles and echo the identifier back"
)]
struct Cli {
    /// Address to listen on [default: 0.0.0.0:443]
    #[arg(short = 'b', long = "bind")]
    bind: Option<SocketAddr>,

    /// PEM certificate chain [default: certs/localhost.crt]
    #[arg(long = "cert")]
    cert: Option<PathBuf>,

    /// PEM private key [default: certs/localhost.key]
    #[arg(long = "key")]
    key: Option<PathBuf>,

    /// Per-connection read timeout in seconds [default: 10]
    #[arg(long = "read-timeout", value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind_addr: self.bind.unwrap_or(defaults.bind_addr),
            cert_path: self.cert.unwrap_or(defaults.cert_path),
            key_path: self.key.unwrap_or(defaults.key_path),
            read_timeout: self
                .read_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Cli::parse().into_config();
    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start");
            return ExitCode::FAILURE;
        }
    };

    server.run();
    ExitCode::SUCCESS
}
