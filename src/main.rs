use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use stdproxy::config::{self, Cli, Config, ConfigError};
use stdproxy::{Direction, Socks5Connector, relay};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stdproxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.log_file.as_deref()) {
        eprintln!("stdproxy: {e}");
        return ExitCode::FAILURE;
    }

    let basic_auth = config.credentials.is_some();
    let connector = Socks5Connector::new(config.proxy)
        .with_timeout(config.timeout)
        .with_credentials(config.credentials);

    info!(proxy = %connector.proxy(), "Proxy");
    info!(timeout = ?config.timeout, "Proxy timeout");
    info!(destination = %config.destination, "Destination");
    info!(enabled = basic_auth, "Basic authentication");
    if let Some(path) = &config.creds_file {
        info!(path = %path.display(), "Basic authentication credentials file");
    }

    let conn = match connector.connect(&config.destination).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Error opening proxy connection: {e}");
            eprintln!("stdproxy: error opening proxy connection: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = relay::run(conn, tokio::io::stdin(), local_output()).await;

    for transfer in result.in_completion_order() {
        let dst = &config.destination;
        match transfer.direction {
            Direction::RemoteToLocal => info!(
                destination = %dst,
                bytes = transfer.bytes,
                "Connection closed by {}, {} bytes received",
                transfer.direction.closed_by(),
                transfer.bytes
            ),
            Direction::LocalToRemote => info!(
                destination = %dst,
                bytes = transfer.bytes,
                "Connection closed by {}, {} bytes sent",
                transfer.direction.closed_by(),
                transfer.bytes
            ),
        }
    }

    ExitCode::SUCCESS
}

/// Standard output as an owned writer, so that finishing the remote→local
/// direction closes descriptor 1 and downstream readers see EOF even while
/// stdin stays open.
#[cfg(unix)]
fn local_output() -> tokio::fs::File {
    use std::os::fd::{FromRawFd, OwnedFd};

    // SAFETY: fd 1 is open for the life of the process and nothing else
    // writes to it once the relay starts: logs go to a file or a sink and
    // errors go to stderr.
    let fd = unsafe { OwnedFd::from_raw_fd(1) };
    tokio::fs::File::from_std(std::fs::File::from(fd))
}

#[cfg(not(unix))]
fn local_output() -> tokio::io::Stdout {
    tokio::io::stdout()
}

/// Route all events to the log file, or discard them when logging is off.
/// The sink is chosen once here and never reopened.
fn init_logging(log_file: Option<&Path>) -> Result<(), ConfigError> {
    let writer = match log_file {
        Some(path) => BoxMakeWriter::new(Mutex::new(config::open_log_file(path)?)),
        None => BoxMakeWriter::new(io::sink),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    Ok(())
}
