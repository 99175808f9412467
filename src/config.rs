//! Command line and environment configuration.
//!
//! Everything here runs before the first network call: a [`Config`] only
//! exists once the destination, timeout and credentials are all valid.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use thiserror::Error;

use crate::auth::credentials::Credentials;

/// Environment variable holding `user:password` for the proxy.
pub const AUTH_ENV_VAR: &str = "PROXY_CREDS";

/// Errors raised while building the configuration. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("proxy credentials not found")]
    CredentialsNotFound,

    #[error("credential format is incorrect, must be '<user>:<password>'")]
    MalformedCredentials,

    #[error("username and password must not be empty")]
    EmptyCredentialPart,

    #[error("username and password must be at most 255 bytes")]
    CredentialTooLong,

    #[error("error reading proxy credentials file '{path}': {source}")]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid duration '{0}', expected e.g. 500ms, 1.5s, 1m30s")]
    InvalidDuration(String),

    #[error("error creating log file '{path}': {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Relay stdin/stdout to a destination through a SOCKS5 proxy.
#[derive(Parser, Debug)]
#[command(name = "stdproxy", version, about, long_about = None)]
pub struct Cli {
    /// SOCKS5 proxy address, host:port
    pub proxy: String,

    /// Destination host
    pub dest_host: String,

    /// Destination port
    pub dest_port: u16,

    /// Proxy connection timeout (e.g. 500ms, 1.5s, 1m30s; 0 disables it)
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Use username/password authentication, read from the PROXY_CREDS environment variable
    #[arg(long)]
    pub basic_auth: bool,

    /// File holding the proxy credentials as user:password (implies --basic-auth)
    #[arg(long)]
    pub creds_file: Option<PathBuf>,

    /// Enable logging
    #[arg(long)]
    pub log: bool,

    /// Log file [default: /tmp/stdproxy_<unix time>.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Validated settings for one run.
#[derive(Debug)]
pub struct Config {
    pub proxy: String,
    pub destination: String,
    pub timeout: Duration,
    pub credentials: Option<Credentials>,
    pub creds_file: Option<PathBuf>,
    /// Where to write the log, `None` when logging is disabled.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Build a config from parsed arguments, reading `PROXY_CREDS` from the
    /// process environment.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::from_cli_with_env(cli, std::env::var(AUTH_ENV_VAR).ok())
    }

    /// Same as [`Config::from_cli`] with the environment value passed in.
    pub fn from_cli_with_env(cli: Cli, env_creds: Option<String>) -> Result<Self, ConfigError> {
        let basic_auth = cli.basic_auth || cli.creds_file.is_some();
        let credentials = if basic_auth {
            Some(resolve_credentials(cli.creds_file.as_deref(), env_creds)?)
        } else {
            None
        };

        let log_file = cli.log.then(|| cli.log_file.unwrap_or_else(default_log_file));

        Ok(Self {
            proxy: cli.proxy,
            destination: join_host_port(&cli.dest_host, cli.dest_port),
            timeout: cli.timeout,
            credentials,
            creds_file: cli.creds_file,
            log_file,
        })
    }
}

/// Read credentials from `creds_file` if given, else from the env value.
pub fn resolve_credentials(
    creds_file: Option<&Path>,
    env_creds: Option<String>,
) -> Result<Credentials, ConfigError> {
    let raw = match creds_file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })?,
        None => env_creds.unwrap_or_default(),
    };

    raw.parse()
}

/// Create (or append to) the log file.
pub fn open_log_file(path: &Path) -> Result<File, ConfigError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ConfigError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn default_log_file() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("stdproxy_{now}.log"))
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration the way Go's `time.ParseDuration` does: one or more
/// decimal numbers, each with an optional fraction and a unit (`ns`, `us`,
/// `µs`, `ms`, `s`, `m`, `h`), e.g. `300ms`, `1.5s`, `1m30s`. A bare integer
/// is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    let mut rest = s.trim();

    if rest.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = rest.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(num_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            _ => return Err(invalid()),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && frac.is_empty()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;

        // Digits below 1ns are dropped.
        let mut digit_scale = scale;
        for d in frac.bytes() {
            digit_scale /= 10;
            if digit_scale == 0 {
                break;
            }
            nanos = nanos
                .checked_add(u128::from(d - b'0') * digit_scale)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
