//! Relay standard input/output through a SOCKS5 proxy.
//!
//! This crate opens an outbound TCP connection to a destination through a
//! SOCKS5 proxy (RFC 1928), optionally authenticating with username and
//! password (RFC 1929), then copies bytes in both directions between that
//! connection and a pair of local streams, usually stdin and stdout.
//!
//! ```no_run
//! use stdproxy::{Socks5Connector, relay};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), stdproxy::error::SocksError> {
//! let conn = Socks5Connector::new("127.0.0.1:1080")
//!     .with_timeout(Duration::from_secs(5))
//!     .connect("example.com:22")
//!     .await?;
//!
//! let result = relay::run(conn, tokio::io::stdin(), tokio::io::stdout()).await;
//! println!("received {} bytes, sent {}", result.received(), result.sent());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

pub mod auth;
pub mod config;
pub mod conn;
pub mod error;
pub mod msg;
pub mod parse;
pub mod relay;

use auth::reply::*;
use auth::request::*;
use conn::reply::*;
use conn::request::*;
use msg::message::*;
use msg::method::*;
use parse::AddrPort;

pub use auth::credentials::Credentials;
pub use relay::{Direction, Transfer, TransferResult};

use crate::error::SocksError;

/// Keep-alive idle time set on the socket to the proxy.
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Represents the address type in SOCKS5 messages.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ATYP {
    /// IPv4 address
    V4 = 0x01,
    /// Domain name
    DomainName = 0x03,
    /// IPv6 address
    V6 = 0x04,
}

impl fmt::Display for ATYP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ATYP::V4 => write!(f, "IPv4"),
            ATYP::V6 => write!(f, "IPv6"),
            ATYP::DomainName => write!(f, "Domain"),
        }
    }
}

/// Opens TCP connections to destinations through a SOCKS5 proxy.
///
/// Only the `CONNECT` command is used. The configured timeout covers both
/// the TCP dial to the proxy and the whole SOCKS5 handshake; it never applies
/// to the connection once it is returned.
#[derive(Debug, Clone)]
pub struct Socks5Connector {
    proxy: String,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl Socks5Connector {
    /// Create a connector for the proxy at `proxy` (`host:port`).
    ///
    /// No timeout and no authentication are configured.
    pub fn new(proxy: impl Into<String>) -> Self {
        Self {
            proxy: proxy.into(),
            timeout: Duration::ZERO,
            credentials: None,
        }
    }

    /// Bound the dial and handshake. `Duration::ZERO` means no bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Offer username/password authentication to the proxy.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// The proxy address this connector dials.
    pub fn proxy(&self) -> &str {
        &self.proxy
    }

    /// Connect to `destination` (`host:port`) through the proxy.
    ///
    /// # Errors
    ///
    /// - [`SocksError::InvalidDestination`] before any dial if `destination`
    ///   is not `host:port`.
    /// - [`SocksError::Timeout`] if dial and handshake take longer than the
    ///   configured timeout.
    /// - [`SocksError::AuthFailed`], [`SocksError::NoAcceptableMethod`] or
    ///   [`SocksError::ConnectRejected`] when the proxy refuses.
    pub async fn connect(&self, destination: &str) -> Result<TcpStream, SocksError> {
        let dst: AddrPort = destination.parse()?;

        if self.timeout.is_zero() {
            return self.dial(&dst).await;
        }

        tokio::time::timeout(self.timeout, self.dial(&dst))
            .await
            .map_err(|_| SocksError::Timeout(self.timeout))?
    }

    async fn dial(&self, dst: &AddrPort) -> Result<TcpStream, SocksError> {
        let mut stream = TcpStream::connect(self.proxy.as_str()).await?;
        SockRef::from(&stream).set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEP_ALIVE))?;
        debug!(proxy = %self.proxy, "TCP connection to proxy established");

        let reply = Self::handshake(&mut stream, dst, self.credentials.as_ref()).await?;
        info!(proxy = %self.proxy, destination = %dst, bind = %reply.bnd, "Proxy connection opened");

        Ok(stream)
    }

    // --- Protocol helpers ---

    /// Run the client side of the SOCKS5 handshake over an open stream.
    ///
    /// Offers `NO AUTH`, plus `USERNAME/PASSWORD` when credentials are given,
    /// authenticates if the proxy asks for it and issues `CONNECT` for `dst`.
    /// Returns the proxy's successful reply.
    pub async fn handshake<S>(
        stream: &mut S,
        dst: &AddrPort,
        credentials: Option<&Credentials>,
    ) -> Result<ConnReply, SocksError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let offered: &[Method] = match credentials {
            Some(_) => &[Method::NO_AUTH, Method::USER_PASS],
            None => &[Method::NO_AUTH],
        };
        Self::send_version_message(stream, offered).await?;

        let selection = Self::read_method_selection(stream).await?;
        debug!(method = %selection.method, "Proxy selected authentication method");

        if selection.method == Method::NO_ACCEPTABLE {
            return Err(SocksError::NoAcceptableMethod);
        }
        if !offered.contains(&selection.method) {
            return Err(SocksError::UnexpectedMethod(selection.method.to_string()));
        }

        if let (Method::Fixed(FixedMethod::UsePass), Some(creds)) = (selection.method, credentials)
        {
            Self::authenticate(stream, creds).await?;
        }

        let request = ConnRequest::connect(dst.clone());
        debug!(request = %request, "Sending connection request");
        Self::send_conn_request(stream, &request).await?;

        let reply = Self::read_conn_reply(stream).await?;
        match reply.rep {
            Rep::Succeeded => Ok(reply),
            rep => Err(SocksError::ConnectRejected(rep)),
        }
    }

    /// Perform the RFC 1929 username/password sub-negotiation.
    pub async fn authenticate<S>(stream: &mut S, credentials: &Credentials) -> Result<(), SocksError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        Self::send_auth_request(stream, credentials).await?;

        match Self::read_auth_reply(stream).await?.status {
            AuthStatus::Success => {
                debug!(user = credentials.username(), "Authentication succeeded");
                Ok(())
            }
            AuthStatus::Failure => Err(SocksError::AuthFailed(format!(
                "proxy rejected credentials for user '{}'",
                credentials.username()
            ))),
        }
    }

    /// Send the client's version/methods message.
    pub async fn send_version_message<S>(stream: &mut S, methods: &[Method]) -> Result<(), SocksError>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&VersionMessage::new(methods).to_bytes()).await?;
        Ok(())
    }

    /// Read the proxy's method selection.
    pub async fn read_method_selection<S>(stream: &mut S) -> Result<MethodSelection, SocksError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await?;
        MethodSelection::try_from(&buf[..])
    }

    /// Send a username/password authentication request.
    pub async fn send_auth_request<S>(stream: &mut S, credentials: &Credentials) -> Result<(), SocksError>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&AuthRequest::new(credentials).to_bytes()).await?;
        Ok(())
    }

    /// Read the proxy's authentication reply.
    pub async fn read_auth_reply<S>(stream: &mut S) -> Result<AuthReply, SocksError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await?;
        AuthReply::try_from(&buf[..])
    }

    /// Send a connection request.
    pub async fn send_conn_request<S>(stream: &mut S, request: &ConnRequest) -> Result<(), SocksError>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&request.to_bytes()).await?;
        Ok(())
    }

    /// Read a connection reply.
    ///
    /// The reply length depends on `ATYP`, so the header and the first
    /// address byte are read before the rest.
    pub async fn read_conn_reply<S>(stream: &mut S) -> Result<ConnReply, SocksError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; 5];
        stream.read_exact(&mut buf).await?;

        if buf[0] != 0x05 {
            return Err(SocksError::UnsupportedVersion(buf[0]));
        }

        let tail = ConnReply::tail_len(buf[3], buf[4])?;
        buf.resize(4 + tail, 0);
        stream.read_exact(&mut buf[5..]).await?;

        ConnReply::try_from(&buf[..])
    }
}
