use std::time::Duration;

use thiserror::Error;

use crate::conn::reply::Rep;

/// Represents the possible errors that can occur while opening a connection
/// through a SOCKS5 proxy.
///
/// Every variant is fatal for the session: nothing is retried.
#[derive(Debug, Error)]
pub enum SocksError {
    // ===== Dial =====
    /// The proxy dial and handshake did not finish in time.
    #[error("proxy connection timed out after {0:?}")]
    Timeout(Duration),

    // ===== Version / Method Selection =====
    /// Occurs when the proxy answers with a SOCKS version other than 5.
    #[error("unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Occurs when the method selection from the proxy is too short.
    #[error("method selection too short")]
    MethodSelectionTooShort,

    /// Occurs when the proxy selects a byte that is not a known method.
    #[error("unknown authentication method: {0}")]
    UnknownMethod(u8),

    /// Occurs when the proxy accepts none of the offered methods.
    #[error("proxy accepted none of the offered authentication methods")]
    NoAcceptableMethod,

    /// Occurs when the proxy selects a method the client never offered.
    #[error("proxy selected a method that was not offered: {0}")]
    UnexpectedMethod(String),

    // ===== Authentication =====
    /// Occurs when the proxy uses an unsupported sub-negotiation version.
    #[error("authentication version not supported: {0}")]
    UnsupportedAuthVersion(u8),

    /// Occurs when the authentication reply is not 2 bytes long.
    #[error("authentication message too short")]
    AuthMessageTooShort,

    /// Occurs when the proxy rejects the username/password.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // ===== Connection =====
    /// Occurs when the proxy refuses the CONNECT request.
    #[error("proxy rejected CONNECT: {0}")]
    ConnectRejected(Rep),

    /// Occurs when the reply field is outside the RFC 1928 range.
    #[error("unknown reply code: {0}")]
    UnknownReply(u8),

    /// Occurs when a reply carries an invalid address type.
    #[error("invalid address type: {0}")]
    InvalidAddressType(u8),

    /// Occurs when a domain name is empty, too long or truncated.
    #[error("invalid domain name")]
    InvalidDomain,

    /// Occurs when a destination is not of the `host:port` form.
    #[error("invalid destination '{0}', expected host:port")]
    InvalidDestination(String),

    /// Occurs when the reply message is too short.
    #[error("reply too short")]
    ReplyTooShort,

    // ===== General =====
    /// Occurs when an I/O error happens.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
