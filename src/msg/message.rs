//! SOCKS5 handshake messages (RFC 1928).
//!
//! - [`VersionMessage`] → sent by the client to advertise supported
//!   authentication methods.
//! - [`MethodSelection`] → returned by the proxy to choose one method.
//!
//! Defined in [RFC 1928, section 3](https://www.rfc-editor.org/rfc/rfc1928#section-3).

use super::method::*;
use crate::error::SocksError;

/// Client's version/methods message.
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMessage<'a> {
    /// The SOCKS protocol version (always `0x05`).
    pub ver: u8,
    /// The authentication methods offered to the proxy.
    pub methods: &'a [Method],
}

impl<'a> VersionMessage<'a> {
    /// Creates a new [`VersionMessage`] offering the given methods.
    ///
    /// # Example
    /// ```
    /// use stdproxy::msg::message::VersionMessage;
    /// use stdproxy::msg::method::Method;
    ///
    /// let msg = VersionMessage::new(&[Method::NO_AUTH]);
    /// assert_eq!(msg.to_bytes(), [0x05, 0x01, 0x00]);
    /// ```
    pub fn new(methods: &'a [Method]) -> Self {
        Self { ver: 0x05, methods }
    }

    /// Serializes the message: `VER`, `NMETHODS`, then one byte per method.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.methods.len());
        buf.push(self.ver);
        buf.push(self.methods.len() as u8);
        buf.extend(self.methods.iter().map(|m| m.to_u8()));
        buf
    }
}

/// Proxy's method selection message.
///
/// ```text
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
///
/// `METHOD` is one of the offered methods, or `0xFF` if none is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSelection {
    /// The SOCKS protocol version (must be `0x05`).
    pub ver: u8,
    /// The authentication method selected by the proxy.
    pub method: Method,
}

impl MethodSelection {
    pub fn new(method: Method) -> Self {
        Self { ver: 0x05, method }
    }

    /// Serializes this [`MethodSelection`] into a 2-byte array.
    pub fn to_bytes(&self) -> [u8; 2] {
        [self.ver, self.method.to_u8()]
    }
}

impl TryFrom<&[u8]> for MethodSelection {
    type Error = SocksError;

    /// Attempts to parse a [`MethodSelection`] from raw bytes.
    ///
    /// Returns an error if:
    /// - the buffer is shorter than 2 bytes
    /// - the version is not `0x05`
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < 2 {
            return Err(SocksError::MethodSelectionTooShort);
        }

        let ver = bytes[0];
        if ver != 0x05 {
            return Err(SocksError::UnsupportedVersion(ver));
        }

        let method = Method::from_u8(bytes[1])?;
        Ok(Self { ver, method })
    }
}
