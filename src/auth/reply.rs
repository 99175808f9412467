//! Authentication reply for SOCKS5 username/password authentication.
//!
//! Defined in [RFC 1929, section 2](https://www.rfc-editor.org/rfc/rfc1929#section-2).
//!
//! ```text
//! +----+--------+
//! |VER | STATUS |
//! +----+--------+
//! |  1 |   1    |
//! +----+--------+
//!
//! o VER    - the version of the subnegotiation (always 0x01)
//! o STATUS - 0x00 for success, any non-zero value indicates failure
//! ```
//!
//! On a non-zero status the proxy closes the connection, so the client gives up.

use crate::error::SocksError;

/// Represents the status of the authentication, as per RFC 1929.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Authentication succeeded (`STATUS = 0x00`).
    Success = 0x00,
    /// Authentication failed (any non-zero `STATUS`).
    Failure = 0x01,
}

/// Represents an authentication reply sent by the proxy.
#[derive(Debug)]
pub struct AuthReply {
    /// Authentication protocol version (`VER`), always `0x01`.
    pub ver: u8,
    /// The status of the authentication (`STATUS`).
    pub status: AuthStatus,
}

impl AuthReply {
    pub fn new(status: AuthStatus) -> Self {
        Self { ver: 0x01, status }
    }

    /// Layout: `[VER, STATUS]`.
    pub fn to_bytes(&self) -> [u8; 2] {
        [self.ver, self.status as u8]
    }
}

impl TryFrom<&[u8]> for AuthReply {
    type Error = SocksError;

    /// Parses an authentication reply from a 2–byte buffer.
    ///
    /// # Errors
    /// - [`SocksError::AuthMessageTooShort`] if the slice is not 2 bytes long.
    /// - [`SocksError::UnsupportedAuthVersion`] if `VER != 0x01`.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 2 {
            return Err(SocksError::AuthMessageTooShort);
        }

        let ver = bytes[0];
        if ver != 0x01 {
            return Err(SocksError::UnsupportedAuthVersion(ver));
        }

        let status = match bytes[1] {
            0x00 => AuthStatus::Success,
            _ => AuthStatus::Failure,
        };

        Ok(Self { ver, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_non_zero_status_is_failure() {
        let reply = AuthReply::try_from(&[0x01, 0x7F][..]).unwrap();
        assert_eq!(reply.status, AuthStatus::Failure);

        let reply = AuthReply::try_from(&[0x01, 0x00][..]).unwrap();
        assert_eq!(reply.status, AuthStatus::Success);
    }

    #[test]
    fn rejects_wrong_version() {
        assert!(matches!(
            AuthReply::try_from(&[0x05, 0x00][..]),
            Err(SocksError::UnsupportedAuthVersion(5))
        ));
    }
}
