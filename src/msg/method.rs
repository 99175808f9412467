//! SOCKS5 authentication methods (RFC 1928).
//!
//! The client advertises the methods it can speak and the proxy picks one:
//!
//! - [`FixedMethod`] → reserved values with a defined meaning
//! - [`Method`] → any byte the proxy may answer with, including
//!   IANA-assigned and private ranges
//!
//! See [RFC 1928, section 3](https://www.rfc-editor.org/rfc/rfc1928#section-3).

use std::fmt;

use crate::error::SocksError;

/// Fixed authentication methods defined in the SOCKS5 specification.
///
/// ```text
/// 0x00 → No authentication required
/// 0x01 → GSS-API authentication
/// 0x02 → Username/password authentication
/// 0xFF → No acceptable methods
/// ```
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FixedMethod {
    /// No authentication required (`0x00`).
    NoAuth = 0x00,
    /// GSS-API authentication (`0x01`). Never offered by this client.
    GssApi = 0x01,
    /// Username/password authentication (`0x02`).
    UsePass = 0x02,
    /// No acceptable methods (`0xFF`).
    NoAcceptable = 0xFF,
}

impl fmt::Display for FixedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FixedMethod::NoAuth => "NO AUTHENTICATION REQUIRED",
            FixedMethod::GssApi => "GSSAPI",
            FixedMethod::UsePass => "USERNAME/PASSWORD",
            FixedMethod::NoAcceptable => "NO ACCEPTABLE METHODS",
        };
        write!(f, "{}", msg)
    }
}

/// Represents any SOCKS5 authentication method byte.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Method {
    /// A fixed, reserved method.
    Fixed(FixedMethod),
    /// An IANA-assigned method (`0x03`–`0x7F`).
    IanaAssigned(u8),
    /// A private-use method (`0x80`–`0xFE`).
    Private(u8),
}

impl Method {
    pub const NO_AUTH: Method = Method::Fixed(FixedMethod::NoAuth);
    pub const USER_PASS: Method = Method::Fixed(FixedMethod::UsePass);
    pub const NO_ACCEPTABLE: Method = Method::Fixed(FixedMethod::NoAcceptable);

    /// Converts a [`Method`] into its byte representation.
    pub fn to_u8(self) -> u8 {
        match self {
            Method::Fixed(f) => f as u8,
            Method::IanaAssigned(b) | Method::Private(b) => b,
        }
    }

    /// Classifies a method byte.
    ///
    /// Every byte maps to some method; the `Result` is kept so callers can
    /// use `?` uniformly with [`FixedMethod::try_from_u8`].
    pub fn from_u8(byte: u8) -> Result<Self, SocksError> {
        match byte {
            0x03..=0x7F => Ok(Method::IanaAssigned(byte)),
            0x80..=0xFE => Ok(Method::Private(byte)),
            _ => FixedMethod::try_from_u8(byte).map(Method::Fixed),
        }
    }
}

impl FixedMethod {
    /// Attempts to parse a [`FixedMethod`] from a byte.
    pub fn try_from_u8(byte: u8) -> Result<Self, SocksError> {
        match byte {
            0x00 => Ok(FixedMethod::NoAuth),
            0x01 => Ok(FixedMethod::GssApi),
            0x02 => Ok(FixedMethod::UsePass),
            0xFF => Ok(FixedMethod::NoAcceptable),
            _ => Err(SocksError::UnknownMethod(byte)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Fixed(fm) => write!(f, "{}", fm),
            Method::IanaAssigned(b) => write!(f, "IANA ASSIGNED METHOD 0x{:02X}", b),
            Method::Private(b) => write!(f, "PRIVATE METHOD 0x{:02X}", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_method_ranges() {
        assert_eq!(Method::from_u8(0x00).unwrap(), Method::NO_AUTH);
        assert_eq!(Method::from_u8(0x02).unwrap(), Method::USER_PASS);
        assert_eq!(Method::from_u8(0xFF).unwrap(), Method::NO_ACCEPTABLE);
        assert_eq!(Method::from_u8(0x10).unwrap(), Method::IanaAssigned(0x10));
        assert_eq!(Method::from_u8(0x80).unwrap(), Method::Private(0x80));
        assert_eq!(Method::Private(0x90).to_u8(), 0x90);
    }

    #[test]
    fn fixed_method_rejects_unreserved_bytes() {
        assert!(matches!(
            FixedMethod::try_from_u8(0x42),
            Err(SocksError::UnknownMethod(0x42))
        ));
    }
}
