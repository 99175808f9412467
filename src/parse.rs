//! SOCKS5 address and port handling.
//!
//! This module defines [`AddrPort`], a destination or bound address and port
//! (IPv4, IPv6, or domain), and [`Parse`], a helper for decoding such addresses
//! from raw SOCKS5 protocol bytes.
//!
//! The address formats are defined in
//! [RFC 1928 §5, "Addressing"](<https://www.rfc-editor.org/rfc/rfc1928#section-5>).
//!
//! Example usage:
//! ```rust
//! use stdproxy::parse::{AddrPort, Parse};
//!
//! // Example: IPv4 address 127.0.0.1:8080
//! let buf = [127, 0, 0, 1, 0x1F, 0x90];
//! let (addr, used) = Parse::parse_ip_port(&buf, 0x01).unwrap();
//! assert_eq!(addr.to_string(), "127.0.0.1:8080");
//! assert_eq!(used, 6);
//!
//! let dst: AddrPort = "example.com:443".parse().unwrap();
//! assert_eq!(dst, AddrPort::Domain("example.com".into(), 443));
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::ATYP;
use crate::error::SocksError;

/// Represents an address and port as carried in SOCKS5 messages.
///
/// - An IPv4 address (`ATYP = 0x01`).
/// - An IPv6 address (`ATYP = 0x04`).
/// - A domain name (`ATYP = 0x03`), resolved by the proxy.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum AddrPort {
    /// An IPv4 address and port.
    V4(Ipv4Addr, u16),

    /// An IPv6 address and port.
    V6(Ipv6Addr, u16),

    /// A domain name and port.
    Domain(String, u16),
}

impl AddrPort {
    /// The `ATYP` byte matching this address.
    pub fn atyp(&self) -> ATYP {
        match self {
            AddrPort::V4(..) => ATYP::V4,
            AddrPort::V6(..) => ATYP::V6,
            AddrPort::Domain(..) => ATYP::DomainName,
        }
    }

    /// Appends `ADDR` and `PORT` in wire order (without the `ATYP` byte).
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            AddrPort::V4(addr, port) => {
                buf.extend_from_slice(&addr.octets());
                buf.extend_from_slice(&port.to_be_bytes());
            }
            AddrPort::V6(addr, port) => {
                buf.extend_from_slice(&addr.octets());
                buf.extend_from_slice(&port.to_be_bytes());
            }
            AddrPort::Domain(name, port) => {
                buf.push(name.len() as u8);
                buf.extend_from_slice(name.as_bytes());
                buf.extend_from_slice(&port.to_be_bytes());
            }
        }
    }
}

impl fmt::Display for AddrPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrPort::V4(ip, port) => write!(f, "{}:{}", ip, port),
            AddrPort::V6(ip, port) => write!(f, "[{}]:{}", ip, port),
            AddrPort::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl FromStr for AddrPort {
    type Err = SocksError;

    /// Parses `host:port`.
    ///
    /// The last `:` separates the port, so both `[::1]:80` and `::1:80` are
    /// read as IPv6. Anything that is not an IP literal is sent to the proxy
    /// as a domain name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SocksError::InvalidDestination(s.to_string());

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        let port: u16 = port.parse().map_err(|_| invalid())?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(invalid());
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => Ok(AddrPort::V4(ip, port)),
            Ok(IpAddr::V6(ip)) => Ok(AddrPort::V6(ip, port)),
            Err(_) if host.len() > 255 || host.contains(':') => Err(SocksError::InvalidDomain),
            Err(_) => Ok(AddrPort::Domain(host.to_string(), port)),
        }
    }
}

/// Provides parsing utilities for extracting addresses from raw bytes.
pub struct Parse;

impl Parse {
    /// Parses an IP address and port from a byte slice.
    ///
    /// # Arguments
    ///
    /// * `buf` - The byte slice containing the raw address data.
    /// * `atyp` - The address type byte (`ATYP`) as defined by RFC 1928:
    ///   - `0x01`: IPv4 address (4 bytes) + port (2 bytes).
    ///   - `0x04`: IPv6 address (16 bytes) + port (2 bytes).
    ///
    /// # Returns
    ///
    /// Returns `Some((AddrPort, used_bytes))` on success. Returns `None` if the
    /// buffer is too short or if the `atyp` is not an IP type.
    pub fn parse_ip_port(buf: &[u8], atyp: u8) -> Option<(AddrPort, usize)> {
        match atyp {
            0x01 => {
                let octets: [u8; 4] = buf.get(..4)?.try_into().ok()?;
                let port = u16::from_be_bytes([*buf.get(4)?, *buf.get(5)?]);
                Some((AddrPort::V4(Ipv4Addr::from(octets), port), 6))
            }
            0x04 => {
                let octets: [u8; 16] = buf.get(..16)?.try_into().ok()?;
                let port = u16::from_be_bytes([*buf.get(16)?, *buf.get(17)?]);
                Some((AddrPort::V6(Ipv6Addr::from(octets), port), 18))
            }
            _ => None,
        }
    }

    /// Parses a length-prefixed domain name and port (`ATYP = 0x03`).
    pub fn parse_domain_port(buf: &[u8]) -> Result<(AddrPort, usize), SocksError> {
        let len = *buf.first().ok_or(SocksError::InvalidDomain)? as usize;
        if buf.len() < 1 + len + 2 {
            return Err(SocksError::InvalidDomain);
        }
        let domain = String::from_utf8_lossy(&buf[1..1 + len]).to_string();
        let port = u16::from_be_bytes([buf[1 + len], buf[2 + len]]);
        Ok((AddrPort::Domain(domain, port), 1 + len + 2))
    }
}
