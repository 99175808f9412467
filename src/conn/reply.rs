//! SOCKS5 proxy connection reply (RFC 1928 §6).
//!
//! After processing a request, the proxy replies with:
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//!
//! o VER       - protocol version: X'05'
//! o REP       - reply field, see below
//! o RSV       - reserved, must be 0x00
//! o ATYP      - address type of BND.ADDR
//! o BND.ADDR  - server bound address
//! o BND.PORT  - server bound port in network byte order
//! ```
//!
//! For `CONNECT` the bound address is only logged.

use std::fmt;

use crate::ATYP;
use crate::error::SocksError;
use crate::parse::{AddrPort, Parse};

/// Reply codes (`REP`) for SOCKS5 connection replies (RFC 1928 §6).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rep {
    /// 0x00 - Succeeded
    Succeeded = 0x00,
    /// 0x01 - General SOCKS server failure
    GeneralFailure = 0x01,
    /// 0x02 - Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// 0x03 - Network unreachable
    NetworkUnreachable = 0x03,
    /// 0x04 - Host unreachable
    HostUnreachable = 0x04,
    /// 0x05 - Connection refused by destination host
    ConnectionRefused = 0x05,
    /// 0x06 - TTL expired
    TTLExpired = 0x06,
    /// 0x07 - Command not supported
    CommandNotSupported = 0x07,
    /// 0x08 - Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl TryFrom<u8> for Rep {
    type Error = SocksError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x00 => Rep::Succeeded,
            0x01 => Rep::GeneralFailure,
            0x02 => Rep::ConnectionNotAllowed,
            0x03 => Rep::NetworkUnreachable,
            0x04 => Rep::HostUnreachable,
            0x05 => Rep::ConnectionRefused,
            0x06 => Rep::TTLExpired,
            0x07 => Rep::CommandNotSupported,
            0x08 => Rep::AddressTypeNotSupported,
            other => return Err(SocksError::UnknownReply(other)),
        })
    }
}

impl fmt::Display for Rep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rep::Succeeded => "succeeded",
            Rep::GeneralFailure => "general SOCKS server failure",
            Rep::ConnectionNotAllowed => "connection not allowed by ruleset",
            Rep::NetworkUnreachable => "network unreachable",
            Rep::HostUnreachable => "host unreachable",
            Rep::ConnectionRefused => "connection refused",
            Rep::TTLExpired => "TTL expired",
            Rep::CommandNotSupported => "command not supported",
            Rep::AddressTypeNotSupported => "address type not supported",
        };
        write!(f, "{}", msg)
    }
}

/// Represents a SOCKS5 proxy reply (RFC 1928 §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnReply {
    /// Protocol version (`VER`), must be 0x05.
    pub ver: u8,
    /// Reply field (`REP`): success or error status.
    pub rep: Rep,
    /// Reserved byte (`RSV`).
    pub rsv: u8,
    /// Address type (`ATYP`).
    pub atyp: ATYP,
    /// Bound address and port (`BND.ADDR`, `BND.PORT`).
    pub bnd: AddrPort,
}

impl ConnReply {
    pub fn new(rep: Rep, bnd: AddrPort) -> Self {
        Self {
            ver: 0x05,
            rep,
            rsv: 0x00,
            atyp: bnd.atyp(),
            bnd,
        }
    }

    /// Number of bytes that follow the 4-byte header for a given `ATYP`.
    ///
    /// For domain names this needs the length octet, i.e. the first byte
    /// after the header.
    pub fn tail_len(atyp: u8, first: u8) -> Result<usize, SocksError> {
        match atyp {
            0x01 => Ok(4 + 2),
            0x04 => Ok(16 + 2),
            0x03 => Ok(1 + first as usize + 2),
            other => Err(SocksError::InvalidAddressType(other)),
        }
    }

    /// Serializes the reply into the SOCKS5 wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![self.ver, self.rep as u8, self.rsv, self.atyp as u8];
        self.bnd.write_to(&mut buf);
        buf
    }
}

impl TryFrom<&[u8]> for ConnReply {
    type Error = SocksError;

    /// Parses a SOCKS5 connection reply from raw bytes.
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < 4 {
            return Err(SocksError::ReplyTooShort);
        }

        let ver = buf[0];
        if ver != 0x05 {
            return Err(SocksError::UnsupportedVersion(ver));
        }

        let rep = Rep::try_from(buf[1])?;
        let rsv = buf[2];

        let atyp = match buf[3] {
            0x01 => ATYP::V4,
            0x03 => ATYP::DomainName,
            0x04 => ATYP::V6,
            other => return Err(SocksError::InvalidAddressType(other)),
        };

        let bnd = match atyp {
            ATYP::V4 | ATYP::V6 => {
                let (addr, _) = Parse::parse_ip_port(&buf[4..], atyp as u8)
                    .ok_or(SocksError::ReplyTooShort)?;
                addr
            }
            ATYP::DomainName => Parse::parse_domain_port(&buf[4..])?.0,
        };

        Ok(ConnReply {
            ver,
            rep,
            rsv,
            atyp,
            bnd,
        })
    }
}
