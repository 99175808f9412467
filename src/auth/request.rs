//! Username/password request (RFC 1929 §2).
//!
//! ```text
//! +----+------+----------+------+----------+
//! |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
//! +----+------+----------+------+----------+
//! | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
//! +----+------+----------+------+----------+
//! ```

use super::credentials::Credentials;

const VER: u8 = 0x01;

/// The sub-negotiation request sent once the proxy selects `USERNAME/PASSWORD`.
pub struct AuthRequest<'a> {
    pub ver: u8,
    pub creds: &'a Credentials,
}

impl<'a> AuthRequest<'a> {
    pub fn new(creds: &'a Credentials) -> Self {
        Self { ver: VER, creds }
    }

    /// Serializes the request. Lengths fit in one octet because
    /// [`Credentials`] caps both parts at 255 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let uname = self.creds.username().as_bytes();
        let passwd = self.creds.password().as_bytes();

        let mut buf = Vec::with_capacity(3 + uname.len() + passwd.len());
        buf.push(self.ver);
        buf.push(uname.len() as u8);
        buf.extend_from_slice(uname);
        buf.push(passwd.len() as u8);
        buf.extend_from_slice(passwd);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_length_prefixed_fields() {
        let creds = Credentials::new("bob", "pw").unwrap();
        let bytes = AuthRequest::new(&creds).to_bytes();
        assert_eq!(bytes, vec![0x01, 3, b'b', b'o', b'b', 2, b'p', b'w']);
    }
}
