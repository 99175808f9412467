//! The CONNECT request and its reply (RFC 1928 §4 and §6).

pub mod reply;
pub mod request;
