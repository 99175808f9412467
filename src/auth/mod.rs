//! Username/password sub-negotiation (RFC 1929).

pub mod credentials;
pub mod reply;
pub mod request;
