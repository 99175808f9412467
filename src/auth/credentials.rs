use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Username and password for RFC 1929 authentication.
///
/// Both parts are non-empty and fit in a single length octet. A value of this
/// type is always valid, so the connector never has to check it again.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let username = username.into();
        let password = password.into();

        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::EmptyCredentialPart);
        }
        if username.len() > 255 || password.len() > 255 {
            return Err(ConfigError::CredentialTooLong);
        }

        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl FromStr for Credentials {
    type Err = ConfigError;

    /// Parses `user:password`. Surrounding whitespace (a trailing newline in
    /// a credentials file) is ignored; exactly one `:` is allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::CredentialsNotFound);
        }

        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(user), Some(pass), None) => Credentials::new(user, pass),
            _ => Err(ConfigError::MalformedCredentials),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_and_password() {
        let creds: Credentials = "alice:s3cret\n".parse().unwrap();
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "s3cret");
    }

    #[test]
    fn rejects_missing_or_extra_separator() {
        assert!(matches!(
            "userpass".parse::<Credentials>(),
            Err(ConfigError::MalformedCredentials)
        ));
        assert!(matches!(
            "user:pa:ss".parse::<Credentials>(),
            Err(ConfigError::MalformedCredentials)
        ));
    }

    #[test]
    fn rejects_empty_parts() {
        for bad in [":pass", "user:", ":"] {
            assert!(matches!(
                bad.parse::<Credentials>(),
                Err(ConfigError::EmptyCredentialPart)
            ));
        }
        assert!(matches!(
            "  \n".parse::<Credentials>(),
            Err(ConfigError::CredentialsNotFound)
        ));
    }

    #[test]
    fn rejects_parts_longer_than_a_length_octet() {
        let long = format!("{}:pw", "u".repeat(256));
        assert!(matches!(
            long.parse::<Credentials>(),
            Err(ConfigError::CredentialTooLong)
        ));
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("bob", "hunter2").unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("bob"));
        assert!(!shown.contains("hunter2"));
    }
}
