//! Login credentials for the remote service.
//!
//! Secrets are held in `Zeroizing` containers so they are cleared when the
//! credentials are dropped, and are never printed by `Debug`.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Remote service environment a login is directed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live organization
    Production,
    /// Test organization
    Sandbox,
}

impl Environment {
    /// Parses an environment literal, case-insensitively.
    ///
    /// # Errors
    /// Returns `UnknownEnvironment` for anything other than `PRODUCTION` or
    /// `SANDBOX`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("PRODUCTION") {
            Ok(Self::Production)
        } else if trimmed.eq_ignore_ascii_case("SANDBOX") {
            Ok(Self::Sandbox)
        } else {
            Err(crate::error::CopyError::UnknownEnvironment {
                value: trimmed.to_string(),
            })
        }
    }

    /// Lowercase name, also used as the snapshot directory name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully specified login credentials.
///
/// # Example
///
/// ```rust
/// use tablecopy_core::security::{Credentials, Environment};
///
/// let creds = Credentials::new(Environment::Sandbox, "admin", "secret", "token");
/// assert_eq!(creds.username(), "admin");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone)]
pub struct Credentials {
    environment: Environment,
    username: Zeroizing<String>,
    password: Zeroizing<String>,
    security_token: Zeroizing<String>,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(
        environment: Environment,
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password.into()),
            security_token: Zeroizing::new(security_token.into()),
        }
    }

    /// Target environment.
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Login user name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password. Only login implementations should read this.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Security token. Only login implementations should read this.
    pub fn security_token(&self) -> &str {
        &self.security_token
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("environment", &self.environment)
            .field("username", &self.username.as_str())
            .field("password", &"****")
            .field("security_token", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse_case_insensitive() {
        assert_eq!(
            Environment::parse("PRODUCTION").unwrap(),
            Environment::Production
        );
        assert_eq!(
            Environment::parse(" production ").unwrap(),
            Environment::Production
        );
        assert_eq!(Environment::parse("Sandbox").unwrap(), Environment::Sandbox);
    }

    #[test]
    fn test_environment_parse_unknown() {
        let error = Environment::parse("staging").unwrap_err();
        assert!(matches!(
            error,
            crate::error::CopyError::UnknownEnvironment { ref value } if value == "staging"
        ));
    }

    #[test]
    fn test_credentials_accessors() {
        let creds = Credentials::new(Environment::Production, "user", "pass", "tok");
        assert_eq!(creds.environment(), Environment::Production);
        assert_eq!(creds.username(), "user");
        assert_eq!(creds.password(), "pass");
        assert_eq!(creds.security_token(), "tok");
        assert!(creds.has_password());
    }

    #[test]
    fn test_credentials_debug_masks_secrets() {
        let creds = Credentials::new(Environment::Sandbox, "user", "hunter2", "tok-abc");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok-abc"));
    }

    #[test]
    fn test_credentials_empty_password() {
        let creds = Credentials::new(Environment::Sandbox, "user", "", "");
        assert!(!creds.has_password());
    }
}
