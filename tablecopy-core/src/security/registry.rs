//! Credential registry lookup.
//!
//! The registry maps profile names to stored credentials. Storage itself is
//! out of scope; `ProfileRegistry` reads a JSON profiles file that already
//! exists and keeps the entries in memory.

use super::credentials::{Credentials, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Looks up stored credentials by profile name.
pub trait CredentialRegistry: Send + Sync {
    /// Returns the credentials stored under `profile`, if any.
    fn get_credentials(&self, profile: &str) -> Option<Credentials>;
}

#[derive(Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: HashMap<String, ProfileEntry>,
}

#[derive(Deserialize)]
struct ProfileEntry {
    environment: Environment,
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    security_token: String,
}

/// In-memory credential registry.
///
/// # Example
///
/// ```rust
/// use tablecopy_core::security::{CredentialRegistry, Credentials, Environment, ProfileRegistry};
///
/// let registry = ProfileRegistry::new()
///     .with_profile("nightly", Credentials::new(Environment::Sandbox, "u", "p", "t"));
/// assert!(registry.get_credentials("nightly").is_some());
/// assert!(registry.get_credentials("other").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Credentials>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a profile.
    pub fn with_profile(mut self, name: impl Into<String>, credentials: Credentials) -> Self {
        self.insert(name, credentials);
        self
    }

    /// Adds or replaces a profile.
    pub fn insert(&mut self, name: impl Into<String>, credentials: Credentials) {
        self.profiles.insert(name.into(), credentials);
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the registry has no profiles.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Parses a JSON profiles document.
    ///
    /// ```json
    /// { "profiles": { "prod": { "environment": "production", "username": "u",
    ///   "password": "p", "security_token": "t" } } }
    /// ```
    ///
    /// # Errors
    /// Returns a serialization error if the document does not match.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let file: ProfilesFile = serde_json::from_str(json).map_err(|e| {
            crate::error::CopyError::serialization("Failed to parse profiles document", e)
        })?;

        let profiles = file
            .profiles
            .into_iter()
            .map(|(name, entry)| {
                let credentials = Credentials::new(
                    entry.environment,
                    entry.username,
                    entry.password,
                    entry.security_token,
                );
                (name.trim().to_string(), credentials)
            })
            .collect();

        Ok(Self { profiles })
    }

    /// Loads a JSON profiles file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or a serialization
    /// error if it does not parse.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            crate::error::CopyError::io(
                format!("Failed to read profiles file {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&json)
    }
}

impl CredentialRegistry for ProfileRegistry {
    fn get_credentials(&self, profile: &str) -> Option<Credentials> {
        self.profiles.get(profile).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PROFILES: &str = r#"{
        "profiles": {
            "prod": {
                "environment": "production",
                "username": "admin@example.com",
                "password": "secret",
                "security_token": "tok"
            },
            "sandbox": {
                "environment": "sandbox",
                "username": "qa@example.com"
            }
        }
    }"#;

    #[test]
    fn test_from_json() {
        let registry = ProfileRegistry::from_json(PROFILES).unwrap();
        assert_eq!(registry.len(), 2);

        let prod = registry.get_credentials("prod").unwrap();
        assert_eq!(prod.environment(), Environment::Production);
        assert_eq!(prod.username(), "admin@example.com");
        assert!(prod.has_password());

        let sandbox = registry.get_credentials("sandbox").unwrap();
        assert_eq!(sandbox.environment(), Environment::Sandbox);
        assert!(!sandbox.has_password());
    }

    #[test]
    fn test_from_json_rejects_unknown_environment() {
        let json = r#"{"profiles":{"x":{"environment":"staging","username":"u"}}}"#;
        assert!(ProfileRegistry::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", PROFILES).unwrap();

        let registry = ProfileRegistry::from_file(file.path()).unwrap();
        assert!(registry.get_credentials("prod").is_some());
    }

    #[test]
    fn test_from_file_missing() {
        let result = ProfileRegistry::from_file(Path::new("/nonexistent/profiles.json"));
        assert!(matches!(
            result,
            Err(crate::error::CopyError::Io { .. })
        ));
    }

    #[test]
    fn test_missing_profile() {
        let registry = ProfileRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get_credentials("prod").is_none());
    }
}
