//! Connection descriptor parsing and credential resolution.
//!
//! A descriptor is either a single profile name, resolved against a
//! [`CredentialRegistry`], or an inline literal
//! `ENVIRONMENT,username,password,token`. Any other shape is malformed.

use super::credentials::{Credentials, Environment};
use super::registry::CredentialRegistry;
use crate::error::CopyError;
use tracing::debug;

/// Parsed shape of a connection descriptor.
#[derive(Debug, Clone)]
pub enum ConnectionDescriptor {
    /// Profile name (trimmed) to look up in the registry
    Profile(String),
    /// Credentials given inline
    Inline(Credentials),
}

/// Parses a connection descriptor without consulting any registry.
///
/// Every part is trimmed. Trailing empty parts are dropped before counting,
/// so `"prof,"` names profile `prof` and `"PRODUCTION,u,p,"` is malformed.
/// The environment of an inline descriptor is matched case-insensitively.
///
/// # Errors
/// - `MalformedConnectionString` unless there are exactly 1 or 4 parts
/// - `UnknownEnvironment` if the inline environment is not PRODUCTION or SANDBOX
///
/// # Example
/// ```rust
/// use tablecopy_core::security::{ConnectionDescriptor, Environment, parse_descriptor};
///
/// match parse_descriptor("sandbox,qa,pw,tok")? {
///     ConnectionDescriptor::Inline(creds) => assert_eq!(creds.environment(), Environment::Sandbox),
///     ConnectionDescriptor::Profile(_) => unreachable!(),
/// }
/// # Ok::<(), tablecopy_core::CopyError>(())
/// ```
pub fn parse_descriptor(descriptor: &str) -> crate::Result<ConnectionDescriptor> {
    let mut tokens: Vec<&str> = descriptor.split(',').map(str::trim).collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }

    match tokens.as_slice() {
        [profile] => Ok(ConnectionDescriptor::Profile((*profile).to_string())),
        [environment, username, password, token] => {
            let environment = Environment::parse(environment)?;
            Ok(ConnectionDescriptor::Inline(Credentials::new(
                environment,
                *username,
                *password,
                *token,
            )))
        }
        other => Err(CopyError::malformed_connection(descriptor, other.len())),
    }
}

/// Turns connection descriptors into credentials.
pub struct ConnectionResolver<'a> {
    registry: &'a dyn CredentialRegistry,
}

impl<'a> ConnectionResolver<'a> {
    /// Creates a resolver backed by `registry`.
    pub fn new(registry: &'a dyn CredentialRegistry) -> Self {
        Self { registry }
    }

    /// Resolves a descriptor into credentials.
    ///
    /// # Errors
    /// - `MalformedConnectionString` for the wrong number of parts
    /// - `UnknownEnvironment` for an unrecognized inline environment
    /// - `UnknownProfile` if a profile name has no registry entry
    pub fn resolve(&self, descriptor: &str) -> crate::Result<Credentials> {
        match parse_descriptor(descriptor)? {
            ConnectionDescriptor::Profile(profile) => {
                debug!("Resolving connection profile '{}'", profile);
                self.registry
                    .get_credentials(&profile)
                    .ok_or(CopyError::UnknownProfile { profile })
            }
            ConnectionDescriptor::Inline(credentials) => {
                debug!(
                    "Using inline {} credentials for '{}'",
                    credentials.environment(),
                    credentials.username()
                );
                Ok(credentials)
            }
        }
    }
}
