//! Error types with credential masking.
//!
//! Every fatal error names the offending input so a run can be corrected
//! without re-running under extra diagnostics. Passwords and security tokens
//! never appear in any message.

use thiserror::Error;

/// Main error type for tablecopy operations.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Connection descriptor is neither a profile name nor a 4-part literal
    #[error(
        "Unrecognized connection string '{descriptor}': expected a profile name or ENVIRONMENT,username,password,token ({tokens} parts given)"
    )]
    MalformedConnectionString {
        /// Descriptor with secrets masked
        descriptor: String,
        /// Number of comma-separated parts found
        tokens: usize,
    },

    /// Profile name not present in the credential registry
    #[error("A profile with the name '{profile}' was not found in the credentials registry")]
    UnknownProfile { profile: String },

    /// Environment literal in a 4-part descriptor is not recognized
    #[error("Unknown connection environment '{value}': expected PRODUCTION or SANDBOX")]
    UnknownEnvironment { value: String },

    /// Remote service rejected the credentials
    #[error("Authentication failed for user '{username}': {reason}")]
    Authentication { username: String, reason: String },

    /// Remote call exceeded the configured timeout
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Destination could not be opened
    #[error("Destination unavailable: {context}")]
    DestinationUnavailable {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Copy of a single table failed
    #[error("Transfer of table '{table}' failed: {context}")]
    Transfer { table: String, context: String },

    /// Table selector is not a valid regular expression
    #[error("Invalid table pattern '{pattern}'")]
    InvalidRulePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rules document could not be parsed
    #[error("Rules document error: {context}")]
    ConfigDocument { context: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `CopyError`
pub type Result<T> = std::result::Result<T, CopyError>;

/// Masks every part of a connection descriptor after the first.
///
/// The first part is either a profile name or an environment literal and is
/// safe to show; the rest may hold a username, password or security token.
///
/// # Example
///
/// ```rust
/// use tablecopy_core::error::redact_descriptor;
///
/// assert_eq!(redact_descriptor("PRODUCTION,user,secret,tok"), "PRODUCTION,****,****,****");
/// assert_eq!(redact_descriptor("myprofile"), "myprofile");
/// ```
pub fn redact_descriptor(descriptor: &str) -> String {
    descriptor
        .split(',')
        .enumerate()
        .map(|(i, part)| if i == 0 { part.trim() } else { "****" })
        .collect::<Vec<_>>()
        .join(",")
}

impl CopyError {
    /// Creates a malformed connection string error with secrets masked
    pub fn malformed_connection(descriptor: &str, tokens: usize) -> Self {
        Self::MalformedConnectionString {
            descriptor: redact_descriptor(descriptor),
            tokens,
        }
    }

    /// Creates an authentication error
    pub fn authentication(username: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Authentication {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Creates a timeout error for the named remote operation
    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Wraps any error raised while opening the destination
    pub fn destination_unavailable<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DestinationUnavailable {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a per-table transfer error
    pub fn transfer(table: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Transfer {
            table: table.into(),
            context: context.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Returns false only for per-table transfer failures, whose handling is
    /// decided by the configured failure policy.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transfer { .. })
    }
}
