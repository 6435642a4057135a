//! Credential handling for the remote service.
//!
//! - `credentials`: secret-bearing credential container with masked `Debug`
//! - `registry`: profile-name lookup (`CredentialRegistry`, `ProfileRegistry`)
//! - `connection`: descriptor parsing and `ConnectionResolver`
//!
//! # Security Guarantees
//! - Passwords and security tokens are held in `Zeroizing` containers
//! - Secrets never appear in `Debug` output, logs or error messages

mod connection;
mod credentials;
mod registry;

pub use connection::{ConnectionDescriptor, ConnectionResolver, parse_descriptor};
pub use credentials::{Credentials, Environment};
pub use registry::{CredentialRegistry, ProfileRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CopyError;

    #[test]
    fn test_credential_errors_never_leak_secrets() {
        let registry = ProfileRegistry::new();
        let resolver = ConnectionResolver::new(&registry);

        let descriptors = [
            "PRODUCTION,admin,s3cr3t-pass",
            "PRODUCTION,admin,s3cr3t-pass,t0k3n,extra",
            "nowhere,admin,s3cr3t-pass,t0k3n",
        ];

        for descriptor in descriptors {
            let error = resolver.resolve(descriptor).unwrap_err();
            let rendered = format!("{} {:?}", error, error);
            assert!(!rendered.contains("s3cr3t-pass"), "leaked: {}", rendered);
            assert!(!rendered.contains("t0k3n"), "leaked: {}", rendered);
        }
    }

    #[test]
    fn test_unknown_profile_names_the_profile() {
        let registry = ProfileRegistry::new();
        let error = ConnectionResolver::new(&registry)
            .resolve("reporting")
            .unwrap_err();
        assert!(matches!(error, CopyError::UnknownProfile { .. }));
        assert!(error.to_string().contains("'reporting'"));
    }
}
