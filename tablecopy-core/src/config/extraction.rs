//! Extraction run configuration.
//!
//! All values are fixed when the orchestrator is built and are never changed
//! afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-call timeout for the remote service, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000_000;

/// Default row buffer budget, in megabytes.
pub const DEFAULT_BUFFER_MB: u32 = 20;

/// Largest accepted row buffer budget, in megabytes.
pub const MAX_BUFFER_MB: u32 = 4096;

const BYTES_PER_MB: usize = 1024 * 1024;

/// What the data phase does after a table fails to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferFailurePolicy {
    /// Stop the run and return the transfer error
    #[default]
    Abort,
    /// Record the failure and go on with the next table
    Continue,
}

impl fmt::Display for TransferFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for TransferFailurePolicy {
    type Err = crate::error::CopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" | "skip" => Ok(Self::Continue),
            other => Err(crate::error::CopyError::configuration(format!(
                "Unknown transfer failure policy '{}': expected abort or continue",
                other
            ))),
        }
    }
}

/// Configuration for one extraction run.
///
/// # Example
/// ```rust
/// use tablecopy_core::config::ExtractionConfig;
///
/// let config = ExtractionConfig::new()
///     .with_timeout_ms(30_000)
///     .with_buffer_mb(8)
///     .with_schema(true);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.buffer_bytes(), 8 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Timeout applied to every remote service call
    pub timeout: Duration,
    /// Row buffer budget in megabytes before a flush is forced
    pub buffer_mb: u32,
    /// Whether to create destination schema before copying data
    pub schema: bool,
    /// Whether progress messages are suppressed
    pub silent: bool,
    /// Whether orchestration narration is traced
    pub trace: bool,
    /// Handling of per-table transfer failures
    pub on_transfer_error: TransferFailurePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            buffer_mb: DEFAULT_BUFFER_MB,
            schema: false,
            silent: false,
            trace: false,
            on_transfer_error: TransferFailurePolicy::Abort,
        }
    }
}

impl ExtractionConfig {
    /// Creates a config with the standard defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if the timeout is zero or the buffer budget is outside
    /// `1..=MAX_BUFFER_MB`.
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout.is_zero() {
            return Err(crate::error::CopyError::configuration(
                "timeout must be greater than 0",
            ));
        }

        if self.buffer_mb == 0 {
            return Err(crate::error::CopyError::configuration(
                "buffer must be at least 1 MB",
            ));
        }

        if self.buffer_mb > MAX_BUFFER_MB {
            return Err(crate::error::CopyError::configuration(format!(
                "buffer should not exceed {} MB",
                MAX_BUFFER_MB
            )));
        }

        Ok(())
    }

    /// Timeout in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Row buffer budget in bytes.
    pub fn buffer_bytes(&self) -> usize {
        usize::try_from(self.buffer_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(BYTES_PER_MB)
    }

    /// Builder method to set the timeout in milliseconds.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    /// Builder method to set the row buffer budget.
    pub fn with_buffer_mb(mut self, mb: u32) -> Self {
        self.buffer_mb = mb;
        self
    }

    /// Builder method to enable/disable the schema phase.
    pub fn with_schema(mut self, enabled: bool) -> Self {
        self.schema = enabled;
        self
    }

    /// Builder method to enable/disable silent mode.
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Builder method to enable/disable orchestration tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Builder method to set the transfer failure policy.
    pub fn with_failure_policy(mut self, policy: TransferFailurePolicy) -> Self {
        self.on_transfer_error = policy;
        self
    }
}
