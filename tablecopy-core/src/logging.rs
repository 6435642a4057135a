//! Logging setup shared by the tablecopy binary and tests.
//!
//! Diagnostics go to stderr; stdout is reserved for the run summary.

use crate::Result;
use tracing_subscriber::EnvFilter;

/// Default message level written to stderr.
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Directive enabling orchestration narration.
const TRACE_DIRECTIVE: &str = "tablecopy_core=trace";

/// Maps a `--log` value onto a `tracing` level.
///
/// Accepts `error`, `warning` (or `warn`), `info`, `debug` and `trace`,
/// case-insensitively.
///
/// # Errors
/// Returns a configuration error for any other value.
pub fn parse_log_level(value: &str) -> Result<tracing::Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Ok(tracing::Level::ERROR),
        "warning" | "warn" => Ok(tracing::Level::WARN),
        "info" => Ok(tracing::Level::INFO),
        "debug" => Ok(tracing::Level::DEBUG),
        "trace" => Ok(tracing::Level::TRACE),
        other => Err(crate::error::CopyError::configuration(format!(
            "Unknown log level '{}': expected error, warning, info, debug or trace",
            other
        ))),
    }
}

/// Builds the filter directive for a level and the trace switch.
///
/// Orchestration narration is emitted at `trace` level under the
/// `tablecopy_core` target, so `--trace` raises that target alone.
pub fn filter_directive(level: tracing::Level, trace: bool) -> String {
    let base = level.to_string().to_ascii_lowercase();
    if trace {
        format!("{},{}", base, TRACE_DIRECTIVE)
    } else {
        base
    }
}

/// Builds the subscriber filter.
///
/// A parseable `env_directive` (the value of `RUST_LOG`) replaces the level
/// directive, but `trace` still enables narration on top of it.
///
/// # Errors
/// Returns a configuration error if the trace directive cannot be parsed.
pub fn build_filter(
    level: tracing::Level,
    trace: bool,
    env_directive: Option<&str>,
) -> Result<EnvFilter> {
    let Some(filter) = env_directive.and_then(|directive| EnvFilter::try_new(directive).ok())
    else {
        return Ok(EnvFilter::new(filter_directive(level, trace)));
    };
    if !trace {
        return Ok(filter);
    }

    let directive = TRACE_DIRECTIVE.parse().map_err(|e| {
        crate::error::CopyError::configuration(format!("Invalid trace directive: {}", e))
    })?;
    Ok(filter.add_directive(directive))
}

/// Initializes structured logging on stderr.
///
/// `RUST_LOG`, when set, takes precedence over the computed level; see
/// [`build_filter`].
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use tablecopy_core::logging::init_logging;
///
/// init_logging(tracing::Level::INFO, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(level: tracing::Level, trace: bool) -> Result<()> {
    let env_directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level, trace, env_directive.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::CopyError::configuration(format!(
                "Failed to initialize logging: {}",
                e
            ))
        })?;

    Ok(())
}
