//! Logger bootstrap for the binary.
//!
//! Libraries in this workspace only use the `log` facade; the binary installs
//! a flexi_logger backend writing to stderr.

use flexi_logger::{Logger, LoggerHandle};

/// Errors from starting the logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level name is not one of the supported ones.
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    Level(String),
    /// The backend refused to start.
    #[error("failed to start logger: {0}")]
    Backend(#[from] flexi_logger::FlexiLoggerError),
}

/// Map a user-supplied level name to the canonical spelling.
pub fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::Level(other.to_string())),
    }
}

/// Start logging to stderr at `level`.
///
/// `RUST_LOG`, when set, overrides `level`. Keep the returned handle alive
/// for as long as output is wanted.
pub fn init(level: &str) -> Result<LoggerHandle, LoggingError> {
    let level = normalize_level(level)?;
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .format(flexi_logger::colored_default_format)
        .start()?;
    log::debug!("logger started at level {level}");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_known_levels() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert_eq!(normalize_level("trace").unwrap(), "trace");
    }

    #[test]
    fn normalize_rejects_unknown_levels() {
        let err = normalize_level("loud").unwrap_err();
        assert!(err.to_string().contains("loud"));
    }
}
