//! Error type and display helpers.
//!
//! [`Error`] covers everything the printer can fail with. The
//! [`ErrorBoundary`] type wraps fallible operations and prints their
//! errors as error lines instead of returning them.

mod boundary;

pub use boundary::ErrorBoundary;

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while printing or configuring.
#[derive(Debug)]
pub enum Error {
    /// Terminal or file I/O failed.
    Io(std::io::Error),
    /// A value could not be serialized for `dir`.
    Json(serde_json::Error),
    /// A settings source could not be parsed.
    Config { source_name: String, message: String },
    /// A global logger was already installed.
    Logger(log::SetLoggerError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Config {
                source_name,
                message,
            } => write!(f, "invalid settings in {source_name}: {message}"),
            Error::Logger(e) => write!(f, "logger registration failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Config { .. } => None,
            Error::Logger(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::Logger(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_io_error_display_and_source() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert!(err.to_string().contains("closed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_names_source() {
        let err = Error::Config {
            source_name: "app.toml".to_string(),
            message: "expected `]`".to_string(),
        };
        assert_eq!(err.to_string(), "invalid settings in app.toml: expected `]`");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_json_error_converts() {
        let json: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err = Error::from(json.unwrap_err());
        assert!(matches!(err, Error::Json(_)));
    }
}
