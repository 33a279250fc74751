//! Routing of `log` records and `tracing` events into a printer.
//!
//! - [`TreeLogger`] - a `log` crate logger
//! - [`register`] / [`Registration`] - install it globally and turn it off again
//! - [`TreeLayer`] / [`TreeSubscriberBuilder`] - the same for `tracing`
//!
//! Records whose target belongs to this crate are never routed back into a
//! printer; they go to stderr as plain text.
//!
//! # Example
//!
//! ```ignore
//! use linegroup::{logging, printer};
//! use log::LevelFilter;
//!
//! let registration = logging::register(printer(), LevelFilter::Info)?;
//! log::info!("routed through the printer");
//! registration.unregister()?;
//! ```

mod logger;
mod subscriber;

pub use logger::{Registration, TreeLogger, TreeLoggerBuilder, register};
pub use subscriber::{TreeLayer, TreeSubscriberBuilder};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::state::LogKind;

/// Whether `target` is one of this crate's own log targets.
pub(crate) fn is_own_target(target: &str) -> bool {
    target == "linegroup" || target.starts_with("linegroup::")
}

pub(crate) fn kind_for(level: log::Level) -> LogKind {
    match level {
        log::Level::Error => LogKind::Error,
        log::Level::Warn => LogKind::Warn,
        log::Level::Info => LogKind::Info,
        log::Level::Debug | log::Level::Trace => LogKind::Debug,
    }
}

/// `HH:MM:SS` in UTC.
pub(crate) fn timestamp() -> Option<String> {
    OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]:[second]"))
        .ok()
}

/// Message text with the optional timestamp and target in front.
pub(crate) fn compose_line(timestamp: Option<&str>, target: Option<&str>, message: &str) -> String {
    let mut line = String::new();
    if let Some(ts) = timestamp {
        line.push_str(ts);
        line.push(' ');
    }
    if let Some(target) = target {
        line.push_str(target);
        line.push_str(": ");
    }
    line.push_str(message);
    line
}

/// Fallback when a record cannot go through a printer.
pub(crate) fn write_plain(level: log::Level, target: &str, message: &str) {
    eprintln!("[{level}] {target}: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_target() {
        assert!(is_own_target("linegroup"));
        assert!(is_own_target("linegroup::spinner"));
        assert!(!is_own_target("linegroupie"));
        assert!(!is_own_target("app"));
    }

    #[test]
    fn test_kind_for_level() {
        assert_eq!(kind_for(log::Level::Error), LogKind::Error);
        assert_eq!(kind_for(log::Level::Trace), LogKind::Debug);
    }

    #[test]
    fn test_compose_line() {
        assert_eq!(compose_line(None, None, "m"), "m");
        assert_eq!(compose_line(Some("12:00:00"), Some("app"), "m"), "12:00:00 app: m");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp().unwrap();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }
}
