//! ErrorBoundary wrapper for automatic error display.
//!
//! The [`ErrorBoundary`] type wraps fallible operations and prints their
//! errors as error lines, so call sites do not need their own reporting.
//!
//! # Example
//!
//! ```rust,ignore
//! use linegroup::{printer, ErrorBoundary};
//!
//! let boundary = ErrorBoundary::new(printer());
//!
//! // Simple usage - returns Option<T>
//! let settings = boundary.wrap(load_settings());
//!
//! // With context message
//! let settings = boundary.wrap_with_context(load_settings(), "Loading settings");
//!
//! if boundary.has_errors() {
//!     eprintln!("Encountered {} errors", boundary.error_count());
//! }
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::printer::Printer;
use crate::state::LogKind;

/// Wraps operations and prints errors on failure.
///
/// Without a context the error is a single error line. With a context it
/// is printed as a two-line group: the context as header, the error as
/// footer.
///
/// # Thread Safety
///
/// The error count is atomic, so a boundary can be shared across threads.
pub struct ErrorBoundary<'a> {
    printer: &'a Printer,
    exit_on_error: bool,
    error_count: AtomicUsize,
}

impl<'a> ErrorBoundary<'a> {
    #[must_use]
    pub fn new(printer: &'a Printer) -> Self {
        Self {
            printer,
            exit_on_error: false,
            error_count: AtomicUsize::new(0),
        }
    }

    /// Exit the process with code 1 after printing any error.
    #[must_use]
    pub fn with_exit_on_error(mut self, exit: bool) -> Self {
        self.exit_on_error = exit;
        self
    }

    /// Returns `Some(value)` on success; prints the error and returns `None` otherwise.
    pub fn wrap<T, E: Display>(&self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.handle_error(&e, None);
                None
            }
        }
    }

    /// Like [`wrap`](Self::wrap), with a context line naming what failed.
    pub fn wrap_with_context<T, E: Display>(&self, result: Result<T, E>, context: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.handle_error(&e, Some(context));
                None
            }
        }
    }

    /// Prints the error and hands it back.
    pub fn wrap_result<T, E: Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.handle_error(e, None);
        }
        result
    }

    pub fn wrap_result_with_context<T, E: Display>(
        &self,
        result: Result<T, E>,
        context: &str,
    ) -> Result<T, E> {
        if let Err(e) = &result {
            self.handle_error(e, Some(context));
        }
        result
    }

    pub fn display_error(&self, error: &dyn Display) {
        self.handle_error(error, None);
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn reset_count(&self) {
        self.error_count.store(0, Ordering::Relaxed);
    }

    fn handle_error(&self, error: &dyn Display, context: Option<&str>) {
        self.error_count.fetch_add(1, Ordering::Relaxed);

        let printed = match context {
            Some(context) => self
                .printer
                .array(LogKind::Error, &[context.to_string(), error.to_string()]),
            None => self.printer.error(error),
        };
        if printed.is_err() {
            eprintln!("error: {error}");
        }

        if self.exit_on_error {
            let _ = self.printer.shutdown();
            std::process::exit(1);
        }
    }
}

/// Unwrap a result or print its error and return from the current function.
///
/// # Example
///
/// ```rust,ignore
/// fn process(boundary: &ErrorBoundary) {
///     let data = try_display!(boundary, fetch_data());
///     let result = try_display!(boundary, transform(data), "Transforming data");
/// }
/// ```
#[macro_export]
macro_rules! try_display {
    ($boundary:expr, $expr:expr) => {
        match $boundary.wrap($expr) {
            Some(v) => v,
            None => return,
        }
    };
    ($boundary:expr, $expr:expr, $ctx:expr) => {
        match $boundary.wrap_with_context($expr, $ctx) {
            Some(v) => v,
            None => return,
        }
    };
}

/// Unwrap a result or print its error and return it as `Err`.
#[macro_export]
macro_rules! try_display_result {
    ($boundary:expr, $expr:expr) => {
        match $boundary.wrap_result($expr) {
            Ok(v) => v,
            Err(e) => return Err(e.into()),
        }
    };
    ($boundary:expr, $expr:expr, $ctx:expr) => {
        match $boundary.wrap_result_with_context($expr, $ctx) {
            Ok(v) => v,
            Err(e) => return Err(e.into()),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;
    use crate::testing::CaptureTerminal;

    fn test_printer() -> (Printer, CaptureTerminal) {
        let term = CaptureTerminal::new();
        let mut settings = RenderSettings::default();
        settings.colored = false;
        (Printer::with_settings(term.clone(), settings), term)
    }

    #[test]
    fn test_error_boundary_wrap_success() {
        let (printer, term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);

        let result: Result<i32, String> = Ok(42);
        assert_eq!(boundary.wrap(result), Some(42));
        assert_eq!(boundary.error_count(), 0);
        assert!(!boundary.has_errors());
        assert!(term.screen().is_empty());
    }

    #[test]
    fn test_error_boundary_wrap_error() {
        let (printer, term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);

        let result: Result<i32, String> = Err("disk full".to_string());
        assert_eq!(boundary.wrap(result), None);
        assert_eq!(boundary.error_count(), 1);
        assert_eq!(term.screen(), vec!["➤ 0001: ─ disk full"]);
    }

    #[test]
    fn test_error_boundary_wrap_with_context() {
        let (printer, term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);

        let result: Result<i32, String> = Err("missing key".to_string());
        assert_eq!(boundary.wrap_with_context(result, "Loading settings"), None);
        assert_eq!(
            term.screen(),
            vec!["➤ 0001: ┌ Loading settings", "        └ missing key"]
        );
        assert_eq!(printer.snapshot().depth, 0);
    }

    #[test]
    fn test_error_boundary_wrap_result_error() {
        let (printer, _term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);

        let result: Result<i32, String> = Err("nope".to_string());
        assert_eq!(boundary.wrap_result(result), Err("nope".to_string()));
        assert_eq!(boundary.error_count(), 1);
    }

    #[test]
    fn test_error_boundary_reset_count() {
        let (printer, _term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);

        boundary.display_error(&"one");
        boundary.display_error(&"two");
        assert_eq!(boundary.error_count(), 2);

        boundary.reset_count();
        assert!(!boundary.has_errors());
    }

    #[test]
    fn test_try_display_returns_early() {
        let (printer, term) = test_printer();
        let boundary = ErrorBoundary::new(&printer);
        let mut reached = false;

        let mut run = || {
            let _value: i32 = try_display!(boundary, Err::<i32, _>("bad input"));
            reached = true;
        };
        run();

        assert!(!reached);
        assert!(term.contains("bad input"));
    }
}
