//! Logging adapter handed to application code.
//!
//! Code that only wants to "just log" takes a `&dyn Console` and stays
//! unaware of whether its output is decorated ([`Printer`]) or raw
//! ([`Plain`]).

use std::fmt::Display;

use crate::printer::{Plain, Printer};
use crate::state::LogKind;

/// The log entry points.
///
/// Output failures are not reported through this trait; use the
/// [`Printer`] methods directly when they matter.
pub trait Console {
    fn print(&self, kind: LogKind, message: &dyn Display);

    fn log(&self, message: &dyn Display) {
        self.print(LogKind::Log, message);
    }

    fn info(&self, message: &dyn Display) {
        self.print(LogKind::Info, message);
    }

    fn warn(&self, message: &dyn Display) {
        self.print(LogKind::Warn, message);
    }

    fn error(&self, message: &dyn Display) {
        self.print(LogKind::Error, message);
    }

    fn debug(&self, message: &dyn Display) {
        self.print(LogKind::Debug, message);
    }
}

impl Console for Printer {
    fn print(&self, kind: LogKind, message: &dyn Display) {
        let _ = self.emit(kind, message);
    }
}

impl Console for Plain {
    fn print(&self, _kind: LogKind, message: &dyn Display) {
        let _ = self.write_line(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;
    use crate::testing::CaptureTerminal;

    fn greet(console: &dyn Console) {
        console.info(&"hello");
        console.warn(&format!("{} left", 3));
    }

    fn printer(term: &CaptureTerminal) -> Printer {
        let mut settings = RenderSettings::default();
        settings.colored = false;
        Printer::with_settings(term.clone(), settings)
    }

    #[test]
    fn test_printer_console_decorates() {
        let term = CaptureTerminal::new();
        greet(&printer(&term));
        assert_eq!(term.screen(), vec!["➤ 0001: ─ hello", "➤ 0002: ─ 3 left"]);
    }

    #[test]
    fn test_plain_console_is_raw() {
        let term = CaptureTerminal::new();
        greet(&printer(&term).plain());
        assert_eq!(term.screen(), vec!["hello", "3 left"]);
    }
}
