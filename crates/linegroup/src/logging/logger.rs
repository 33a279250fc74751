//! `log` crate logger writing through a printer.
//!
//! # Usage
//!
//! ```ignore
//! use linegroup::logging::TreeLogger;
//! use log::LevelFilter;
//!
//! TreeLogger::builder(printer().clone())
//!     .level(LevelFilter::Debug)
//!     .with_timestamps(true)
//!     .init()?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{LevelFilter, Log, Metadata, Record};

use super::{compose_line, is_own_target, kind_for, timestamp, write_plain};
use crate::error::Result;
use crate::printer::Printer;

/// Logger that prints each record as a line of the matching kind.
pub struct TreeLogger {
    printer: Printer,
    min_level: LevelFilter,
    show_timestamps: bool,
    show_targets: bool,
    routing: Arc<AtomicBool>,
}

impl TreeLogger {
    #[must_use]
    pub fn new(printer: Printer, min_level: LevelFilter) -> Self {
        TreeLoggerBuilder::new(printer).level(min_level).build()
    }

    #[must_use]
    pub fn builder(printer: Printer) -> TreeLoggerBuilder {
        TreeLoggerBuilder::new(printer)
    }

    fn route(&self, record: &Record) {
        let level = record.level();
        let target = record.target();
        let message = record.args().to_string();

        if is_own_target(target) || !self.routing.load(Ordering::Acquire) {
            write_plain(level, target, &message);
            return;
        }

        let ts = if self.show_timestamps { timestamp() } else { None };
        let line = compose_line(
            ts.as_deref(),
            self.show_targets.then_some(target),
            &message,
        );
        if self.printer.emit(kind_for(level), &line).is_err() {
            write_plain(level, target, &message);
        }
    }
}

impl Log for TreeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.min_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.route(record);
        }
    }

    fn flush(&self) {}
}

/// Builder for [`TreeLogger`].
#[derive(Debug)]
pub struct TreeLoggerBuilder {
    printer: Printer,
    min_level: LevelFilter,
    show_timestamps: bool,
    show_targets: bool,
}

impl TreeLoggerBuilder {
    /// Info level, no timestamps, no targets.
    #[must_use]
    pub fn new(printer: Printer) -> Self {
        Self {
            printer,
            min_level: LevelFilter::Info,
            show_timestamps: false,
            show_targets: false,
        }
    }

    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    #[must_use]
    pub fn build(self) -> TreeLogger {
        TreeLogger {
            printer: self.printer,
            min_level: self.min_level,
            show_timestamps: self.show_timestamps,
            show_targets: self.show_targets,
            routing: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Build and install as the global logger.
    pub fn init(self) -> Result<Registration> {
        let level = self.min_level;
        let logger = self.build();
        let registration = Registration {
            printer: logger.printer.clone(),
            routing: Arc::clone(&logger.routing),
        };
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(registration)
    }
}

/// Install a [`TreeLogger`] for `printer` as the global logger.
pub fn register(printer: &Printer, level: LevelFilter) -> Result<Registration> {
    TreeLoggerBuilder::new(printer.clone()).level(level).init()
}

/// Handle to an installed [`TreeLogger`].
#[derive(Debug)]
pub struct Registration {
    printer: Printer,
    routing: Arc<AtomicBool>,
}

impl Registration {
    /// Stop routing records into the printer and finalize its pending line.
    ///
    /// The `log` facade cannot uninstall a logger, so later records are
    /// written plainly to stderr instead.
    pub fn unregister(self) -> Result<()> {
        self.routing.store(false, Ordering::Release);
        self.printer.shutdown()
    }

    pub fn is_active(&self) -> bool {
        self.routing.load(Ordering::Acquire)
    }
}
