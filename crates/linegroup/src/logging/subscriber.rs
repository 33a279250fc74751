//! Tracing subscriber integration.
//!
//! [`TreeLayer`] prints tracing events through a printer. With span groups
//! enabled, entering a span opens a print group headed by the span name and
//! exiting it closes the group. Span groups assume spans are entered and
//! exited in order on one thread.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::span::Id;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use super::{compose_line, is_own_target, kind_for, timestamp, write_plain};
use crate::printer::Printer;

/// A tracing layer that prints events as tree lines.
pub struct TreeLayer {
    printer: Printer,
    show_timestamps: bool,
    show_targets: bool,
    span_groups: bool,
}

impl TreeLayer {
    #[must_use]
    pub fn new(printer: Printer) -> Self {
        Self {
            printer,
            show_timestamps: false,
            show_targets: false,
            span_groups: false,
        }
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

    /// Open a print group for every entered span.
    #[must_use]
    pub fn with_span_groups(mut self, enabled: bool) -> Self {
        self.span_groups = enabled;
        self
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            if self.message.is_none() {
                self.message = Some(value);
            }
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    /// Message followed by `key=value` pairs.
    fn into_text(self, fallback: &str) -> String {
        let mut text = self.message.unwrap_or_else(|| fallback.to_string());
        for (key, value) in self.fields {
            text.push_str(&format!(" {key}={value}"));
        }
        text
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }
}

fn log_level(level: tracing::Level) -> log::Level {
    match level {
        tracing::Level::ERROR => log::Level::Error,
        tracing::Level::WARN => log::Level::Warn,
        tracing::Level::INFO => log::Level::Info,
        tracing::Level::DEBUG => log::Level::Debug,
        tracing::Level::TRACE => log::Level::Trace,
    }
}

impl<S> Layer<S> for TreeLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let level = log_level(*metadata.level());
        let target = metadata.target();
        let message = collector.into_text(metadata.name());

        if is_own_target(target) {
            write_plain(level, target, &message);
            return;
        }

        let ts = if self.show_timestamps { timestamp() } else { None };
        let line = compose_line(ts.as_deref(), self.show_targets.then_some(target), &message);
        if self.printer.emit(kind_for(level), &line).is_err() {
            write_plain(level, target, &message);
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if !self.span_groups {
            return;
        }
        let Some(span) = ctx.span(id) else {
            return;
        };
        let name = span.name();
        let _ = self.printer.open_group_with(|p| p.start(name));
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if self.span_groups && ctx.span(id).is_some() {
            let _ = self.printer.close_group();
        }
    }
}

/// Builder for a registry with a [`TreeLayer`].
#[derive(Debug)]
pub struct TreeSubscriberBuilder {
    printer: Option<Printer>,
    show_timestamps: bool,
    show_targets: bool,
    span_groups: bool,
    level_filter: LevelFilter,
}

impl Default for TreeSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSubscriberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            printer: None,
            show_timestamps: false,
            show_targets: false,
            span_groups: false,
            level_filter: LevelFilter::INFO,
        }
    }

    /// Print through `printer` instead of the global one.
    #[must_use]
    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = Some(printer);
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
    pub fn with_span_groups(mut self, enabled: bool) -> Self {
        self.span_groups = enabled;
        self
    }

    #[must_use]
    pub fn with_level_filter(mut self, filter: LevelFilter) -> Self {
        self.level_filter = filter;
        self
    }

    /// Build the subscriber without installing it.
    #[must_use]
    pub fn build(self) -> impl Subscriber {
        let printer = self
            .printer
            .unwrap_or_else(|| crate::printer::printer().clone());
        let layer = TreeLayer::new(printer)
            .with_timestamps(self.show_timestamps)
            .with_targets(self.show_targets)
            .with_span_groups(self.span_groups);

        tracing_subscriber::registry()
            .with(self.level_filter)
            .with(layer)
    }

    /// Build and install as the global subscriber.
    pub fn init(self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        let subscriber = self.build();
        tracing::subscriber::set_global_default(subscriber)
    }
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
        settings.spinner.animate = false;
        (Printer::with_settings(term.clone(), settings), term)
    }

    #[test]
    fn test_builder_defaults() {
        let builder = TreeSubscriberBuilder::default();
        assert!(!builder.show_timestamps);
        assert!(!builder.span_groups);
        assert_eq!(builder.level_filter, LevelFilter::INFO);
    }

    #[test]
    fn test_event_with_fields() {
        let (printer, term) = test_printer();
        let subscriber = TreeSubscriberBuilder::new().with_printer(printer).build();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(port = 8080, "listening");
            tracing::debug!("filtered out");
        });

        assert_eq!(term.screen(), vec!["➤ 0001: ─ listening port=8080"]);
    }

    #[test]
    fn test_span_groups() {
        let (printer, term) = test_printer();
        let subscriber = TreeSubscriberBuilder::new()
            .with_printer(printer.clone())
            .with_span_groups(true)
            .build();

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("build");
            let _entered = span.enter();
            tracing::info!("compiling");
        });

        assert_eq!(printer.snapshot().depth, 0);
        assert_eq!(term.screen(), vec!["➤ 0001: ┌ build", "        │ compiling"]);
    }
}
