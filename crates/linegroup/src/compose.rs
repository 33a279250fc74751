//! Composite operations built from open, emit and close.
//!
//! Nothing here touches the render state directly; every helper is a
//! sequence of ordinary printer calls. Groups are held by a [`GroupScope`]
//! so an early return, a `?` or a panic inside the body still closes them.

use std::backtrace::Backtrace;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use console::measure_text_width;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::glyph::Context;
use crate::printer::Printer;
use crate::state::LogKind;

/// An open group that closes when dropped.
#[must_use = "dropping the scope closes the group immediately"]
pub struct GroupScope<'a> {
    printer: &'a Printer,
    open: bool,
}

impl<'a> GroupScope<'a> {
    fn new(printer: &'a Printer) -> Self {
        Self {
            printer,
            open: true,
        }
    }

    /// Close the group without a footer.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.printer.close_group()
    }

    /// Close the group; lines printed by `footer` are its footer.
    pub fn close_with<R>(mut self, footer: impl FnOnce(&Printer) -> R) -> Result<R> {
        self.open = false;
        self.printer.close_group_with(footer)
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.printer.close_group();
        }
    }
}

impl std::fmt::Debug for GroupScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupScope").field("open", &self.open).finish()
    }
}

impl Printer {
    /// Open a group without a header and hold it open until the scope ends.
    pub fn group_scope(&self) -> Result<GroupScope<'_>> {
        self.open_group()?;
        Ok(GroupScope::new(self))
    }

    /// Open a group whose header is printed by `header`.
    pub fn group_scope_with(
        &self,
        header: impl FnOnce(&Printer) -> Result<()>,
    ) -> Result<GroupScope<'_>> {
        let printed = self.open_group_with(header)?;
        let scope = GroupScope::new(self);
        printed?;
        Ok(scope)
    }

    /// Header text of a step, from the `step_start` formatter.
    pub fn step_start_text(&self, name: &str) -> String {
        self.with_engine(|engine| {
            let ctx = Context::new(&engine.settings, &engine.state, LogKind::GroupStart);
            (engine.settings.formatters.step_start)(&ctx, name)
        })
    }

    /// Footer text of a step, from the `step_end` formatter.
    pub fn step_end_text(&self, name: &str, elapsed: Duration) -> String {
        self.with_engine(|engine| {
            let ctx = Context::new(&engine.settings, &engine.state, LogKind::GroupEnd);
            (engine.settings.formatters.step_end)(&ctx, name, elapsed)
        })
    }

    /// Run `work` inside a titled group and report how long it took.
    pub fn step<R>(&self, name: &str, work: impl FnOnce() -> R) -> Result<R> {
        let started = Instant::now();
        let scope = self.group_scope_with(|p| p.info(p.step_start_text(name)))?;
        let out = work();
        let elapsed = started.elapsed();
        scope.close_with(|p| p.info(p.step_end_text(name, elapsed)))??;
        Ok(out)
    }

    pub async fn step_async<F: Future>(&self, name: &str, work: F) -> Result<F::Output> {
        let started = Instant::now();
        let scope = self.group_scope_with(|p| p.info(p.step_start_text(name)))?;
        let out = work.await;
        let elapsed = started.elapsed();
        scope.close_with(|p| p.info(p.step_end_text(name, elapsed)))??;
        Ok(out)
    }

    /// Run `body` inside a group without header or footer.
    pub fn group<R>(&self, body: impl FnOnce() -> R) -> Result<R> {
        let scope = self.group_scope()?;
        let out = body();
        scope.close()?;
        Ok(out)
    }

    /// Run `body` inside a group with caller-printed header and footer.
    pub fn group_with<R>(
        &self,
        open: impl FnOnce(&Printer) -> Result<()>,
        body: impl FnOnce() -> R,
        close: impl FnOnce(&Printer) -> Result<()>,
    ) -> Result<R> {
        let scope = self.group_scope_with(open)?;
        let out = body();
        scope.close_with(close)??;
        Ok(out)
    }

    pub async fn group_async<F: Future>(&self, body: F) -> Result<F::Output> {
        let scope = self.group_scope()?;
        let out = body.await;
        scope.close()?;
        Ok(out)
    }

    /// Print messages as one group: the first is the header, the last the
    /// footer. A single message is printed as a plain line.
    pub fn array<T: Display>(&self, kind: LogKind, messages: &[T]) -> Result<()> {
        match messages {
            [] => Ok(()),
            [only] => self.emit(kind, only),
            [first, middle @ .., last] => {
                let scope = self.group_scope_with(|p| p.emit(kind, first))?;
                for message in middle {
                    self.emit(kind, message)?;
                }
                scope.close_with(|p| p.emit(kind, last))?
            }
        }
    }

    /// Split a byte buffer on newlines and print it with [`array`](Self::array).
    pub fn chunk(&self, kind: LogKind, bytes: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(bytes);
        let lines: Vec<&str> = text.trim().split('\n').collect();
        self.array(kind, &lines)
    }

    /// Print a serializable value as `path = value` lines.
    pub fn dir<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut lines = Vec::new();
        flatten(&value, String::new(), &mut lines);
        self.array(LogKind::Dir, &lines)
    }

    /// Print rows as an aligned text table.
    pub fn table<H, C>(&self, headers: &[H], rows: &[Vec<C>]) -> Result<()>
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        let lines = table_lines(headers, rows);
        self.array(LogKind::Table, &lines)
    }

    /// Print `message` followed by a backtrace of the caller.
    pub fn trace(&self, message: impl Display) -> Result<()> {
        let backtrace = Backtrace::force_capture().to_string();
        let mut lines = vec![message.to_string()];
        lines.extend(
            backtrace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
        self.array(LogKind::Trace, &lines)
    }
}

/// Leaf values of `value`, one `path = value` line each.
fn flatten(value: &Value, path: String, out: &mut Vec<String>) {
    let leaf = |text: String| if path.is_empty() { text } else { format!("{path} = {text}") };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten(child, child_path, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten(child, format!("{path}[{i}]"), out);
            }
        }
        other => out.push(leaf(other.to_string())),
    }
}

fn table_lines<H: AsRef<str>, C: AsRef<str>>(headers: &[H], rows: &[Vec<C>]) -> Vec<String> {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0; columns];
    for (i, header) in headers.iter().enumerate() {
        widths[i] = widths[i].max(measure_text_width(header.as_ref()));
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(measure_text_width(cell.as_ref()));
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(measure_text_width(cell));
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        padded.join(" │ ").trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    if !headers.is_empty() {
        lines.push(render(headers.iter().map(AsRef::as_ref).collect()));
        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        lines.push(rule.join("─┼─"));
    }
    for row in rows {
        lines.push(render(row.iter().map(AsRef::as_ref).collect()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: &Value) -> Vec<String> {
        let mut lines = Vec::new();
        flatten(value, String::new(), &mut lines);
        lines
    }

    #[test]
    fn test_flatten_nested_object() {
        let lines = flat(&json!({"server": {"port": 8080, "tags": ["a", "b"]}}));
        assert_eq!(
            lines,
            vec!["server.port = 8080", "server.tags[0] = \"a\"", "server.tags[1] = \"b\""]
        );
    }

    #[test]
    fn test_flatten_scalar_and_empty() {
        assert_eq!(flat(&json!(3)), vec!["3"]);
        assert_eq!(flat(&json!({})), vec!["{}"]);
        assert_eq!(flat(&json!({"list": []})), vec!["list = []"]);
    }

    #[test]
    fn test_table_lines_align_columns() {
        let lines = table_lines(
            &["name", "size"],
            &[vec!["a", "1"], vec!["long-name", "22"]],
        );
        assert_eq!(
            lines,
            vec![
                "name      │ size",
                "──────────┼─────",
                "a         │ 1",
                "long-name │ 22",
            ]
        );
    }

    #[test]
    fn test_table_lines_ragged_rows() {
        let headers: [&str; 0] = [];
        let lines = table_lines(&headers, &[vec!["a", "b"], vec!["c"]]);
        assert_eq!(lines, vec!["a │ b", "c"]);
    }
}
