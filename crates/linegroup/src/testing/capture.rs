//! CaptureTerminal for asserting on printed output in tests
//!
//! Applies every terminal operation to an in-memory row buffer, so tests see
//! what a user would finally see after spinner frames were erased and
//! rewritten, and can also inspect the raw operation log.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use strip_ansi_escapes::strip;

use crate::terminal::{DEFAULT_WIDTH, Terminal};

/// One operation received by a [`CaptureTerminal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermOp {
    WriteLine(String),
    MoveUp(usize),
    ClearLine,
    ToStart,
    Flush,
}

#[derive(Debug, Default)]
struct Screen {
    rows: Vec<String>,
    cursor: usize,
    ops: Vec<TermOp>,
}

impl Screen {
    fn write_line(&mut self, text: &str) {
        for part in text.split('\n') {
            if self.cursor < self.rows.len() {
                self.rows[self.cursor] = part.to_string();
            } else {
                self.rows.push(part.to_string());
            }
            self.cursor += 1;
        }
    }

    /// Rows above the cursor. Cleared rows below it are blank and will be
    /// overwritten by the next write.
    fn visible(&self) -> &[String] {
        &self.rows[..self.cursor.min(self.rows.len())]
    }
}

fn strip_ansi(text: &str) -> String {
    String::from_utf8_lossy(&strip(text.as_bytes())).into_owned()
}

/// A [`Terminal`] that records output in memory.
///
/// Clones share the same buffer: hand one clone to the printer and keep
/// another for assertions.
#[derive(Clone)]
pub struct CaptureTerminal {
    screen: Arc<Mutex<Screen>>,
    width: usize,
}

impl CaptureTerminal {
    /// A capture terminal 80 columns wide.
    #[must_use]
    pub fn new() -> Self {
        Self::with_width(DEFAULT_WIDTH)
    }

    #[must_use]
    pub fn with_width(width: usize) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen::default())),
            width,
        }
    }

    fn with_screen<R>(&self, f: impl FnOnce(&mut Screen) -> R) -> R {
        let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut screen)
    }

    /// Visible rows, ANSI codes stripped
    #[must_use]
    pub fn screen(&self) -> Vec<String> {
        self.with_screen(|s| s.visible().iter().map(|row| strip_ansi(row)).collect())
    }

    /// Visible rows, ANSI codes preserved
    #[must_use]
    pub fn raw_screen(&self) -> Vec<String> {
        self.with_screen(|s| s.visible().to_vec())
    }

    /// Every operation received, in order
    #[must_use]
    pub fn writes(&self) -> Vec<TermOp> {
        self.with_screen(|s| s.ops.clone())
    }

    /// Text of every `write_line` call, ANSI codes stripped
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.with_screen(|s| {
            s.ops
                .iter()
                .filter_map(|op| match op {
                    TermOp::WriteLine(text) => Some(strip_ansi(text)),
                    _ => None,
                })
                .collect()
        })
    }

    /// Visible output as a single string
    #[must_use]
    pub fn output_string(&self) -> String {
        self.screen().join("\n")
    }

    /// Check if visible output contains a string (case-insensitive)
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output_string()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    #[must_use]
    pub fn contains_all(&self, needles: &[&str]) -> bool {
        needles.iter().all(|n| self.contains(n))
    }

    /// Check if visible output matches a regex pattern
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(&self.output_string()),
            Err(_) => false,
        }
    }

    /// # Panics
    ///
    /// Panics if the output does not contain the needle string.
    pub fn assert_contains(&self, needle: &str) {
        assert!(
            self.contains(needle),
            "Output did not contain '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// # Panics
    ///
    /// Panics if the output contains the needle string.
    pub fn assert_not_contains(&self, needle: &str) {
        assert!(
            !self.contains(needle),
            "Output unexpectedly contained '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// # Panics
    ///
    /// Panics if the visible row count doesn't match expected.
    pub fn assert_line_count(&self, expected: usize) {
        let actual = self.screen().len();
        assert_eq!(
            actual, expected,
            "Expected {} lines but got {}. Actual output:\n{}",
            expected, actual, self.output_string()
        );
    }

    /// Forget all rows and operations
    pub fn clear(&self) {
        self.with_screen(|s| *s = Screen::default());
    }

    pub fn debug_print(&self) {
        eprintln!("=== CaptureTerminal Output ===");
        for (i, line) in self.screen().iter().enumerate() {
            eprintln!("{:3}: {}", i + 1, line);
        }
        eprintln!("==============================");
    }
}

impl Default for CaptureTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CaptureTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureTerminal")
            .field("width", &self.width)
            .field("line_count", &self.screen().len())
            .finish()
    }
}

impl Terminal for CaptureTerminal {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.with_screen(|s| {
            s.ops.push(TermOp::WriteLine(text.to_string()));
            s.write_line(text);
        });
        Ok(())
    }

    fn move_cursor_up(&mut self, rows: usize) -> io::Result<()> {
        self.with_screen(|s| {
            s.ops.push(TermOp::MoveUp(rows));
            s.cursor = s.cursor.saturating_sub(rows);
        });
        Ok(())
    }

    fn clear_line(&mut self) -> io::Result<()> {
        self.with_screen(|s| {
            s.ops.push(TermOp::ClearLine);
            let cursor = s.cursor;
            if let Some(row) = s.rows.get_mut(cursor) {
                row.clear();
            }
        });
        Ok(())
    }

    fn cursor_to_start(&mut self) -> io::Result<()> {
        self.with_screen(|s| s.ops.push(TermOp::ToStart));
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_screen(|s| s.ops.push(TermOp::Flush));
        Ok(())
    }
}
