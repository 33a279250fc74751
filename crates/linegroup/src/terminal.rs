//! Terminal I/O capability.

use std::io;

use console::Term;

/// Width assumed when the terminal size cannot be queried.
pub const DEFAULT_WIDTH: usize = 80;

/// The raw operations the printer needs from a terminal.
pub trait Terminal: Send {
    /// Write `text` followed by a newline.
    fn write_line(&mut self, text: &str) -> io::Result<()>;

    /// Move the cursor up `rows` rows.
    fn move_cursor_up(&mut self, rows: usize) -> io::Result<()>;

    /// Clear the row under the cursor.
    fn clear_line(&mut self) -> io::Result<()>;

    /// Move the cursor to column 0.
    fn cursor_to_start(&mut self) -> io::Result<()>;

    /// Current width in columns.
    fn width(&self) -> usize;

    fn flush(&mut self) -> io::Result<()>;
}

/// [`Terminal`] over a real stdout or stderr handle.
#[derive(Debug, Clone)]
pub struct StdTerminal {
    term: Term,
}

impl StdTerminal {
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Whether the handle is attached to a real terminal.
    pub fn is_term(&self) -> bool {
        self.term.is_term()
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Terminal for StdTerminal {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.term.write_line(text)
    }

    fn move_cursor_up(&mut self, rows: usize) -> io::Result<()> {
        self.term.move_cursor_up(rows)
    }

    fn clear_line(&mut self) -> io::Result<()> {
        self.term.clear_line()
    }

    fn cursor_to_start(&mut self) -> io::Result<()> {
        self.term.write_str("\r")
    }

    fn width(&self) -> usize {
        self.term
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .filter(|cols| *cols > 0)
            .unwrap_or(DEFAULT_WIDTH)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.term.flush()
    }
}
