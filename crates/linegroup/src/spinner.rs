//! Spinner engine: animates the pending line of an open group in place.
//!
//! A pending line is drawn once in its static form when it becomes final.
//! Until then a ticker thread redraws it every period with the next spinner
//! frame, erasing the rows of the previous frame first. Every redraw
//! happens under the printer's lock and is checked against a generation
//! number, so a retired spinner never draws again.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::printer::Engine;
use crate::state::LogKind;

/// A line waiting to become final.
#[derive(Debug, Clone)]
pub(crate) struct PendingLine {
    pub(crate) kind: LogKind,
    pub(crate) message: String,
    pub(crate) divider: bool,
}

impl PendingLine {
    pub(crate) fn new(kind: LogKind, message: String) -> Self {
        Self {
            kind,
            message,
            divider: false,
        }
    }

    pub(crate) fn divider(message: String) -> Self {
        Self {
            kind: LogKind::Divider,
            message,
            divider: true,
        }
    }
}

/// The spinner currently animating a pending line.
#[derive(Debug)]
pub(crate) struct ActiveSpinner {
    pub(crate) frame: usize,
    pub(crate) generation: u64,
    pub(crate) line: PendingLine,
    /// Static rendering written when the spinner retires.
    pub(crate) settled: String,
    /// Rows the last frame occupies on screen.
    pub(crate) rows_on_screen: usize,
    pub(crate) ticker: Option<Ticker>,
}

impl ActiveSpinner {
    #[cfg(test)]
    pub(crate) fn for_tests(frame: usize) -> Self {
        Self {
            frame,
            generation: 0,
            line: PendingLine::new(LogKind::Log, String::new()),
            settled: String::new(),
            rows_on_screen: 0,
            ticker: None,
        }
    }
}

/// Handle to a ticker thread. Dropping it stops the thread without waiting.
#[derive(Debug)]
pub(crate) struct Ticker {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    fn spawn(engine: Weak<Mutex<Engine>>, generation: u64, period: Duration) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("linegroup-spinner".to_string())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }
                    let Some(engine) = engine.upgrade() else {
                        return;
                    };
                    let result = {
                        let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
                        if engine.state.spinner.as_ref().map(|s| s.generation) != Some(generation) {
                            return;
                        }
                        engine.tick_spinner()
                    };
                    if let Err(err) = result {
                        log::warn!(
                            target: "linegroup::spinner",
                            "spinner redraw failed, animation stopped: {err}"
                        );
                        return;
                    }
                }
            })?;

        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    /// Signal the thread to stop. It exits at its next wake-up.
    pub(crate) fn cancel(&mut self) {
        self.stop.take();
    }

    /// Stop the thread and wait for it to exit.
    pub(crate) fn join(mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Physical rows a rendered text occupies.
pub(crate) fn row_count(text: &str) -> usize {
    text.split('\n').count()
}

impl Engine {
    /// Hold `line` back as pending and start animating it.
    ///
    /// Without animation the line is only stored and written once, when it
    /// retires.
    pub(crate) fn start_spinner(&mut self, line: PendingLine) -> io::Result<()> {
        let settled = self.render_line(&line);
        self.generation += 1;
        let generation = self.generation;
        self.state.spinner = Some(ActiveSpinner {
            frame: 0,
            generation,
            line,
            settled,
            rows_on_screen: 0,
            ticker: None,
        });

        if !self.settings.spinner.animate {
            return Ok(());
        }

        self.tick_spinner()?;
        let ticker = Ticker::spawn(self.handle.clone(), generation, self.settings.spinner.period)?;
        if let Some(spinner) = self.state.spinner.as_mut() {
            spinner.ticker = Some(ticker);
        }
        log::debug!(target: "linegroup::spinner", "spinner {generation} started");
        Ok(())
    }

    /// Redraw the pending line with the current frame, then advance the frame.
    pub(crate) fn tick_spinner(&mut self) -> io::Result<()> {
        let Some(spinner) = self.state.spinner.as_ref() else {
            return Ok(());
        };
        let rows = spinner.rows_on_screen;
        let text = self.render_line(&spinner.line);

        self.erase_rows(rows)?;
        if let Some(spinner) = self.state.spinner.as_mut() {
            spinner.rows_on_screen = 0;
        }
        self.terminal.cursor_to_start()?;
        self.terminal.write_line(&text)?;
        self.terminal.flush()?;

        let frames = self.settings.spinner.frame_count().max(1);
        if let Some(spinner) = self.state.spinner.as_mut() {
            spinner.rows_on_screen = row_count(&text);
            spinner.frame = (spinner.frame + 1) % frames;
        }
        Ok(())
    }

    /// Stop the active spinner, erase its animation and write the line in
    /// its final form. Does nothing when no spinner is active.
    pub(crate) fn retire_spinner(&mut self) -> io::Result<()> {
        let Some(mut spinner) = self.state.spinner.take() else {
            return Ok(());
        };
        if let Some(mut ticker) = spinner.ticker.take() {
            ticker.cancel();
            self.retired.push(ticker);
        }

        self.erase_rows(spinner.rows_on_screen)?;
        self.terminal.write_line(&spinner.settled)?;
        self.terminal.flush()?;
        log::debug!(target: "linegroup::spinner", "spinner {} retired", spinner.generation);
        Ok(())
    }

    /// Move up over `rows` rows, clearing each one.
    pub(crate) fn erase_rows(&mut self, rows: usize) -> io::Result<()> {
        for _ in 0..rows {
            self.terminal.move_cursor_up(1)?;
            self.terminal.clear_line()?;
        }
        Ok(())
    }
}
