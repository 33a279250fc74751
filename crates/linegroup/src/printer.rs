//! The print orchestrator.
//!
//! Every print call funnels through [`Printer`]. A call first retires any
//! active spinner, then either writes its line as final and advances the
//! counters, or hands it to the spinner engine when it lands on a pending
//! position inside an open group.
//!
//! All rendering state sits behind a single mutex shared with the spinner
//! ticker thread, so final lines and animation frames never interleave.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use crate::config::{RenderSettings, SettingsPatch};
use crate::error::Result;
use crate::format::LineFormatter;
use crate::glyph::{GlyphRole, Resolver};
use crate::group::GroupStack;
use crate::spinner::{PendingLine, Ticker};
use crate::state::{LogKind, RenderState, StateSnapshot, Transition};
use crate::terminal::{StdTerminal, Terminal};

/// Rendering state owned by one printer.
pub(crate) struct Engine {
    pub(crate) settings: RenderSettings,
    pub(crate) state: RenderState,
    pub(crate) stack: GroupStack,
    pub(crate) terminal: Box<dyn Terminal>,
    /// Cancelled tickers waiting to be joined once the lock is released.
    pub(crate) retired: Vec<Ticker>,
    pub(crate) generation: u64,
    pub(crate) handle: Weak<Mutex<Engine>>,
}

impl Engine {
    pub(crate) fn render_line(&self, line: &PendingLine) -> String {
        let formatter = LineFormatter::new(&self.settings, &self.state, self.terminal.width());
        if line.divider {
            formatter.render_divider(line.kind, &line.message)
        } else {
            formatter.render(line.kind, &line.message)
        }
    }

    pub(crate) fn emit(&mut self, line: PendingLine) -> std::io::Result<()> {
        self.retire_spinner()?;

        if self.state.is_pending_position() {
            return self.start_spinner(line);
        }

        let text = self.render_line(&line);
        self.terminal.write_line(&text)?;
        self.terminal.flush()?;
        if !line.divider {
            self.state.advance();
        }
        Ok(())
    }

    /// Write text as-is, after retiring the spinner.
    pub(crate) fn write_plain(&mut self, text: &str) -> std::io::Result<()> {
        self.retire_spinner()?;
        self.terminal.write_line(text)?;
        self.terminal.flush()
    }

    fn group_glyph(&self, role: GlyphRole, kind: LogKind) -> String {
        Resolver::new(&self.settings, &self.state).symbol(role, kind)
    }

    /// Enter a group and the opening phase. Returns the sequence number at entry.
    pub(crate) fn begin_open(&mut self) -> std::io::Result<usize> {
        self.retire_spinner()?;
        self.state.group_prefix = self.group_glyph(GlyphRole::GroupStart, LogKind::GroupStart);
        self.stack.open(&mut self.state);
        self.state.transition = Transition::Opening;
        Ok(self.state.line_no)
    }

    /// Leave the opening phase. A header that printed counts as the group's
    /// first line.
    pub(crate) fn finish_open(&mut self, line_no_at_entry: usize) {
        if self.state.line_no != line_no_at_entry {
            self.state.group_line_no += 1;
        }
        self.state.transition = Transition::None;
        self.state.group_prefix = self.group_glyph(GlyphRole::GroupLine, LogKind::GroupLine);
    }

    pub(crate) fn begin_close(&mut self) -> std::io::Result<()> {
        self.retire_spinner()?;
        self.state.transition = Transition::Closing;
        self.state.group_prefix = self.group_glyph(GlyphRole::GroupEnd, LogKind::GroupEnd);
        Ok(())
    }

    pub(crate) fn finish_close(&mut self) -> std::io::Result<()> {
        let retired = self.retire_spinner();
        self.state.transition = Transition::None;
        self.stack.close(&mut self.state);
        retired
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.retire_spinner();
    }
}

/// Which phase a [`PhaseGuard`] finishes.
#[derive(Clone, Copy)]
enum Phase {
    Opening { line_no_at_entry: usize },
    Closing,
}

/// Ends an open or close phase even when the header or footer panics.
struct PhaseGuard<'a> {
    printer: &'a Printer,
    phase: Option<Phase>,
}

impl<'a> PhaseGuard<'a> {
    fn new(printer: &'a Printer, phase: Phase) -> Self {
        Self {
            printer,
            phase: Some(phase),
        }
    }

    fn finish(mut self) -> Result<()> {
        match self.phase.take() {
            Some(phase) => self.printer.finish_phase(phase),
            None => Ok(()),
        }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if let Some(phase) = self.phase.take() {
            let _ = self.printer.finish_phase(phase);
        }
    }
}

/// Handle to a decorated output stream. Clones share the same state.
#[derive(Clone)]
pub struct Printer {
    engine: Arc<Mutex<Engine>>,
}

impl Printer {
    /// Printer over `terminal` with default settings.
    pub fn new(terminal: impl Terminal + 'static) -> Self {
        Self::with_settings(terminal, RenderSettings::default())
    }

    pub fn with_settings(terminal: impl Terminal + 'static, settings: RenderSettings) -> Self {
        let terminal: Box<dyn Terminal> = Box::new(terminal);
        let engine = Arc::new_cyclic(|handle| {
            Mutex::new(Engine {
                settings,
                state: RenderState::new(),
                stack: GroupStack::new(),
                terminal,
                retired: Vec::new(),
                generation: 0,
                handle: handle.clone(),
            })
        });
        Self { engine }
    }

    /// Printer on stdout, configured from the environment.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_settings(StdTerminal::stdout(), RenderSettings::from_env())
    }

    /// Printer on stderr, configured from the environment.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_settings(StdTerminal::stderr(), RenderSettings::from_env())
    }

    /// Run `f` under the lock, then join any tickers it retired.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let (out, retired) = {
            let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut engine);
            (out, std::mem::take(&mut engine.retired))
        };
        for ticker in retired {
            ticker.join();
        }
        out
    }

    // ─────────────────────────────────────────────────
    // Settings and State
    // ─────────────────────────────────────────────────

    /// Merge `patch` into the live settings and restart the spinner frames.
    pub fn configure(&self, patch: SettingsPatch) {
        self.with_engine(|engine| {
            engine.settings.apply(patch);
            if let Some(spinner) = engine.state.spinner.as_mut() {
                spinner.frame = 0;
            }
        });
    }

    /// Copy of the live settings.
    pub fn settings(&self) -> RenderSettings {
        self.with_engine(|engine| engine.settings.clone())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.with_engine(|engine| engine.state.snapshot())
    }

    pub fn is_spinning(&self) -> bool {
        self.with_engine(|engine| engine.state.is_spinning())
    }

    /// Current terminal width.
    pub fn width(&self) -> usize {
        self.with_engine(|engine| engine.terminal.width())
    }

    // ─────────────────────────────────────────────────
    // Emit
    // ─────────────────────────────────────────────────

    /// Print `message` as a line of `kind`.
    pub fn emit(&self, kind: LogKind, message: impl Display) -> Result<()> {
        let line = PendingLine::new(kind, message.to_string());
        self.with_engine(|engine| engine.emit(line))?;
        Ok(())
    }

    pub fn log(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Log, message)
    }

    pub fn info(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Info, message)
    }

    pub fn warn(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Warn, message)
    }

    pub fn error(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Error, message)
    }

    pub fn debug(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Debug, message)
    }

    pub fn start(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Start, message)
    }

    pub fn del(&self, message: impl Display) -> Result<()> {
        self.emit(LogKind::Del, message)
    }

    /// A rule of divider glyphs followed by `message`. Consumes no sequence number.
    pub fn divider(&self, message: impl Display) -> Result<()> {
        let line = PendingLine::divider(message.to_string());
        self.with_engine(|engine| engine.emit(line))?;
        Ok(())
    }

    /// Unformatted writer on the same terminal.
    pub fn plain(&self) -> Plain {
        Plain {
            printer: self.clone(),
        }
    }

    // ─────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────

    fn finish_phase(&self, phase: Phase) -> Result<()> {
        match phase {
            Phase::Opening { line_no_at_entry } => {
                self.with_engine(|engine| engine.finish_open(line_no_at_entry));
                Ok(())
            }
            Phase::Closing => Ok(self.with_engine(Engine::finish_close)?),
        }
    }

    fn begin_open(&self) -> Result<PhaseGuard<'_>> {
        let line_no_at_entry = self.with_engine(Engine::begin_open)?;
        Ok(PhaseGuard::new(self, Phase::Opening { line_no_at_entry }))
    }

    fn begin_close(&self) -> Result<PhaseGuard<'_>> {
        self.with_engine(Engine::begin_close)?;
        Ok(PhaseGuard::new(self, Phase::Closing))
    }

    /// Open a group without a header line.
    pub fn open_group(&self) -> Result<()> {
        self.begin_open()?.finish()
    }

    /// Open a group; lines printed by `header` are its header.
    pub fn open_group_with<R>(&self, header: impl FnOnce(&Printer) -> R) -> Result<R> {
        let guard = self.begin_open()?;
        let out = header(self);
        guard.finish()?;
        Ok(out)
    }

    /// Open a group; lines printed while `header` runs are its header.
    pub async fn open_group_async<F: Future>(&self, header: F) -> Result<F::Output> {
        let guard = self.begin_open()?;
        let out = header.await;
        guard.finish()?;
        Ok(out)
    }

    /// Close the innermost group without a footer line. Closing with no
    /// group open leaves the counters untouched.
    pub fn close_group(&self) -> Result<()> {
        self.begin_close()?.finish()
    }

    /// Close the innermost group; lines printed by `footer` are its footer.
    pub fn close_group_with<R>(&self, footer: impl FnOnce(&Printer) -> R) -> Result<R> {
        let guard = self.begin_close()?;
        let out = footer(self);
        guard.finish()?;
        Ok(out)
    }

    pub async fn close_group_async<F: Future>(&self, footer: F) -> Result<F::Output> {
        let guard = self.begin_close()?;
        let out = footer.await;
        guard.finish()?;
        Ok(out)
    }

    /// Finalize the pending line and stop its ticker thread.
    pub fn shutdown(&self) -> Result<()> {
        self.with_engine(Engine::retire_spinner)?;
        Ok(())
    }
}

impl std::fmt::Debug for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Unformatted output on a printer's terminal.
///
/// Each write retires the printer's spinner first so raw text never lands
/// inside an animation.
#[derive(Clone, Debug)]
pub struct Plain {
    printer: Printer,
}

impl Plain {
    pub fn write_line(&self, text: impl Display) -> Result<()> {
        let text = text.to_string();
        self.printer.with_engine(|engine| engine.write_plain(&text))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// Global Printer Accessor
// ─────────────────────────────────────────────────────────

static PRINTER: OnceLock<Printer> = OnceLock::new();

/// The process-wide printer on stdout.
#[must_use]
pub fn printer() -> &'static Printer {
    PRINTER.get_or_init(Printer::stdout)
}

/// Install the process-wide printer.
/// Must be called before [`printer`]; returns error if already initialized.
pub fn init_printer(printer: Printer) -> std::result::Result<(), &'static str> {
    PRINTER
        .set(printer)
        .map_err(|_| "Printer already initialized")
}
