//! Process-wide render state: counters, nesting depth and transition flags.

use std::fmt;
use std::str::FromStr;

use crate::spinner::ActiveSpinner;

/// The kind of a printed line.
///
/// Kinds select the prefix color and are handed to computed glyphs. The
/// group kinds are used when resolving the structural group glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Start,
    Del,
    Divider,
    Dir,
    Table,
    Trace,
    GroupStart,
    GroupLine,
    GroupEnd,
    NestedGroupStart,
    NestedGroupLine,
    NestedGroupEnd,
}

impl LogKind {
    /// Every kind, in declaration order.
    pub const ALL: [LogKind; 17] = [
        LogKind::Log,
        LogKind::Info,
        LogKind::Warn,
        LogKind::Error,
        LogKind::Debug,
        LogKind::Start,
        LogKind::Del,
        LogKind::Divider,
        LogKind::Dir,
        LogKind::Table,
        LogKind::Trace,
        LogKind::GroupStart,
        LogKind::GroupLine,
        LogKind::GroupEnd,
        LogKind::NestedGroupStart,
        LogKind::NestedGroupLine,
        LogKind::NestedGroupEnd,
    ];

    /// Snake-case name, as used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Log => "log",
            LogKind::Info => "info",
            LogKind::Warn => "warn",
            LogKind::Error => "error",
            LogKind::Debug => "debug",
            LogKind::Start => "start",
            LogKind::Del => "del",
            LogKind::Divider => "divider",
            LogKind::Dir => "dir",
            LogKind::Table => "table",
            LogKind::Trace => "trace",
            LogKind::GroupStart => "group_start",
            LogKind::GroupLine => "group_line",
            LogKind::GroupEnd => "group_end",
            LogKind::NestedGroupStart => "nested_group_start",
            LogKind::NestedGroupLine => "nested_group_line",
            LogKind::NestedGroupEnd => "nested_group_end",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = String;

    /// Accepts snake_case and camelCase names (`group_start`, `groupStart`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        LogKind::ALL
            .into_iter()
            .find(|kind| normalize_name(kind.as_str()) == wanted)
            .ok_or_else(|| format!("unknown log kind '{s}'"))
    }
}

/// Lowercases and drops separators so `groupStart` and `group_start` compare equal.
pub(crate) fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Group transition phase of the call currently being rendered.
///
/// Only one phase can be active at a time; it lasts for the header (or
/// footer) lines of a single open (or close) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transition {
    #[default]
    None,
    Opening,
    Closing,
}

/// Mutable rendering state shared by every print call of one printer.
pub struct RenderState {
    pub(crate) line_no: usize,
    pub(crate) depth: usize,
    pub(crate) group_line_no: usize,
    pub(crate) transition: Transition,
    pub(crate) group_prefix: String,
    pub(crate) spinner: Option<ActiveSpinner>,
}

impl RenderState {
    /// Fresh state: the first top-level line is numbered 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line_no: 1,
            depth: 0,
            group_line_no: 0,
            transition: Transition::None,
            group_prefix: String::new(),
            spinner: None,
        }
    }

    /// Sequence number the next numbered line will display.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Current group nesting depth (0 = top level).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Position of the next line within the innermost open group.
    pub fn group_line_no(&self) -> usize {
        self.group_line_no
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Prefix glyph recorded for the innermost group.
    pub fn group_prefix(&self) -> &str {
        &self.group_prefix
    }

    /// Frame index of the active spinner, if one is animating.
    pub fn spinner_frame(&self) -> Option<usize> {
        self.spinner.as_ref().map(|s| s.frame)
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner.is_some()
    }

    /// Whether a line printed now is provisional and goes to the spinner.
    pub(crate) fn is_pending_position(&self) -> bool {
        self.depth > 0 && self.group_line_no > 0 && self.transition != Transition::Closing
    }

    /// Advance the counter a final line consumes.
    pub(crate) fn advance(&mut self) {
        if self.depth == 0 || self.transition == Transition::Opening {
            self.line_no += 1;
        } else {
            self.group_line_no += 1;
        }
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            line_no: self.line_no,
            depth: self.depth,
            group_line_no: self.group_line_no,
            spinning: self.spinner.is_some(),
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderState")
            .field("line_no", &self.line_no)
            .field("depth", &self.depth)
            .field("group_line_no", &self.group_line_no)
            .field("transition", &self.transition)
            .field("spinning", &self.spinner.is_some())
            .finish_non_exhaustive()
    }
}

/// Copy of the observable counters, for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub line_no: usize,
    pub depth: usize,
    pub group_line_no: usize,
    pub spinning: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_accepts_both_cases() {
        assert_eq!("group_start".parse::<LogKind>(), Ok(LogKind::GroupStart));
        assert_eq!("groupStart".parse::<LogKind>(), Ok(LogKind::GroupStart));
        assert_eq!("INFO".parse::<LogKind>(), Ok(LogKind::Info));
        assert!("nope".parse::<LogKind>().is_err());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in LogKind::ALL {
            assert_eq!(kind.as_str().parse::<LogKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_advance_top_level_bumps_sequence() {
        let mut state = RenderState::new();
        state.advance();
        state.advance();
        assert_eq!(state.line_no(), 3);
        assert_eq!(state.group_line_no(), 0);
    }

    #[test]
    fn test_advance_in_group_bumps_group_counter() {
        let mut state = RenderState::new();
        state.depth = 1;
        state.advance();
        assert_eq!(state.line_no(), 1);
        assert_eq!(state.group_line_no(), 1);

        state.transition = Transition::Opening;
        state.advance();
        assert_eq!(state.line_no(), 2);
    }

    #[test]
    fn test_pending_position() {
        let mut state = RenderState::new();
        assert!(!state.is_pending_position());
        state.depth = 1;
        assert!(!state.is_pending_position());
        state.group_line_no = 1;
        assert!(state.is_pending_position());
        state.transition = Transition::Closing;
        assert!(!state.is_pending_position());
    }
}
