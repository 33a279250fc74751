//! Glyphs and the tree-glyph resolver.
//!
//! A [`Glyph`] is either a literal string or a function evaluated at render
//! time. [`Resolver`] decides which glyph represents a line given the
//! current depth, transition phase and spinner state. It never mutates
//! anything.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use console::measure_text_width;

use crate::config::RenderSettings;
use crate::format::format_duration;
use crate::state::{LogKind, RenderState, Transition, normalize_name};

/// Role a glyph plays in a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphRole {
    GroupStart,
    GroupLine,
    GroupEnd,
    NestedGroupStart,
    NestedGroupLine,
    NestedGroupEnd,
    SingleLine,
    NewLine,
    Prefix,
    Divider,
}

impl GlyphRole {
    pub const ALL: [GlyphRole; 10] = [
        GlyphRole::GroupStart,
        GlyphRole::GroupLine,
        GlyphRole::GroupEnd,
        GlyphRole::NestedGroupStart,
        GlyphRole::NestedGroupLine,
        GlyphRole::NestedGroupEnd,
        GlyphRole::SingleLine,
        GlyphRole::NewLine,
        GlyphRole::Prefix,
        GlyphRole::Divider,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GlyphRole::GroupStart => "group_start",
            GlyphRole::GroupLine => "group_line",
            GlyphRole::GroupEnd => "group_end",
            GlyphRole::NestedGroupStart => "nested_group_start",
            GlyphRole::NestedGroupLine => "nested_group_line",
            GlyphRole::NestedGroupEnd => "nested_group_end",
            GlyphRole::SingleLine => "single_line",
            GlyphRole::NewLine => "new_line",
            GlyphRole::Prefix => "prefix",
            GlyphRole::Divider => "divider",
        }
    }

    /// Kind handed to structural glyphs, which are resolved under their own name.
    fn group_kind(self) -> Option<LogKind> {
        match self {
            GlyphRole::GroupStart => Some(LogKind::GroupStart),
            GlyphRole::GroupLine => Some(LogKind::GroupLine),
            GlyphRole::GroupEnd => Some(LogKind::GroupEnd),
            GlyphRole::NestedGroupStart => Some(LogKind::NestedGroupStart),
            GlyphRole::NestedGroupLine => Some(LogKind::NestedGroupLine),
            GlyphRole::NestedGroupEnd => Some(LogKind::NestedGroupEnd),
            _ => None,
        }
    }
}

impl fmt::Display for GlyphRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlyphRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        GlyphRole::ALL
            .into_iter()
            .find(|role| normalize_name(role.as_str()) == wanted)
            .ok_or_else(|| format!("unknown glyph role '{s}'"))
    }
}

/// Function form of a glyph.
pub type GlyphFn = Arc<dyn Fn(&Context<'_>) -> String + Send + Sync>;

/// A literal glyph or one computed per call.
///
/// Computed glyphs run while the printer's state is locked and must not
/// print through the same printer.
#[derive(Clone)]
pub enum Glyph {
    Literal(String),
    Computed(GlyphFn),
}

impl Glyph {
    pub fn literal(text: impl Into<String>) -> Self {
        Glyph::Literal(text.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> String + Send + Sync + 'static,
    {
        Glyph::Computed(Arc::new(f))
    }

    #[must_use]
    pub fn resolve(&self, ctx: &Context<'_>) -> String {
        match self {
            Glyph::Literal(text) => text.clone(),
            Glyph::Computed(f) => f(ctx),
        }
    }
}

impl From<&str> for Glyph {
    fn from(text: &str) -> Self {
        Glyph::Literal(text.to_string())
    }
}

impl From<String> for Glyph {
    fn from(text: String) -> Self {
        Glyph::Literal(text)
    }
}

impl fmt::Debug for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Glyph::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Glyph::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// What computed glyphs and formatters get to look at.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub settings: &'a RenderSettings,
    pub state: &'a RenderState,
    pub kind: LogKind,
}

impl<'a> Context<'a> {
    pub fn new(settings: &'a RenderSettings, state: &'a RenderState, kind: LogKind) -> Self {
        Self {
            settings,
            state,
            kind,
        }
    }

    pub fn line_no(&self) -> usize {
        self.state.line_no()
    }

    pub fn depth(&self) -> usize {
        self.state.depth()
    }

    /// Same duration text the step footer uses.
    pub fn duration(&self, elapsed: Duration) -> String {
        format_duration(elapsed)
    }
}

/// Picks the glyphs for the current state.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    settings: &'a RenderSettings,
    state: &'a RenderState,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a RenderSettings, state: &'a RenderState) -> Self {
        Self { settings, state }
    }

    /// Resolve one glyph role for a line of `kind`.
    #[must_use]
    pub fn symbol(&self, role: GlyphRole, kind: LogKind) -> String {
        let ctx = Context::new(self.settings, self.state, kind);
        self.settings.symbols.get(role).resolve(&ctx)
    }

    fn group_symbol(&self, role: GlyphRole) -> String {
        self.symbol(role, role.group_kind().unwrap_or(LogKind::Log))
    }

    /// Vertical connectors for every ancestor above depth 2.
    #[must_use]
    pub fn ladder(&self) -> String {
        let mut unit = self.group_symbol(GlyphRole::NestedGroupLine);
        unit.pop();
        unit.repeat(self.state.depth().saturating_sub(2))
    }

    /// Glyph shown between the sequence number and the message.
    #[must_use]
    pub fn tree_glyph(&self, kind: LogKind) -> String {
        if let Some(frame) = self.state.spinner_frame() {
            return self.spinner_glyph(frame);
        }

        let transition = self.state.transition();
        match self.state.depth() {
            0 => self.symbol(GlyphRole::SingleLine, kind),
            1 => self.group_symbol(match transition {
                Transition::Opening => GlyphRole::GroupStart,
                Transition::Closing => GlyphRole::GroupEnd,
                Transition::None => GlyphRole::GroupLine,
            }),
            _ => {
                let role = match transition {
                    Transition::Opening => GlyphRole::NestedGroupStart,
                    Transition::Closing => GlyphRole::NestedGroupEnd,
                    Transition::None => GlyphRole::NestedGroupLine,
                };
                self.ladder() + &self.group_symbol(role)
            }
        }
    }

    /// Connector drawn in front of wrapped continuation lines inside a group.
    ///
    /// On a closing nested group the closing level is left blank and padded
    /// to the nested-line width so the text column does not move.
    #[must_use]
    pub fn group_connector(&self) -> String {
        let line = self.group_symbol(GlyphRole::GroupLine);
        let closing = self.state.transition() == Transition::Closing;

        match self.state.depth() {
            0 => String::new(),
            1 if closing => " ".repeat(measure_text_width(&line)),
            1 => line,
            _ if closing => {
                let nested_width = measure_text_width(&self.group_symbol(GlyphRole::NestedGroupLine));
                let pad = nested_width.saturating_sub(measure_text_width(&line));
                format!("{}{}{}", self.ladder(), line, " ".repeat(pad))
            }
            _ => self.ladder() + &self.group_symbol(GlyphRole::NestedGroupLine),
        }
    }

    /// Frame `index` of the configured spinner, wrapping around.
    #[must_use]
    pub fn spinner_glyph(&self, index: usize) -> String {
        let count = self.settings.spinner.frame_count();
        if count == 0 {
            return " ".to_string();
        }
        self.settings
            .spinner
            .frames
            .chars()
            .nth(index % count)
            .map(String::from)
            .unwrap_or_else(|| " ".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsPatch;

    fn plain_settings() -> RenderSettings {
        let mut settings = RenderSettings::default();
        settings.colored = false;
        settings
    }

    fn state_at(depth: usize, transition: Transition) -> RenderState {
        let mut state = RenderState::new();
        state.depth = depth;
        state.transition = transition;
        state
    }

    #[test]
    fn test_top_level_uses_single_line() {
        let settings = plain_settings();
        let state = state_at(0, Transition::None);
        assert_eq!(Resolver::new(&settings, &state).tree_glyph(LogKind::Info), "─");
    }

    #[test]
    fn test_depth_one_follows_transition() {
        let settings = plain_settings();
        let opening = state_at(1, Transition::Opening);
        let body = state_at(1, Transition::None);
        let closing = state_at(1, Transition::Closing);

        assert_eq!(Resolver::new(&settings, &opening).tree_glyph(LogKind::Log), "┌");
        assert_eq!(Resolver::new(&settings, &body).tree_glyph(LogKind::Log), "│");
        assert_eq!(Resolver::new(&settings, &closing).tree_glyph(LogKind::Log), "└");
    }

    #[test]
    fn test_nested_uses_nested_variants() {
        let settings = plain_settings();
        let opening = state_at(2, Transition::Opening);
        let closing = state_at(2, Transition::Closing);

        assert_eq!(Resolver::new(&settings, &opening).tree_glyph(LogKind::Log), "├─┬");
        assert_eq!(Resolver::new(&settings, &closing).tree_glyph(LogKind::Log), "│ └");
    }

    #[test]
    fn test_ladder_length_is_depth_minus_two() {
        let settings = plain_settings();
        for depth in 2..7 {
            let state = state_at(depth, Transition::None);
            let glyph = Resolver::new(&settings, &state).tree_glyph(LogKind::Log);
            let expected = format!("{}│ │", "│ ".repeat(depth - 2));
            assert_eq!(glyph, expected, "depth {depth}");
        }
    }

    #[test]
    fn test_spinner_frame_takes_precedence() {
        let settings = plain_settings();
        let mut state = state_at(3, Transition::None);
        state.spinner = Some(crate::spinner::ActiveSpinner::for_tests(2));

        let glyph = Resolver::new(&settings, &state).tree_glyph(LogKind::Log);
        assert_eq!(glyph, "⣻");
    }

    #[test]
    fn test_spinner_glyph_wraps_around() {
        let settings = plain_settings();
        let state = RenderState::new();
        let resolver = Resolver::new(&settings, &state);
        assert_eq!(resolver.spinner_glyph(0), resolver.spinner_glyph(8));
    }

    #[test]
    fn test_group_connector_pads_closing_nested_group() {
        let settings = plain_settings();
        let closing = state_at(2, Transition::Closing);
        let body = state_at(2, Transition::None);

        let closing_connector = Resolver::new(&settings, &closing).group_connector();
        let body_connector = Resolver::new(&settings, &body).group_connector();

        assert_eq!(closing_connector, "│  ");
        assert_eq!(body_connector, "│ │");
        assert_eq!(
            measure_text_width(&closing_connector),
            measure_text_width(&body_connector)
        );
    }

    #[test]
    fn test_group_connector_blank_when_closing_top_group() {
        let settings = plain_settings();
        let closing = state_at(1, Transition::Closing);
        assert_eq!(Resolver::new(&settings, &closing).group_connector(), " ");
    }

    #[test]
    fn test_computed_glyph_sees_context() {
        let mut settings = plain_settings();
        settings.apply(SettingsPatch::new().computed_symbol(GlyphRole::SingleLine, |ctx| {
            format!("{}@{}", ctx.kind, ctx.depth())
        }));
        let state = RenderState::new();

        assert_eq!(Resolver::new(&settings, &state).tree_glyph(LogKind::Warn), "warn@0");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("nestedGroupLine".parse::<GlyphRole>(), Ok(GlyphRole::NestedGroupLine));
        assert_eq!("new_line".parse::<GlyphRole>(), Ok(GlyphRole::NewLine));
        assert!("corner".parse::<GlyphRole>().is_err());
    }
}
