//! Render settings and partial configuration.
//!
//! [`RenderSettings`] holds everything a print call reads: spinner frames,
//! per-kind colors, glyphs and formatter functions. It is changed only by
//! merging a [`SettingsPatch`], section by section, so a patch that sets one
//! glyph never resets another.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::detection::DisplayContext;
use crate::error::{Error, Result};
use crate::glyph::{Context, Glyph, GlyphRole};
use crate::state::LogKind;
use crate::style::style;

/// Spinner frame presets. Each character of a preset is one frame.
pub const SPINNERS: [&str; 19] = [
    "⣾⣽⣻⢿⡿⣟⣯⣷",
    "←↖↑↗→↘↓↙",
    "⠁⠂⠄⡀⢀⠠⠐⠈",
    "▉▊▋▌▍▎▏▎▍▌▋▊▉",
    "▁▂▃▄▅▆▇█▇▆▅▄▃▂▁",
    "▖▘▝▗",
    "┤┘┴└├┌┬┐",
    "◢◣◤◥",
    "◰◳◲◱",
    "◴◷◶◵",
    "◐◓◑◒",
    "◡⊙◠",
    "bᓂqᓄ",
    "dᓇpᓀ",
    "d|b|",
    "q|p|",
    "ᓂ—ᓄ—",
    "ᓇ—ᓀ—",
    "|/—\\",
];

/// Default spinner redraw period.
pub const DEFAULT_SPINNER_PERIOD: Duration = Duration::from_millis(100);

/// Spinner animation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinnerSettings {
    /// One frame per character.
    pub frames: String,
    /// Time between redraws.
    pub period: Duration,
    /// When false, pending lines are held back and printed once they settle.
    pub animate: bool,
}

impl SpinnerSettings {
    pub fn frame_count(&self) -> usize {
        self.frames.chars().count()
    }
}

impl Default for SpinnerSettings {
    fn default() -> Self {
        Self {
            frames: SPINNERS[0].to_string(),
            period: DEFAULT_SPINNER_PERIOD,
            animate: true,
        }
    }
}

/// Style names applied to the prefix glyph of each kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colors(HashMap<LogKind, Vec<String>>);

impl Colors {
    /// Style names for `kind`; empty when the kind is uncolored.
    pub fn get(&self, kind: LogKind) -> &[String] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, kind: LogKind, names: Vec<String>) {
        self.0.insert(kind, names);
    }
}

impl Default for Colors {
    fn default() -> Self {
        let table: [(LogKind, &[&str]); 11] = [
            (LogKind::GroupStart, &["green"]),
            (LogKind::GroupEnd, &["blue"]),
            (LogKind::NestedGroupStart, &["green"]),
            (LogKind::NestedGroupEnd, &["blue"]),
            (LogKind::Info, &["blue"]),
            (LogKind::Start, &["green"]),
            (LogKind::Error, &["red"]),
            (LogKind::Warn, &["yellow"]),
            (LogKind::Del, &["red"]),
            (LogKind::Debug, &["magenta"]),
            (LogKind::Trace, &["cyan"]),
        ];

        Self(
            table
                .into_iter()
                .map(|(kind, names)| (kind, names.iter().map(|n| (*n).to_string()).collect()))
                .collect(),
        )
    }
}

/// Glyph for every role.
#[derive(Debug, Clone)]
pub struct Symbols {
    pub group_start: Glyph,
    pub group_line: Glyph,
    pub group_end: Glyph,
    pub nested_group_start: Glyph,
    pub nested_group_line: Glyph,
    pub nested_group_end: Glyph,
    pub single_line: Glyph,
    pub new_line: Glyph,
    pub prefix: Glyph,
    pub divider: Glyph,
}

impl Symbols {
    pub fn get(&self, role: GlyphRole) -> &Glyph {
        match role {
            GlyphRole::GroupStart => &self.group_start,
            GlyphRole::GroupLine => &self.group_line,
            GlyphRole::GroupEnd => &self.group_end,
            GlyphRole::NestedGroupStart => &self.nested_group_start,
            GlyphRole::NestedGroupLine => &self.nested_group_line,
            GlyphRole::NestedGroupEnd => &self.nested_group_end,
            GlyphRole::SingleLine => &self.single_line,
            GlyphRole::NewLine => &self.new_line,
            GlyphRole::Prefix => &self.prefix,
            GlyphRole::Divider => &self.divider,
        }
    }

    pub fn set(&mut self, role: GlyphRole, glyph: Glyph) {
        let slot = match role {
            GlyphRole::GroupStart => &mut self.group_start,
            GlyphRole::GroupLine => &mut self.group_line,
            GlyphRole::GroupEnd => &mut self.group_end,
            GlyphRole::NestedGroupStart => &mut self.nested_group_start,
            GlyphRole::NestedGroupLine => &mut self.nested_group_line,
            GlyphRole::NestedGroupEnd => &mut self.nested_group_end,
            GlyphRole::SingleLine => &mut self.single_line,
            GlyphRole::NewLine => &mut self.new_line,
            GlyphRole::Prefix => &mut self.prefix,
            GlyphRole::Divider => &mut self.divider,
        };
        *slot = glyph;
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            group_start: "┌".into(),
            group_line: "│".into(),
            group_end: "└".into(),
            nested_group_start: "├─┬".into(),
            nested_group_line: "│ │".into(),
            nested_group_end: "│ └".into(),
            single_line: "─".into(),
            new_line: "↳".into(),
            prefix: Glyph::computed(|ctx| {
                style(ctx.settings.colors.get(ctx.kind), "➤", ctx.settings.colored)
            }),
            divider: "─".into(),
        }
    }
}

pub type LineNumberFn = Arc<dyn Fn(&Context<'_>) -> String + Send + Sync>;
pub type StepStartFn = Arc<dyn Fn(&Context<'_>, &str) -> String + Send + Sync>;
pub type StepEndFn = Arc<dyn Fn(&Context<'_>, &str, Duration) -> String + Send + Sync>;

/// Text producers for sequence numbers and step headers/footers.
#[derive(Clone)]
pub struct Formatters {
    pub line_number: LineNumberFn,
    pub step_start: StepStartFn,
    pub step_end: StepEndFn,
}

impl Default for Formatters {
    fn default() -> Self {
        Self {
            line_number: Arc::new(|ctx| format!("{:04}:", ctx.line_no())),
            step_start: Arc::new(|_, name| format!("{name} step")),
            step_end: Arc::new(|ctx, _, elapsed| format!("Completed in {}", ctx.duration(elapsed))),
        }
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatters").finish_non_exhaustive()
    }
}

/// Everything a print call reads.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub spinner: SpinnerSettings,
    pub colors: Colors,
    pub symbols: Symbols,
    pub formatters: Formatters,
    /// Emit ANSI colors.
    pub colored: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            spinner: SpinnerSettings::default(),
            colors: Colors::default(),
            symbols: Symbols::default(),
            formatters: Formatters::default(),
            colored: true,
        }
    }
}

impl RenderSettings {
    /// Defaults adjusted by the environment (see [`SettingsPatch::from_env`]).
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply(SettingsPatch::from_env());
        settings
    }

    /// Merge a patch. Only fields present in the patch change.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(spinner) = patch.spinner {
            if let Some(frames) = spinner.frames {
                self.spinner.frames = frames;
            }
            if let Some(period) = spinner.period {
                self.spinner.period = period;
            }
            if let Some(animate) = spinner.animate {
                self.spinner.animate = animate;
            }
        }
        for (kind, names) in patch.colors {
            self.colors.set(kind, names);
        }
        for (role, glyph) in patch.symbols {
            self.symbols.set(role, glyph);
        }
        let formatters = patch.formatters;
        if let Some(f) = formatters.line_number {
            self.formatters.line_number = f;
        }
        if let Some(f) = formatters.step_start {
            self.formatters.step_start = f;
        }
        if let Some(f) = formatters.step_end {
            self.formatters.step_end = f;
        }
        if let Some(colored) = patch.colored {
            self.colored = colored;
        }
    }
}

/// Partial spinner settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpinnerPatch {
    pub frames: Option<String>,
    pub period: Option<Duration>,
    pub animate: Option<bool>,
}

/// Partial formatter settings.
#[derive(Clone, Default)]
pub struct FormattersPatch {
    pub line_number: Option<LineNumberFn>,
    pub step_start: Option<StepStartFn>,
    pub step_end: Option<StepEndFn>,
}

/// A partial [`RenderSettings`]; absent fields leave the live value alone.
#[derive(Clone, Default)]
pub struct SettingsPatch {
    pub spinner: Option<SpinnerPatch>,
    pub colors: HashMap<LogKind, Vec<String>>,
    pub symbols: HashMap<GlyphRole, Glyph>,
    pub formatters: FormattersPatch,
    pub colored: Option<bool>,
}

impl fmt::Debug for SettingsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsPatch")
            .field("spinner", &self.spinner)
            .field("colors", &self.colors)
            .field("symbols", &self.symbols)
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Values | Description |
    /// |----------|--------|-------------|
    /// | `LINEGROUP_FORCE_COLOR` | (set) | Colors and animation on |
    /// | `LINEGROUP_PLAIN` | (set) | Colors and animation off |
    /// | `NO_COLOR` | (set) | Colors and animation off (standard) |
    /// | `LINEGROUP_SPINNER` | 0-18 or frames | Spinner preset or literal frames |
    /// | `LINEGROUP_SPINNER_MS` | integer | Spinner period in milliseconds |
    #[must_use]
    pub fn from_env() -> Self {
        let human = DisplayContext::detect().is_human();
        let mut patch = Self::new().colored(human).animate(human);

        if let Ok(val) = env::var("LINEGROUP_SPINNER") {
            match val.parse::<usize>() {
                Ok(index) => match SPINNERS.get(index) {
                    Some(frames) => patch = patch.spinner_frames(*frames),
                    None => log::warn!(target: "linegroup::config", "no spinner preset {index}"),
                },
                Err(_) if !val.is_empty() => patch = patch.spinner_frames(val),
                Err(_) => {}
            }
        }
        if let Ok(val) = env::var("LINEGROUP_SPINNER_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => patch = patch.spinner_period(Duration::from_millis(ms)),
                _ => log::warn!(target: "linegroup::config", "ignoring LINEGROUP_SPINNER_MS={val}"),
            }
        }

        patch
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// colored = true
    ///
    /// [spinner]
    /// frames = "◐◓◑◒"
    /// period_ms = 80
    ///
    /// [colors]
    /// info = ["cyan", "bold"]
    ///
    /// [symbols]
    /// prefix = "$"
    /// ```
    ///
    /// Unknown kinds and roles are skipped with a warning.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(source).map_err(|err| Error::Config {
            source_name: "<inline>".to_string(),
            message: err.to_string(),
        })?;
        Ok(file.into_patch())
    }

    /// Read and parse a TOML settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let file: SettingsFile = toml::from_str(&source).map_err(|err| Error::Config {
            source_name: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(file.into_patch())
    }

    // ─────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────

    #[must_use]
    pub fn symbol(mut self, role: GlyphRole, glyph: impl Into<Glyph>) -> Self {
        self.symbols.insert(role, glyph.into());
        self
    }

    #[must_use]
    pub fn computed_symbol<F>(mut self, role: GlyphRole, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> String + Send + Sync + 'static,
    {
        self.symbols.insert(role, Glyph::computed(f));
        self
    }

    #[must_use]
    pub fn color<I, S>(mut self, kind: LogKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors.insert(kind, names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn spinner_frames(mut self, frames: impl Into<String>) -> Self {
        self.spinner.get_or_insert_with(SpinnerPatch::default).frames = Some(frames.into());
        self
    }

    #[must_use]
    pub fn spinner_period(mut self, period: Duration) -> Self {
        self.spinner.get_or_insert_with(SpinnerPatch::default).period = Some(period);
        self
    }

    #[must_use]
    pub fn animate(mut self, animate: bool) -> Self {
        self.spinner.get_or_insert_with(SpinnerPatch::default).animate = Some(animate);
        self
    }

    #[must_use]
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = Some(colored);
        self
    }

    #[must_use]
    pub fn line_number<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> String + Send + Sync + 'static,
    {
        self.formatters.line_number = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn step_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &str) -> String + Send + Sync + 'static,
    {
        self.formatters.step_start = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn step_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &str, Duration) -> String + Send + Sync + 'static,
    {
        self.formatters.step_end = Some(Arc::new(f));
        self
    }

    /// Layer `other` on top of this patch; fields set in `other` win.
    #[must_use]
    pub fn merge(mut self, other: SettingsPatch) -> Self {
        if let Some(theirs) = other.spinner {
            let ours = self.spinner.get_or_insert_with(SpinnerPatch::default);
            if theirs.frames.is_some() {
                ours.frames = theirs.frames;
            }
            if theirs.period.is_some() {
                ours.period = theirs.period;
            }
            if theirs.animate.is_some() {
                ours.animate = theirs.animate;
            }
        }
        self.colors.extend(other.colors);
        self.symbols.extend(other.symbols);
        if other.formatters.line_number.is_some() {
            self.formatters.line_number = other.formatters.line_number;
        }
        if other.formatters.step_start.is_some() {
            self.formatters.step_start = other.formatters.step_start;
        }
        if other.formatters.step_end.is_some() {
            self.formatters.step_end = other.formatters.step_end;
        }
        if other.colored.is_some() {
            self.colored = other.colored;
        }
        self
    }
}

// ─────────────────────────────────────────────────────────
// File Format
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    colored: Option<bool>,
    spinner: Option<SpinnerSection>,
    colors: HashMap<String, Vec<String>>,
    symbols: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpinnerSection {
    frames: Option<String>,
    preset: Option<usize>,
    period_ms: Option<u64>,
    animate: Option<bool>,
}

impl SettingsFile {
    fn into_patch(self) -> SettingsPatch {
        let mut patch = SettingsPatch::new();
        patch.colored = self.colored;

        if let Some(section) = self.spinner {
            let preset = section.preset.and_then(|i| {
                let frames = SPINNERS.get(i).map(|f| (*f).to_string());
                if frames.is_none() {
                    log::warn!(target: "linegroup::config", "no spinner preset {i}");
                }
                frames
            });
            patch.spinner = Some(SpinnerPatch {
                frames: section.frames.or(preset),
                period: section.period_ms.filter(|ms| *ms > 0).map(Duration::from_millis),
                animate: section.animate,
            });
        }

        for (name, names) in self.colors {
            match name.parse::<LogKind>() {
                Ok(kind) => {
                    patch.colors.insert(kind, names);
                }
                Err(err) => log::warn!(target: "linegroup::config", "{err}"),
            }
        }
        for (name, text) in self.symbols {
            match name.parse::<GlyphRole>() {
                Ok(role) => {
                    patch.symbols.insert(role, Glyph::Literal(text));
                }
                Err(err) => log::warn!(target: "linegroup::config", "{err}"),
            }
        }

        patch
    }
}
