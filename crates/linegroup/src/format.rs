//! Line formatting: label composition and message wrapping.
//!
//! A rendered line is `label + " " + message`, where the label is the
//! prefix glyph, the sequence number and the tree glyph. Messages longer
//! than the space left next to the label are hard-wrapped; continuation
//! lines start under the tree-glyph column with the new-line glyph so the
//! text column never moves.

use std::time::Duration;

use console::measure_text_width;

use crate::config::RenderSettings;
use crate::glyph::{Context, GlyphRole, Resolver};
use crate::state::{LogKind, RenderState, Transition};

/// Columns kept free to the right of every wrapped fragment.
const WRAP_MARGIN: usize = 3;

/// Renders lines for one snapshot of settings and state.
pub struct LineFormatter<'a> {
    settings: &'a RenderSettings,
    state: &'a RenderState,
    width: usize,
}

impl<'a> LineFormatter<'a> {
    /// `width` is the terminal width in columns.
    pub fn new(settings: &'a RenderSettings, state: &'a RenderState, width: usize) -> Self {
        Self {
            settings,
            state,
            width,
        }
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.settings, self.state)
    }

    fn context(&self, kind: LogKind) -> Context<'a> {
        Context::new(self.settings, self.state, kind)
    }

    /// Whether the current line shows its sequence number.
    fn shows_number(&self) -> bool {
        self.state.depth() == 0 || self.state.transition() == Transition::Opening
    }

    /// Sequence number text, or blank space of the same width.
    #[must_use]
    pub fn line_number(&self, kind: LogKind) -> String {
        let number = (self.settings.formatters.line_number)(&self.context(kind));
        if self.shows_number() {
            number
        } else {
            " ".repeat(measure_text_width(&number))
        }
    }

    /// Prefix glyph and sequence number, before the tree glyph.
    fn head(&self, kind: LogKind) -> String {
        let prefix = self.resolver().symbol(GlyphRole::Prefix, kind);
        let number = self.line_number(kind);
        if self.shows_number() {
            format!("{prefix} {number}")
        } else {
            // Blank heads keep the column, not the prefix color.
            format!("{} {number}", " ".repeat(measure_text_width(&prefix)))
        }
    }

    /// Prefix, sequence number and tree glyph.
    #[must_use]
    pub fn label(&self, kind: LogKind) -> String {
        format!("{} {}", self.head(kind), self.resolver().tree_glyph(kind))
    }

    /// Text preceding the new-line glyph on wrapped lines.
    #[must_use]
    pub fn continuation(&self, kind: LogKind) -> String {
        let head_width = measure_text_width(&self.head(kind));
        let resolver = self.resolver();

        if self.state.depth() > 0 {
            let connector = if self.state.is_spinning() {
                " ".to_string()
            } else {
                resolver.group_connector()
            };
            format!("{} {connector}", " ".repeat(head_width))
        } else {
            let icon_width = measure_text_width(&resolver.tree_glyph(kind));
            " ".repeat(head_width + 1 + icon_width)
        }
    }

    /// Columns available for message text next to `label`.
    #[must_use]
    pub fn message_width(&self, label: &str) -> usize {
        self.width
            .saturating_sub(measure_text_width(label))
            .saturating_sub(WRAP_MARGIN)
            .max(1)
    }

    /// Trim each line of `message`, wrap it and join with continuation markers.
    ///
    /// Lines that are empty after trimming produce no rows.
    #[must_use]
    pub fn wrap_message(&self, kind: LogKind, label: &str, message: &str) -> String {
        let max_width = self.message_width(label);
        let fragments: Vec<String> = message
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .flat_map(|line| wrap(line, max_width))
            .collect();

        let separator = format!(
            "\n{} {} ",
            self.continuation(kind),
            self.resolver().symbol(GlyphRole::NewLine, kind)
        );
        fragments.join(&separator)
    }

    /// Full line for `message`. A blank message yields the label alone.
    #[must_use]
    pub fn render(&self, kind: LogKind, message: &str) -> String {
        let label = self.label(kind);
        if message.trim().is_empty() {
            return label;
        }
        let body = self.wrap_message(kind, &label, message);
        format!("{label} {body}")
    }

    /// Divider glyph repeated across the label width, then the message.
    #[must_use]
    pub fn render_divider(&self, kind: LogKind, message: &str) -> String {
        let label = self.label(kind);
        let glyph = self.resolver().symbol(GlyphRole::Divider, kind);
        let count = measure_text_width(&label) / measure_text_width(&glyph).max(1);
        let rule = glyph.repeat(count);
        if message.trim().is_empty() {
            return rule;
        }
        let body = self.wrap_message(kind, &label, message);
        format!("{rule} {body}")
    }
}

/// Hard-wrap one line so no fragment is wider than `max_width` columns.
///
/// ANSI escape sequences are carried along and count as zero width. An
/// empty line yields a single empty fragment.
#[must_use]
pub fn wrap(line: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            current.push(c);
            if chars.peek() == Some(&'[') {
                for next in chars.by_ref() {
                    current.push(next);
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }

        let width = measure_text_width(c.encode_utf8(&mut [0; 4]));
        if current_width + width > max_width && current_width > 0 {
            fragments.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += width;
    }

    if !current.is_empty() || fragments.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Elapsed-time text used by step footers.
///
/// Above one minute: `"{m}m"` or `"{m}m {s}s"` with seconds rounded up.
/// Otherwise `"{s}s"` or `"{s}s {ms}ms"`.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();

    if millis > 60_000 {
        let mut minutes = millis / 60_000;
        let mut seconds = (millis % 60_000).div_ceil(1000);
        if seconds == 60 {
            minutes += 1;
            seconds = 0;
        }
        if seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    } else {
        let seconds = millis / 1000;
        let rest = millis % 1000;
        if rest == 0 {
            format!("{seconds}s")
        } else {
            format!("{seconds}s {rest}ms")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsPatch;

    fn settings() -> RenderSettings {
        let mut settings = RenderSettings::default();
        settings.colored = false;
        settings
    }

    #[test]
    fn test_top_level_line_layout() {
        let settings = settings();
        let mut state = RenderState::new();
        state.line_no = 7;

        let line = LineFormatter::new(&settings, &state, 80).render(LogKind::Info, "hello");
        assert_eq!(line, "➤ 0007: ─ hello");
    }

    #[test]
    fn test_empty_message_is_label_only() {
        let settings = settings();
        let state = RenderState::new();

        let line = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "");
        assert_eq!(line, "➤ 0001: ─");
    }

    #[test]
    fn test_group_body_hides_number() {
        let settings = settings();
        let mut state = RenderState::new();
        state.depth = 1;

        let line = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "body");
        assert_eq!(line, "        │ body");
    }

    #[test]
    fn test_opening_shows_number() {
        let settings = settings();
        let mut state = RenderState::new();
        state.depth = 1;
        state.transition = Transition::Opening;

        let line = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "head");
        assert_eq!(line, "➤ 0001: ┌ head");
    }

    #[test]
    fn test_wrap_count_is_ceiling() {
        let settings = settings();
        let state = RenderState::new();
        let formatter = LineFormatter::new(&settings, &state, 40);
        let label = formatter.label(LogKind::Log);
        let max = formatter.message_width(&label);
        assert_eq!(max, 40 - 9 - 3);

        let message = "x".repeat(max * 2 + 5);
        let rendered = formatter.render(LogKind::Log, &message);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), (message.len()).div_ceil(max));
        for line in &lines[1..] {
            assert!(line.trim_start().starts_with('↳'), "{line:?}");
        }
    }

    #[test]
    fn test_continuation_aligns_under_glyph_column() {
        let settings = settings();
        let state = RenderState::new();
        let formatter = LineFormatter::new(&settings, &state, 20);

        let rendered = formatter.render(LogKind::Log, "abcdefghijk");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "➤ 0001: ─ abcdefgh");
        assert_eq!(lines[1], "          ↳ ijk");
    }

    #[test]
    fn test_continuation_in_group_uses_connector() {
        let settings = settings();
        let mut state = RenderState::new();
        state.depth = 1;
        let formatter = LineFormatter::new(&settings, &state, 20);

        let rendered = formatter.render(LogKind::Log, "abcdefghijk");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "        │ ↳ ijk");
    }

    #[test]
    fn test_explicit_newlines_are_trimmed() {
        let settings = settings();
        let state = RenderState::new();
        let rendered = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "a  \n   b");
        assert_eq!(rendered, "➤ 0001: ─ a\n          ↳ b");
    }

    #[test]
    fn test_trailing_newline_adds_no_row() {
        let settings = settings();
        let state = RenderState::new();
        let rendered = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "done\n");
        assert_eq!(rendered, "➤ 0001: ─ done");
    }

    #[test]
    fn test_blank_lines_inside_message_are_skipped() {
        let settings = settings();
        let state = RenderState::new();
        let formatter = LineFormatter::new(&settings, &state, 80);

        assert_eq!(formatter.render(LogKind::Log, "a\n\nb"), "➤ 0001: ─ a\n          ↳ b");
        assert_eq!(formatter.render(LogKind::Log, "a\n   \nb\n"), "➤ 0001: ─ a\n          ↳ b");
    }

    #[test]
    fn test_whitespace_message_is_label_only() {
        let settings = settings();
        let state = RenderState::new();
        let formatter = LineFormatter::new(&settings, &state, 80);

        assert_eq!(formatter.render(LogKind::Log, "   "), "➤ 0001: ─");
        assert_eq!(formatter.render(LogKind::Log, "\n \n"), "➤ 0001: ─");
    }

    #[test]
    fn test_divider_spans_label() {
        let settings = settings();
        let state = RenderState::new();
        let line = LineFormatter::new(&settings, &state, 80).render_divider(LogKind::Divider, "Next");
        assert_eq!(line, format!("{} Next", "─".repeat(9)));
    }

    #[test]
    fn test_custom_line_number_formatter() {
        let mut settings = settings();
        settings.apply(SettingsPatch::new().line_number(|ctx| format!("[{}]", ctx.line_no())));
        let state = RenderState::new();

        let line = LineFormatter::new(&settings, &state, 80).render(LogKind::Log, "x");
        assert_eq!(line, "➤ [1] ─ x");
    }

    #[test]
    fn test_wrap_plain() {
        assert_eq!(wrap("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap("", 4), vec![String::new()]);
        assert_eq!(wrap("abcd", 4), vec!["abcd"]);
    }

    #[test]
    fn test_wrap_skips_ansi_width() {
        let colored = "\u{1b}[31mabcd\u{1b}[0m";
        let fragments = wrap(colored, 4);
        assert_eq!(fragments.len(), 1);
        assert_eq!(measure_text_width(&fragments[0]), 4);
    }

    #[test]
    fn test_wrap_wide_chars() {
        let fragments = wrap("日本語", 4);
        assert_eq!(fragments, vec!["日本", "語"]);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s 500ms");
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(60)), "60s");
        assert_eq!(format_duration(Duration::from_millis(61_200)), "1m 2s");
        assert_eq!(format_duration(Duration::from_secs(180)), "3m");
        assert_eq!(format_duration(Duration::from_millis(119_500)), "2m");
    }
}
