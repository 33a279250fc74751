//! Color application.

use console::Style;

/// Apply each style name in order (`console` dotted names such as `red`,
/// `green.bold` or `on_blue`). Returns `text` untouched when `enabled` is
/// false or no names are given.
pub fn style<S: AsRef<str>>(names: &[S], text: &str, enabled: bool) -> String {
    if !enabled || names.is_empty() {
        return text.to_string();
    }

    let style = names
        .iter()
        .fold(Style::new(), |acc, name| merge(acc, name.as_ref()))
        .force_styling(true);
    style.apply_to(text).to_string()
}

/// Layer one dotted name on top of `acc`.
fn merge(acc: Style, name: &str) -> Style {
    let mut style = acc;
    for part in name.split('.').filter(|p| !p.is_empty()) {
        style = apply_part(style, part);
    }
    style
}

fn apply_part(style: Style, part: &str) -> Style {
    match part {
        "black" => style.black(),
        "red" => style.red(),
        "green" => style.green(),
        "yellow" => style.yellow(),
        "blue" => style.blue(),
        "magenta" => style.magenta(),
        "cyan" => style.cyan(),
        "white" => style.white(),
        "on_black" => style.on_black(),
        "on_red" => style.on_red(),
        "on_green" => style.on_green(),
        "on_yellow" => style.on_yellow(),
        "on_blue" => style.on_blue(),
        "on_magenta" => style.on_magenta(),
        "on_cyan" => style.on_cyan(),
        "on_white" => style.on_white(),
        "bright" => style.bright(),
        "on_bright" => style.on_bright(),
        "bold" => style.bold(),
        "dim" => style.dim(),
        "italic" => style.italic(),
        "underlined" => style.underlined(),
        "blink" => style.blink(),
        "reverse" => style.reverse(),
        "hidden" => style.hidden(),
        "strikethrough" => style.strikethrough(),
        other => match other.parse::<u8>() {
            Ok(color) => style.color256(color),
            Err(_) => style,
        },
    }
}
