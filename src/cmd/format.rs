/*!
format.rs

Styling helpers for human-readable command output.

  - StyleOptions::detect() honours NO_COLOR / NO_EMOJI.
  - color(role, text, &StyleOptions) wraps text in an ANSI SGR sequence.
  - emoji(tag, &StyleOptions) returns a status glyph (or "" when disabled).

JSON output paths do not use these helpers.
*/

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
}

impl StyleOptions {
    pub fn detect() -> Self {
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Secondary,
    Success,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Secondary => "38;5;250", // gray
        Role::Success => "38;5;82",    // green
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        _ => "",
    }
}
