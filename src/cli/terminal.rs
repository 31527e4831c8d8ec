//! Terminal width and colour helpers for command output.

use owo_colors::{Color, OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Shortens `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Styles for status output. Each falls back to plain text when stdout
/// has no colour support.
pub trait Colorize {
    /// Green.
    fn success(&self) -> String;
    /// Amber.
    fn warning(&self) -> String;
    /// Red.
    fn error(&self) -> String;
    /// Light blue.
    fn info(&self) -> String;
    /// Dimmed.
    fn dim(&self) -> String;
}

fn paint<C: Color>(text: &str) -> String {
    if supports_color() {
        text.fg::<C>().to_string()
    } else {
        text.to_string()
    }
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint::<css::Green>(self.as_ref())
    }

    fn warning(&self) -> String {
        paint::<css::Orange>(self.as_ref())
    }

    fn error(&self) -> String {
        paint::<css::Red>(self.as_ref())
    }

    fn info(&self) -> String {
        paint::<css::LightBlue>(self.as_ref())
    }

    fn dim(&self) -> String {
        let text = self.as_ref();
        if supports_color() {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}
