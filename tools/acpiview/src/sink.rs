//! Terminal output for decoded tables.

use std::io::{self, Write};

use acpiview::{Sink, Style};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

fn colour(style: Style) -> Color {
    match style {
        Style::Error => Color::Red,
        Style::Warning | Style::Section => Color::Yellow,
        Style::Success => Color::Green,
    }
}

/// A sink writing to a terminal or pipe, colouring styled text.
///
/// The session only hands styles over when highlighting is enabled, so a
/// plain pipe never sees escape sequences unless `--colour` asked for them.
/// The first write error is kept and reported by [`TerminalSink::finish`];
/// later output is dropped.
pub struct TerminalSink<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TerminalSink<W> {
    /// Wraps `out`.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flushes the output and returns the first write error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Sink for TerminalSink<W> {
    fn emit(&mut self, text: &str, style: Option<Style>) {
        if self.error.is_some() {
            return;
        }
        let result = match style {
            Some(style) => queue!(
                self.out,
                SetForegroundColor(colour(style)),
                Print(text),
                ResetColor
            ),
            None => self.out.write_all(text.as_bytes()),
        };
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}
