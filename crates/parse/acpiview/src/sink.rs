//! Output capability consumed by the decoder.

use alloc::string::String;

/// Highlight style requested for a piece of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// A detected error.
    Error,
    /// A detected warning.
    Warning,
    /// A table or structure section header.
    Section,
    /// A passing check.
    Success,
}

/// Destination for rendered table output.
///
/// Implementations may ignore `style` entirely; the decoder never relies on
/// it for correctness.
pub trait Sink {
    /// Emits `text` verbatim, optionally highlighted.
    fn emit(&mut self, text: &str, style: Option<Style>);
}

/// A sink that accumulates unstyled text in memory.
#[derive(Debug, Default, Clone)]
pub struct PlainSink {
    buf: String,
}

impl PlainSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything emitted so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consumes the sink, returning the accumulated text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }

    /// Discards the accumulated text.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Sink for PlainSink {
    fn emit(&mut self, text: &str, _style: Option<Style>) {
        self.buf.push_str(text);
    }
}
