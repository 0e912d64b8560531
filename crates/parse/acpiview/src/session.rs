//! Per-invocation decoder state.
//!
//! A [`Session`] replaces the global indent, counters and output handle a
//! firmware shell tool would keep in statics. Every decode operation borrows
//! the session mutably, so two sessions over independent buffers never share
//! state.

use alloc::fmt;

use crate::config::Config;
use crate::counters::Counters;
use crate::sink::{Sink, Style};

/// Column at which field values start in traced output.
pub const OUTPUT_FIELD_COLUMN_WIDTH: usize = 36;

/// Indent applied to the entries of the table breakdown.
pub const INSTANCE_COUNT_INDENT: usize = 2;

/// Decoder context threaded through every interpreter and dispatcher call.
pub struct Session<'s> {
    sink: &'s mut dyn Sink,
    config: Config,
    counters: Counters,
    indent: usize,
}

impl<'s> Session<'s> {
    /// Creates a session writing to `sink`.
    pub fn new(sink: &'s mut dyn Sink, config: Config) -> Self {
        Self {
            sink,
            config,
            counters: Counters::default(),
            indent: 0,
        }
    }

    /// Returns the configuration this session was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `true` if consistency checking is enabled.
    #[must_use]
    pub fn consistency_checking(&self) -> bool {
        self.config.consistency_checking
    }

    /// Returns a snapshot of the error and warning counts.
    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Returns the error and warning counts for direct updates.
    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    /// Resets the error and warning counts.
    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Returns the current nesting indent.
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Runs `f` with the nesting indent increased by `extra`.
    ///
    /// The previous indent is restored when `f` returns.
    pub fn indented<R>(&mut self, extra: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.indent;
        self.indent = saved.saturating_add(extra);
        let result = f(self);
        self.indent = saved;
        result
    }

    /// Emits formatted text without highlighting.
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        self.emit(args, None);
    }

    /// Emits formatted text, highlighted when the configuration asks for it.
    pub fn print_styled(&mut self, style: Style, args: fmt::Arguments<'_>) {
        let style = self.config.highlight.then_some(style);
        self.emit(args, style);
    }

    /// Records an error and emits `ERROR: <message>` on its own line.
    pub fn error(&mut self, args: fmt::Arguments<'_>) {
        self.counters.increment_error();
        self.print_styled(Style::Error, format_args!("ERROR: {args}\n"));
    }

    /// Records a warning and emits `WARNING: <message>` on its own line.
    pub fn warning(&mut self, args: fmt::Arguments<'_>) {
        self.counters.increment_warning();
        self.print_styled(Style::Warning, format_args!("WARNING: {args}\n"));
    }

    /// Emits a field label padded to the value column.
    ///
    /// `indent` is added to the session's nesting indent.
    pub fn print_field_name(&mut self, indent: usize, name: &str) {
        let pad = self.indent.saturating_add(indent);
        let width = OUTPUT_FIELD_COLUMN_WIDTH.saturating_sub(pad);
        self.print(format_args!("{:pad$}{name:<width$} : ", ""));
    }

    fn emit(&mut self, args: fmt::Arguments<'_>, style: Option<Style>) {
        match args.as_str() {
            Some(text) => self.sink.emit(text, style),
            None => self.sink.emit(&fmt::format(args), style),
        }
    }
}
