//! Field descriptors and the default value renderers.
//!
//! A [`Field`] describes one fixed-width value inside a record. Descriptor
//! lists are plain `const` arrays built with the `const fn` builder methods,
//! so a descriptor that asks for both a format and a custom renderer fails at
//! compile time rather than being silently resolved at decode time.

use core::any::Any;
use core::fmt;

use crate::bytes::FromBytes;
use crate::session::Session;

/// Custom renderer for a field value.
///
/// Receives the descriptor's optional format and exactly `length` bytes of
/// field data.
pub type Renderer = fn(&mut Session<'_>, Option<Format>, &[u8]);

/// Opaque value handed to a [`Validator`], recovered with `downcast_ref`.
pub type ValidatorContext = &'static (dyn Any + Send + Sync);

/// Semantic check run on a field's data after it has been rendered.
///
/// The last argument is the descriptor's opaque validation context.
pub type Validator = fn(&mut Session<'_>, &[u8], Option<ValidatorContext>);

/// Display format for integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `0x` followed by lowercase hex digits.
    Hex,
    /// `0x` followed by uppercase hex digits.
    HexUpper,
    /// Unsigned decimal.
    Decimal,
}

impl Format {
    /// Renders `value` in this format.
    pub fn print(self, session: &mut Session<'_>, value: u64) {
        match self {
            Self::Hex => session.print(format_args!("0x{value:x}")),
            Self::HexUpper => session.print(format_args!("0x{value:X}")),
            Self::Decimal => session.print(format_args!("{value}")),
        }
    }
}

/// How a traced field's value is rendered.
#[derive(Clone, Copy)]
pub enum Render {
    /// Only the field label is traced.
    Label,
    /// A 1, 2, 4 or 8 byte little-endian integer in the given format.
    Format(Format),
    /// A custom renderer, optionally parameterised by a format.
    Custom {
        /// Renderer invoked with the field data.
        renderer: Renderer,
        /// Format handed to the renderer.
        format: Option<Format>,
    },
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => f.write_str("Label"),
            Self::Format(format) => f.debug_tuple("Format").field(format).finish(),
            Self::Custom { format, .. } => f
                .debug_struct("Custom")
                .field("format", format)
                .finish_non_exhaustive(),
        }
    }
}

/// Descriptor for one field of a fixed-layout record.
#[derive(Clone, Copy)]
pub struct Field {
    name: Option<&'static str>,
    length: usize,
    offset: usize,
    render: Render,
    capture: bool,
    validator: Option<Validator>,
    context: Option<ValidatorContext>,
}

impl Field {
    /// Creates a labelled field of `length` bytes declared at `offset`.
    #[must_use]
    pub const fn new(name: &'static str, length: usize, offset: usize) -> Self {
        Self {
            name: Some(name),
            length,
            offset,
            render: Render::Label,
            capture: false,
            validator: None,
            context: None,
        }
    }

    /// Creates an unlabelled field, never traced.
    ///
    /// Used by lookahead lists that only harvest captured values.
    #[must_use]
    pub const fn hidden(length: usize, offset: usize) -> Self {
        let mut field = Self::new("", length, offset);
        field.name = None;
        field
    }

    /// Renders the value as an integer in `format`.
    ///
    /// # Panics
    ///
    /// Panics (at compile time for `const` descriptors) if a renderer was
    /// already set.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        assert!(
            matches!(self.render, Render::Label),
            "field already has a format or renderer"
        );
        self.render = Render::Format(format);
        self
    }

    /// Renders the value with a custom renderer.
    ///
    /// # Panics
    ///
    /// Panics if a format or renderer was already set.
    #[must_use]
    pub const fn renderer(self, renderer: Renderer) -> Self {
        self.render_with(renderer, None)
    }

    /// Renders the value with a custom renderer that receives `format`.
    ///
    /// # Panics
    ///
    /// Panics if a format or renderer was already set.
    #[must_use]
    pub const fn render_with(mut self, renderer: Renderer, format: Option<Format>) -> Self {
        assert!(
            matches!(self.render, Render::Label),
            "field already has a format or renderer"
        );
        self.render = Render::Custom { renderer, format };
        self
    }

    /// Records where this field lies so the caller can read it back.
    #[must_use]
    pub const fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Attaches a semantic validator.
    #[must_use]
    pub const fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attaches a validator together with its context value.
    #[must_use]
    pub const fn validate_with(
        mut self,
        validator: Validator,
        context: ValidatorContext,
    ) -> Self {
        self.validator = Some(validator);
        self.context = Some(context);
        self
    }

    /// Returns the display label, or `None` for hidden fields.
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Returns the field width in bytes.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns the declared byte offset.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the rendering strategy.
    #[must_use]
    pub const fn render(&self) -> Render {
        self.render
    }

    /// Returns `true` if the field location is captured.
    #[must_use]
    pub const fn captures(&self) -> bool {
        self.capture
    }

    /// Returns the validator, if any.
    #[must_use]
    pub const fn validator(&self) -> Option<Validator> {
        self.validator
    }

    /// Returns the validation context, if any.
    #[must_use]
    pub const fn context(&self) -> Option<ValidatorContext> {
        self.context
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("offset", &self.offset)
            .field("render", &self.render)
            .field("capture", &self.capture)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Location of a captured field inside the decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldView<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> FieldView<'a> {
    pub(crate) fn new(offset: usize, bytes: &'a [u8]) -> Self {
        Self { offset, bytes }
    }

    /// Byte offset of the field from the start of the decoded buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The field's bytes.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Reads the field as a little-endian value.
    ///
    /// Returns `None` if the field is narrower than `T`.
    #[must_use]
    pub fn read<T: FromBytes>(&self) -> Option<T> {
        T::read_from(self.bytes)
    }
}

/// Renders a little-endian integer of 1, 2, 4 or 8 bytes.
///
/// Returns `false` without printing anything for any other width.
pub fn print_uint(session: &mut Session<'_>, format: Format, data: &[u8]) -> bool {
    let value = match data.len() {
        1 => u8::read_from(data).map(u64::from),
        2 => u16::read_from(data).map(u64::from),
        4 => u32::read_from(data).map(u64::from),
        8 => u64::read_from(data),
        _ => None,
    };
    match value {
        Some(value) => {
            format.print(session, value);
            true
        }
        None => false,
    }
}

/// Renders `N` bytes as characters, or as space-separated hex bytes when
/// given [`Format::Hex`] or [`Format::HexUpper`].
pub fn dump_chars<const N: usize>(session: &mut Session<'_>, format: Option<Format>, data: &[u8]) {
    let bytes = data.get(..N).unwrap_or(data);
    for (index, &byte) in bytes.iter().enumerate() {
        match format {
            Some(Format::Hex) => session.print(format_args!("{byte:x}")),
            Some(Format::HexUpper) => session.print(format_args!("{byte:X}")),
            Some(Format::Decimal) => session.print(format_args!("{byte}")),
            None => session.print(format_args!("{}", char::from(byte))),
        }
        if format.is_some() && index + 1 < bytes.len() {
            session.print(format_args!(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::Config;
    use crate::sink::PlainSink;

    fn render(f: impl FnOnce(&mut Session<'_>)) -> std::string::String {
        let mut sink = PlainSink::new();
        let mut session = Session::new(&mut sink, Config::default());
        f(&mut session);
        sink.into_string()
    }

    #[test]
    fn integer_widths() {
        assert_eq!(render(|s| assert!(print_uint(s, Format::Hex, &[0x2A]))), "0x2a");
        assert_eq!(
            render(|s| assert!(print_uint(s, Format::Decimal, &[0x18, 0x00]))),
            "24"
        );
        assert_eq!(
            render(|s| assert!(print_uint(s, Format::HexUpper, &[0xEF, 0xBE, 0xAD, 0xDE]))),
            "0xDEADBEEF"
        );
        assert_eq!(
            render(|s| assert!(print_uint(s, Format::Hex, &[0, 0, 0, 0, 1, 0, 0, 0]))),
            "0x100000000"
        );
    }

    #[test]
    fn odd_width_is_rejected() {
        assert_eq!(render(|s| assert!(!print_uint(s, Format::Hex, &[1, 2, 3]))), "");
    }

    #[test]
    fn chars_plain_and_hex() {
        assert_eq!(render(|s| dump_chars::<4>(s, None, b"APIC")), "APIC");
        assert_eq!(
            render(|s| dump_chars::<3>(s, Some(Format::Hex), &[0x0, 0xAB, 0x1])),
            "0 ab 1"
        );
    }

    #[test]
    fn builder_sets_components() {
        const FIELD: Field = Field::new("Flags", 4, 8).format(Format::Hex).capture();
        assert_eq!(FIELD.name(), Some("Flags"));
        assert_eq!(FIELD.length(), 4);
        assert_eq!(FIELD.offset(), 8);
        assert!(FIELD.captures());
        assert!(matches!(FIELD.render(), Render::Format(Format::Hex)));
        assert!(FIELD.validator().is_none());

        const HIDDEN: Field = Field::hidden(1, 0);
        assert_eq!(HIDDEN.name(), None);
    }

    #[test]
    #[should_panic(expected = "already has a format or renderer")]
    fn format_and_renderer_are_exclusive() {
        let _ = Field::new("Oem ID", 6, 10)
            .renderer(dump_chars::<6>)
            .format(Format::Hex);
    }

    #[test]
    fn captured_view_reads_value() {
        let data = [0x01, 0x18];
        let view = FieldView::new(1, &data[1..2]);
        assert_eq!(view.offset(), 1);
        assert_eq!(view.read::<u8>(), Some(24));
        assert_eq!(view.read::<u16>(), None);
    }
}
