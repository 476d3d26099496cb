//! Module for parsing JSON data
//!
//! [`JsonPushParser`] parses a JSON document directly inside a caller-supplied
//! byte buffer and reports grammar events to a [`JsonEventHandler`]. Member
//! names, string values and numbers are decoded *in place*, so the byte slices
//! handed to the handler point into the caller's buffer and no heap allocation
//! is performed. Streaming input is supported by pulling more bytes from a
//! [`Read`](std::io::Read) source into the buffer whenever the already parsed
//! prefix can be recycled.

use std::ops::Range;

use thiserror::Error;

mod push_parser;
// Re-export push parser implementation under `reader` module
pub use push_parser::*;

/// Describes why parsing failed
///
/// The kinds fall into three categories: grammar errors (the `Expecting*`
/// kinds, [`InvalidEscapeSequence`](Self::InvalidEscapeSequence),
/// [`UnescapedControlCharacter`](Self::UnescapedControlCharacter) and the
/// UTF-8 kinds) for malformed input, resource errors
/// ([`NestingTooDeep`](Self::NestingTooDeep),
/// [`BufferTooShort`](Self::BufferTooShort),
/// [`OutOfMemory`](Self::OutOfMemory),
/// [`ElementTooLong`](Self::ElementTooLong),
/// [`RefillFailure`](Self::RefillFailure)) for limits being hit, and
/// [`Aborted`](Self::Aborted) for a handler asking to stop.
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, strum::IntoStaticStr, Debug)]
pub enum ErrorKind {
    /// A handler returned `false` to cancel parsing
    Aborted,
    /// Data other than whitespace follows the top-level value
    ExpectingEndOfInput,
    /// A JSON value was expected but something else (or the end of the input) was encountered
    ExpectingValue,
    /// An object was expected but its opening `{` is missing
    ExpectingOpeningCurlyBracket,
    /// An object member or the closing `}` of an object was expected but something else was encountered
    ExpectingClosingCurlyBracket,
    /// The `:` between a member name and the member value is missing
    ExpectingColon,
    /// An array was expected but its opening `[` is missing
    ExpectingOpeningSquareBracket,
    /// An array element or the closing `]` of an array was expected but something else was encountered
    ExpectingClosingSquareBracket,
    /// A member name was expected but its opening `"` is missing
    ExpectingOpeningQuote,
    /// The input ended inside a member name or string value
    ExpectingClosingQuote,
    /// A number was expected, for example after a standalone `-`
    ExpectingNumber,
    /// A number has a `.` which is not followed by a digit
    ExpectingFractionDigits,
    /// A number has an `e` / `E` which is not followed by a digit
    ExpectingExponentDigits,
    /// A literal starting with `n` is not `null`
    ExpectingNull,
    /// A literal starting with `t` is not `true`
    ExpectingTrue,
    /// A literal starting with `f` is not `false`
    ExpectingFalse,
    /// An unknown escape (`\x`), a malformed `\uXXXX` escape or an escape denoting
    /// a code point above U+10FFFF was encountered
    InvalidEscapeSequence,
    /// A control character in the range U+0000 to U+001F appeared unescaped
    /// inside a member name or string value
    UnescapedControlCharacter,
    /// A `\u0000` escape decoded to U+0000, which is not
    /// [allowed by the parser settings](ParserSettings::allow_null_in_string)
    ForbiddenNullInString,
    /// The nesting depth exceeded [`ParserSettings::nesting_depth_max`]
    NestingTooDeep,
    /// A literal NUL byte appeared in the input
    ///
    /// Unlike [`ForbiddenNullInString`](Self::ForbiddenNullInString) this is
    /// always fatal, regardless of the parser settings.
    InlineNullByte,
    /// A byte which is neither ASCII nor a valid UTF-8 multi-byte start byte
    /// was encountered where a new character was expected
    InvalidUTF8StartByte,
    /// A UTF-8 multi-byte character is not followed by enough continuation bytes
    InvalidUTF8ContinuationByte,
    /// The parse buffer cannot hold any input at all
    BufferTooShort,
    /// A transient allocation needed during parsing could not be made
    ///
    /// This parser converts number tokens directly from the parse buffer and
    /// therefore does not produce this kind; it is kept so the taxonomy is
    /// stable for callers which share error handling with other decoders.
    OutOfMemory,
    /// A single token is larger than the whole parse buffer, so no shift can
    /// free up space for the rest of it
    ElementTooLong,
    /// The input source reported an error while refilling the parse buffer
    RefillFailure,
}

impl ErrorKind {
    /// The identifier of this error kind as a static string, for example `"NestingTooDeep"`
    pub fn name(&self) -> &'static str {
        (*self).into()
    }
}

/// Error which occurred while parsing a JSON document
///
/// Once returned, the parsing session is over; no recovery is attempted and
/// no further handler methods are invoked.
#[derive(Error, PartialEq, Eq, Clone, Debug)]
#[error("JSON parse error {kind} at byte {}", .unparsed.start)]
pub struct ParseError {
    /// Kind of the error
    pub kind: ErrorKind,
    /// Index range of the parse buffer covering the input which had not been
    /// successfully parsed when the error was detected
    ///
    /// Since the parser may have shifted buffer contents while streaming, the
    /// range indexes the buffer state at the time of failure, not the
    /// original input; it is intended for displaying a diagnostic region.
    pub unparsed: Range<usize>,
}

/// Settings to customize the JSON parser behavior
///
/// These settings are used by [`JsonPushParser::new_custom`] and
/// [`JsonPushParser::streaming_custom`]. To avoid repeating the default
/// values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use bufson::reader::ParserSettings;
/// ParserSettings {
///     nesting_depth_max: 10,
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
pub struct ParserSettings {
    /// Maximum number of JSON arrays and objects which may be open at the same time
    ///
    /// The parser descends recursively into nested containers, so this limit
    /// also bounds its call stack usage. Exceeding the limit fails with
    /// [`ErrorKind::NestingTooDeep`].
    pub nesting_depth_max: u32,

    /// Whether a `\u0000` escape may decode to U+0000 in member names and string values
    ///
    /// Token bytes are often handed on to consumers which treat NUL as a
    /// terminator; keeping this disabled guarantees decoded tokens are
    /// NUL-free. When disabled, a `\u0000` escape fails with
    /// [`ErrorKind::ForbiddenNullInString`]. A literal NUL byte in the input
    /// is rejected with [`ErrorKind::InlineNullByte`] no matter how this is
    /// set.
    pub allow_null_in_string: bool,
}

impl Default for ParserSettings {
    /// Creates the default JSON parser settings
    ///
    /// - maximum nesting depth: 128
    /// - U+0000 in strings: disallowed
    fn default() -> Self {
        ParserSettings {
            nesting_depth_max: 128,
            allow_null_in_string: false,
        }
    }
}

/// A JSON number token, refined by the conversion the token admits
///
/// The refinement follows the shape of the token: integer tokens convert to
/// [`U64`](Self::U64) (or [`I64`](Self::I64) when negative), tokens with a
/// fraction or exponent convert to [`F64`](Self::F64). A token whose
/// conversion does not fit the target type is handed over as
/// [`Raw`](Self::Raw) text instead, so no value is silently lost.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum JsonNumber<'a> {
    /// A number without fraction and exponent, fitting into `u64`
    U64(u64),
    /// A negative number without fraction and exponent, fitting into `i64`
    I64(i64),
    /// A number with a fraction or exponent, converted to a finite `f64`
    F64(f64),
    /// The raw text of a number whose conversion overflowed the target type,
    /// for example `18446744073709551616` or `1e999`
    Raw(&'a str),
}

/// Handler which receives the events of a parsing session
///
/// All methods have no-op default implementations, so a handler only
/// implements the events it cares about. Every method returns whether parsing
/// should continue; returning `false` makes
/// [`parse`](JsonPushParser::parse) fail with [`ErrorKind::Aborted`].
///
/// Events are reported in document order: [`begin_document`](Self::begin_document)
/// first, then for every member name the events of its value right after the
/// [`member_name`](Self::member_name) event, container begin events before the
/// events of the contained elements, and [`end_document`](Self::end_document)
/// after everything else, only when the document was parsed completely.
///
/// # Examples
/// ```
/// # use bufson::reader::{JsonEventHandler, JsonPushParser};
/// #[derive(Default)]
/// struct StringCollector(Vec<String>);
///
/// impl JsonEventHandler for StringCollector {
///     fn string_value(&mut self, value: &[u8]) -> bool {
///         self.0.push(String::from_utf8_lossy(value).into_owned());
///         true
///     }
/// }
///
/// let mut buf = *br#"["a", "b\n"]"#;
/// let mut handler = StringCollector::default();
/// JsonPushParser::new(&mut buf).parse(&mut handler)?;
/// assert_eq!(handler.0, vec!["a", "b\n"]);
/// # Ok::<(), bufson::reader::ParseError>(())
/// ```
pub trait JsonEventHandler {
    /// Called once before any other event
    fn begin_document(&mut self) -> bool {
        true
    }

    /// Called once after all other events, only when the complete document was
    /// parsed successfully
    fn end_document(&mut self) -> bool {
        true
    }

    /// Called when the opening `{` of an object has been consumed
    fn begin_object(&mut self) -> bool {
        true
    }

    /// Called when the closing `}` of an object has been consumed
    fn end_object(&mut self) -> bool {
        true
    }

    /// Called when the opening `[` of an array has been consumed
    fn begin_array(&mut self) -> bool {
        true
    }

    /// Called when the closing `]` of an array has been consumed
    fn end_array(&mut self) -> bool {
        true
    }

    /// Called with the decoded name of an object member, before any event of
    /// the member value
    ///
    /// The slice points into the parse buffer and is only valid for the
    /// duration of the call. All escape sequences have been decoded. The
    /// bytes are valid UTF-8 unless the name contained unpaired surrogate
    /// escapes, which are kept as individually encoded surrogate code points
    /// (see [`string_value`](Self::string_value)).
    fn member_name(&mut self, _name: &[u8]) -> bool {
        true
    }

    /// Called with the decoded content of a string value
    ///
    /// The slice points into the parse buffer and is only valid for the
    /// duration of the call. All escape sequences have been decoded in place,
    /// so the slice never contains a `\`-escape.
    ///
    /// The bytes are valid UTF-8 with one deliberate exception: a `\uXXXX`
    /// escape denoting half of a UTF-16 surrogate pair is not combined with
    /// its counterpart but encoded as an individual 3-byte sequence. Handlers
    /// which require strict UTF-8 can convert with
    /// [`String::from_utf8_lossy`] or reject such values.
    fn string_value(&mut self, _value: &[u8]) -> bool {
        true
    }

    /// Called with a number value, refined as described on [`JsonNumber`]
    fn number_value(&mut self, _value: JsonNumber<'_>) -> bool {
        true
    }

    /// Called with a boolean value
    fn bool_value(&mut self, _value: bool) -> bool {
        true
    }

    /// Called when a `null` has been consumed
    fn null_value(&mut self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_names() {
        assert_eq!("Aborted", ErrorKind::Aborted.name());
        assert_eq!("ExpectingEndOfInput", ErrorKind::ExpectingEndOfInput.name());
        assert_eq!("NestingTooDeep", ErrorKind::NestingTooDeep.name());
        assert_eq!("InvalidUTF8StartByte", ErrorKind::InvalidUTF8StartByte.name());
        assert_eq!("RefillFailure", ErrorKind::RefillFailure.name());

        // Display matches the identifier
        assert_eq!("ForbiddenNullInString", ErrorKind::ForbiddenNullInString.to_string());
    }

    #[test]
    fn parse_error_display() {
        let e = ParseError {
            kind: ErrorKind::ExpectingColon,
            unparsed: 4..10,
        };
        assert_eq!("JSON parse error ExpectingColon at byte 4", e.to_string());
    }
}
