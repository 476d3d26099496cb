//! Streaming push implementation of the JSON parser

use std::fmt::{self, Debug};
use std::io::{ErrorKind as IoErrorKind, Read};

use super::*;
use crate::utf8;

#[derive(Clone, Copy)]
enum Keyword {
    Null,
    True,
    False,
}

/// A JSON parser which parses a document in place, inside a caller-supplied
/// byte buffer
///
/// The parser walks the buffer with a single cursor and reports grammar
/// events to a [`JsonEventHandler`]. Member names and string values are
/// unescaped *in place*: the decoded bytes overwrite the raw token bytes
/// (decoding never grows a token), and the slice handed to the handler points
/// directly into the buffer. Number tokens are converted from their in-buffer
/// text. The parser performs no heap allocation.
///
/// # Streaming
/// When constructed with [`streaming`](Self::streaming) the parser pulls more
/// input from a [`Read`] source whenever the cursor reaches the end of the
/// filled buffer prefix: bytes which are still needed are first *shifted* to
/// the front of the buffer, then the freed tail is refilled from the source.
/// A document of any length can be parsed through a small buffer, as long as
/// each single token fits; a token larger than the whole buffer fails with
/// [`ErrorKind::ElementTooLong`].
///
/// If the source returns an error of kind
/// [`Interrupted`](std::io::ErrorKind::Interrupted), the parser will keep
/// retrying to read data. Any other source error fails the session with
/// [`ErrorKind::RefillFailure`].
///
/// # Sessions
/// A parser value represents a single parsing session: [`parse`](Self::parse)
/// consumes it and runs to completion (or error) on the calling thread. The
/// buffer is exclusively borrowed for the session, so the caller regains
/// access to it afterwards, including when an error reports a
/// [diagnostic range](ParseError::unparsed) into it.
///
/// # Security
/// The parser validates UTF-8 framing (start and continuation bytes) on the
/// raw input and enforces the configured nesting limit. It does **not**
/// detect duplicate member names, impose length limits on documents or
/// tokens beyond the buffer capacity, or reject overlong UTF-8 encodings.
/// When processing JSON data from an untrusted source, users must implement
/// protections against these issues themselves.
pub struct JsonPushParser<'b, R: Read> {
    // When adding more fields to this struct, adjust the Debug implementation below, if necessary
    /// Caller-owned parse buffer; tokens are decoded in place inside it
    buf: &'b mut [u8],
    source: R,
    /// Index (exclusive) up to which `buf` holds valid input
    filled: usize,
    /// Index of the current byte
    pos: usize,
    /// The current byte, or 0 once the end of the input has been reached
    ///
    /// A literal NUL byte in the input is always a fatal error, so 0 is free
    /// to act as the end-of-input sentinel.
    cur: u8,
    /// Index (exclusive) up to which input has been parsed successfully; those
    /// bytes may be overwritten by the next shift
    committed: usize,
    /// Remaining continuation bytes expected for the current UTF-8 code point
    pending_continuation_bytes: u8,
    /// Number of currently open arrays and objects
    nesting_depth: u32,
    reached_eof: bool,
    settings: ParserSettings,
}

impl<R: Read + Debug> Debug for JsonPushParser<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("JsonPushParser");
        debug_struct.field("source", &self.source);

        // Show a bounded window of the unconsumed input
        let remaining = &self.buf[self.pos.min(self.filled)..self.filled];
        let window = &remaining[..remaining.len().min(45)];
        debug_struct.field(
            "remaining_input",
            &String::from_utf8_lossy(window).into_owned(),
        );

        debug_struct
            .field("buf_len", &self.buf.len())
            .field("filled", &self.filled)
            .field("pos", &self.pos)
            .field("cur", &self.cur)
            .field("committed", &self.committed)
            .field("nesting_depth", &self.nesting_depth)
            .field("reached_eof", &self.reached_eof)
            .field("settings", &self.settings)
            .finish()
    }
}

// Implementation with public constructor methods
impl<'b> JsonPushParser<'b, std::io::Empty> {
    /// Creates a parser with [default settings](ParserSettings::default) over
    /// a buffer which already contains the complete JSON document
    pub fn new(buf: &'b mut [u8]) -> Self {
        JsonPushParser::new_custom(buf, ParserSettings::default())
    }

    /// Creates a parser with custom settings over a buffer which already
    /// contains the complete JSON document
    pub fn new_custom(buf: &'b mut [u8], settings: ParserSettings) -> Self {
        let filled = buf.len();
        let mut parser = JsonPushParser::streaming_custom(buf, filled, std::io::empty(), settings);
        parser.reached_eof = true;
        parser
    }
}

impl<'b, R: Read> JsonPushParser<'b, R> {
    /// Creates a streaming parser with [default settings](ParserSettings::default)
    ///
    /// The first `filled` bytes of `buf` hold input which is already
    /// available (0 is fine); the rest of the document is pulled from
    /// `source` as parsing proceeds.
    ///
    /// # Panics
    /// Panics when `filled` is greater than the buffer length. This indicates
    /// incorrect usage by the user and is unrelated to the JSON data.
    pub fn streaming(buf: &'b mut [u8], filled: usize, source: R) -> Self {
        JsonPushParser::streaming_custom(buf, filled, source, ParserSettings::default())
    }

    /// Creates a streaming parser with custom settings
    ///
    /// See [`streaming`](Self::streaming).
    pub fn streaming_custom(
        buf: &'b mut [u8],
        filled: usize,
        source: R,
        settings: ParserSettings,
    ) -> Self {
        assert!(
            filled <= buf.len(),
            "Incorrect parser usage: filled count {filled} exceeds buffer length {}",
            buf.len()
        );
        JsonPushParser {
            buf,
            source,
            filled,
            pos: 0,
            cur: 0,
            committed: 0,
            pending_continuation_bytes: 0,
            nesting_depth: 0,
            reached_eof: false,
            settings,
        }
    }

    /// Parses the document, reporting events to `handler`
    ///
    /// Consumes the parser; a session cannot be restarted or resumed after it
    /// has ended. On failure no recovery is attempted: the returned error
    /// names the [`ErrorKind`] and the buffer range holding the unparsed
    /// remainder of the input.
    pub fn parse<H: JsonEventHandler>(mut self, handler: &mut H) -> Result<(), ParseError> {
        match self.parse_document(handler) {
            Ok(()) => Ok(()),
            Err(kind) => Err(ParseError {
                kind,
                unparsed: self.committed..self.filled,
            }),
        }
    }
}

// Implementation with low level cursor methods
impl<R: Read> JsonPushParser<'_, R> {
    /// Validates a byte read from the buffer before it becomes the current byte
    fn check_byte(&mut self, b: u8) -> Result<(), ErrorKind> {
        if b == 0 {
            return Err(ErrorKind::InlineNullByte);
        }
        if self.pending_continuation_bytes > 0 {
            if !utf8::is_continuation(b) {
                return Err(ErrorKind::InvalidUTF8ContinuationByte);
            }
            self.pending_continuation_bytes -= 1;
        } else if utf8::is_1byte(b) {
            // ASCII
        } else if utf8::is_2byte_start(b) {
            self.pending_continuation_bytes = 1;
        } else if utf8::is_3byte_start(b) {
            self.pending_continuation_bytes = 2;
        } else if utf8::is_4byte_start(b) {
            self.pending_continuation_bytes = 3;
        } else {
            // Lone continuation byte, or a start byte denoting 5+ bytes
            return Err(ErrorKind::InvalidUTF8StartByte);
        }
        Ok(())
    }

    /// Moves the bytes which are still needed to the front of the buffer,
    /// rebasing all cursor indices; returns the shift distance
    fn shift(&mut self) -> usize {
        let shift = self.committed;
        if shift > 0 {
            self.buf.copy_within(shift..self.filled, 0);
            self.filled -= shift;
            self.pos -= shift;
            self.committed = 0;
        }
        shift
    }

    /// Reads more input from the source into the unused buffer tail
    fn refill(&mut self) -> Result<(), ErrorKind> {
        if self.reached_eof {
            return Ok(());
        }
        if self.filled == self.buf.len() {
            // Even after a shift there is no room left, so a single token
            // spans the whole buffer while the source may still hold more of it
            return Err(ErrorKind::ElementTooLong);
        }
        loop {
            match self.source.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    self.reached_eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.filled += n;
                    return Ok(());
                }
                // Retry if interrupted
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(_) => return Err(ErrorKind::RefillFailure),
            }
        }
    }

    /// Loads the byte at index 0 as the current byte, refilling first when the
    /// buffer starts out empty
    fn load_first_byte(&mut self) -> Result<(), ErrorKind> {
        if self.filled == 0 {
            self.refill()?;
        }
        if self.filled == 0 {
            // Empty input
            self.cur = 0;
            return Ok(());
        }
        let b = self.buf[0];
        self.check_byte(b)?;
        self.cur = b;
        Ok(())
    }

    /// Advances the cursor to the next byte, shifting the buffer and refilling
    /// it from the source when the filled prefix has been consumed
    ///
    /// After the call [`cur`](Self::cur) holds the new current byte, or 0 once
    /// the end of the input has been reached. Returns how many bytes the
    /// buffer contents moved towards the front, so callers can rebase token
    /// indices they hold across the call.
    fn advance(&mut self) -> Result<usize, ErrorKind> {
        if self.pos >= self.filled {
            // Already at the end of the input
            return Ok(0);
        }
        self.pos += 1;
        let mut shift = 0;
        if self.pos >= self.filled && !self.reached_eof {
            shift = self.shift();
            self.refill()?;
        }
        if self.pos >= self.filled {
            self.cur = 0;
            return Ok(shift);
        }
        let b = self.buf[self.pos];
        self.check_byte(b)?;
        self.cur = b;
        Ok(shift)
    }

    /// Records that parsing succeeded up to (excluding) the current byte,
    /// releasing the preceding bytes for reuse by the next shift
    fn commit(&mut self) {
        self.committed = self.pos;
    }
}

// Implementation with the grammar driver
impl<R: Read> JsonPushParser<'_, R> {
    fn parse_document<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        if self.buf.is_empty() {
            return Err(ErrorKind::BufferTooShort);
        }
        if !handler.begin_document() {
            return Err(ErrorKind::Aborted);
        }
        self.load_first_byte()?;
        self.skip_whitespace()?;
        self.parse_value(handler)?;
        self.skip_whitespace()?;
        if self.cur != 0 {
            return Err(ErrorKind::ExpectingEndOfInput);
        }
        if !handler.end_document() {
            return Err(ErrorKind::Aborted);
        }
        Ok(())
    }

    /// Skips the RFC 8259 whitespace set: space, tab, LF and CR
    fn skip_whitespace(&mut self) -> Result<(), ErrorKind> {
        while matches!(self.cur, b' ' | b'\t' | b'\n' | b'\r') {
            self.advance()?;
            self.commit();
        }
        Ok(())
    }

    fn parse_value<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        match self.cur {
            b'{' => self.parse_object(handler),
            b'[' => self.parse_array(handler),
            b'"' => self.parse_string(handler, false),
            b'n' => self.parse_keyword(handler, Keyword::Null),
            b't' => self.parse_keyword(handler, Keyword::True),
            b'f' => self.parse_keyword(handler, Keyword::False),
            b'-' | b'0'..=b'9' => self.parse_number(handler),
            _ => Err(ErrorKind::ExpectingValue),
        }
    }

    fn enter_container(&mut self) -> Result<(), ErrorKind> {
        self.nesting_depth += 1;
        if self.nesting_depth > self.settings.nesting_depth_max {
            return Err(ErrorKind::NestingTooDeep);
        }
        Ok(())
    }

    fn exit_container(&mut self) {
        self.nesting_depth -= 1;
    }

    fn parse_object<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        if self.cur != b'{' {
            return Err(ErrorKind::ExpectingOpeningCurlyBracket);
        }
        self.enter_container()?;
        if !handler.begin_object() {
            return Err(ErrorKind::Aborted);
        }
        self.advance()?;
        self.commit();
        self.skip_whitespace()?;

        // An empty object is recognized directly, not parsed as zero members
        if self.cur == b'}' {
            self.advance()?;
            self.commit();
            self.exit_container();
            if !handler.end_object() {
                return Err(ErrorKind::Aborted);
            }
            return Ok(());
        }

        loop {
            self.parse_member(handler)?;
            self.skip_whitespace()?;
            match self.cur {
                b',' => {
                    self.advance()?;
                    self.commit();
                    self.skip_whitespace()?;
                }
                b'}' => {
                    self.advance()?;
                    self.commit();
                    self.exit_container();
                    if !handler.end_object() {
                        return Err(ErrorKind::Aborted);
                    }
                    return Ok(());
                }
                _ => return Err(ErrorKind::ExpectingClosingCurlyBracket),
            }
        }
    }

    fn parse_member<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        self.parse_string(handler, true)?;
        self.skip_whitespace()?;
        if self.cur != b':' {
            return Err(ErrorKind::ExpectingColon);
        }
        self.advance()?;
        self.commit();
        self.skip_whitespace()?;
        self.parse_value(handler)
    }

    fn parse_array<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        if self.cur != b'[' {
            return Err(ErrorKind::ExpectingOpeningSquareBracket);
        }
        self.enter_container()?;
        if !handler.begin_array() {
            return Err(ErrorKind::Aborted);
        }
        self.advance()?;
        self.commit();
        self.skip_whitespace()?;

        // An empty array is recognized directly, not parsed as zero elements
        if self.cur == b']' {
            self.advance()?;
            self.commit();
            self.exit_container();
            if !handler.end_array() {
                return Err(ErrorKind::Aborted);
            }
            return Ok(());
        }

        loop {
            self.parse_value(handler)?;
            self.skip_whitespace()?;
            match self.cur {
                b',' => {
                    self.advance()?;
                    self.commit();
                    self.skip_whitespace()?;
                }
                b']' => {
                    self.advance()?;
                    self.commit();
                    self.exit_container();
                    if !handler.end_array() {
                        return Err(ErrorKind::Aborted);
                    }
                    return Ok(());
                }
                _ => return Err(ErrorKind::ExpectingClosingSquareBracket),
            }
        }
    }

    fn parse_keyword<H: JsonEventHandler>(
        &mut self,
        handler: &mut H,
        keyword: Keyword,
    ) -> Result<(), ErrorKind> {
        let (text, mismatch_error): (&[u8], _) = match keyword {
            Keyword::Null => (b"null", ErrorKind::ExpectingNull),
            Keyword::True => (b"true", ErrorKind::ExpectingTrue),
            Keyword::False => (b"false", ErrorKind::ExpectingFalse),
        };
        for expected in text {
            if self.cur != *expected {
                return Err(mismatch_error);
            }
            self.advance()?;
        }
        let proceed = match keyword {
            Keyword::Null => handler.null_value(),
            Keyword::True => handler.bool_value(true),
            Keyword::False => handler.bool_value(false),
        };
        if !proceed {
            return Err(ErrorKind::Aborted);
        }
        self.commit();
        Ok(())
    }
}

// Implementation with in-place string decoding
impl<R: Read> JsonPushParser<'_, R> {
    /// Parses a string token, decoding its content in place, and delivers the
    /// decoded bytes to the member name or string value handler
    fn parse_string<H: JsonEventHandler>(
        &mut self,
        handler: &mut H,
        is_member_name: bool,
    ) -> Result<(), ErrorKind> {
        if self.cur != b'"' {
            return Err(ErrorKind::ExpectingOpeningQuote);
        }
        self.advance()?;
        self.commit();

        // Two cursors walk the token: the read cursor is `pos`, the write
        // cursor `end` trails it, overwriting raw bytes with decoded ones.
        // Every `advance` may shift the buffer; `start` and `end` are rebased
        // by the reported distance.
        let mut start = self.pos;
        let mut end = self.pos;

        loop {
            match self.cur {
                0 => return Err(ErrorKind::ExpectingClosingQuote),
                b'"' => break,
                b'\\' => {
                    let shift = self.advance()?;
                    start -= shift;
                    end -= shift;

                    let decoded = match self.cur {
                        b'"' => b'"',
                        b'\\' => b'\\',
                        b'/' => b'/',
                        b'b' => 0x08,
                        b'f' => 0x0C,
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'u' => {
                            let code_point = self.parse_escape_hex(&mut start, &mut end)?;
                            if code_point == 0 && !self.settings.allow_null_in_string {
                                return Err(ErrorKind::ForbiddenNullInString);
                            }
                            if code_point > 0x10FFFF {
                                // Four hex digits cannot get here, guards the encoder
                                return Err(ErrorKind::InvalidEscapeSequence);
                            }
                            // The escape spans 6 source bytes and encodes to at
                            // most 4, so the write cursor never passes the read
                            // cursor
                            let mut encoded = [0_u8; utf8::MAX_BYTES_PER_CHAR];
                            let len = utf8::encode_code_point(code_point, &mut encoded);
                            self.buf[end..end + len].copy_from_slice(&encoded[..len]);
                            end += len;
                            let shift = self.advance()?;
                            start -= shift;
                            end -= shift;
                            continue;
                        }
                        _ => return Err(ErrorKind::InvalidEscapeSequence),
                    };
                    self.buf[end] = decoded;
                    end += 1;
                    let shift = self.advance()?;
                    start -= shift;
                    end -= shift;
                }
                b if b <= 0x1F => return Err(ErrorKind::UnescapedControlCharacter),
                b => {
                    self.buf[end] = b;
                    end += 1;
                    let shift = self.advance()?;
                    start -= shift;
                    end -= shift;
                }
            }
        }

        // Consume the closing quote
        let shift = self.advance()?;
        start -= shift;
        end -= shift;

        let token = &self.buf[start..end];
        let proceed = if is_member_name {
            handler.member_name(token)
        } else {
            handler.string_value(token)
        };
        if !proceed {
            return Err(ErrorKind::Aborted);
        }
        self.commit();
        Ok(())
    }

    /// Parses the four hex digits of a `\uXXXX` escape; the current byte must
    /// be the `u`
    fn parse_escape_hex(&mut self, start: &mut usize, end: &mut usize) -> Result<u32, ErrorKind> {
        let mut code_point = 0_u32;
        for _ in 0..4 {
            let shift = self.advance()?;
            *start -= shift;
            *end -= shift;
            let digit = match self.cur {
                b'0'..=b'9' => u32::from(self.cur - b'0'),
                b'a'..=b'f' => u32::from(self.cur - b'a' + 10),
                b'A'..=b'F' => u32::from(self.cur - b'A' + 10),
                _ => return Err(ErrorKind::InvalidEscapeSequence),
            };
            code_point = code_point << 4 | digit;
        }
        Ok(code_point)
    }
}

// Implementation with number decoding
impl<R: Read> JsonPushParser<'_, R> {
    /// Parses a number token and delivers it, refined by the conversion the
    /// token admits
    fn parse_number<H: JsonEventHandler>(&mut self, handler: &mut H) -> Result<(), ErrorKind> {
        let mut start = self.pos;
        let mut is_integer = true;

        let negative = self.cur == b'-';
        if negative {
            start -= self.advance()?;
            if !self.cur.is_ascii_digit() {
                return Err(ErrorKind::ExpectingNumber);
            }
        }

        // Integer part; a leading 0 is not followed by further digits
        if self.cur == b'0' {
            start -= self.advance()?;
        } else {
            start = self.consume_digits(start)?;
        }

        // Fraction part
        if self.cur == b'.' {
            is_integer = false;
            start -= self.advance()?;
            if !self.cur.is_ascii_digit() {
                return Err(ErrorKind::ExpectingFractionDigits);
            }
            start = self.consume_digits(start)?;
        }

        // Exponent part
        if self.cur == b'e' || self.cur == b'E' {
            is_integer = false;
            start -= self.advance()?;
            if self.cur == b'+' || self.cur == b'-' {
                start -= self.advance()?;
            }
            if !self.cur.is_ascii_digit() {
                return Err(ErrorKind::ExpectingExponentDigits);
            }
            start = self.consume_digits(start)?;
        }

        // The token is ASCII by construction; conversion happens straight from
        // the buffer slice, no terminator or transient copy is needed
        let token = utf8::to_str_unchecked(&self.buf[start..self.pos]);
        let number = if !is_integer {
            match token.parse::<f64>() {
                // An overflowing conversion yields an infinite value and falls
                // back to the raw token
                Ok(value) if value.is_finite() => JsonNumber::F64(value),
                _ => JsonNumber::Raw(token),
            }
        } else if negative {
            match token.parse::<i64>() {
                Ok(value) => JsonNumber::I64(value),
                Err(_) => JsonNumber::Raw(token),
            }
        } else {
            match token.parse::<u64>() {
                Ok(value) => JsonNumber::U64(value),
                Err(_) => JsonNumber::Raw(token),
            }
        };

        if !handler.number_value(number) {
            return Err(ErrorKind::Aborted);
        }
        self.commit();
        Ok(())
    }

    /// Consumes one or more decimal digits, returning the rebased `start`
    fn consume_digits(&mut self, mut start: usize) -> Result<usize, ErrorKind> {
        while self.cur.is_ascii_digit() {
            start -= self.advance()?;
        }
        Ok(start)
    }
}
