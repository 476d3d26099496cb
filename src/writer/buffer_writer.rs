//! Bounded-buffer implementation of the JSON writer

use std::fmt::{self, Debug, Write as _};

use super::{FiniteNumber, FloatingPointNumber};

/// A JSON writer implementation which writes data into a fixed-size byte buffer
///
/// The writer never fails: when the document outgrows the buffer the overflow
/// is dropped silently while the byte count keeps growing, so the value
/// returned by [`finish_document`](Self::finish_document) is always the size
/// the complete document needs (excluding the terminating NUL byte, mirroring
/// the return value convention of `snprintf`-style truncating formatters).
/// Callers detect truncation by comparing that count to the buffer length.
///
/// Passing an empty buffer turns the writer into a pure sizer: nothing is
/// stored, but the returned byte count is exact. This allows the common
/// size-then-allocate pattern:
///
/// ```
/// # use bufson::writer::JsonBufferWriter;
/// fn write_document(json_writer: &mut JsonBufferWriter) {
///     json_writer.begin_array();
///     json_writer.string_value("size me");
///     json_writer.end_array();
/// }
///
/// // Dry run to measure
/// let mut sizer = JsonBufferWriter::new(&mut []);
/// write_document(&mut sizer);
/// let required = sizer.finish_document();
///
/// // Real run; one extra byte for the terminating NUL
/// let mut buf = vec![0_u8; required + 1];
/// let mut json_writer = JsonBufferWriter::new(&mut buf);
/// write_document(&mut json_writer);
/// assert_eq!(required, json_writer.finish_document());
/// assert_eq!(&buf[..required], br#"["size me"]"#);
/// ```
///
/// # Document structure
/// The writer only tracks whether the current container is still empty, to
/// decide whether a separating `,` is needed. It does not validate the overall
/// document structure; the caller is responsible for balancing
/// [`begin_object`](Self::begin_object) / [`end_object`](Self::end_object) and
/// [`begin_array`](Self::begin_array) / [`end_array`](Self::end_array) calls
/// and for writing a [`name`](Self::name) before each member value.
///
/// # Security
/// Member names and string values are escaped as required by the JSON
/// specification, but multi-byte UTF-8 content passes through unvalidated:
/// `&str` inputs are guaranteed valid by Rust, and the buffer content is only
/// valid UTF-8 if the caller emits a well-formed document.
pub struct JsonBufferWriter<'b> {
    buf: &'b mut [u8],
    /// Index of the next byte to write; pinned to `buf.len()` once the buffer is full
    head: usize,
    /// Total number of bytes the document needs, regardless of truncation
    bytes_required: usize,
    /// Whether the current array or object has no elements yet, or at top-level
    /// whether no value has been written yet; also set after a member name so
    /// the following value does not emit a separator
    in_empty_container: bool,
}

impl Debug for JsonBufferWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBufferWriter")
            .field("buf_len", &self.buf.len())
            .field("head", &self.head)
            .field("bytes_required", &self.bytes_required)
            .field("in_empty_container", &self.in_empty_container)
            .finish()
    }
}

// Implementation with the low level bounded write primitives
impl JsonBufferWriter<'_> {
    /// Writes a single byte, if there is room
    fn put(&mut self, b: u8) {
        self.bytes_required += 1;

        if self.head >= self.buf.len() {
            return;
        }
        self.buf[self.head] = b;
        self.head += 1;
    }

    /// Writes a chunk of bytes; a chunk which does not fit completely is dropped
    fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes_required += bytes.len();

        if bytes.len() > self.buf.len() || self.head > self.buf.len() - bytes.len() {
            return;
        }
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
        self.head += bytes.len();
    }

    /// Writes formatted output, counting its full length even when truncated
    ///
    /// Mirrors the `vsnprintf` discipline: when the output does not fit into
    /// the remaining capacity the head is pinned to the buffer end and the
    /// final buffer byte is zeroed.
    fn put_fmt(&mut self, args: fmt::Arguments) {
        struct TruncatingSink<'s> {
            buf: &'s mut [u8],
            written: usize,
            required: usize,
        }

        impl fmt::Write for TruncatingSink<'_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.required += s.len();
                let room = self.buf.len() - self.written;
                let n = room.min(s.len());
                self.buf[self.written..self.written + n].copy_from_slice(&s.as_bytes()[..n]);
                self.written += n;
                Ok(())
            }
        }

        let mut sink = TruncatingSink {
            buf: &mut self.buf[self.head..],
            written: 0,
            required: 0,
        };
        // The sink never reports failure
        let _ = sink.write_fmt(args);
        let required = sink.required;

        self.bytes_required += required;
        if self.buf.is_empty() {
            return;
        }
        if required < self.buf.len() - self.head {
            self.head += required;
        } else {
            self.head = self.buf.len();
            let last = self.buf.len() - 1;
            self.buf[last] = 0;
        }
    }
}

// Implementation with the string escaping logic
impl JsonBufferWriter<'_> {
    /*
     * All code points may be placed within the quotation marks except for the
     * code points that must be escaped: quotation mark (U+0022), reverse
     * solidus (U+005C), and the control characters U+0000 to U+001F.
     */
    fn put_escaped(&mut self, value: &str) {
        fn to_hex(i: u8) -> u8 {
            match i {
                0..=9 => b'0' + i,
                _ => b'A' + (i - 10),
            }
        }

        let bytes = value.as_bytes();
        let mut next_to_write_index = 0;

        for (index, b) in bytes.iter().copied().enumerate() {
            let unicode_escape;
            let escape: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                0x08 => b"\\b",
                0x0C => b"\\f",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                // Remaining control characters escape as \u00XY with upper-case hex;
                // bytes >= 0x20 (including UTF-8 continuation bytes) pass through
                0x00..=0x1F => {
                    unicode_escape = [b'\\', b'u', b'0', b'0', to_hex(b >> 4), to_hex(b & 0x0F)];
                    &unicode_escape
                }
                _ => continue,
            };

            if index > next_to_write_index {
                self.put_bytes(&bytes[next_to_write_index..index]);
            }
            self.put_bytes(escape);
            next_to_write_index = index + 1;
        }
        // Write remaining bytes
        if next_to_write_index < bytes.len() {
            self.put_bytes(&bytes[next_to_write_index..]);
        }
    }
}

// Implementation with the public writing methods
impl<'b> JsonBufferWriter<'b> {
    /// Creates a JSON writer which writes into `buf`
    ///
    /// An empty buffer is permitted; the writer then only counts the bytes the
    /// document would need, see the struct documentation.
    pub fn new(buf: &'b mut [u8]) -> Self {
        JsonBufferWriter {
            buf,
            head: 0,
            bytes_required: 0,
            in_empty_container: true,
        }
    }

    /// Number of bytes the document has needed so far, regardless of truncation
    pub fn bytes_required(&self) -> usize {
        self.bytes_required
    }

    /// Called before a value is written; emits the separating `,` if needed
    fn before_value(&mut self) {
        if !self.in_empty_container {
            self.put(b',');
        }
        self.in_empty_container = false;
    }

    /// Writes the opening bracket `{` of a JSON object
    pub fn begin_object(&mut self) {
        if !self.in_empty_container {
            self.put(b',');
        }
        self.in_empty_container = true;
        self.put(b'{');
    }

    /// Writes the closing bracket `}` of a JSON object
    pub fn end_object(&mut self) {
        self.in_empty_container = false;
        self.put(b'}');
    }

    /// Writes the opening bracket `[` of a JSON array
    pub fn begin_array(&mut self) {
        if !self.in_empty_container {
            self.put(b',');
        }
        self.in_empty_container = true;
        self.put(b'[');
    }

    /// Writes the closing bracket `]` of a JSON array
    pub fn end_array(&mut self) {
        self.in_empty_container = false;
        self.put(b']');
    }

    /// Writes the name of the next object member
    ///
    /// The name is written in quotes with all necessary escaping, followed by
    /// a `:`. The next value operation then writes the member value, without
    /// emitting a separator of its own:
    ///
    /// ```
    /// # use bufson::writer::JsonBufferWriter;
    /// let mut buf = [0_u8; 32];
    /// let mut json_writer = JsonBufferWriter::new(&mut buf);
    /// json_writer.begin_object();
    /// json_writer.name("a");
    /// json_writer.number_value(1);
    /// json_writer.name("b");
    /// json_writer.bool_value(true);
    /// json_writer.end_object();
    /// let len = json_writer.finish_document();
    /// assert_eq!(&buf[..len], br#"{"a":1,"b":true}"#);
    /// ```
    pub fn name(&mut self, name: &str) {
        if !self.in_empty_container {
            self.put(b',');
        }
        self.in_empty_container = true;

        self.put(b'"');
        self.put_escaped(name);
        self.put_bytes(b"\":");
    }

    /// Writes a JSON string value, escaping characters where necessary
    pub fn string_value(&mut self, value: &str) {
        self.before_value();
        self.put(b'"');
        self.put_escaped(value);
        self.put(b'"');
    }

    /// Writes a JSON boolean value
    pub fn bool_value(&mut self, value: bool) {
        self.before_value();
        self.put_bytes(if value { b"true" } else { b"false" });
    }

    /// Writes a JSON `null`
    pub fn null_value(&mut self) {
        self.before_value();
        self.put_bytes(b"null");
    }

    /// Writes a finite JSON number value
    ///
    /// This method supports the primitive integral number types up to 64 bits,
    /// written with their default decimal `Display` rendering.
    pub fn number_value<N: FiniteNumber>(&mut self, value: N) {
        self.before_value();
        self.put_fmt(format_args!("{value}"));
    }

    /// Writes a floating point JSON number value
    ///
    /// The number is written with its default decimal `Display` rendering.
    /// Since JSON has no representation for non-finite numbers, NaN and
    /// Infinity are written as the bare token `null`.
    pub fn fp_number_value<N: FloatingPointNumber>(&mut self, value: N) {
        self.before_value();
        if value.is_finite() {
            self.put_fmt(format_args!("{value}"));
        } else {
            self.put_bytes(b"null");
        }
    }

    /// Writes an unsigned 64-bit number surrounded by double quotes
    ///
    /// String-encoding a 64-bit number lets it survive JSON readers which
    /// parse all numbers as IEEE-754 doubles and would otherwise lose
    /// precision above 2^53.
    pub fn quoted_u64_value(&mut self, value: u64) {
        self.before_value();
        self.put(b'"');
        self.put_fmt(format_args!("{value}"));
        self.put(b'"');
    }

    /// Null-terminates the output and returns the number of bytes the document
    /// needs, excluding the terminating NUL
    ///
    /// When the returned count is greater than or equal to the buffer length
    /// the document was truncated; the last buffer byte is then NUL so the
    /// (incomplete) content stays NUL-terminated. Consuming the writer makes
    /// it impossible to keep writing after the terminator.
    pub fn finish_document(mut self) -> usize {
        // Return required buffer size _without_ the null terminator,
        // mirroring the behaviour of snprintf
        let result = self.bytes_required;
        self.put(0);
        if !self.buf.is_empty() && result >= self.buf.len() {
            let last = self.buf.len() - 1;
            self.buf[last] = 0;
        }
        result
    }
}
