#![warn(missing_docs)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]

//! Bufson is an [RFC 8259](https://www.rfc-editor.org/rfc/rfc8259.html) compliant JSON
//! serializer and streaming push parser for caller-supplied fixed-size byte buffers.
//!
//! Its main purpose is allowing to produce and consume JSON data in memory-constrained
//! and streaming environments without heap allocation: the serializer writes into a byte
//! buffer the caller owns (and can predict the required size with a dry run), and the
//! parser decodes member names, string values and numbers *in place* inside the caller's
//! input buffer while reporting structural events through a handler object. It is *not*
//! an object mapper and builds no document tree; a dedicated library such as
//! [Serde](https://github.com/serde-rs/json) should be used for that.
//!
//! # Terminology
//!
//! This crate uses the same terminology as the JSON specification:
//!
//! - *object*: `{ ... }`
//!   - *member*: Entry in an object. For example the JSON object `{"a": 1}` has the member
//!     `"a": 1` where `"a"` is the member *name* and `1` is the member *value*.
//! - *array*: `[ ... ]`
//! - *literal*:
//!   - *boolean*: `true` or `false`
//!   - `null`
//! - *number*: number value, for example `123.4e+10`
//! - *string*: string value, for example `"text in \"quotes\""`
//!
//! # Usage examples
//!
//! ## Writing
//! See [`JsonBufferWriter`](crate::writer::JsonBufferWriter).
//!
//! ```
//! # use bufson::writer::JsonBufferWriter;
//! let mut buf = [0_u8; 64];
//! let mut json_writer = JsonBufferWriter::new(&mut buf);
//!
//! json_writer.begin_object();
//! json_writer.name("a");
//!
//! json_writer.begin_array();
//! json_writer.number_value(1);
//! json_writer.bool_value(true);
//! json_writer.end_array();
//!
//! json_writer.end_object();
//! // Null-terminates the output and returns the number of bytes the document needs
//! let len = json_writer.finish_document();
//!
//! assert_eq!(&buf[..len], br#"{"a":[1,true]}"#);
//! ```
//!
//! Passing an empty buffer turns the same call sequence into a dry run which
//! returns the exact size a real buffer would need.
//!
//! ## Parsing
//! See [`JsonPushParser`](crate::reader::JsonPushParser).
//!
//! ```
//! # use bufson::reader::{JsonEventHandler, JsonNumber, JsonPushParser};
//! struct Sum(u64);
//!
//! impl JsonEventHandler for Sum {
//!     fn number_value(&mut self, value: JsonNumber<'_>) -> bool {
//!         if let JsonNumber::U64(n) = value {
//!             self.0 += n;
//!         }
//!         true
//!     }
//! }
//!
//! // The parser decodes tokens in place, so it needs mutable access to the input
//! let mut buf = *b"[1, 2, 3]";
//! let mut handler = Sum(0);
//! JsonPushParser::new(&mut buf).parse(&mut handler)?;
//! assert_eq!(handler.0, 6);
//! # Ok::<(), bufson::reader::ParseError>(())
//! ```

pub mod reader;
pub mod writer;

mod utf8;
