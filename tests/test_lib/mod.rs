//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

// Not every integration test binary uses every helper in here
#![allow(dead_code)]

use std::io::Read;

use bufson::reader::{JsonEventHandler, JsonNumber};

/// One parser event, with token bytes copied out of the parse buffer
#[derive(PartialEq, Clone, Debug)]
pub enum JsonEvent {
    BeginDocument,
    EndDocument,
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    MemberName(Vec<u8>),
    StringValue(Vec<u8>),
    U64Value(u64),
    I64Value(i64),
    F64Value(f64),
    RawNumberValue(String),
    BoolValue(bool),
    NullValue,
}

/// Handler which records all events it receives
#[derive(Default)]
pub struct EventRecorder {
    pub events: Vec<JsonEvent>,
}

impl JsonEventHandler for EventRecorder {
    fn begin_document(&mut self) -> bool {
        self.events.push(JsonEvent::BeginDocument);
        true
    }

    fn end_document(&mut self) -> bool {
        self.events.push(JsonEvent::EndDocument);
        true
    }

    fn begin_object(&mut self) -> bool {
        self.events.push(JsonEvent::ObjectBegin);
        true
    }

    fn end_object(&mut self) -> bool {
        self.events.push(JsonEvent::ObjectEnd);
        true
    }

    fn begin_array(&mut self) -> bool {
        self.events.push(JsonEvent::ArrayBegin);
        true
    }

    fn end_array(&mut self) -> bool {
        self.events.push(JsonEvent::ArrayEnd);
        true
    }

    fn member_name(&mut self, name: &[u8]) -> bool {
        self.events.push(JsonEvent::MemberName(name.to_vec()));
        true
    }

    fn string_value(&mut self, value: &[u8]) -> bool {
        self.events.push(JsonEvent::StringValue(value.to_vec()));
        true
    }

    fn number_value(&mut self, value: JsonNumber<'_>) -> bool {
        self.events.push(match value {
            JsonNumber::U64(n) => JsonEvent::U64Value(n),
            JsonNumber::I64(n) => JsonEvent::I64Value(n),
            JsonNumber::F64(n) => JsonEvent::F64Value(n),
            JsonNumber::Raw(text) => JsonEvent::RawNumberValue(text.to_owned()),
        });
        true
    }

    fn bool_value(&mut self, value: bool) -> bool {
        self.events.push(JsonEvent::BoolValue(value));
        true
    }

    fn null_value(&mut self) -> bool {
        self.events.push(JsonEvent::NullValue);
        true
    }
}

/// A reader which hands out the wrapped data at most `chunk_size` bytes per
/// `read` call, simulating a slow streaming source
pub struct ChunkedReader<'a> {
    data: &'a [u8],
    position: usize,
    chunk_size: usize,
}

impl<'a> ChunkedReader<'a> {
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        assert!(chunk_size > 0);
        ChunkedReader {
            data,
            position: 0,
            chunk_size,
        }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.position..];
        let count = remaining.len().min(self.chunk_size).min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// A reader which always fails
pub struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "test reader failure",
        ))
    }
}
