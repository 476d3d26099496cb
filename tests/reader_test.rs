mod test_lib;

use bufson::reader::{ErrorKind, JsonPushParser, ParserSettings};
use bufson::writer::JsonBufferWriter;
use test_lib::{EventRecorder, JsonEvent};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn parse_to_events(json: &[u8]) -> Result<Vec<JsonEvent>, bufson::reader::ParseError> {
    let mut buf = json.to_vec();
    let mut recorder = EventRecorder::default();
    JsonPushParser::new(&mut buf).parse(&mut recorder)?;
    Ok(recorder.events)
}

#[test]
fn document_events() -> TestResult {
    let events = parse_to_events(br#"{"a":1,"b":[true,null]}"#)?;
    assert_eq!(
        vec![
            JsonEvent::BeginDocument,
            JsonEvent::ObjectBegin,
            JsonEvent::MemberName(b"a".to_vec()),
            JsonEvent::U64Value(1),
            JsonEvent::MemberName(b"b".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::BoolValue(true),
            JsonEvent::NullValue,
            JsonEvent::ArrayEnd,
            JsonEvent::ObjectEnd,
            JsonEvent::EndDocument,
        ],
        events
    );
    Ok(())
}

#[test]
fn mixed_document() -> TestResult {
    let json = br#"
        {
            "empty": {},
            "list": [ -1, 0.5, "two", { "three": 3 } ],
            "text": "aAb",
            "big": 18446744073709551616
        }
    "#;
    let events = parse_to_events(json)?;
    assert_eq!(
        vec![
            JsonEvent::BeginDocument,
            JsonEvent::ObjectBegin,
            JsonEvent::MemberName(b"empty".to_vec()),
            JsonEvent::ObjectBegin,
            JsonEvent::ObjectEnd,
            JsonEvent::MemberName(b"list".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::I64Value(-1),
            JsonEvent::F64Value(0.5),
            JsonEvent::StringValue(b"two".to_vec()),
            JsonEvent::ObjectBegin,
            JsonEvent::MemberName(b"three".to_vec()),
            JsonEvent::U64Value(3),
            JsonEvent::ObjectEnd,
            JsonEvent::ArrayEnd,
            JsonEvent::MemberName(b"text".to_vec()),
            JsonEvent::StringValue(b"aAb".to_vec()),
            JsonEvent::MemberName(b"big".to_vec()),
            JsonEvent::RawNumberValue("18446744073709551616".to_owned()),
            JsonEvent::ObjectEnd,
            JsonEvent::EndDocument,
        ],
        events
    );
    Ok(())
}

/// Parsing the serializer's output reconstructs the written values
#[test]
fn roundtrip() -> TestResult {
    let mut buf = [0_u8; 256];
    let mut json_writer = JsonBufferWriter::new(&mut buf);
    json_writer.begin_object();
    json_writer.name("strings");
    json_writer.begin_array();
    json_writer.string_value("");
    json_writer.string_value("with \"escapes\" \n\t\\");
    json_writer.string_value("unicode \u{E9}\u{1F600}");
    json_writer.end_array();
    json_writer.name("numbers");
    json_writer.begin_array();
    json_writer.number_value(u64::MAX);
    json_writer.number_value(-42);
    json_writer.fp_number_value(1.5);
    json_writer.end_array();
    json_writer.name("literals");
    json_writer.begin_array();
    json_writer.bool_value(true);
    json_writer.bool_value(false);
    json_writer.null_value();
    json_writer.end_array();
    json_writer.end_object();
    let len = json_writer.finish_document();

    let mut parse_buf = buf[..len].to_vec();
    let mut recorder = EventRecorder::default();
    JsonPushParser::new(&mut parse_buf).parse(&mut recorder)?;

    assert_eq!(
        vec![
            JsonEvent::BeginDocument,
            JsonEvent::ObjectBegin,
            JsonEvent::MemberName(b"strings".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::StringValue(Vec::new()),
            JsonEvent::StringValue(b"with \"escapes\" \n\t\\".to_vec()),
            JsonEvent::StringValue("unicode \u{E9}\u{1F600}".as_bytes().to_vec()),
            JsonEvent::ArrayEnd,
            JsonEvent::MemberName(b"numbers".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::U64Value(u64::MAX),
            JsonEvent::I64Value(-42),
            JsonEvent::F64Value(1.5),
            JsonEvent::ArrayEnd,
            JsonEvent::MemberName(b"literals".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::BoolValue(true),
            JsonEvent::BoolValue(false),
            JsonEvent::NullValue,
            JsonEvent::ArrayEnd,
            JsonEvent::ObjectEnd,
            JsonEvent::EndDocument,
        ],
        recorder.events
    );
    Ok(())
}

#[test]
fn error_diagnostic_range() {
    let json = br#"{"a": [1, 2, oops]}"#;
    let mut buf = json.to_vec();
    let mut recorder = EventRecorder::default();
    let e = JsonPushParser::new(&mut buf)
        .parse(&mut recorder)
        .unwrap_err();
    assert_eq!(ErrorKind::ExpectingValue, e.kind);
    assert_eq!(b"oops]}", &buf[e.unparsed]);
    // Events up to the failure were delivered
    assert_eq!(
        vec![
            JsonEvent::BeginDocument,
            JsonEvent::ObjectBegin,
            JsonEvent::MemberName(b"a".to_vec()),
            JsonEvent::ArrayBegin,
            JsonEvent::U64Value(1),
            JsonEvent::U64Value(2),
        ],
        recorder.events
    );
}

#[test]
fn nesting_limit_from_settings() {
    let json = b"[[[[[[[[[[[[";
    let mut buf = json.to_vec();
    let mut recorder = EventRecorder::default();
    let settings = ParserSettings {
        nesting_depth_max: 4,
        ..Default::default()
    };
    let e = JsonPushParser::new_custom(&mut buf, settings)
        .parse(&mut recorder)
        .unwrap_err();
    assert_eq!(ErrorKind::NestingTooDeep, e.kind);
    // Four arrays were opened before the fifth bracket failed
    assert_eq!(5, recorder.events.len());
}

#[test]
fn error_kind_name_lookup() {
    let e = parse_to_events(b"[1, 2").unwrap_err();
    assert_eq!(ErrorKind::ExpectingClosingSquareBracket, e.kind);
    assert_eq!("ExpectingClosingSquareBracket", e.kind.name());
    assert_eq!(
        "JSON parse error ExpectingClosingSquareBracket at byte 5",
        e.to_string()
    );
}
