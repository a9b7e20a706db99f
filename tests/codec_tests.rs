//! Codec Tests
//!
//! Tests for value and request encoding/decoding.

use std::io::Cursor;

use cellwire::protocol::{
    decode_request, decode_value, encode_request, encode_value, read_request, read_value,
    write_request, write_value, Array, ErrorCode, Request, StreamSource, Value, MAX_ARGS,
    MAX_TEXT_LEN, TAG_ARRAY, TAG_NUMBER, TAG_TEXT,
};
use cellwire::CellwireError;

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_bytes(bytes: &[u8]) -> cellwire::Result<Value> {
    let mut source = bytes;
    decode_value(&mut source)
}

fn roundtrip(value: &Value) -> Value {
    let bytes = encode_value(value).unwrap();
    let mut source = &bytes[..];
    let decoded = decode_value(&mut source).unwrap();
    assert!(source.is_empty(), "decode left {} bytes behind", source.len());
    decoded
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::Number(0.0),
        Value::Number(-1234.5678),
        Value::Number(f64::MAX),
        Value::Number(f64::INFINITY),
        Value::text("hello"),
        Value::text(""),
        Value::Text(vec![0x00, 0xA9, 0xFF, 0x80]),
        Value::Boolean(true),
        Value::Boolean(false),
        Value::Error(ErrorCode::Div0),
        Value::Error(ErrorCode::NA),
        Value::Missing,
        Value::Nil,
        Value::Array(Array::empty()),
        Value::Array(Array::new(0, 4, vec![]).unwrap()),
        Value::Array(
            Array::new(
                2,
                3,
                vec![
                    Value::Number(1.0),
                    Value::text("two"),
                    Value::Boolean(true),
                    Value::Error(ErrorCode::Ref),
                    Value::Missing,
                    Value::Nil,
                ],
            )
            .unwrap(),
        ),
    ]
}

// =============================================================================
// Byte Layout Tests
// =============================================================================

#[test]
fn test_number_layout() {
    let bytes = encode_value(&Value::Number(2.0)).unwrap();
    let mut expected = vec![TAG_NUMBER];
    expected.extend_from_slice(&2.0f64.to_be_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn test_text_layout() {
    let bytes = encode_value(&Value::text("ab")).unwrap();
    assert_eq!(bytes, vec![TAG_TEXT, 0, 0, 0, 2, b'a', b'b']);
}

#[test]
fn test_scalar_tags() {
    assert_eq!(encode_value(&Value::Boolean(true)).unwrap(), vec![0x03, 0x01]);
    assert_eq!(encode_value(&Value::Boolean(false)).unwrap(), vec![0x03, 0x00]);
    assert_eq!(encode_value(&Value::Error(ErrorCode::Div0)).unwrap(), vec![0x04, 7]);
    assert_eq!(encode_value(&Value::Missing).unwrap(), vec![0x06]);
    assert_eq!(encode_value(&Value::Nil).unwrap(), vec![0x07]);
}

#[test]
fn test_array_layout() {
    let array = Array::new(1, 2, vec![Value::Nil, Value::Boolean(true)]).unwrap();
    let bytes = encode_value(&Value::Array(array)).unwrap();
    assert_eq!(
        bytes,
        vec![TAG_ARRAY, 0, 0, 0, 1, 0, 0, 0, 2, 0x07, 0x03, 0x01]
    );
}

#[test]
fn test_request_layout() {
    let request = Request::new("ADD", vec![Value::Number(2.0), Value::Number(3.0)]);
    let bytes = encode_request(&request).unwrap();

    let mut expected = vec![TAG_TEXT, 0, 0, 0, 3, b'A', b'D', b'D', 0, 0, 0, 2];
    expected.push(TAG_NUMBER);
    expected.extend_from_slice(&2.0f64.to_be_bytes());
    expected.push(TAG_NUMBER);
    expected.extend_from_slice(&3.0f64.to_be_bytes());

    assert_eq!(bytes, expected);
}

#[test]
fn test_bare_request_carries_zero_count() {
    let bytes = encode_request(&Request::bare("NOW")).unwrap();
    assert_eq!(bytes, vec![TAG_TEXT, 0, 0, 0, 3, b'N', b'O', b'W', 0, 0, 0, 0]);
}

#[test]
fn test_encoding_is_deterministic() {
    for value in sample_values() {
        assert_eq!(encode_value(&value).unwrap(), encode_value(&value).unwrap());
    }
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_roundtrip_all_kinds() {
    for value in sample_values() {
        assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn test_roundtrip_every_error_code() {
    for code in [
        ErrorCode::Null,
        ErrorCode::Div0,
        ErrorCode::Value,
        ErrorCode::Ref,
        ErrorCode::Name,
        ErrorCode::Num,
        ErrorCode::NA,
        ErrorCode::GettingData,
    ] {
        assert_eq!(roundtrip(&Value::Error(code)), Value::Error(code));
    }
}

#[test]
fn test_roundtrip_request() {
    let request = Request::new(
        "LOOKUP",
        vec![
            Value::text("key"),
            Value::Missing,
            Value::Array(Array::new(2, 1, vec![Value::Number(1.0), Value::Nil]).unwrap()),
        ],
    );
    let bytes = encode_request(&request).unwrap();
    let mut source = &bytes[..];
    assert_eq!(decode_request(&mut source).unwrap(), request);
    assert!(source.is_empty());
}

#[test]
fn test_consecutive_values_in_one_stream() {
    let mut bytes = encode_value(&Value::Number(1.0)).unwrap();
    bytes.extend(encode_value(&Value::text("x")).unwrap());

    let mut source = &bytes[..];
    assert_eq!(decode_value(&mut source).unwrap(), Value::Number(1.0));
    assert_eq!(decode_value(&mut source).unwrap(), Value::text("x"));
    assert!(source.is_empty());
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_every_truncated_prefix_fails() {
    for value in sample_values() {
        let bytes = encode_value(&value).unwrap();
        for cut in 0..bytes.len() {
            match decode_bytes(&bytes[..cut]) {
                Err(CellwireError::Decode(_)) => {}
                other => panic!(
                    "{:?} truncated at {} of {} gave {:?}",
                    value,
                    cut,
                    bytes.len(),
                    other
                ),
            }
        }
    }
}

#[test]
fn test_truncated_request_fails() {
    let request = Request::new("F", vec![Value::text("abc"), Value::Number(1.0)]);
    let bytes = encode_request(&request).unwrap();
    for cut in 0..bytes.len() {
        let mut source = &bytes[..cut];
        assert!(matches!(
            decode_request(&mut source),
            Err(CellwireError::Decode(_))
        ));
    }
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_unknown_tag() {
    assert!(matches!(decode_bytes(&[0x09]), Err(CellwireError::Decode(_))));
    assert!(matches!(decode_bytes(&[0x00]), Err(CellwireError::Decode(_))));
}

#[test]
fn test_invalid_boolean_byte() {
    assert!(matches!(
        decode_bytes(&[0x03, 0x02]),
        Err(CellwireError::Decode(_))
    ));
}

#[test]
fn test_unknown_error_code() {
    assert!(matches!(
        decode_bytes(&[0x04, 99]),
        Err(CellwireError::Decode(_))
    ));
}

#[test]
fn test_nested_array_rejected_on_decode() {
    let bytes = vec![
        TAG_ARRAY, 0, 0, 0, 1, 0, 0, 0, 1, // 1x1 outer
        TAG_ARRAY, 0, 0, 0, 0, 0, 0, 0, 0, // 0x0 inner
    ];
    assert!(matches!(decode_bytes(&bytes), Err(CellwireError::Decode(_))));
}

#[test]
fn test_huge_array_rejected_without_allocating() {
    let bytes = vec![TAG_ARRAY, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    assert!(matches!(decode_bytes(&bytes), Err(CellwireError::Decode(_))));
}

#[test]
fn test_array_count_beyond_available_bytes() {
    // Claims 1000 cells, delivers one
    let bytes = vec![TAG_ARRAY, 0, 0, 0, 10, 0, 0, 0, 100, 0x07];
    assert!(matches!(decode_bytes(&bytes), Err(CellwireError::Decode(_))));
}

#[test]
fn test_oversized_text_rejected() {
    let len = (MAX_TEXT_LEN as u32 + 1).to_be_bytes();
    let bytes = vec![TAG_TEXT, len[0], len[1], len[2], len[3]];
    assert!(matches!(decode_bytes(&bytes), Err(CellwireError::Decode(_))));
}

#[test]
fn test_request_name_must_be_text() {
    let mut bytes = encode_value(&Value::Number(1.0)).unwrap();
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    let mut source = &bytes[..];
    assert!(matches!(
        decode_request(&mut source),
        Err(CellwireError::Decode(_))
    ));
}

#[test]
fn test_request_count_over_limit() {
    let mut bytes = vec![TAG_TEXT, 0, 0, 0, 1, b'F'];
    bytes.extend_from_slice(&(MAX_ARGS as u32 + 1).to_be_bytes());
    let mut source = &bytes[..];
    assert!(matches!(
        decode_request(&mut source),
        Err(CellwireError::Decode(_))
    ));
}

#[test]
fn test_encode_rejects_too_many_args() {
    let request = Request::new("F", vec![Value::Nil; MAX_ARGS + 1]);
    assert!(matches!(
        encode_request(&request),
        Err(CellwireError::ContractViolation(_))
    ));
}

// =============================================================================
// Stream-based I/O Tests
// =============================================================================

#[test]
fn test_stream_helpers() {
    let request = Request::new("ECHO", vec![Value::Boolean(true)]);
    let mut wire = Vec::new();
    write_request(&mut wire, &request).unwrap();
    write_value(&mut wire, &Value::text("done")).unwrap();

    let mut cursor = Cursor::new(wire);
    assert_eq!(read_request(&mut cursor).unwrap(), request);
    assert_eq!(read_value(&mut cursor).unwrap(), Value::text("done"));
}

#[test]
fn test_stream_source_eof_is_decode_error() {
    let mut source = StreamSource::new(Cursor::new(vec![TAG_NUMBER, 0x40]));
    assert!(matches!(
        decode_value(&mut source),
        Err(CellwireError::Decode(_))
    ));
}
