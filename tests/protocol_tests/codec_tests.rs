//! Codec Tests
//!
//! Tests for request and reply encoding/decoding.

use std::io::Cursor;

use bytes::Bytes;
use openshowvar::protocol::{
    decode_request, decode_response, encode_read, encode_request, encode_response,
    encode_write, read_request, read_response, write_frame, Flag, Request, MAX_FIELD_LEN,
    STATUS_FAILED, STATUS_OK,
};
use openshowvar::{OsvError, ProtocolError};

// =============================================================================
// Helper Functions
// =============================================================================

fn body_len(frame: &[u8]) -> usize {
    u16::from_be_bytes([frame[2], frame[3]]) as usize
}

/// Reply frame assembled by hand, independent of `encode_response`
fn raw_reply(id: u16, flag: u8, value: &[u8], status: [u8; 3]) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&id.to_be_bytes());
    frame.extend_from_slice(&((6 + value.len()) as u16).to_be_bytes());
    frame.push(flag);
    frame.extend_from_slice(&(value.len() as u16).to_be_bytes());
    frame.extend_from_slice(value);
    frame.extend_from_slice(&status);
    frame
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_read_exact_bytes() {
    let frame = encode_read(42, b"$OV_PRO").unwrap();

    let expected: &[u8] = &[
        0x00, 0x2A, // sequence id 42
        0x00, 0x0A, // body length 10
        0x00, // read flag
        0x00, 0x07, // name length 7
        0x24, 0x4F, 0x56, 0x5F, 0x50, 0x52, 0x4F, // "$OV_PRO"
    ];
    assert_eq!(&frame[..], expected);
}

#[test]
fn test_encode_write_exact_bytes() {
    let frame = encode_write(0x0102, b"SCHICHT", b"80").unwrap();

    let mut expected = vec![0x01, 0x02, 0x00, 0x0E, 0x01, 0x00, 0x07];
    expected.extend_from_slice(b"SCHICHT");
    expected.extend_from_slice(&[0x00, 0x02]);
    expected.extend_from_slice(b"80");
    assert_eq!(&frame[..], &expected[..]);
}

#[test]
fn test_read_body_len_is_three_plus_name() {
    let long_name = [b'x'; 300];
    let names: [&[u8]; 4] = [b"A", b"$OV_PRO", b"$ROBNAME[]", &long_name];
    for name in names {
        let frame = encode_read(1, name).unwrap();
        assert_eq!(body_len(&frame), 3 + name.len());
        assert_eq!(frame.len(), 4 + body_len(&frame));
    }
}

#[test]
fn test_write_body_len_includes_value() {
    let cases: [(&[u8], &[u8]); 3] = [
        (b"SCHICHT", b"80"),
        (b"$OUT[3]", b"TRUE"),
        (b"POS", b"{X 10.5, Y 20.0, Z 300.25}"),
    ];
    for (name, value) in cases {
        let frame = encode_write(7, name, value).unwrap();
        assert_eq!(body_len(&frame), 3 + name.len() + 2 + value.len());
        assert_eq!(frame.len(), 4 + body_len(&frame));
    }
}

#[test]
fn test_encode_request_matches_specific_encoders() {
    let read = Request::read(&b"$OV_PRO"[..]);
    let write = Request::write(&b"SCHICHT"[..], &b"80"[..]);

    assert_eq!(encode_request(9, &read).unwrap(), encode_read(9, b"$OV_PRO").unwrap());
    assert_eq!(
        encode_request(9, &write).unwrap(),
        encode_write(9, b"SCHICHT", b"80").unwrap()
    );
    assert_eq!(read.flag(), Flag::Read);
    assert_eq!(write.flag(), Flag::Write);
}

#[test]
fn test_encode_name_too_large() {
    let name = vec![b'n'; MAX_FIELD_LEN + 1];
    let err = encode_read(1, &name).unwrap_err();

    assert!(matches!(
        err,
        OsvError::ValueTooLarge {
            field: "variable name",
            len: 65_536,
            max: 65_535
        }
    ));
}

#[test]
fn test_encode_value_too_large() {
    let value = vec![b'v'; MAX_FIELD_LEN + 1];
    let err = encode_write(1, b"X", &value).unwrap_err();

    assert!(matches!(err, OsvError::ValueTooLarge { field: "variable value", .. }));
}

#[test]
fn test_encode_body_overflow_rejected() {
    // Each field fits 16 bits, the sum does not
    let name = vec![b'n'; 40_000];
    let value = vec![b'v'; 40_000];
    let err = encode_write(1, &name, &value).unwrap_err();

    assert!(matches!(err, OsvError::ValueTooLarge { field: "frame body", .. }));
}

#[test]
fn test_encode_largest_read() {
    let name = vec![b'n'; MAX_FIELD_LEN - 3];
    let frame = encode_read(1, &name).unwrap();
    assert_eq!(body_len(&frame), MAX_FIELD_LEN);
}

// =============================================================================
// Response Decoding Tests
// =============================================================================

#[test]
fn test_decode_response_auto() {
    let frame = raw_reply(42, 0, b"AUTO", [0x00, 0x00, 0x01]);
    let response = decode_response(&frame).unwrap();

    assert_eq!(response.sequence_id, 42);
    assert_eq!(response.flag, 0);
    assert_eq!(response.value, Bytes::from_static(b"AUTO"));
    assert_eq!(response.status, [0x00, 0x00, 0x01]);
    assert!(response.is_success());
}

#[test]
fn test_decode_failure_status() {
    let frame = raw_reply(42, 0, b"", [0x00, 0x01, 0x00]);
    let response = decode_response(&frame).unwrap();

    assert!(response.value.is_empty());
    assert!(!response.is_success());
}

#[test]
fn test_decode_derives_length_from_frame_size() {
    // value_len field claims 2 bytes, the frame carries 5
    let mut frame = raw_reply(3, 0, b"HELLO", STATUS_OK);
    frame[5..7].copy_from_slice(&2u16.to_be_bytes());

    let response = decode_response(&frame).unwrap();
    assert_eq!(response.value, Bytes::from_static(b"HELLO"));
}

#[test]
fn test_decode_truncated() {
    for len in [0, 1, 4, 7, 9] {
        let frame = vec![0u8; len];
        let err = decode_response(&frame).unwrap_err();
        assert!(matches!(
            err,
            OsvError::Protocol(ProtocolError::TruncatedFrame { expected: 10, actual }) if actual == len
        ));
        assert!(err.is_fatal());
    }
}

#[test]
fn test_decode_minimum_frame() {
    let frame = raw_reply(1, 1, b"", STATUS_OK);
    assert_eq!(frame.len(), 10);
    assert!(decode_response(&frame).unwrap().value.is_empty());
}

#[test]
fn test_decode_value_of_maximum_field_length() {
    // The body_len field cannot describe this frame; decoding ignores it
    let value = vec![b'z'; MAX_FIELD_LEN];
    let frame = raw_reply(5, 0, &value, STATUS_OK);

    let response = decode_response(&frame).unwrap();
    assert_eq!(response.value.len(), MAX_FIELD_LEN);
}

#[test]
fn test_response_roundtrip_sizes() {
    for len in [0usize, 1, 255, 256, 257, 4096, 65_529] {
        let value: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let frame = encode_response(1000, 0, &value, STATUS_OK).unwrap();
        let response = decode_response(&frame).unwrap();

        assert_eq!(response.sequence_id, 1000);
        assert_eq!(&response.value[..], &value[..], "value of {} bytes", len);
    }
}

#[test]
fn test_binary_value_passes_through() {
    let value: Vec<u8> = (0..=255).collect();
    let frame = encode_response(1, 0, &value, STATUS_OK).unwrap();
    assert_eq!(&decode_response(&frame).unwrap().value[..], &value[..]);
}

// =============================================================================
// Request Decoding Tests (controller side)
// =============================================================================

#[test]
fn test_decode_request_read_and_write() {
    let (id, request) = decode_request(&encode_read(12, b"$OV_PRO").unwrap()).unwrap();
    assert_eq!(id, 12);
    assert_eq!(request, Request::read(&b"$OV_PRO"[..]));

    let (id, request) = decode_request(&encode_write(13, b"SCHICHT", b"80").unwrap()).unwrap();
    assert_eq!(id, 13);
    assert_eq!(request, Request::write(&b"SCHICHT"[..], &b"80"[..]));
}

#[test]
fn test_decode_request_unknown_flag() {
    let mut frame = encode_read(1, b"X").unwrap().to_vec();
    frame[4] = 0x07;

    let err = decode_request(&frame).unwrap_err();
    assert!(matches!(err, OsvError::Protocol(ProtocolError::MalformedFrame(_))));
}

#[test]
fn test_decode_request_bad_lengths() {
    // name_len larger than the body
    let mut frame = encode_read(1, b"ABC").unwrap().to_vec();
    frame[5..7].copy_from_slice(&9u16.to_be_bytes());
    assert!(decode_request(&frame).unwrap_err().is_fatal());

    // body_len disagrees with frame size
    let mut frame = encode_read(1, b"ABC").unwrap().to_vec();
    frame.push(0);
    assert!(matches!(
        decode_request(&frame).unwrap_err(),
        OsvError::Protocol(ProtocolError::MalformedFrame(_))
    ));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_read_response_from_stream() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&raw_reply(1, 0, b"first", STATUS_OK));
    stream.extend_from_slice(&raw_reply(2, 0, b"second", STATUS_FAILED));
    let mut cursor = Cursor::new(stream);

    let first = read_response(&mut cursor).unwrap();
    let second = read_response(&mut cursor).unwrap();

    assert_eq!(first.value, Bytes::from_static(b"first"));
    assert_eq!(second.sequence_id, 2);
    assert!(!second.is_success());
}

#[test]
fn test_read_response_larger_than_256_bytes() {
    let value = vec![b'q'; 1000];
    let mut cursor = Cursor::new(raw_reply(9, 0, &value, STATUS_OK));

    let response = read_response(&mut cursor).unwrap();
    assert_eq!(response.value.len(), 1000);
}

#[test]
fn test_read_response_eof_is_connection_closed() {
    let mut cursor = Cursor::new(Vec::new());
    assert!(matches!(read_response(&mut cursor), Err(OsvError::ConnectionClosed)));

    // Header promises more than the stream holds
    let frame = raw_reply(1, 0, b"partial", STATUS_OK);
    let mut cursor = Cursor::new(frame[..8].to_vec());
    assert!(matches!(read_response(&mut cursor), Err(OsvError::ConnectionClosed)));
}

#[test]
fn test_write_then_read_request() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, &encode_write(77, b"$OUT[1]", b"TRUE").unwrap()).unwrap();

    let (id, request) = read_request(&mut Cursor::new(buffer)).unwrap();
    assert_eq!(id, 77);
    assert_eq!(request.name(), &Bytes::from_static(b"$OUT[1]"));
    assert_eq!(request.value(), Some(&Bytes::from_static(b"TRUE")));
}
