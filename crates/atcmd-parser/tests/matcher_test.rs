//! Integration tests for response matching.

mod common;

use atcmd_parser::{AtError, ErrorKind, ParserConfig, Value};
use common::{session, session_with_input, ScriptedTransport};
use std::time::Duration;

// ============================================================================
// Literal patterns
// ============================================================================

#[test]
fn test_literal_found_verbatim() {
    let mut at = session_with_input(b"\r\nOK\r\n");
    assert!(at.recv("OK").unwrap().is_empty());
}

#[test]
fn test_literal_missing_times_out() {
    let mut at = session_with_input(b"\r\nERROR\r\n");
    let err = at.recv("OK").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(at.transport().remaining(), 0);
}

#[test]
fn test_literal_inside_noise_line_is_skipped() {
    // Matching starts at the beginning of a candidate line, so "NOT OK"
    // never matches "OK" and the real OK on the next line does.
    let mut at = session_with_input(b"NOT OK\nOK\n");
    assert!(at.recv("OK\n").unwrap().is_empty());
    assert_eq!(at.transport().remaining(), 0);
}

#[test]
fn test_empty_pattern_reads_nothing() {
    let mut at = session_with_input(b"OK\r\n");
    assert!(at.recv("").unwrap().is_empty());
    assert_eq!(at.transport().reads(), 0);
}

// ============================================================================
// Captures
// ============================================================================

#[test]
fn test_send_then_receive_round_trip() {
    let mut at = session(ScriptedTransport::new().with_echo());
    at.send("CMD=%d", &[5.into()]).unwrap();
    assert_eq!(at.transport().written(), b"CMD=5\r");

    let values = at.recv("CMD=%d").unwrap();
    assert_eq!(values, vec![Value::Int(5)]);
}

#[test]
fn test_terminated_line_captures_all_digits() {
    let mut at = session_with_input(b"+CMGS: 123\r\n");
    let values = at.recv("+CMGS: %d\r\n").unwrap();
    assert_eq!(values[0].as_i64(), Some(123));
}

#[test]
fn test_multi_line_response_with_noise() {
    let mut at = session_with_input(
        b"AT+CSQ\r\r\n\xff\xfe\r\n+CSQ: 21,99\r\n\r\nOK\r\n",
    );
    let values = at.recv("+CSQ: %d,%d\r\nOK\r\n").unwrap();
    assert_eq!(values, vec![Value::Int(21), Value::Int(99)]);
}

#[test]
fn test_mixed_conversions() {
    let mut at = session_with_input(b"+CBC: 0,87,4.12V\r\n+CGMR: rev_7 build\r\nOK\r\n");
    let values = at
        .recv("+CBC: %u,%d,%fV\r\n+CGMR: %s %*s\r\nOK")
        .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Uint(0),
            Value::Int(87),
            Value::Float(4.12),
            Value::Str("rev_7".into()),
        ]
    );
}

#[test]
fn test_empty_rest_of_line_capture() {
    let mut at = session_with_input(b"+CMD:\r\n");
    let values = at.recv("+CMD:%[^\r\n]\r\n").unwrap();
    assert_eq!(values, vec![Value::Str(String::new())]);
}

#[test]
fn test_non_empty_rest_of_line_capture() {
    let mut at = session_with_input(b"+CMD:hello world\r\n");
    let values = at.recv("+CMD:%[^\r\n]\r\n").unwrap();
    assert_eq!(values[0].as_str(), Some("hello world"));
}

#[test]
fn test_empty_capture_with_bare_newline() {
    let mut at = session_with_input(b"+CMD:\n");
    let values = at.recv("+CMD:%[^\r\n]\n").unwrap();
    assert_eq!(values, vec![Value::Str(String::new())]);
}

#[test]
fn test_percent_literal_in_pattern() {
    let mut at = session_with_input(b"+CBC: 87%\r\n");
    let values = at.recv("+CBC: %d%%\r\n").unwrap();
    assert_eq!(values, vec![Value::Int(87)]);
}

// ============================================================================
// Captures closed by a literal
// ============================================================================

#[test]
fn test_quoted_capture_in_multi_line_response() {
    let mut at = session_with_input(b"+COPS: 0,0,\"Vodafone\"\r\nOK\r\n");
    let values = at.recv("+COPS: %d,%d,\"%[^\"]\"\r\nOK\r\n").unwrap();
    assert_eq!(
        values,
        vec![Value::Int(0), Value::Int(0), Value::Str("Vodafone".into())]
    );
}

#[test]
fn test_quoted_capture_empty() {
    let mut at = session_with_input(b"+COPS: 0,0,\"\"\r\n");
    let values = at.recv("+COPS: %d,%d,\"%[^\"]\"\r\n").unwrap();
    assert_eq!(
        values,
        vec![Value::Int(0), Value::Int(0), Value::Str(String::new())]
    );
}

#[test]
fn test_quoted_capture_with_bare_newline() {
    let mut at = session_with_input(b"+COPS: 1,2,\"Telia\"\n+COPS: 1,2,\"\"\n");
    let values = at.recv("+COPS: %d,%d,\"%[^\"]\"\n").unwrap();
    assert_eq!(values[2].as_str(), Some("Telia"));

    let values = at.recv("+COPS: %d,%d,\"%[^\"]\"\n").unwrap();
    assert_eq!(values[2].as_str(), Some(""));
}

#[test]
fn test_field_before_trailing_comma() {
    let mut at = session_with_input(b"+CPBR: 1,Anna,\r\n+CPBR: 12,,\r\n");
    let values = at.recv("+CPBR: %d,%[^,],\r\n").unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::Str("Anna".into())]);

    let values = at.recv("+CPBR: %d,%[^,],\r\n").unwrap();
    assert_eq!(values, vec![Value::Int(12), Value::Str(String::new())]);
}

#[test]
fn test_field_before_trailing_comma_with_bare_newline() {
    let mut at = session_with_input(b"+CPBR: 3,,\n+CPBR: 4,Bo,\n");
    let values = at.recv("+CPBR: %d,%[^,],\n").unwrap();
    assert_eq!(values, vec![Value::Int(3), Value::Str(String::new())]);

    let values = at.recv("+CPBR: %d,%[^,],\n").unwrap();
    assert_eq!(values, vec![Value::Int(4), Value::Str("Bo".into())]);
}

#[test]
fn test_single_char_capture_is_never_padded() {
    // `%c` always takes a byte, so an empty field reads the terminator.
    let mut at = session_with_input(b"+X:A\r\n+X:\r\n");
    assert_eq!(at.recv("+X:%c\r\n").unwrap(), vec![Value::Str("A".into())]);
    assert_eq!(at.recv("+X:%c\r\n").unwrap(), vec![Value::Str("\r".into())]);
    assert_eq!(at.transport().remaining(), 0);
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn test_partial_success_is_visible() {
    let mut at = session_with_input(b"+CSQ: 5,0\r\nERROR\r\n");
    let mut values = Vec::new();
    let err = at
        .recv_into("+CSQ: %d,%d\r\nOK\r\n", &mut values)
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(values, vec![Value::Int(5), Value::Int(0)]);
}

#[test]
fn test_capacity_overflow_resets_then_times_out() {
    let transport = ScriptedTransport::new().with_input(&[b'#'; 500]);
    let config = ParserConfig::default()
        .with_timeout(Duration::from_millis(10))
        .with_buffer_size(32);
    let mut at = atcmd_parser::AtParser::new(transport, config).unwrap();

    let err = at.recv("OK\r\n").unwrap_err();
    assert!(matches!(err, AtError::Timeout));
    assert_eq!(at.transport().remaining(), 0);
    assert!(at.scratch().candidate().len() < at.scratch().capacity());
}

#[test]
fn test_capacity_overflow_recovers() {
    let mut transport = ScriptedTransport::new().with_input(&[b'#'; 500]);
    transport.push(b"\r\nOK\r\n");
    let config = ParserConfig::default()
        .with_timeout(Duration::from_millis(10))
        .with_buffer_size(32);
    let mut at = atcmd_parser::AtParser::new(transport, config).unwrap();

    assert!(at.recv("OK\r\n").unwrap().is_empty());
}

#[test]
fn test_scripted_timeout_interrupts_response() {
    let mut transport = ScriptedTransport::new().with_input(b"+CSQ: 1");
    transport.push_timeout();
    transport.push(b"2,3\r\n");
    let mut at = session(transport);

    assert!(at.recv("+CSQ: %d,%d\r\n").unwrap_err().is_timeout());
    assert_eq!(at.transport().remaining(), 5);
}

#[test]
fn test_invalid_pattern() {
    let mut at = session_with_input(b"OK\r\n");
    let err = at.recv("OK %q").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPattern);
    assert_eq!(at.transport().reads(), 0);
}
