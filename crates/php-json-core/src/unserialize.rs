//! PHP serialize-format to JSON conversion.
//!
//! The converter dispatches on the one-character type tag, reads each
//! construct's framing with fixed-set expectations, and emits JSON text as
//! soon as the construct is complete. PHP strings are length-prefixed, so the
//! payload is copied scalar by scalar while the declared UTF-8 byte count is
//! run down to exactly zero.

use crate::cursor::Cursor;
use crate::error::{ConversionError, ErrorKind, Result};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

/// Acceptable scalars while reading a decimal length prefix.
const LENGTH_CHARS: &str = "0123456789:";
/// Acceptable scalars while reading an `i:` / `d:` number payload.
const NUMBER_CHARS: &str = "0123456789;.";

/// Convert PHP serialize-format text to a JSON literal.
///
/// PHP arrays are ordered maps, so they always become JSON objects; integer
/// keys are rendered as quoted decimal strings. PHP objects (`O:`) are
/// rejected outright.
///
/// # Example
///
/// ```rust
/// use php_json_core::unserialize;
///
/// let json = unserialize("a:3:{i:0;i:10;i:1;i:11;i:2;i:12;}").unwrap();
/// assert_eq!(json, r#"{"0":10,"1":11,"2":12}"#);
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(php), fields(php_len = php.len())))]
pub fn unserialize(php: &str) -> Result<String> {
    #[cfg(feature = "tracing")]
    debug!(php_len = php.len(), "starting PHP to JSON conversion");

    let mut cursor = Cursor::new(php);
    let result = convert_value(&mut cursor, true);

    #[cfg(feature = "tracing")]
    match &result {
        Ok(json) => debug!(json_len = json.len(), "conversion completed"),
        Err(e) => warn!(error = %e, "conversion failed"),
    }

    result
}

/// Convert the next PHP value at the cursor, dispatching on its type tag.
fn convert_value(cursor: &mut Cursor, root_level: bool) -> Result<String> {
    let Some(tag) = cursor.read_char() else {
        return Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos()));
    };

    match tag {
        'N' => {
            expect_next(cursor, ";")?;
            expect_end(cursor, root_level)?;
            Ok("null".to_string())
        }
        'b' => {
            expect_next(cursor, ":")?;
            let value = match cursor.read_char() {
                Some('1') => "true",
                Some('0') => "false",
                _ => {
                    return Err(ConversionError::new(ErrorKind::Expected("01"), cursor.pos()));
                }
            };
            expect_next(cursor, ";")?;
            expect_end(cursor, root_level)?;
            Ok(value.to_string())
        }
        // The tag already told the producer whether this was an int or a
        // float; the digits are passed through verbatim either way.
        'i' | 'd' => {
            expect_next(cursor, ":")?;
            let mut number = String::new();
            loop {
                let ch = expect_next(cursor, NUMBER_CHARS)?;
                if ch == ';' {
                    expect_end(cursor, root_level)?;
                    return Ok(number);
                }
                number.push(ch);
            }
        }
        's' => convert_string(cursor, root_level),
        'a' => convert_array(cursor, root_level),
        'O' => Err(ConversionError::new(
            ErrorKind::ObjectUnsupported,
            cursor.pos().saturating_sub(1),
        )),
        other => Err(ConversionError::new(
            ErrorKind::UnsupportedType(other),
            cursor.pos().saturating_sub(1),
        )
        .with_input_preview(cursor.input(), cursor.pos().saturating_sub(1))),
    }
}

/// Convert `s:<len>:"<payload>";`, re-escaping the payload as it is copied.
///
/// `len` counts UTF-8 bytes of the payload, not scalars; the running
/// remainder is decremented by each scalar's encoded width and must land on
/// exactly zero at the closing quote.
fn convert_string(cursor: &mut Cursor, root_level: bool) -> Result<String> {
    expect_next(cursor, ":")?;
    let mut remaining = expect_length(cursor)?;
    expect_next(cursor, "\"")?;

    if remaining < 0 {
        return Err(ConversionError::new(ErrorKind::UnmatchedLength, cursor.pos()));
    }

    if remaining == 0 {
        expect_next(cursor, "\"")?;
        expect_next(cursor, ";")?;
        expect_end(cursor, root_level)?;
        return Ok("\"\"".to_string());
    }

    let mut result = String::from('"');
    loop {
        let Some(ch) = cursor.read_char() else {
            return Err(ConversionError::new(ErrorKind::UnmatchedLength, cursor.pos()));
        };
        match ch {
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            other => result.push(other),
        }
        remaining -= ch.len_utf8() as i64;

        if remaining == 0 {
            if cursor.read_char() != Some('"') {
                return Err(ConversionError::new(ErrorKind::UnmatchedLength, cursor.pos()));
            }
            expect_next(cursor, ";")?;
            expect_end(cursor, root_level)?;
            result.push('"');
            return Ok(result);
        }
        if remaining < 0 {
            return Err(ConversionError::new(ErrorKind::UnmatchedLength, cursor.pos()));
        }
    }
}

/// Convert `a:<count>:{<key><value>...}` into a JSON object.
///
/// Exactly `count` key/value pairs are read; keys that arrived as bare PHP
/// integers are forced into quoted JSON-key form.
fn convert_array(cursor: &mut Cursor, root_level: bool) -> Result<String> {
    expect_next(cursor, ":")?;
    let mut count = expect_length(cursor)?;
    expect_next(cursor, "{")?;

    let mut items: Vec<String> = Vec::new();
    while count > 0 {
        count -= 1;
        let mut key = convert_value(cursor, false)?;
        if !key.starts_with('"') {
            key = format!("\"{}\"", key);
        }
        let value = convert_value(cursor, false)?;
        items.push(format!("{}:{}", key, value));
    }
    expect_next(cursor, "}")?;
    expect_end(cursor, root_level)?;
    Ok(format!("{{{}}}", items.join(",")))
}

/// Read one scalar and require it to be a member of `set`.
fn expect_next(cursor: &mut Cursor, set: &'static str) -> Result<char> {
    match cursor.read_char() {
        Some(ch) if set.contains(ch) => Ok(ch),
        _ => Err(ConversionError::new(ErrorKind::Expected(set), cursor.pos())),
    }
}

/// Read a decimal length terminated by `:`.
///
/// An empty digit run, or one that does not fit the length type, is a hard
/// failure rather than a silent zero.
fn expect_length(cursor: &mut Cursor) -> Result<i64> {
    let mut digits = String::new();
    loop {
        let ch = expect_next(cursor, LENGTH_CHARS)?;
        if ch == ':' {
            return digits.parse().map_err(|_| {
                ConversionError::new(ErrorKind::SyntaxError, cursor.pos())
                    .with_context("declared length is not a valid integer")
            });
        }
        digits.push(ch);
    }
}

/// At root level, reject any trailing input, whitespace included.
fn expect_end(cursor: &Cursor, root_level: bool) -> Result<()> {
    if root_level && cursor.has_next() {
        return Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos())
            .with_context("trailing input after the root value")
            .with_input_preview(cursor.input(), cursor.pos()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_value() {
        assert_eq!(unserialize("N;").unwrap(), "null");
    }

    #[test]
    fn booleans() {
        assert_eq!(unserialize("b:1;").unwrap(), "true");
        assert_eq!(unserialize("b:0;").unwrap(), "false");
    }

    #[test]
    fn numbers_pass_through_verbatim() {
        assert_eq!(unserialize("i:42;").unwrap(), "42");
        assert_eq!(
            unserialize("d:42.378900000000002;").unwrap(),
            "42.378900000000002"
        );
    }

    #[test]
    fn strings() {
        assert_eq!(unserialize(r#"s:0:"";"#).unwrap(), r#""""#);
        assert_eq!(unserialize(r#"s:6:"foobar";"#).unwrap(), r#""foobar""#);
        assert_eq!(unserialize("s:6:\"한글\";").unwrap(), "\"한글\"");
    }

    #[test]
    fn strings_reescape_control_scalars() {
        assert_eq!(unserialize("s:1:\"\r\";").unwrap(), r#""\r""#);
        assert_eq!(unserialize("s:1:\"\t\";").unwrap(), r#""\t""#);
        assert_eq!(unserialize("s:1:\"\n\";").unwrap(), r#""\n""#);
        assert_eq!(unserialize(r#"s:1:"\";"#).unwrap(), r#""\\""#);
        assert_eq!(unserialize(r#"s:1:""";"#).unwrap(), r#""\"""#);
        assert_eq!(unserialize(r#"s:1:"/";"#).unwrap(), r#""/""#);
    }

    #[test]
    fn string_length_counts_bytes_not_scalars() {
        // Four bytes, one scalar.
        assert_eq!(unserialize("s:4:\"😄\";").unwrap(), "\"😄\"");
    }

    #[test]
    fn arrays_become_json_objects() {
        assert_eq!(unserialize("a:0:{}").unwrap(), "{}");
        assert_eq!(
            unserialize("a:3:{i:0;i:10;i:1;i:11;i:2;i:12;}").unwrap(),
            r#"{"0":10,"1":11,"2":12}"#
        );
        assert_eq!(
            unserialize(r#"a:2:{s:3:"foo";i:4;s:3:"bar";i:2;}"#).unwrap(),
            r#"{"foo":4,"bar":2}"#
        );
    }

    #[test]
    fn nested_arrays() {
        assert_eq!(
            unserialize("a:2:{i:1;s:4:\"😄\";i:0;a:1:{i:1;s:4:\"😄\";}}").unwrap(),
            "{\"1\":\"😄\",\"0\":{\"1\":\"😄\"}}"
        );
    }

    #[test]
    fn realistic_payload() {
        let php = r#"a:4:{s:6:"_token";s:40:"nSh5GbbZplACOiAtPz13QVWqnANf8KEPhph4LDgX";s:11:"play_status";s:6:"queued";s:9:"_previous";a:1:{s:3:"url";s:27:"http://localhost:8081/login";}s:6:"_flash";a:2:{s:3:"old";a:0:{}s:3:"new";a:0:{}}}"#;
        let json = r#"{"_token":"nSh5GbbZplACOiAtPz13QVWqnANf8KEPhph4LDgX","play_status":"queued","_previous":{"url":"http://localhost:8081/login"},"_flash":{"old":{},"new":{}}}"#;
        assert_eq!(unserialize(php).unwrap(), json);
    }

    #[test]
    fn objects_are_rejected() {
        let err = unserialize(r#"O:4:"Test":3:{s:6:"public";i:1;}"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ObjectUnsupported));
        // Never a partial object, regardless of payload.
        let err = unserialize("O:garbage").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ObjectUnsupported));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let err = unserialize("X:1;").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedType('X')));
        let err = unserialize("😄").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedType('😄')));
    }

    #[test]
    fn empty_input_is_a_syntax_error() {
        let err = unserialize("").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SyntaxError));
    }

    #[test]
    fn length_mismatches() {
        // Declared length shorter than the payload.
        let err = unserialize(r#"s:1:"abc";"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnmatchedLength));
        // Declared length longer than the payload.
        let err = unserialize(r#"s:10:"abc";"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnmatchedLength));
        // A declared length that lands mid-scalar overshoots to negative.
        let err = unserialize("s:3:\"😄\";").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnmatchedLength));
    }

    #[test]
    fn negative_length_never_reaches_the_payload() {
        let err = unserialize(r#"s:-1:"";"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Expected(_)));
    }

    #[test]
    fn unparsable_length_is_a_hard_failure() {
        let err = unserialize(r#"s::"";"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SyntaxError));
        let err = unserialize("a:99999999999999999999:{}").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SyntaxError));
    }

    #[test]
    fn truncated_input() {
        assert!(unserialize("N").is_err());
        assert!(unserialize("s:1").is_err());
        assert!(unserialize("i:100").is_err());
        assert!(unserialize("d:100").is_err());
    }

    #[test]
    fn trailing_input_after_root_value() {
        for input in ["N;;", "i:100;;", "d:100;;", "b:1;;", r#"s:0:"";;"#, r#"s:1:"a";;"#] {
            let err = unserialize(input).unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::SyntaxError),
                "expected syntax error for {:?}",
                input
            );
        }
        assert!(unserialize("a:3:{i:0;i:10;i:1;i:11;i:2;i:12;};").is_err());
        // No whitespace is tolerated on the PHP side.
        assert!(unserialize("N; ").is_err());
    }

    #[test]
    fn array_count_must_match_pairs() {
        // Fewer pairs than declared: the count loop runs into the brace.
        assert!(unserialize("a:4:{i:0;i:10;i:1;i:11;i:2;i:12;}").is_err());
        assert!(unserialize("a:3:{};").is_err());
        // More pairs than declared: trailing content before the brace.
        let err = unserialize("a:2:{i:0;i:10;i:1;i:11;i:2;i:12;}").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Expected("}")));
    }

    #[test]
    fn invalid_booleans() {
        let err = unserialize("b:2;").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Expected("01")));
        assert!(unserialize("b:1;;").is_err());
    }

    #[test]
    fn signs_are_not_part_of_number_payloads() {
        assert!(unserialize("i:-5;").is_err());
        assert!(unserialize("d:-2.5;").is_err());
    }
}
