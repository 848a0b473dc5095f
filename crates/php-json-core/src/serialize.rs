//! JSON to PHP serialize-format conversion.
//!
//! The converter walks the JSON text with one scalar of lookahead and emits
//! PHP text fragment by fragment; nested values are produced by recursive
//! calls whose results the caller concatenates. No value tree is built.

use crate::cursor::Cursor;
use crate::error::{ConversionError, ErrorKind, Result};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

/// Scalars that may appear in a JSON numeric literal.
const NUMBER_CHARS: &str = "-0123456789eE.+";

/// Convert a JSON literal to PHP serialize-format text.
///
/// String lengths are emitted as exact UTF-8 byte counts, JSON arrays become
/// PHP arrays with implicit `0..n` integer keys, and object keys composed
/// solely of decimal digits become PHP integer keys.
///
/// # Example
///
/// ```rust
/// use php_json_core::serialize;
///
/// let php = serialize(r#"{"foo":4,"bar":2}"#).unwrap();
/// assert_eq!(php, r#"a:2:{s:3:"foo";i:4;s:3:"bar";i:2;}"#);
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(json), fields(json_len = json.len())))]
pub fn serialize(json: &str) -> Result<String> {
    #[cfg(feature = "tracing")]
    debug!(json_len = json.len(), "starting JSON to PHP conversion");

    let mut cursor = Cursor::new(json);
    let result = convert_value(&mut cursor, false, true);

    #[cfg(feature = "tracing")]
    match &result {
        Ok(php) => debug!(php_len = php.len(), "conversion completed"),
        Err(e) => warn!(error = %e, "conversion failed"),
    }

    result
}

/// Convert the next JSON value at the cursor.
///
/// `prefer_int` marks a JSON object key position: a fully numeric string
/// there is emitted as a PHP integer instead of a string. `root_level`
/// enables the trailing-input check once the value is complete.
fn convert_value(cursor: &mut Cursor, prefer_int: bool, root_level: bool) -> Result<String> {
    skip_whitespace(cursor);

    match cursor.peek_char() {
        Some('"') => {
            cursor.read_char();
            let text = read_string(cursor)?;
            expect_end(cursor, root_level)?;
            // Quotes are ASCII, so byte-slicing them off is safe.
            let content = &text[1..text.len() - 1];
            if prefer_int && !content.is_empty() && content.chars().all(|c| c.is_ascii_digit()) {
                return Ok(format!("i:{};", content));
            }
            Ok(format!("s:{}:{};", text.len() - 2, text))
        }
        Some('t') => {
            cursor.read_char();
            expect_literal(cursor, "rue")?;
            expect_end(cursor, root_level)?;
            Ok("b:1;".to_string())
        }
        Some('f') => {
            cursor.read_char();
            expect_literal(cursor, "alse")?;
            expect_end(cursor, root_level)?;
            Ok("b:0;".to_string())
        }
        Some('n') => {
            cursor.read_char();
            expect_literal(cursor, "ull")?;
            expect_end(cursor, root_level)?;
            Ok("N;".to_string())
        }
        Some('[') => {
            cursor.read_char();
            let mut items: Vec<String> = Vec::new();
            loop {
                skip_whitespace(cursor);
                match cursor.peek_char() {
                    // End of input closes the list like `]` does.
                    None | Some(']') => {
                        cursor.read_char();
                        expect_end(cursor, root_level)?;
                        return Ok(format!("a:{}:{{{}}}", items.len() / 2, items.concat()));
                    }
                    Some(ch) => {
                        if ch == ',' {
                            cursor.read_char();
                        }
                        items.push(format!("i:{};", items.len() / 2));
                        items.push(convert_value(cursor, false, false)?);
                    }
                }
            }
        }
        Some('{') => {
            cursor.read_char();
            let mut items: Vec<String> = Vec::new();
            let mut key_position = true;
            loop {
                skip_whitespace(cursor);
                match cursor.peek_char() {
                    None | Some('}') => {
                        cursor.read_char();
                        expect_end(cursor, root_level)?;
                        return Ok(format!("a:{}:{{{}}}", items.len() / 2, items.concat()));
                    }
                    Some(_) => {
                        if cursor.peek_char() == Some(',') {
                            cursor.read_char();
                        }
                        if cursor.peek_char() == Some(':') {
                            cursor.read_char();
                        }
                        items.push(convert_value(cursor, key_position, false)?);
                        key_position = !key_position;
                    }
                }
            }
        }
        Some(ch) if NUMBER_CHARS.contains(ch) => {
            let run = read_number(cursor)?;
            expect_end(cursor, root_level)?;
            let scientific = run.contains('e') || run.contains('E');
            let flag = if scientific || run.contains('.') { 'd' } else { 'i' };
            Ok(format!("{}:{};", flag, run))
        }
        None => Ok(r#"s:0:"";"#.to_string()),
        Some(_) => Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos())
            .with_input_preview(cursor.input(), cursor.pos())),
    }
}

/// Advance past JSON whitespace (space, tab, CR, LF).
fn skip_whitespace(cursor: &mut Cursor) {
    while let Some(ch) = cursor.peek_char() {
        if matches!(ch, ' ' | '\t' | '\r' | '\n') {
            cursor.read_char();
        } else {
            break;
        }
    }
}

/// At root level, reject any trailing non-whitespace input.
fn expect_end(cursor: &mut Cursor, root_level: bool) -> Result<()> {
    if !root_level {
        return Ok(());
    }
    skip_whitespace(cursor);
    if cursor.has_next() {
        return Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos())
            .with_context("trailing input after the root value")
            .with_input_preview(cursor.input(), cursor.pos()));
    }
    Ok(())
}

/// Consume the remaining scalars of a keyword, character by character.
fn expect_literal(cursor: &mut Cursor, rest: &str) -> Result<()> {
    for expected in rest.chars() {
        if cursor.read_char() != Some(expected) {
            return Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos()));
        }
    }
    Ok(())
}

/// Consume one quoted JSON string, the opening `"` having been read already.
///
/// The returned text keeps its surrounding quotes so the caller can reuse it
/// verbatim as a PHP string payload. Escapes are decoded as they are copied:
/// `\n`, `\r`, `\t` and `\\` become their literal scalars, `\uXXXX` becomes
/// the scalar it names, and any other escaped scalar (`\"`, `\/`) is kept
/// as itself.
fn read_string(cursor: &mut Cursor) -> Result<String> {
    let mut text = String::from('"');
    let mut escaping = false;

    while let Some(ch) = cursor.read_char() {
        if ch == '\n' || ch == '\r' {
            return Err(ConversionError::new(ErrorKind::UnterminatedString, cursor.pos()));
        }

        if escaping {
            match ch {
                'n' => text.push('\n'),
                'r' => text.push('\r'),
                't' => text.push('\t'),
                '\\' => text.push('\\'),
                'u' => text.push(read_unicode_escape(cursor)?),
                other => text.push(other),
            }
            escaping = false;
        } else if ch == '\\' {
            escaping = true;
        } else {
            text.push(ch);
            if ch == '"' {
                return Ok(text);
            }
        }
    }

    Err(ConversionError::new(ErrorKind::UnterminatedString, cursor.pos()))
}

/// Decode the four hex digits of a `\u` escape into the scalar they name.
fn read_unicode_escape(cursor: &mut Cursor) -> Result<char> {
    let mut code = 0u32;
    for _ in 0..4 {
        let digit = cursor
            .read_char()
            .and_then(|ch| ch.to_digit(16))
            .ok_or_else(|| {
                ConversionError::new(ErrorKind::UnterminatedUnicodeEscape, cursor.pos())
            })?;
        code = code * 16 + digit;
    }
    // Well-formed hex can still name no scalar (surrogate halves).
    char::from_u32(code).ok_or_else(|| ConversionError::new(ErrorKind::SyntaxError, cursor.pos()))
}

/// Consume a maximal run of numeric-literal scalars.
///
/// The run must end in a decimal digit; `1.` and `3e` are malformed.
fn read_number(cursor: &mut Cursor) -> Result<String> {
    let mut run = String::new();
    loop {
        let Some(ch) = cursor.read_char() else { break };
        run.push(ch);
        match cursor.peek_char() {
            Some(next) if NUMBER_CHARS.contains(next) => {}
            _ => break,
        }
    }
    if !run.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(ConversionError::new(ErrorKind::SyntaxError, cursor.pos()));
    }
    Ok(run)
}
