//! Error types for JSON/PHP text conversion.
//!
//! Every error carries the scalar position where it was raised, and can be
//! enriched with context and a preview of the input around the failure.

use std::fmt;
use thiserror::Error;

/// The main error type for a failed conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The scalar position (cursor index) where the error occurred.
    pub position: usize,
    /// Optional context about what was being converted.
    pub context: Option<String>,
    /// Preview of input around the error position for debugging.
    pub input_preview: Option<String>,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        if let Some(ref preview) = self.input_preview {
            write!(f, "\n{}", preview)?;
        }
        Ok(())
    }
}

/// Specific kinds of conversion errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The next scalar was not in an enumerated acceptable set.
    #[error("expected `{0}`")]
    Expected(&'static str),

    /// A PHP object (`O:`) tag was encountered.
    #[error("PHP objects are not supported")]
    ObjectUnsupported,

    /// An unrecognized PHP type tag.
    #[error("unsupported type tag '{0}'")]
    UnsupportedType(char),

    /// A JSON string reached end of input or a raw newline before its
    /// closing quote.
    #[error("unterminated string")]
    UnterminatedString,

    /// A `\u` escape with fewer than four hex digits.
    #[error("unterminated unicode escape")]
    UnterminatedUnicodeEscape,

    /// A PHP string's declared byte length is negative or does not match the
    /// payload actually present.
    #[error("declared byte length does not match string payload")]
    UnmatchedLength,

    /// Generic malformed input: bad keyword spelling, malformed number,
    /// trailing input after the root value, or no input at all.
    #[error("syntax error")]
    SyntaxError,
}

impl ConversionError {
    /// Create a new error with the given kind and position.
    #[inline]
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            context: None,
            input_preview: None,
        }
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add an input preview around the error position for debugging.
    ///
    /// Shows up to 20 scalars before and after the error position.
    #[cold]
    pub fn with_input_preview(mut self, input: &[char], error_pos: usize) -> Self {
        let start = error_pos.saturating_sub(20);
        let end = (error_pos + 20).min(input.len());

        if start < end {
            let preview: String = input[start..end].iter().collect();

            // Mark the error position with a caret
            let relative_pos = error_pos.saturating_sub(start);
            let mut result = String::with_capacity(preview.len() + relative_pos + 2);
            result.push_str(&preview);
            result.push('\n');
            result.push_str(&" ".repeat(relative_pos));
            result.push('^');

            self.input_preview = Some(result);
        }
        self
    }
}

/// Result type alias for conversions.
pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_and_context() {
        let err = ConversionError::new(ErrorKind::SyntaxError, 7).with_context("reading a keyword");
        assert_eq!(format!("{}", err), "syntax error at position 7 (reading a keyword)");
    }

    #[test]
    fn preview_marks_error_position() {
        let input: Vec<char> = "N;;".chars().collect();
        let err = ConversionError::new(ErrorKind::SyntaxError, 2).with_input_preview(&input, 2);
        assert_eq!(err.input_preview.as_deref(), Some("N;;\n  ^"));
    }
}
