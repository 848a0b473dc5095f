//! Streaming converter between JSON text and PHP's serialize format.
//!
//! This crate converts, losslessly, between a JSON literal and the
//! equivalent PHP native serialization text, in both directions. The
//! converters are recursive-descent and operate directly on the character
//! stream with one scalar of lookahead; no intermediate value tree is built
//! on the output path.
//!
//! # Features
//!
//! - **No intermediate model** - Each recognized construct is emitted as
//!   soon as it is fully parsed
//! - **UTF-8 aware** - PHP string lengths are exact UTF-8 byte counts, even
//!   for payloads written as `\uXXXX` escapes
//! - **All-or-nothing** - A conversion either completes or fails atomically
//!   with a typed, positioned error
//! - **Detailed errors** - Error kind, scalar position, and an input preview
//!   around the failure
//!
//! # Quick Start
//!
//! ```rust
//! use php_json_core::{serialize, unserialize};
//!
//! let php = serialize(r#"{"name":"Alice","age":30}"#).unwrap();
//! assert_eq!(php, r#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#);
//!
//! let json = unserialize(&php).unwrap();
//! assert_eq!(json, r#"{"name":"Alice","age":30}"#);
//! ```
//!
//! # Value Mapping
//!
//! | JSON | PHP serialize |
//! |------|---------------|
//! | `null` | `N;` |
//! | `true` / `false` | `b:1;` / `b:0;` |
//! | number without `.`/`e`/`E` | `i:<digits>;` |
//! | number with `.`/`e`/`E` | `d:<literal>;` |
//! | string | `s:<utf8-byte-len>:"<payload>";` |
//! | array | `a:<count>:{...}` with `0..n` integer keys |
//! | object | `a:<count>:{...}`, digit-only keys as integers |
//!
//! On the way back, PHP arrays always become JSON objects (PHP arrays are
//! ordered maps), and PHP objects (`O:`) are rejected with
//! [`ErrorKind::ObjectUnsupported`].
//!
//! # Tracing Support
//!
//! Enable the `tracing` feature for conversion instrumentation:
//!
//! ```toml
//! php-json-core = { version = "0.1", features = ["tracing"] }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::inline_always)]
#![allow(clippy::cast_possible_wrap)]

pub mod cursor;
pub mod error;
pub mod serialize;
pub mod unserialize;

pub use cursor::Cursor;
pub use error::{ConversionError, ErrorKind, Result};
pub use serialize::serialize;
pub use unserialize::unserialize;
