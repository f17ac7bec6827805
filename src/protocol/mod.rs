//! Line Protocol Implementation
//!
//! KVStor speaks a newline-delimited text protocol: one command per line,
//! one response line per command.
//!
//! ## Modules
//!
//! - `types`: `Command`, `Response` and response rendering
//! - `parser`: tokenizes and validates a request line
//!
//! ## Example
//!
//! ```
//! use kvstor::protocol::{parse_line, Response, ResponseStyle, USAGE};
//!
//! assert!(parse_line(b"get name").is_ok());
//!
//! let bytes = Response::Usage.serialize(ResponseStyle::Plain);
//! assert_eq!(&bytes[..], USAGE.as_bytes());
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_line, MalformedCommand, MAX_FIELDS};
pub use types::{Command, Response, ResponseStyle, USAGE};
