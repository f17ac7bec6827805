//! Protocol Types
//!
//! [`Command`] is one parsed request line. [`Response`] is the single line
//! written back for it.
//!
//! ## Response Lines
//!
//! | Response     | Line                                               |
//! |--------------|----------------------------------------------------|
//! | `Stored`     | `set key: <k> with value <v> and TTL <t>s`         |
//! | `Value`      | `key: <k> has value <v>`                           |
//! | `NotFound`   | `key: <k> doesn't exist or expired`                |
//! | `Deleted`    | `key: <k> was deleted`                             |
//! | `DeleteError`| `deletion error: <error>`                          |
//! | `Usage`      | [`USAGE`]                                          |
//!
//! Every line ends with `\n`. In [`ResponseStyle::Highlighted`] the key,
//! value and TTL substrings are wrapped in ANSI magenta.

use crate::storage::StorageError;
use bytes::{BufMut, Bytes, BytesMut};

/// Line terminator for responses
pub const LF: &[u8] = b"\n";

/// Sent for every malformed command.
pub const USAGE: &str = "Usage: get <key> | set <key> <value> [TTL in seconds] | delete <key>\n";

const HIGHLIGHT_START: &[u8] = b"\x1b[35m";
const HIGHLIGHT_END: &[u8] = b"\x1b[0m";

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set <key> <value> [<ttlSeconds>]`
    Set {
        key: String,
        value: Bytes,
        /// `None` when the client omitted the TTL field
        ttl_secs: Option<u64>,
    },
    /// `get <key>`
    Get { key: String },
    /// `delete <key>`
    Delete { key: String },
}

impl Command {
    /// The verb as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "set",
            Command::Get { .. } => "get",
            Command::Delete { .. } => "delete",
        }
    }

    /// The key this command operates on.
    pub fn key(&self) -> &str {
        match self {
            Command::Set { key, .. } | Command::Get { key } | Command::Delete { key } => key,
        }
    }
}

/// How response lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseStyle {
    /// Plain text
    #[default]
    Plain,
    /// Key, value and TTL wrapped in ANSI color escapes
    Highlighted,
}

/// The response to one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A `set` was applied with the given TTL
    Stored {
        key: String,
        value: Bytes,
        ttl_secs: u64,
    },
    /// A `get` found a live value
    Value { key: String, value: Bytes },
    /// A `get` found nothing live under the key
    NotFound { key: String },
    /// A `delete` removed the key
    Deleted { key: String },
    /// A `delete` failed
    DeleteError(StorageError),
    /// The line was malformed
    Usage,
}

impl Response {
    /// Renders this response as one `\n`-terminated line.
    pub fn serialize(&self, style: ResponseStyle) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.estimated_len());
        let mut line = Line {
            buf: &mut buf,
            style,
        };

        match self {
            Response::Stored {
                key,
                value,
                ttl_secs,
            } => {
                line.text("set key: ");
                line.field(key.as_bytes());
                line.text(" with value ");
                line.field(value);
                line.text(" and TTL ");
                line.field(format!("{}s", ttl_secs).as_bytes());
            }
            Response::Value { key, value } => {
                line.text("key: ");
                line.field(key.as_bytes());
                line.text(" has value ");
                line.field(value);
            }
            Response::NotFound { key } => {
                line.text("key: ");
                line.field(key.as_bytes());
                line.text(" doesn't exist or expired");
            }
            Response::Deleted { key } => {
                line.text("key: ");
                line.field(key.as_bytes());
                line.text(" was deleted");
            }
            Response::DeleteError(e) => {
                line.text("deletion error: ");
                line.text(&e.to_string());
            }
            Response::Usage => return Bytes::from_static(USAGE.as_bytes()),
        }

        buf.put_slice(LF);
        buf.freeze()
    }

    fn estimated_len(&self) -> usize {
        let payload = match self {
            Response::Stored { key, value, .. } | Response::Value { key, value } => {
                key.len() + value.len()
            }
            Response::NotFound { key } | Response::Deleted { key } => key.len(),
            Response::DeleteError(_) | Response::Usage => 0,
        };
        payload + 64
    }
}

/// Writes the pieces of one response line.
struct Line<'a> {
    buf: &'a mut BytesMut,
    style: ResponseStyle,
}

impl Line<'_> {
    fn text(&mut self, s: &str) {
        self.buf.put_slice(s.as_bytes());
    }

    fn field(&mut self, bytes: &[u8]) {
        match self.style {
            ResponseStyle::Plain => self.buf.put_slice(bytes),
            ResponseStyle::Highlighted => {
                self.buf.put_slice(HIGHLIGHT_START);
                self.buf.put_slice(bytes);
                self.buf.put_slice(HIGHLIGHT_END);
            }
        }
    }
}
