//! Line Command Parser
//!
//! Turns one request line into a [`Command`].
//!
//! ## Grammar
//!
//! ```text
//! set <key> <value> [<ttlSeconds>]
//! get <key>
//! delete <key>
//! ```
//!
//! Fields are separated by ASCII whitespace. Only the first four fields are
//! looked at; anything after them is ignored. Verbs are case-sensitive.
//!
//! Every failure is a [`MalformedCommand`]. The caller answers all of them
//! with the same usage line, the variants only exist so the reason can be
//! logged and tested.

use crate::protocol::types::Command;
use bytes::Bytes;
use thiserror::Error;

/// Number of leading fields that carry meaning.
pub const MAX_FIELDS: usize = 4;

/// Why a request line could not be turned into a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedCommand {
    /// The line has no fields at all
    #[error("empty command")]
    Empty,

    /// The line is not valid UTF-8
    #[error("command is not valid UTF-8")]
    InvalidUtf8,

    /// The first field is not a known verb
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A required field is missing
    #[error("missing {field} for '{command}' command")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    /// The TTL field is not a non-negative integer
    #[error("invalid TTL '{0}'")]
    InvalidTtl(String),
}

/// Parses one request line.
///
/// `line` must not include the line terminator. A trailing `\r` is
/// whitespace and therefore ignored.
///
/// # Example
///
/// ```
/// use kvstor::protocol::{parse_line, Command};
/// use bytes::Bytes;
///
/// let cmd = parse_line(b"set greeting hello 30").unwrap();
/// assert_eq!(
///     cmd,
///     Command::Set {
///         key: "greeting".into(),
///         value: Bytes::from("hello"),
///         ttl_secs: Some(30),
///     }
/// );
///
/// assert!(parse_line(b"set greeting").is_err());
/// ```
pub fn parse_line(line: &[u8]) -> Result<Command, MalformedCommand> {
    let line = std::str::from_utf8(line).map_err(|_| MalformedCommand::InvalidUtf8)?;

    let mut fields = line.split_ascii_whitespace().take(MAX_FIELDS);

    let verb = fields.next().ok_or(MalformedCommand::Empty)?;

    match verb {
        "set" => {
            let key = require(fields.next(), "set", "key")?;
            let value = require(fields.next(), "set", "value")?;
            let ttl_secs = fields.next().map(parse_ttl).transpose()?;

            Ok(Command::Set {
                key: key.to_string(),
                value: Bytes::copy_from_slice(value.as_bytes()),
                ttl_secs,
            })
        }
        "get" => {
            let key = require(fields.next(), "get", "key")?;
            Ok(Command::Get {
                key: key.to_string(),
            })
        }
        "delete" => {
            let key = require(fields.next(), "delete", "key")?;
            Ok(Command::Delete {
                key: key.to_string(),
            })
        }
        other => Err(MalformedCommand::UnknownCommand(other.to_string())),
    }
}

fn require<'a>(
    field: Option<&'a str>,
    command: &'static str,
    name: &'static str,
) -> Result<&'a str, MalformedCommand> {
    field.ok_or(MalformedCommand::MissingField {
        command,
        field: name,
    })
}

/// Parses a TTL in whole seconds. Signs are rejected.
fn parse_ttl(s: &str) -> Result<u64, MalformedCommand> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedCommand::InvalidTtl(s.to_string()));
    }
    s.parse()
        .map_err(|_| MalformedCommand::InvalidTtl(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str, ttl_secs: Option<u64>) -> Command {
        Command::Set {
            key: key.into(),
            value: Bytes::copy_from_slice(value.as_bytes()),
            ttl_secs,
        }
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(parse_line(b"set a 1 1"), Ok(set("a", "1", Some(1))));
        assert_eq!(parse_line(b"set b 2"), Ok(set("b", "2", None)));
        assert_eq!(parse_line(b"set z v 0"), Ok(set("z", "v", Some(0))));
    }

    #[test]
    fn test_parse_get_delete() {
        assert_eq!(
            parse_line(b"get key5"),
            Ok(Command::Get { key: "key5".into() })
        );
        assert_eq!(
            parse_line(b"delete zzz"),
            Ok(Command::Delete { key: "zzz".into() })
        );
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(parse_line(b"  set\tk   v  5 \r"), Ok(set("k", "v", Some(5))));
        assert_eq!(
            parse_line(b"get k\r"),
            Ok(Command::Get { key: "k".into() })
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        assert_eq!(parse_line(b"set k v 5 extra more"), Ok(set("k", "v", Some(5))));
        assert_eq!(
            parse_line(b"get k ignored"),
            Ok(Command::Get { key: "k".into() })
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            parse_line(b"set k"),
            Err(MalformedCommand::MissingField {
                command: "set",
                field: "value"
            })
        );
        assert_eq!(
            parse_line(b"set"),
            Err(MalformedCommand::MissingField {
                command: "set",
                field: "key"
            })
        );
        assert!(matches!(
            parse_line(b"get"),
            Err(MalformedCommand::MissingField { command: "get", .. })
        ));
        assert!(matches!(
            parse_line(b"delete   "),
            Err(MalformedCommand::MissingField {
                command: "delete",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_ttl() {
        for ttl in ["abc", "-5", "+5", "1.5", "99999999999999999999999"] {
            let line = format!("set k v {}", ttl);
            assert_eq!(
                parse_line(line.as_bytes()),
                Err(MalformedCommand::InvalidTtl(ttl.to_string())),
                "ttl {:?}",
                ttl
            );
        }
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(
            parse_line(b"INVALID_COMMAND"),
            Err(MalformedCommand::UnknownCommand("INVALID_COMMAND".into()))
        );
        assert_eq!(
            parse_line(b"GET k"),
            Err(MalformedCommand::UnknownCommand("GET".into()))
        );
        assert_eq!(parse_line(b""), Err(MalformedCommand::Empty));
        assert_eq!(parse_line(b" \t "), Err(MalformedCommand::Empty));
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            parse_line(b"set k \xff\xfe"),
            Err(MalformedCommand::InvalidUtf8)
        );
    }
}
