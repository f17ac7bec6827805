//! Command Handler Module
//!
//! Executes one request line against the storage engine and produces the
//! response for it.
//!
//! ## Supported Commands
//!
//! - `set key value [ttl]` - Store a value; the TTL defaults to 3600 seconds
//! - `get key` - Fetch a live value
//! - `delete key` - Remove a key
//!
//! Anything else, including a known verb with missing fields or a
//! non-numeric TTL, is answered with the usage line. Nothing in the store
//! changes in that case.

use crate::protocol::{parse_line, Command, Response};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Dispatches parsed commands to the storage engine.
///
/// Cheap to clone; every connection gets its own clone sharing one engine.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
    /// TTL used when `set` omits one
    default_ttl_secs: u64,
}

impl CommandHandler {
    /// Creates a handler that uses [`DEFAULT_TTL_SECS`](crate::DEFAULT_TTL_SECS)
    /// for `set` without a TTL.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self::with_default_ttl(storage, crate::DEFAULT_TTL_SECS)
    }

    /// Creates a handler with a custom default TTL.
    pub fn with_default_ttl(storage: Arc<StorageEngine>, default_ttl_secs: u64) -> Self {
        Self {
            storage,
            default_ttl_secs,
        }
    }

    /// Parses and executes one request line.
    ///
    /// `line` excludes the `\n` terminator.
    pub fn execute_line(&self, line: &[u8]) -> Response {
        match parse_line(line) {
            Ok(command) => self.execute(command),
            Err(e) => {
                debug!(reason = %e, "Malformed command");
                Response::Usage
            }
        }
    }

    /// Executes a parsed command.
    pub fn execute(&self, command: Command) -> Response {
        debug!(command = command.name(), key = command.key(), "Executing command");

        match command {
            Command::Set {
                key,
                value,
                ttl_secs,
            } => self.cmd_set(key, value, ttl_secs),
            Command::Get { key } => self.cmd_get(key),
            Command::Delete { key } => self.cmd_delete(key),
        }
    }

    /// set key value [ttl]
    fn cmd_set(&self, key: String, value: Bytes, ttl_secs: Option<u64>) -> Response {
        let ttl_secs = ttl_secs.unwrap_or(self.default_ttl_secs);

        self.storage
            .set(key.clone(), value.clone(), Duration::from_secs(ttl_secs));

        Response::Stored {
            key,
            value,
            ttl_secs,
        }
    }

    /// get key
    fn cmd_get(&self, key: String) -> Response {
        match self.storage.get(&key) {
            Some(value) => Response::Value { key, value },
            None => Response::NotFound { key },
        }
    }

    /// delete key
    fn cmd_delete(&self, key: String) -> Response {
        match self.storage.delete(&key) {
            Ok(()) => Response::Deleted { key },
            Err(e) => Response::DeleteError(e),
        }
    }
}
