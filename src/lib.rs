//! # KVStor - An In-Memory Key-Value Store with TTL
//!
//! KVStor keeps string values in memory, each with a time-to-live, and serves
//! them over a newline-delimited text protocol.
//!
//! ## Features
//!
//! - **Line Protocol**: `set`, `get` and `delete`, one command per line
//! - **TTL Support**: Every value expires; 3600 seconds unless the client says otherwise
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            KVStor                            │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐       │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │       │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │       │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘       │
//! │                                               │              │
//! │                                               ▼              │
//! │  ┌─────────────┐    ┌───────────────────────────────────┐    │
//! │  │    Line     │    │          StorageEngine            │    │
//! │  │   Parser    │    │   Mutex<HashMap<String, Entry>>   │    │
//! │  └─────────────┘    └───────────────────────────────────┘    │
//! │                                       ▲                      │
//! │                     ┌─────────────────┴─────────────────┐    │
//! │                     │          ExpirySweeper            │    │
//! │                     │     (Background Tokio Task)       │    │
//! │                     └───────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use kvstor::storage::{StorageEngine, start_expiry_sweeper};
//! use kvstor::commands::CommandHandler;
//! use kvstor::connection::{handle_connection, ConnectionStats};
//! use kvstor::protocol::ResponseStyle;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::new());
//!     let _sweeper = start_expiry_sweeper(Arc::clone(&storage));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("0.0.0.0:8666").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&storage));
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, ResponseStyle::Plain, stats));
//!     }
//! }
//! ```
//!
//! ## Protocol
//!
//! ```text
//! set <key> <value> [<ttlSeconds>]
//! get <key>
//! delete <key>
//! ```
//!
//! Anything else gets the usage line back.
//!
//! ## Lazy + Active Expiry
//!
//! An entry is live while `now < created_at + ttl`. Expired entries are
//! removed in two ways:
//! 1. **Lazy**: `get` removes an expired entry it finds
//! 2. **Active**: a background task sweeps the whole map every minute
//!
//! Memory is reclaimed even for keys that are never read again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

use std::time::Duration;

pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionError, ConnectionStats};
pub use protocol::{Command, MalformedCommand, Response, ResponseStyle};
pub use storage::{
    start_expiry_sweeper, ExpiryConfig, ExpirySweeper, StorageEngine, StorageError,
};

/// The default port KVStor listens on
pub const DEFAULT_PORT: u16 = 8666;

/// The default host KVStor binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// TTL applied to `set` commands that omit one
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Interval between background expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Version of KVStor
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
