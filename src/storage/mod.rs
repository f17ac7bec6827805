//! Storage Engine Module
//!
//! This module provides the core storage functionality for KVStor:
//! a mutex-guarded key-value map with per-entry TTL and a background
//! expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           StorageEngine             │
//! │   Mutex<HashMap<String, Entry>>     │
//! └─────────────────────────────────────┘
//!                   ▲
//!                   │ cleanup_expired()
//!     ┌─────────────┴─────────────┐
//!     │      ExpirySweeper        │
//!     │  (Background Tokio Task)  │
//!     └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **TTL Support**: Every entry carries a time-to-live
//! - **Lazy Expiry**: Expired entries are removed when read
//! - **Active Expiry**: Background sweeper removes expired entries nobody reads
//!
//! ## Example
//!
//! ```
//! use kvstor::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new();
//!
//! engine.set("session", Bytes::from("token123"), Duration::from_secs(3600));
//! assert_eq!(engine.get("session"), Some(Bytes::from("token123")));
//! ```

pub mod engine;
pub mod expiry;

pub use engine::{Entry, StorageEngine, StorageError, StorageStats};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
