//! # Logvault
//!
//! Logvault is an in-process, time-indexed store for log events. It accepts a
//! continuous stream of timestamped events, answers range queries filtered by
//! producing service and/or originating host, and bounds memory by evicting
//! events that fall outside a retention window.
//!
//! ## Features
//!
//! - Per-service and per-host time-sorted partitions, plus an optional global index
//! - Concurrent inserts, queries and eviction without a store-wide lock
//! - Timer-driven or write-path retention sweeps
//! - An HTTP front-end and a synthetic load generator
//!
//! ## Example
//!
//! ```rust
//! use logvault::{core::LogEvent, storage::LogStore};
//!
//! let store = LogStore::new();
//! store.insert(LogEvent::new(1_000, "OrderService", "order-node-1", "order created"));
//!
//! let logs = store.query_by_service("OrderService", 0, 2_000);
//! assert_eq!(logs.len(), 1);
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::new_without_default)]
#![allow(clippy::doc_markdown)]

/// Core data structures and types
pub mod core;

/// Range-validating query layer
pub mod api;

/// HTTP front-end
pub mod http;

/// Tracing subscriber setup
pub mod logging;

/// Synthetic log producers
pub mod producer;

/// Partitions, indexes, the store and retention
pub mod storage;

pub mod error {
    //! Error types and result definitions

    use thiserror::Error;

    /// Result type alias for Logvault operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for Logvault
    #[derive(Debug, Error)]
    pub enum Error {
        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),
        /// HTTP client error
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        /// IO error
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }
}

// Re-export commonly used types
pub use error::{Error, Result};
