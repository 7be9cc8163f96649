//! Applied-set persistence backends and abstractions.
//!
//! This module provides the storage layer for the applied set: the persisted,
//! ordered list of migration keys currently considered executed.
//!
//! # Storage Providers
//!
//! Backends implement [`StorageProvider`] and are selected through a
//! [`StorageModule`] at engine construction:
//! - **JSON Store**: [`JsonStorage`] persists the applied set as a JSON text
//!   record (the default backend)
//! - **In-Memory Store**: [`InMemoryStorage`] for testing and dry runs
//!
//! # Consistency
//!
//! Each successful migration action maps to exactly one `log_migration` or
//! `unlog_migration` call. Backends re-read their medium before answering
//! queries and rewrite it atomically on mutation, so read-after-write always
//! reflects the last durable state.

#[cfg(feature = "json-storage")]
mod json;
mod memory;
mod storage;

#[cfg(feature = "json-storage")]
pub use json::*;
pub use memory::*;
pub use storage::*;
