//! # Migratory - Programmatic Migration Engine
//!
//! Migratory is a framework-agnostic migration engine written in Rust. It
//! takes an ordered collection of named, reversible units of work
//! ("migrations"), determines which of them still need to run (or be
//! reverted) against a persisted execution log, executes them serially in
//! the correct order, records success, and reports progress through
//! lifecycle events and log lines.
//!
//! ## Key Features
//!
//! - **Reversible**: every migration carries an up and a down action
//! - **Exactly-Once**: a persisted applied set guarantees each migration
//!   runs at most once
//! - **Pluggable Storage**: JSON text record by default, in-memory for
//!   tests, any backend through the `StorageProvider` trait
//! - **Action Normalization**: synchronous and callback-last actions are
//!   adapted into one uniform completion contract
//! - **Lifecycle Events**: subscribe to migrating/migrated and
//!   reverting/reverted notifications
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use migratory::Migratory;
//! use migratory::migration::{MigrationRecord, OpOptions, RawAction};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let migratory = Migratory::builder()
//!     .migrations(vec![
//!         MigrationRecord::new("20240101120000-create-users.js")
//!             .up(RawAction::ready(|_params| Ok(())))
//!             .down(RawAction::ready(|_params| Ok(()))),
//!     ])
//!     .build()?;
//!
//! // run everything pending
//! migratory.up(OpOptions::default())?;
//!
//! // revert the most recent migration
//! migratory.down(OpOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Migratory uses the **PIMPL (Pointer To IMPLementation)** design pattern
//! to provide:
//!
//! - **Encapsulation**: Implementation details are completely hidden
//! - **API Stability**: Public interface is stable and can evolve independently
//! - **Thread Safety**: All clones share the same underlying state through
//!   `Arc` inner types
//!
//! Sharing an engine across threads is safe, but executions are strictly
//! serial: the engine performs no internal locking around `execute`, so two
//! concurrent executions against the same storage backend are not supported.
//!
//! ## Module Organization
//!
//! - [`common`] - Common types, constants, event bus, and utilities
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - Migration units, normalization, planning, and execution
//! - [`migratory`] - Core engine interface
//! - [`migratory_builder`] - Engine builder for initialization
//! - [`migratory_config`] - Engine configuration
//! - [`storage`] - Applied-set persistence backends

pub mod common;
pub mod errors;
pub mod migration;
pub mod migratory;
pub mod migratory_builder;
pub mod migratory_config;
pub mod storage;

pub use common::{atomic, Atomic, MigrationEventListener, MigrationEvents, SubscriberRef};
pub use migratory::Migratory;

/// The crate version, as recorded in the package manifest.
pub const MIGRATORY_VERSION: &str = env!("CARGO_PKG_VERSION");
