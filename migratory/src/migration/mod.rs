//! Migration units, normalization, planning, and execution.
//!
//! This module holds the core of the engine: the migration data model, the
//! adapters that normalize heterogeneous action conventions, the resolver
//! that turns a request into an ordered plan, and the executor that runs it.
//!
//! # Execution Process
//!
//! One `execute`/`up`/`down` call:
//! 1. Reads the applied set from storage
//! 2. Diffs it against the migration set to compute an [`ExecutionPlan`]
//! 3. Runs the plan serially, recording each success in storage and
//!    publishing lifecycle events
//!
//! # Defining Migrations
//!
//! ```rust,ignore
//! use migratory::migration::{MigrationRecord, RawAction};
//!
//! let record = MigrationRecord::new("20240101120000-create-users.js")
//!     .up(RawAction::ready(|_params| Ok(())))
//!     .down(RawAction::ready(|_params| Ok(())));
//!
//! let migratory = Migratory::builder()
//!     .migrations(vec![record])
//!     .build()?;
//! migratory.up(Default::default())?;
//! ```
//!
//! # Exactly-Once Application
//!
//! The applied set is the sole source of truth for "has this migration run".
//! A plan for `up` only ever contains migrations absent from it, and every
//! successful action maps to exactly one storage mutation, so re-running a
//! plan is a no-op.

mod action;
mod executor;
mod migration;
mod plan;
mod set;

pub use action::*;
pub use migration::*;
pub use plan::*;
pub use set::*;

pub(crate) use executor::MigrationExecutor;
