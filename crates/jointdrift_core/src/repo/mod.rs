//! Repository layer for joint drift data.
//!
//! # Responsibility
//! - Define the write-side and read-side data access contracts.
//! - Keep persistence-context and legacy-store details out of services.
//!
//! # Invariants
//! - Repository writes run record validation before persistence.
//! - `NotFound` is raised by callers needing a result, never by reads here.

pub mod context;
pub mod joint_drift_repo;
