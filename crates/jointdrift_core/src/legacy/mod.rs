//! Read-only access to legacy joint drift export databases.
//!
//! # Responsibility
//! - Own the single connection to a legacy export file.
//! - Keep the column-name contract and row decoding in one place.
//! - Stream case-filtered rows into domain records.
//!
//! # Invariants
//! - The legacy store is never written.

pub mod columns;
pub mod connection;
pub mod reader;
