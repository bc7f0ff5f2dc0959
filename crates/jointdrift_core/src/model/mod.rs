//! Joint drift domain model.
//!
//! # Responsibility
//! - Define the measurement record imported from legacy exports.
//! - Define the composite identity used for lookup and de-duplication.
//! - Define the aggregate that owns records on the write path.
//!
//! # Invariants
//! - Records are values: the aggregate only hands out shared references.
//! - Identity is structural over `(story, label, output_case, step_number)`.

pub mod joint_drift;
pub mod validation;
