//! Core import pipeline for structural-analysis joint drift exports.
//!
//! Legacy export database → typed records → validation → write-side
//! aggregate, plus case-filtered reads for reporting.

pub mod cancel;
pub mod db;
pub mod legacy;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cancel::CancellationToken;
pub use legacy::columns::{decode_joint_drift_item, CellSource, DecodeError, SyntheticRow};
pub use legacy::connection::{ConnectionError, LegacyConnectionProvider};
pub use legacy::reader::{ImportError, JointDriftImportReader};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::joint_drift::{JointDriftId, JointDriftItem, JointDriftList};
pub use model::validation::{
    validate_item, validate_items, ValidationError, ValidationFailure, ValidationRules,
};
pub use repo::context::{InMemoryContext, PersistenceContext, PersistenceError, SqliteContext};
pub use repo::joint_drift_repo::{
    AggregateJointDriftRepository, CombinedJointDriftRepository, JointDriftCaseRepository,
    JointDriftRepository, JointDriftWriteRepository, LegacyJointDriftRepository, NotFoundError,
    RepoError, RepoResult,
};
pub use service::dto::JointDriftItemDto;
pub use service::joint_drift_service::JointDriftService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
