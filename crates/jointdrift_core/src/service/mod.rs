//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into caller-facing APIs.
//! - Map domain records to transport DTOs.

pub mod dto;
pub mod joint_drift_service;
