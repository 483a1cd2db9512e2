//! Domain model for the service-order workflow.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Own field-level validation that must pass before any write.
//!
//! # Invariants
//! - Every persisted record is identified by a stable UUID v4.
//! - Enum values round-trip through stable storage strings (`as_str`/`parse`).

pub mod classification;
pub mod customer;
pub mod mapping;
pub mod occurrence;
pub mod order;
pub mod product;
pub mod schedule;
pub mod session;
pub mod status;
pub mod user;
pub mod validation;
