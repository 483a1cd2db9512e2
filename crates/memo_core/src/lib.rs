//! Core domain logic for MEMO service-order management.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{
    default_config_with_override, load_config, load_config_from_str, load_default_config,
    ConfigError, MemoConfig,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::{ImportError, ImportReport, RowOutcome, RowResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::session::Session;
pub use model::status::OrderStatus;
pub use model::user::{Role, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::{Confirmation, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
