//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into role-aware use-case APIs.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Every service call receives the caller's `Session` explicitly.
//! - Rejected calls (forbidden, invalid, unconfirmed) perform no write.

use crate::model::occurrence::OccurrenceId;
use crate::model::status::OrderStatus;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod access;
pub mod customer_service;
pub mod dashboard_service;
pub mod mapping_service;
pub mod notice;
pub mod occurrence_service;
pub mod order_service;
pub mod product_service;
pub mod schedule_service;
pub mod user_service;
pub mod workflow;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every use-case service.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    Repo(RepoError),
    /// Caller's role does not allow the action.
    Forbidden { action: &'static str },
    NotFound { entity: &'static str, id: Uuid },
    /// Kanban move to a non-adjacent column.
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    AlreadyConverted(OccurrenceId),
    /// Destructive action attempted without explicit confirmation.
    ConfirmationRequired { action: &'static str },
    /// Record is not in a state that allows the action.
    InvalidState(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Forbidden { action } => write!(f, "not allowed to {action}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidTransition { from, to } => write!(
                f,
                "cannot move from `{}` to `{}`; orders advance one column at a time",
                from.as_str(),
                to.as_str()
            ),
            Self::AlreadyConverted(id) => {
                write!(f, "occurrence {id} was already converted into an order")
            }
            Self::ConfirmationRequired { action } => {
                write!(f, "{action} requires explicit confirmation")
            }
            Self::InvalidState(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Conflict(message) => Self::InvalidState(message),
            other => Self::Repo(other),
        }
    }
}

impl ServiceError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Repo(err) if err.is_duplicate() => "duplicate",
            Self::Repo(_) => "repo",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AlreadyConverted(_) => "already_converted",
            Self::ConfirmationRequired { .. } => "confirmation_required",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

/// Explicit acknowledgement for destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    Confirmed,
    #[default]
    Unconfirmed,
}

impl Confirmation {
    pub fn require(self, action: &'static str) -> ServiceResult<()> {
        match self {
            Self::Confirmed => Ok(()),
            Self::Unconfirmed => Err(ServiceError::ConfirmationRequired { action }),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{Confirmation, ServiceError};
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn unconfirmed_destructive_action_is_rejected() {
        assert!(Confirmation::Confirmed.require("delete customer").is_ok());
        let err = Confirmation::Unconfirmed
            .require("delete customer")
            .unwrap_err();
        assert_eq!(err.code(), "confirmation_required");
    }

    #[test]
    fn repo_not_found_maps_to_service_not_found() {
        let id = Uuid::new_v4();
        let err = ServiceError::from(RepoError::NotFound {
            entity: "customer",
            id,
        });
        assert!(matches!(
            err,
            ServiceError::NotFound { entity: "customer", id: found } if found == id
        ));
    }
}
