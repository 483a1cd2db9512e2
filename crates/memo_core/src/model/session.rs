//! Authenticated caller context.
//!
//! Authentication itself happens outside the core. Every service call
//! receives the caller's `Session` explicitly; there is no ambient global
//! identity.

use crate::model::user::{Role, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    pub display_name: String,
}

impl Session {
    pub fn new(user_id: UserId, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            display_name: display_name.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Technician filter applied to order and reservation reads.
    ///
    /// Admins see everything (`None`); operators only their own rows.
    pub fn technician_scope(&self) -> Option<UserId> {
        match self.role {
            Role::Admin => None,
            Role::Operator => Some(self.user_id),
        }
    }
}
