//! User profile and role model.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Access role. Operators are the field/workshop technicians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operador",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "operador" => Some(Self::Operator),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Operator => "Operador",
        }
    }
}

/// Profile joined with its single role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub role: Role,
    /// Identifier of the same person in the ERP.
    pub id_dinamics: Option<String>,
}

impl UserProfile {
    pub fn new(nome: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            nome: nome.into(),
            email: email.into(),
            telefone: None,
            role,
            id_dinamics: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("nome", &self.nome)?;
        require_text("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidValue {
                field: "email",
                value: self.email.clone(),
            });
        }
        Ok(())
    }
}
