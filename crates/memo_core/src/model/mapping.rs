//! De-Para mapping between ERP identifiers and internal IDs.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MappingId = Uuid;

/// Kind of internal entity a mapping points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappedEntity {
    Customer,
    Product,
    User,
    Order,
}

impl MappedEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "cliente",
            Self::Product => "produto",
            Self::User => "usuario",
            Self::Order => "os",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cliente" => Some(Self::Customer),
            "produto" => Some(Self::Product),
            "usuario" => Some(Self::User),
            "os" => Some(Self::Order),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMapping {
    pub id: MappingId,
    pub id_dinamics: String,
    pub entidade: MappedEntity,
    pub id_interno: Uuid,
    pub observacoes: Option<String>,
}

impl ExternalMapping {
    pub fn new(entidade: MappedEntity, id_dinamics: impl Into<String>, id_interno: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            id_dinamics: id_dinamics.into(),
            entidade,
            id_interno,
            observacoes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id_dinamics", &self.id_dinamics)?;
        if self.id_interno.is_nil() {
            return Err(ValidationError::MissingField("id_interno"));
        }
        Ok(())
    }
}
