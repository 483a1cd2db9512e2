//! Product catalog model.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProductId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique catalog code; the import key.
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
}

impl Product {
    pub fn new(codigo: impl Into<String>, nome: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            codigo: codigo.into(),
            nome: nome.into(),
            descricao: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("codigo", &self.codigo)?;
        require_text("nome", &self.nome)
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.codigo.to_lowercase().contains(&needle)
            || self.nome.to_lowercase().contains(&needle)
    }
}
