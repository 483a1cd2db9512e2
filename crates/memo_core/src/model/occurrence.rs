//! Occurrence (intake record) model.
//!
//! # Responsibility
//! - Capture a customer complaint before a formal service order exists.
//! - Own the one-way conversion marker.
//!
//! # Invariants
//! - `convertida_em_os` is monotonic: once true it never becomes false.
//! - A converted occurrence has status `Converted` and a linked order.

use crate::model::classification::{Origin, Priority, WarrantyStatus};
use crate::model::customer::CustomerId;
use crate::model::order::OrderId;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OccurrenceId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    #[default]
    Open,
    UnderAnalysis,
    Converted,
    Cancelled,
}

impl OccurrenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "aberta",
            Self::UnderAnalysis => "em_analise",
            Self::Converted => "convertida_em_os",
            Self::Cancelled => "cancelada",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "aberta" => Some(Self::Open),
            "em_analise" => Some(Self::UnderAnalysis),
            "convertida_em_os" => Some(Self::Converted),
            "cancelada" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Aberta",
            Self::UnderAnalysis => "Em Análise",
            Self::Converted => "Convertida em OS",
            Self::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    /// Generated at creation; empty until then.
    pub numero: String,
    pub titulo: String,
    pub descricao: Option<String>,
    pub prioridade: Priority,
    pub origem: Origin,
    pub situacao_garantia: WarrantyStatus,
    pub id_cliente: CustomerId,
    pub contato_cliente: Option<String>,
    pub telefone_contato: Option<String>,
    pub endereco_atendimento: Option<String>,
    pub observacoes: Option<String>,
    pub status: OccurrenceStatus,
    pub convertida_em_os: bool,
    pub id_os_gerada: Option<OrderId>,
    pub created_by: Option<UserId>,
}

impl Occurrence {
    pub fn new(id_cliente: CustomerId, titulo: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            numero: String::new(),
            titulo: titulo.into(),
            descricao: None,
            prioridade: Priority::default(),
            origem: Origin::default(),
            situacao_garantia: WarrantyStatus::default(),
            id_cliente,
            contato_cliente: None,
            telefone_contato: None,
            endereco_atendimento: None,
            observacoes: None,
            status: OccurrenceStatus::Open,
            convertida_em_os: false,
            id_os_gerada: None,
            created_by: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("titulo", &self.titulo)?;
        if self.id_cliente.is_nil() {
            return Err(ValidationError::MissingField("id_cliente"));
        }
        if self.convertida_em_os != (self.status == OccurrenceStatus::Converted) {
            return Err(ValidationError::InvalidValue {
                field: "status_ocorrencia",
                value: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub fn is_converted(&self) -> bool {
        self.convertida_em_os
    }

    /// Marks the occurrence as promoted into `order_id`.
    pub fn mark_converted(&mut self, order_id: OrderId) {
        self.convertida_em_os = true;
        self.status = OccurrenceStatus::Converted;
        self.id_os_gerada = Some(order_id);
    }
}

/// Formats an occurrence number, e.g. `OC-2026-0007`.
pub fn format_occurrence_number(year: i32, sequence: u32) -> String {
    format!("OC-{year}-{sequence:04}")
}

#[cfg(test)]
mod tests {
    use super::{format_occurrence_number, Occurrence, OccurrenceStatus};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn new_occurrence_is_open_and_unconverted() {
        let occurrence = Occurrence::new(Uuid::new_v4(), "Motor falhando");
        assert_eq!(occurrence.status, OccurrenceStatus::Open);
        assert!(!occurrence.is_converted());
        assert!(occurrence.validate().is_ok());
    }

    #[test]
    fn mark_converted_keeps_flag_and_status_consistent() {
        let mut occurrence = Occurrence::new(Uuid::new_v4(), "Vazamento");
        let order_id = Uuid::new_v4();
        occurrence.mark_converted(order_id);
        assert!(occurrence.is_converted());
        assert_eq!(occurrence.status, OccurrenceStatus::Converted);
        assert_eq!(occurrence.id_os_gerada, Some(order_id));
        assert!(occurrence.validate().is_ok());
    }

    #[test]
    fn validate_requires_title_and_customer() {
        let occurrence = Occurrence::new(Uuid::new_v4(), "  ");
        assert_eq!(
            occurrence.validate(),
            Err(ValidationError::MissingField("titulo"))
        );
        let occurrence = Occurrence::new(Uuid::nil(), "Ruído");
        assert_eq!(
            occurrence.validate(),
            Err(ValidationError::MissingField("id_cliente"))
        );
    }

    #[test]
    fn occurrence_number_is_zero_padded() {
        assert_eq!(format_occurrence_number(2026, 7), "OC-2026-0007");
    }
}
