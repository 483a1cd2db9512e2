//! Service-order model and quotation lines.
//!
//! # Invariants
//! - `status` is always one of the seven `OrderStatus` states.
//! - `data_fim_execucao`, when set, is not earlier than `data_inicio_execucao`.
//! - Quotation line quantities are at least 1.

use crate::model::classification::{Origin, PaymentTerms, Priority, WarrantyStatus};
use crate::model::customer::CustomerId;
use crate::model::occurrence::{Occurrence, OccurrenceId};
use crate::model::product::ProductId;
use crate::model::status::OrderStatus;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrderId = Uuid;
pub type OrderItemId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: OrderId,
    pub numero: String,
    pub id_cliente: CustomerId,
    pub id_tecnico_principal: Option<UserId>,
    /// Occurrence this order was promoted from, if any.
    pub id_ocorrencia: Option<OccurrenceId>,
    pub origem: Origin,
    pub situacao_garantia: WarrantyStatus,
    pub prioridade: Option<Priority>,
    pub condicao_pagamento: Option<PaymentTerms>,
    pub status: OrderStatus,
    /// Diagnosis report written by the technician.
    pub laudo: Option<String>,
    pub motivo_cancelamento: Option<String>,
    pub prazo: Option<NaiveDate>,
    /// Epoch milliseconds.
    pub data_inicio_execucao: Option<i64>,
    /// Epoch milliseconds.
    pub data_fim_execucao: Option<i64>,
    pub id_dinamics_os: Option<String>,
    pub created_by: Option<UserId>,
}

impl ServiceOrder {
    /// Creates an open order with default classification.
    pub fn new(numero: impl Into<String>, id_cliente: CustomerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            numero: numero.into(),
            id_cliente,
            id_tecnico_principal: None,
            id_ocorrencia: None,
            origem: Origin::default(),
            situacao_garantia: WarrantyStatus::default(),
            prioridade: Some(Priority::default()),
            condicao_pagamento: None,
            status: OrderStatus::Open,
            laudo: None,
            motivo_cancelamento: None,
            prazo: None,
            data_inicio_execucao: None,
            data_fim_execucao: None,
            id_dinamics_os: None,
            created_by: None,
        }
    }

    /// Builds the order an occurrence is promoted into.
    ///
    /// Carries over customer, origin, warranty and priority; starts `Open`.
    pub fn from_occurrence(numero: impl Into<String>, occurrence: &Occurrence) -> Self {
        let mut order = Self::new(numero, occurrence.id_cliente);
        order.id_ocorrencia = Some(occurrence.id);
        order.origem = occurrence.origem;
        order.situacao_garantia = occurrence.situacao_garantia;
        order.prioridade = Some(occurrence.prioridade);
        order
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("numero", &self.numero)?;
        if self.id_cliente.is_nil() {
            return Err(ValidationError::MissingField("id_cliente"));
        }
        if let (Some(start), Some(end)) = (self.data_inicio_execucao, self.data_fim_execucao) {
            if end < start {
                return Err(ValidationError::InvalidInterval { start, end });
            }
        }
        Ok(())
    }

    /// Deadline passed and work not finalized.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.prazo, self.status, today)
    }
}

pub fn is_overdue(prazo: Option<NaiveDate>, status: OrderStatus, today: NaiveDate) -> bool {
    matches!(prazo, Some(deadline) if deadline < today) && status != OrderStatus::Finalized
}

/// Formats an order number as `{year}-{sequence}` zero-padded to `width`.
pub fn format_order_number(year: i32, sequence: u64, width: usize) -> String {
    format!("{year}-{sequence:0width$}")
}

/// Quotation line linking an order to a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub id_os: OrderId,
    pub id_produto: ProductId,
    pub quantidade: i64,
}

impl OrderItem {
    pub fn new(id_os: OrderId, id_produto: ProductId, quantidade: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            id_os,
            id_produto,
            quantidade,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantidade < 1 {
            return Err(ValidationError::InvalidQuantity(self.quantidade));
        }
        Ok(())
    }
}

/// Immutable audit row for one status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: Uuid,
    pub id_os: OrderId,
    pub status_anterior: Option<OrderStatus>,
    pub status_novo: OrderStatus,
    pub changed_by: Option<UserId>,
    /// Epoch milliseconds.
    pub changed_at: i64,
}
