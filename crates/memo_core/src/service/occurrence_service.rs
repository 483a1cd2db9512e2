//! Occurrence intake and promotion into service orders.
//!
//! # Responsibility
//! - Register customer complaints with a yearly `OC-YYYY-NNNN` number.
//! - Convert an occurrence into exactly one service order.
//!
//! # Invariants
//! - Conversion happens at most once per occurrence; the repository
//!   writes the order and the occurrence flag in the same transaction.
//! - Cancelled occurrences are never converted.

use crate::model::classification::{Origin, Priority, WarrantyStatus};
use crate::model::customer::CustomerId;
use crate::model::occurrence::{Occurrence, OccurrenceId, OccurrenceStatus};
use crate::model::order::ServiceOrder;
use crate::model::session::Session;
use crate::model::validation::non_blank;
use crate::repo::occurrence_repo::{OccurrenceListQuery, OccurrenceRepository, OccurrenceSummary};
use crate::repo::order_repo::OrderRepository;
use crate::repo::RepoError;
use crate::service::access::require_admin;
use crate::service::order_service::{allocate_order_number, DEFAULT_ORDER_NUMBER_WIDTH};
use crate::service::{ServiceError, ServiceResult};
use chrono::{Datelike, Utc};
use log::{info, warn};

/// Input for registering an occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOccurrence {
    pub id_cliente: CustomerId,
    pub titulo: String,
    pub descricao: Option<String>,
    pub prioridade: Priority,
    pub origem: Origin,
    pub situacao_garantia: WarrantyStatus,
    pub contato_cliente: Option<String>,
    pub telefone_contato: Option<String>,
    pub endereco_atendimento: Option<String>,
    pub observacoes: Option<String>,
}

pub struct OccurrenceService<O: OccurrenceRepository, R: OrderRepository> {
    occurrences: O,
    orders: R,
    number_width: usize,
}

impl<O: OccurrenceRepository, R: OrderRepository> OccurrenceService<O, R> {
    pub fn new(occurrences: O, orders: R) -> Self {
        Self {
            occurrences,
            orders,
            number_width: DEFAULT_ORDER_NUMBER_WIDTH,
        }
    }

    pub fn with_number_width(mut self, width: usize) -> Self {
        self.number_width = width.max(1);
        self
    }

    pub fn create_occurrence(
        &self,
        session: &Session,
        request: NewOccurrence,
    ) -> ServiceResult<Occurrence> {
        let mut occurrence = Occurrence::new(request.id_cliente, request.titulo.trim());
        occurrence.descricao = non_blank(request.descricao.as_deref());
        occurrence.prioridade = request.prioridade;
        occurrence.origem = request.origem;
        occurrence.situacao_garantia = request.situacao_garantia;
        occurrence.contato_cliente = non_blank(request.contato_cliente.as_deref());
        occurrence.telefone_contato = non_blank(request.telefone_contato.as_deref());
        occurrence.endereco_atendimento = non_blank(request.endereco_atendimento.as_deref());
        occurrence.observacoes = non_blank(request.observacoes.as_deref());
        occurrence.created_by = Some(session.user_id);
        occurrence.validate()?;

        let stored = self
            .occurrences
            .create_occurrence(&occurrence, Utc::now().year())?;
        info!(
            "event=occurrence_create module=service status=ok occurrence_id={} numero={}",
            stored.id, stored.numero
        );
        Ok(stored)
    }

    /// Newest first, with customer and generated-order details.
    pub fn list_occurrences(
        &self,
        _session: &Session,
        query: &OccurrenceListQuery,
    ) -> ServiceResult<Vec<OccurrenceSummary>> {
        Ok(self.occurrences.list_occurrences(query)?)
    }

    pub fn get_occurrence(
        &self,
        _session: &Session,
        id: OccurrenceId,
    ) -> ServiceResult<Occurrence> {
        self.load(id)
    }

    pub fn set_occurrence_status(
        &self,
        session: &Session,
        id: OccurrenceId,
        status: OccurrenceStatus,
    ) -> ServiceResult<()> {
        if status == OccurrenceStatus::Converted {
            return Err(ServiceError::InvalidState(
                "use conversion to turn an occurrence into an order".to_string(),
            ));
        }
        let occurrence = self.load(id)?;
        if occurrence.is_converted() {
            return Err(ServiceError::AlreadyConverted(id));
        }

        self.occurrences
            .update_occurrence_status(id, status)
            .map_err(|err| conversion_error(err, id))?;
        info!(
            "event=occurrence_status module=service status=ok occurrence_id={} user_id={} new_status={}",
            id,
            session.user_id,
            status.as_str()
        );
        Ok(())
    }

    /// Promotes the occurrence into a new open service order.
    pub fn convert_to_order(
        &self,
        session: &Session,
        id: OccurrenceId,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "convert occurrence")?;

        let occurrence = self.load(id)?;
        if occurrence.is_converted() {
            warn!(
                "event=occurrence_convert module=service status=rejected occurrence_id={id} reason=already_converted"
            );
            return Err(ServiceError::AlreadyConverted(id));
        }
        if occurrence.status == OccurrenceStatus::Cancelled {
            return Err(ServiceError::InvalidState(format!(
                "occurrence {} is cancelled",
                occurrence.numero
            )));
        }

        let numero = allocate_order_number(&self.orders, Utc::now().year(), self.number_width)?;
        let mut order = ServiceOrder::from_occurrence(numero, &occurrence);
        order.created_by = Some(session.user_id);

        self.occurrences
            .convert_to_order(id, &order)
            .map_err(|err| conversion_error(err, id))?;
        info!(
            "event=occurrence_convert module=service status=ok occurrence_id={} order_id={} numero={}",
            id, order.id, order.numero
        );
        Ok(order)
    }

    fn load(&self, id: OccurrenceId) -> ServiceResult<Occurrence> {
        self.occurrences
            .get_occurrence(id)?
            .ok_or(ServiceError::NotFound {
                entity: "occurrence",
                id,
            })
    }
}

/// A guarded occurrence write that lost the race means it was converted.
fn conversion_error(err: RepoError, id: OccurrenceId) -> ServiceError {
    match err {
        RepoError::Conflict(_) => ServiceError::AlreadyConverted(id),
        other => other.into(),
    }
}
