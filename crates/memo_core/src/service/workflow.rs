//! Kanban board and column-to-column order moves.
//!
//! # Invariants
//! - A move is accepted only when the destination column immediately
//!   follows the source column; every other move writes nothing.
//! - An accepted move performs one guarded status update and one audit row.

use crate::model::classification::Priority;
use crate::model::order::OrderId;
use crate::model::session::Session;
use crate::model::status::OrderStatus;
use crate::repo::order_repo::{OrderListQuery, OrderRepository, OrderSummary, StatusTransition};
use crate::service::order_service::ensure_in_scope;
use crate::service::{now_epoch_ms, ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::{info, warn};

pub const UNASSIGNED_LABEL: &str = "Não atribuído";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanCard {
    pub order_id: OrderId,
    pub numero: String,
    pub customer_name: String,
    /// Technician name, or `UNASSIGNED_LABEL`.
    pub technician_name: String,
    pub prazo: Option<NaiveDate>,
    pub prioridade: Option<Priority>,
}

impl From<&OrderSummary> for KanbanCard {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            order_id: summary.order.id,
            numero: summary.order.numero.clone(),
            customer_name: summary.customer_display_name().to_string(),
            technician_name: summary
                .technician_nome
                .clone()
                .unwrap_or_else(|| UNASSIGNED_LABEL.to_string()),
            prazo: summary.order.prazo,
            prioridade: summary.order.prioridade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanColumn {
    pub status: OrderStatus,
    pub cards: Vec<KanbanCard>,
}

impl KanbanColumn {
    pub fn label(&self) -> &'static str {
        self.status.label()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source and destination were the same column.
    Unchanged,
    Moved { from: OrderStatus, to: OrderStatus },
}

pub struct KanbanService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> KanbanService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Seven columns in workflow order; operators see only their orders.
    pub fn board(&self, session: &Session) -> ServiceResult<Vec<KanbanColumn>> {
        let orders = self.repo.list_orders(&OrderListQuery {
            technician: session.technician_scope(),
            ..OrderListQuery::default()
        })?;

        let mut columns: Vec<KanbanColumn> = OrderStatus::ALL
            .iter()
            .map(|status| KanbanColumn {
                status: *status,
                cards: Vec::new(),
            })
            .collect();
        for summary in &orders {
            columns[summary.order.status.index()]
                .cards
                .push(KanbanCard::from(summary));
        }
        Ok(columns)
    }

    /// Moves one card from `from` to `to`.
    pub fn move_order(
        &self,
        session: &Session,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> ServiceResult<MoveOutcome> {
        if from == to {
            return Ok(MoveOutcome::Unchanged);
        }
        if !from.can_advance_to(to) {
            warn!(
                "event=order_move module=service status=rejected order_id={} from={} to={} reason=non_adjacent",
                order_id,
                from.as_str(),
                to.as_str()
            );
            return Err(ServiceError::InvalidTransition { from, to });
        }

        let order = self
            .repo
            .get_order(order_id)?
            .ok_or(ServiceError::NotFound {
                entity: "service order",
                id: order_id,
            })?;
        ensure_in_scope(session, &order, "move service order")?;
        if order.status != from {
            return Err(ServiceError::InvalidState(format!(
                "order {} is in `{}`, not `{}`",
                order.numero,
                order.status.as_str(),
                from.as_str()
            )));
        }

        self.repo.transition_status(&StatusTransition {
            order_id,
            from,
            to,
            changed_by: Some(session.user_id),
            changed_at: now_epoch_ms(),
            payment_terms: None,
        })?;
        info!(
            "event=order_move module=service status=ok order_id={} from={} to={}",
            order_id,
            from.as_str(),
            to.as_str()
        );
        Ok(MoveOutcome::Moved { from, to })
    }
}
