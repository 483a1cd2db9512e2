//! Service-order use-case service.
//!
//! # Responsibility
//! - Create, read and update service orders with role scoping.
//! - Own quotation lines and the approve/reject decision.
//!
//! # Invariants
//! - Operators only read or touch orders where they are the principal
//!   technician.
//! - Approval is valid only from `aguardando_aprovacao` and always records
//!   payment terms together with the status change.
//! - Rejection records the reason and leaves the status unchanged.

use crate::model::classification::{Origin, PaymentTerms, Priority, WarrantyStatus};
use crate::model::customer::CustomerId;
use crate::model::order::{
    format_order_number, OrderId, OrderItem, OrderItemId, ServiceOrder, StatusChange,
};
use crate::model::product::ProductId;
use crate::model::session::Session;
use crate::model::status::OrderStatus;
use crate::model::user::UserId;
use crate::model::validation::{non_blank, require_text, ValidationError};
use crate::repo::order_repo::{
    OrderItemLine, OrderListQuery, OrderRepository, OrderSummary, StatusTransition,
};
use crate::repo::product_repo::ProductRepository;
use crate::repo::RepoResult;
use crate::service::access::require_admin;
use crate::service::{now_epoch_ms, Confirmation, ServiceError, ServiceResult};
use chrono::{Datelike, NaiveDate, Utc};
use log::info;

pub const DEFAULT_ORDER_NUMBER_WIDTH: usize = 3;

/// Input for a manually opened order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewServiceOrder {
    /// Generated as `{year}-{n}` when absent.
    pub numero: Option<String>,
    pub id_cliente: CustomerId,
    pub id_tecnico_principal: Option<UserId>,
    pub origem: Origin,
    pub situacao_garantia: WarrantyStatus,
    pub prioridade: Option<Priority>,
    pub prazo: Option<NaiveDate>,
    pub id_dinamics_os: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub statuses: Vec<OrderStatus>,
    pub limit: Option<u32>,
}

/// Picks the next free order number for `year`.
///
/// Starts at `count + 1` and skips numbers already taken, so deleting an
/// order never makes the generator hand out an existing number.
pub fn allocate_order_number<R: OrderRepository>(
    repo: &R,
    year: i32,
    width: usize,
) -> RepoResult<String> {
    let mut sequence = repo.count_orders()? + 1;
    loop {
        let candidate = format_order_number(year, sequence, width);
        if !repo.order_number_exists(&candidate)? {
            return Ok(candidate);
        }
        sequence += 1;
    }
}

pub struct OrderService<R: OrderRepository, P: ProductRepository> {
    orders: R,
    products: P,
    number_width: usize,
}

impl<R: OrderRepository, P: ProductRepository> OrderService<R, P> {
    pub fn new(orders: R, products: P) -> Self {
        Self {
            orders,
            products,
            number_width: DEFAULT_ORDER_NUMBER_WIDTH,
        }
    }

    pub fn with_number_width(mut self, width: usize) -> Self {
        self.number_width = width.max(1);
        self
    }

    pub fn create_order(
        &self,
        session: &Session,
        request: NewServiceOrder,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "create service order")?;

        let numero = match non_blank(request.numero.as_deref()) {
            Some(numero) => numero,
            None => allocate_order_number(&self.orders, Utc::now().year(), self.number_width)?,
        };

        let mut order = ServiceOrder::new(numero, request.id_cliente);
        order.id_tecnico_principal = request.id_tecnico_principal;
        order.origem = request.origem;
        order.situacao_garantia = request.situacao_garantia;
        order.prioridade = request.prioridade.or(order.prioridade);
        order.prazo = request.prazo;
        order.id_dinamics_os = non_blank(request.id_dinamics_os.as_deref());
        order.created_by = Some(session.user_id);

        self.orders.create_order(&order)?;
        info!(
            "event=order_create module=service status=ok order_id={} numero={}",
            order.id, order.numero
        );
        Ok(order)
    }

    pub fn list_orders(
        &self,
        session: &Session,
        filter: &OrderFilter,
    ) -> ServiceResult<Vec<OrderSummary>> {
        let query = OrderListQuery {
            technician: session.technician_scope(),
            statuses: filter.statuses.clone(),
            limit: filter.limit,
        };
        Ok(self.orders.list_orders(&query)?)
    }

    /// Orders waiting for a quotation decision.
    pub fn pending_approval(&self, session: &Session) -> ServiceResult<Vec<OrderSummary>> {
        require_admin(session, "review quotations")?;
        self.list_orders(
            session,
            &OrderFilter {
                statuses: vec![OrderStatus::AwaitingApproval],
                limit: None,
            },
        )
    }

    pub fn get_order(&self, session: &Session, id: OrderId) -> ServiceResult<ServiceOrder> {
        let order = self.load(id)?;
        ensure_in_scope(session, &order, "view service order")?;
        Ok(order)
    }

    pub fn status_history(
        &self,
        session: &Session,
        id: OrderId,
    ) -> ServiceResult<Vec<StatusChange>> {
        self.get_order(session, id)?;
        Ok(self.orders.list_status_changes(id)?)
    }

    pub fn assign_technician(
        &self,
        session: &Session,
        id: OrderId,
        technician: Option<UserId>,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "assign technician")?;

        let mut order = self.load(id)?;
        order.id_tecnico_principal = technician;
        self.orders.update_order(&order)?;
        info!(
            "event=order_assign module=service status=ok order_id={} technician_id={}",
            order.id,
            technician.map_or_else(|| "none".to_string(), |tech| tech.to_string())
        );
        Ok(order)
    }

    pub fn set_deadline(
        &self,
        session: &Session,
        id: OrderId,
        prazo: Option<NaiveDate>,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "change deadline")?;

        let mut order = self.load(id)?;
        order.prazo = prazo;
        self.orders.update_order(&order)?;
        Ok(order)
    }

    /// Stores the technician's diagnosis report.
    pub fn save_diagnosis(
        &self,
        session: &Session,
        id: OrderId,
        laudo: &str,
    ) -> ServiceResult<ServiceOrder> {
        require_text("laudo", laudo)?;

        let mut order = self.load(id)?;
        ensure_in_scope(session, &order, "write diagnosis")?;
        order.laudo = Some(laudo.trim().to_string());
        self.orders.update_order(&order)?;
        info!(
            "event=order_diagnosis module=service status=ok order_id={} laudo_len={}",
            order.id,
            laudo.trim().chars().count()
        );
        Ok(order)
    }

    pub fn add_item(
        &self,
        session: &Session,
        order_id: OrderId,
        product_id: ProductId,
        quantidade: i64,
    ) -> ServiceResult<OrderItemId> {
        let item = OrderItem::new(order_id, product_id, quantidade);
        item.validate()?;

        let order = self.load(order_id)?;
        ensure_in_scope(session, &order, "edit quotation")?;
        if self.products.get_product(product_id)?.is_none() {
            return Err(ServiceError::NotFound {
                entity: "product",
                id: product_id,
            });
        }

        let item_id = self.orders.add_item(&item)?;
        info!(
            "event=order_item_add module=service status=ok order_id={} product_id={} quantidade={}",
            order_id, product_id, quantidade
        );
        Ok(item_id)
    }

    pub fn remove_item(
        &self,
        session: &Session,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> ServiceResult<()> {
        let order = self.load(order_id)?;
        ensure_in_scope(session, &order, "edit quotation")?;
        let belongs = self
            .orders
            .list_items(order_id)?
            .iter()
            .any(|line| line.item.id == item_id);
        if !belongs {
            return Err(ServiceError::NotFound {
                entity: "order item",
                id: item_id,
            });
        }

        self.orders.remove_item(item_id)?;
        Ok(())
    }

    pub fn list_items(
        &self,
        session: &Session,
        order_id: OrderId,
    ) -> ServiceResult<Vec<OrderItemLine>> {
        self.get_order(session, order_id)?;
        Ok(self.orders.list_items(order_id)?)
    }

    /// Approves the quotation and advances the order to `aguardando_pecas`.
    pub fn approve(
        &self,
        session: &Session,
        id: OrderId,
        payment_terms: Option<PaymentTerms>,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "approve quotation")?;
        let payment_terms =
            payment_terms.ok_or(ValidationError::MissingField("condicao_pagamento"))?;

        let order = self.load(id)?;
        if order.status != OrderStatus::AwaitingApproval {
            return Err(ServiceError::InvalidState(format!(
                "order {} is not awaiting approval",
                order.numero
            )));
        }

        self.orders.transition_status(&StatusTransition {
            order_id: id,
            from: OrderStatus::AwaitingApproval,
            to: OrderStatus::AwaitingParts,
            changed_by: Some(session.user_id),
            changed_at: now_epoch_ms(),
            payment_terms: Some(payment_terms),
        })?;
        info!(
            "event=order_approve module=service status=ok order_id={} condicao_pagamento={}",
            id,
            payment_terms.as_str()
        );
        self.load(id)
    }

    /// Records why the quotation was refused; the status stays put.
    pub fn reject(
        &self,
        session: &Session,
        id: OrderId,
        motivo: &str,
    ) -> ServiceResult<ServiceOrder> {
        require_admin(session, "reject quotation")?;
        require_text("motivo_cancelamento", motivo)?;

        let mut order = self.load(id)?;
        if order.status != OrderStatus::AwaitingApproval {
            return Err(ServiceError::InvalidState(format!(
                "order {} is not awaiting approval",
                order.numero
            )));
        }
        order.motivo_cancelamento = Some(motivo.trim().to_string());
        self.orders.update_order(&order)?;
        info!(
            "event=order_reject module=service status=ok order_id={}",
            order.id
        );
        Ok(order)
    }

    pub fn delete_order(
        &self,
        session: &Session,
        id: OrderId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete service order")?;
        confirmation.require("delete service order")?;

        self.orders.delete_order(id)?;
        info!("event=order_delete module=service status=ok order_id={id}");
        Ok(())
    }

    fn load(&self, id: OrderId) -> ServiceResult<ServiceOrder> {
        self.orders.get_order(id)?.ok_or(ServiceError::NotFound {
            entity: "service order",
            id,
        })
    }
}

/// Fails with `Forbidden` when an operator touches someone else's order.
pub(crate) fn ensure_in_scope(
    session: &Session,
    order: &ServiceOrder,
    action: &'static str,
) -> ServiceResult<()> {
    match session.technician_scope() {
        Some(technician) if order.id_tecnico_principal != Some(technician) => {
            Err(ServiceError::Forbidden { action })
        }
        _ => Ok(()),
    }
}
