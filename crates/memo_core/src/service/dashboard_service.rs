//! Dashboard counters.

use crate::model::session::Session;
use crate::model::status::OrderStatus;
use crate::model::user::Role;
use crate::repo::order_repo::{OrderListQuery, OrderRepository, OrderSummary};
use crate::repo::user_repo::UserRepository;
use crate::service::ServiceResult;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_orders: usize,
    /// `em_diagnostico` plus `em_execucao`.
    pub in_progress: usize,
    /// Deadline before today and not finalized.
    pub overdue: usize,
    /// Operator count; always 0 for operators.
    pub technicians: usize,
}

pub struct DashboardService<R: OrderRepository, U: UserRepository> {
    orders: R,
    users: U,
}

impl<R: OrderRepository, U: UserRepository> DashboardService<R, U> {
    pub fn new(orders: R, users: U) -> Self {
        Self { orders, users }
    }

    pub fn stats(&self, session: &Session, today: NaiveDate) -> ServiceResult<DashboardStats> {
        let orders = self.scoped_orders(session, None)?;

        let in_progress = orders
            .iter()
            .filter(|summary| {
                matches!(
                    summary.order.status,
                    OrderStatus::InDiagnosis | OrderStatus::InExecution
                )
            })
            .count();
        let overdue = orders
            .iter()
            .filter(|summary| summary.order.is_overdue(today))
            .count();
        let technicians = if session.is_admin() {
            self.users.list_users(Some(Role::Operator))?.len()
        } else {
            0
        };

        Ok(DashboardStats {
            total_orders: orders.len(),
            in_progress,
            overdue,
            technicians,
        })
    }

    /// Newest orders first.
    pub fn recent_orders(&self, session: &Session, limit: u32) -> ServiceResult<Vec<OrderSummary>> {
        self.scoped_orders(session, Some(limit))
    }

    fn scoped_orders(
        &self,
        session: &Session,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<OrderSummary>> {
        Ok(self.orders.list_orders(&OrderListQuery {
            technician: session.technician_scope(),
            statuses: Vec::new(),
            limit,
        })?)
    }
}
