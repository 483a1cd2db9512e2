//! Customer catalog use-case service.
//!
//! # Invariants
//! - Reads are open to every role; writes are admin-only.
//! - Deletes require explicit confirmation.

use crate::model::customer::{Customer, CustomerId};
use crate::model::session::Session;
use crate::repo::customer_repo::{CustomerListQuery, CustomerRepository};
use crate::service::access::require_admin;
use crate::service::{Confirmation, ServiceError, ServiceResult};
use log::info;

pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Ordered by name; `search` matches name, legal name and e-mails.
    pub fn list_customers(&self, search: Option<&str>) -> ServiceResult<Vec<Customer>> {
        Ok(self.repo.list_customers(&CustomerListQuery {
            search: search.map(str::to_string),
            active_only: false,
        })?)
    }

    /// Active customers, as offered in order and occurrence forms.
    pub fn list_active_customers(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.repo.list_customers(&CustomerListQuery {
            search: None,
            active_only: true,
        })?)
    }

    pub fn get_customer(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.repo.get_customer(id)?.ok_or(ServiceError::NotFound {
            entity: "customer",
            id,
        })
    }

    pub fn create_customer(
        &self,
        session: &Session,
        customer: &Customer,
    ) -> ServiceResult<CustomerId> {
        require_admin(session, "create customer")?;

        let id = self.repo.create_customer(customer)?;
        info!("event=customer_create module=service status=ok customer_id={id}");
        Ok(id)
    }

    pub fn update_customer(&self, session: &Session, customer: &Customer) -> ServiceResult<()> {
        require_admin(session, "update customer")?;

        self.repo.update_customer(customer)?;
        info!(
            "event=customer_update module=service status=ok customer_id={}",
            customer.id
        );
        Ok(())
    }

    pub fn delete_customer(
        &self,
        session: &Session,
        id: CustomerId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete customer")?;
        confirmation.require("delete customer")?;

        self.repo.delete_customer(id)?;
        info!("event=customer_delete module=service status=ok customer_id={id}");
        Ok(())
    }
}
