//! Product catalog use-case service.

use crate::model::product::{Product, ProductId};
use crate::model::session::Session;
use crate::repo::product_repo::ProductRepository;
use crate::service::access::require_admin;
use crate::service::{Confirmation, ServiceError, ServiceResult};
use log::info;

pub struct ProductService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_products(&self, search: Option<&str>) -> ServiceResult<Vec<Product>> {
        Ok(self.repo.list_products(search)?)
    }

    pub fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.repo.get_product(id)?.ok_or(ServiceError::NotFound {
            entity: "product",
            id,
        })
    }

    pub fn create_product(&self, session: &Session, product: &Product) -> ServiceResult<ProductId> {
        require_admin(session, "create product")?;

        let id = self.repo.create_product(product)?;
        info!("event=product_create module=service status=ok product_id={id}");
        Ok(id)
    }

    pub fn update_product(&self, session: &Session, product: &Product) -> ServiceResult<()> {
        require_admin(session, "update product")?;

        self.repo.update_product(product)?;
        info!(
            "event=product_update module=service status=ok product_id={}",
            product.id
        );
        Ok(())
    }

    pub fn delete_product(
        &self,
        session: &Session,
        id: ProductId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete product")?;
        confirmation.require("delete product")?;

        self.repo.delete_product(id)?;
        info!("event=product_delete module=service status=ok product_id={id}");
        Ok(())
    }
}
