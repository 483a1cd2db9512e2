//! De-Para mapping administration.

use crate::model::mapping::{ExternalMapping, MappedEntity, MappingId};
use crate::model::session::Session;
use crate::model::validation::ValidationError;
use crate::repo::mapping_repo::MappingRepository;
use crate::service::access::require_admin;
use crate::service::{Confirmation, ServiceResult};
use log::info;
use uuid::Uuid;

pub struct MappingService<R: MappingRepository> {
    repo: R,
}

impl<R: MappingRepository> MappingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_mappings(
        &self,
        session: &Session,
        entity: Option<MappedEntity>,
    ) -> ServiceResult<Vec<ExternalMapping>> {
        require_admin(session, "list mappings")?;
        Ok(self.repo.list_mappings(entity)?)
    }

    /// Registers a mapping whose internal id must name an existing row.
    pub fn create_mapping(
        &self,
        session: &Session,
        mapping: &ExternalMapping,
    ) -> ServiceResult<MappingId> {
        require_admin(session, "create mapping")?;
        mapping.validate()?;
        if !self.repo.entity_exists(mapping.entidade, mapping.id_interno)? {
            return Err(ValidationError::InvalidValue {
                field: "id_interno",
                value: mapping.id_interno.to_string(),
            }
            .into());
        }

        let id = self.repo.create_mapping(mapping)?;
        info!(
            "event=mapping_create module=service status=ok mapping_id={} entidade={}",
            id,
            mapping.entidade.as_str()
        );
        Ok(id)
    }

    pub fn delete_mapping(
        &self,
        session: &Session,
        id: MappingId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete mapping")?;
        confirmation.require("delete mapping")?;

        self.repo.delete_mapping(id)?;
        info!("event=mapping_delete module=service status=ok mapping_id={id}");
        Ok(())
    }

    pub fn resolve(&self, entity: MappedEntity, id_dinamics: &str) -> ServiceResult<Option<Uuid>> {
        Ok(self.repo.resolve(entity, id_dinamics)?)
    }
}
