//! De-Para (ERP identifier) mapping repository.
//!
//! # Invariants
//! - `(entidade, id_dinamics)` is unique; re-registering yields
//!   `RepoError::Duplicate`.

use crate::model::mapping::{ExternalMapping, MappedEntity, MappingId};
use crate::repo::{
    ensure_connection_ready, map_write_error, parse_enum, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub trait MappingRepository {
    fn create_mapping(&self, mapping: &ExternalMapping) -> RepoResult<MappingId>;
    /// Newest first, optionally restricted to one entity kind.
    fn list_mappings(&self, entity: Option<MappedEntity>) -> RepoResult<Vec<ExternalMapping>>;
    fn delete_mapping(&self, id: MappingId) -> RepoResult<()>;
    /// Internal id registered for an ERP identifier.
    fn resolve(&self, entity: MappedEntity, id_dinamics: &str) -> RepoResult<Option<Uuid>>;
    /// Whether `id` names an existing row of the given kind.
    fn entity_exists(&self, entity: MappedEntity, id: Uuid) -> RepoResult<bool>;
}

pub struct SqliteMappingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMappingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["external_mappings"])?;
        Ok(Self { conn })
    }
}

impl MappingRepository for SqliteMappingRepository<'_> {
    fn create_mapping(&self, mapping: &ExternalMapping) -> RepoResult<MappingId> {
        mapping.validate()?;

        let key = format!("{}:{}", mapping.entidade.as_str(), mapping.id_dinamics.trim());
        self.conn
            .execute(
                "INSERT INTO external_mappings (
                    id,
                    id_dinamics,
                    entidade,
                    id_interno,
                    observacoes
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    mapping.id.to_string(),
                    mapping.id_dinamics.trim(),
                    mapping.entidade.as_str(),
                    mapping.id_interno.to_string(),
                    mapping.observacoes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, "mapping", key))?;

        Ok(mapping.id)
    }

    fn list_mappings(&self, entity: Option<MappedEntity>) -> RepoResult<Vec<ExternalMapping>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, id_dinamics, entidade, id_interno, observacoes
             FROM external_mappings
             WHERE (?1 IS NULL OR entidade = ?1)
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([entity.map(MappedEntity::as_str)])?;
        let mut mappings = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let entity_text: String = row.get("entidade")?;
            let internal_text: String = row.get("id_interno")?;
            let mapping = ExternalMapping {
                id: parse_uuid(&id_text, "external_mappings.id")?,
                id_dinamics: row.get("id_dinamics")?,
                entidade: parse_enum(
                    &entity_text,
                    "external_mappings.entidade",
                    MappedEntity::parse,
                )?,
                id_interno: parse_uuid(&internal_text, "external_mappings.id_interno")?,
                observacoes: row.get("observacoes")?,
            };
            mapping.validate()?;
            mappings.push(mapping);
        }
        Ok(mappings)
    }

    fn delete_mapping(&self, id: MappingId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM external_mappings WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "mapping",
                id,
            });
        }
        Ok(())
    }

    fn resolve(&self, entity: MappedEntity, id_dinamics: &str) -> RepoResult<Option<Uuid>> {
        let internal: Option<String> = self
            .conn
            .query_row(
                "SELECT id_interno
                 FROM external_mappings
                 WHERE entidade = ?1 AND id_dinamics = ?2;",
                params![entity.as_str(), id_dinamics.trim()],
                |row| row.get(0),
            )
            .optional()?;
        internal
            .map(|text| parse_uuid(&text, "external_mappings.id_interno"))
            .transpose()
    }

    fn entity_exists(&self, entity: MappedEntity, id: Uuid) -> RepoResult<bool> {
        let table = match entity {
            MappedEntity::Customer => "customers",
            MappedEntity::Product => "products",
            MappedEntity::User => "profiles",
            MappedEntity::Order => "service_orders",
        };
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}
