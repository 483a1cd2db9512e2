//! Occurrence repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist intake occurrences and hand out their yearly numbers.
//! - Promote an occurrence into a service order atomically.
//!
//! # Invariants
//! - Numbers come from `number_sequences`, so they never repeat within a
//!   year even after deletes.
//! - Conversion inserts the order and flips `convertida_em_os` in one
//!   transaction; a second conversion of the same occurrence writes nothing.

use crate::model::classification::{Origin, Priority, WarrantyStatus};
use crate::model::customer::display_name_of;
use crate::model::occurrence::{
    format_occurrence_number, Occurrence, OccurrenceId, OccurrenceStatus,
};
use crate::model::order::{OrderId, ServiceOrder};
use crate::model::status::OrderStatus;
use crate::repo::order_repo::insert_order;
use crate::repo::{
    bool_to_int, ensure_connection_ready, map_write_error, parse_bool, parse_enum,
    parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const OCCURRENCE_SEQUENCE: &str = "occurrence";

const OCCURRENCE_COLUMNS_SQL: &str = "
    oc.id,
    oc.numero,
    oc.titulo,
    oc.descricao,
    oc.prioridade,
    oc.origem,
    oc.situacao_garantia,
    oc.id_cliente,
    oc.contato_cliente,
    oc.telefone_contato,
    oc.endereco_atendimento,
    oc.observacoes,
    oc.status_ocorrencia,
    oc.convertida_em_os,
    oc.id_os_gerada,
    oc.created_by";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceListQuery {
    pub status: Option<OccurrenceStatus>,
    /// Matched against number, title and customer name.
    pub search: Option<String>,
}

/// Occurrence joined with its customer and generated order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceSummary {
    pub occurrence: Occurrence,
    pub customer_nome: String,
    pub customer_razao_social: Option<String>,
    pub order_numero: Option<String>,
    pub order_status: Option<OrderStatus>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl OccurrenceSummary {
    pub fn customer_display_name(&self) -> &str {
        display_name_of(self.customer_razao_social.as_deref(), &self.customer_nome)
    }

    fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.occurrence.numero.as_str(),
            self.occurrence.titulo.as_str(),
            self.customer_display_name(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub trait OccurrenceRepository {
    /// Inserts `occurrence` under the next number for `year`.
    ///
    /// Returns the stored record including its generated `numero`.
    fn create_occurrence(&self, occurrence: &Occurrence, year: i32) -> RepoResult<Occurrence>;
    fn get_occurrence(&self, id: OccurrenceId) -> RepoResult<Option<Occurrence>>;
    fn list_occurrences(&self, query: &OccurrenceListQuery)
        -> RepoResult<Vec<OccurrenceSummary>>;
    /// Changes the status of an unconverted occurrence.
    fn update_occurrence_status(
        &self,
        id: OccurrenceId,
        status: OccurrenceStatus,
    ) -> RepoResult<()>;
    /// Inserts `order` and marks the occurrence converted, atomically.
    fn convert_to_order(&self, id: OccurrenceId, order: &ServiceOrder) -> RepoResult<OrderId>;
}

pub struct SqliteOccurrenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOccurrenceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["occurrences", "number_sequences", "service_orders"],
        )?;
        Ok(Self { conn })
    }
}

impl OccurrenceRepository for SqliteOccurrenceRepository<'_> {
    fn create_occurrence(&self, occurrence: &Occurrence, year: i32) -> RepoResult<Occurrence> {
        occurrence.validate()?;
        if occurrence.is_converted() {
            return Err(RepoError::Conflict(
                "new occurrences cannot start converted".to_string(),
            ));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sequence = next_sequence_value(&tx, OCCURRENCE_SEQUENCE, year)?;

        let mut stored = occurrence.clone();
        stored.numero = format_occurrence_number(year, sequence);

        tx.execute(
            "INSERT INTO occurrences (
                id,
                numero,
                titulo,
                descricao,
                prioridade,
                origem,
                situacao_garantia,
                id_cliente,
                contato_cliente,
                telefone_contato,
                endereco_atendimento,
                observacoes,
                status_ocorrencia,
                convertida_em_os,
                id_os_gerada,
                created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL, ?15);",
            params![
                stored.id.to_string(),
                stored.numero.as_str(),
                stored.titulo.trim(),
                stored.descricao.as_deref(),
                stored.prioridade.as_str(),
                stored.origem.as_str(),
                stored.situacao_garantia.as_str(),
                stored.id_cliente.to_string(),
                stored.contato_cliente.as_deref(),
                stored.telefone_contato.as_deref(),
                stored.endereco_atendimento.as_deref(),
                stored.observacoes.as_deref(),
                stored.status.as_str(),
                bool_to_int(false),
                stored.created_by.map(|id| id.to_string()),
            ],
        )
        .map_err(|err| map_write_error(err, "occurrence", stored.numero.clone()))?;
        tx.commit()?;

        Ok(stored)
    }

    fn get_occurrence(&self, id: OccurrenceId) -> RepoResult<Option<Occurrence>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OCCURRENCE_COLUMNS_SQL} FROM occurrences oc WHERE oc.id = ?1;"
        ))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_occurrence_row(row)))
            .optional()?
            .transpose()
    }

    fn list_occurrences(
        &self,
        query: &OccurrenceListQuery,
    ) -> RepoResult<Vec<OccurrenceSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OCCURRENCE_COLUMNS_SQL},
                oc.created_at,
                c.nome AS customer_nome,
                c.razao_social AS customer_razao_social,
                o.numero AS order_numero,
                o.status_atual AS order_status
             FROM occurrences oc
             INNER JOIN customers c ON c.id = oc.id_cliente
             LEFT JOIN service_orders o ON o.id = oc.id_os_gerada
             WHERE (?1 IS NULL OR oc.status_ocorrencia = ?1)
             ORDER BY oc.created_at DESC, oc.rowid DESC;"
        ))?;
        let mut rows = stmt.query([query.status.map(OccurrenceStatus::as_str)])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            let order_status = row
                .get::<_, Option<String>>("order_status")?
                .map(|value| parse_enum(&value, "service_orders.status_atual", OrderStatus::parse))
                .transpose()?;
            let summary = OccurrenceSummary {
                occurrence: parse_occurrence_row(row)?,
                customer_nome: row.get("customer_nome")?,
                customer_razao_social: row.get("customer_razao_social")?,
                order_numero: row.get("order_numero")?,
                order_status,
                created_at: row.get("created_at")?,
            };
            let keep = query
                .search
                .as_deref()
                .map_or(true, |term| summary.matches_search(term));
            if keep {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    fn update_occurrence_status(
        &self,
        id: OccurrenceId,
        status: OccurrenceStatus,
    ) -> RepoResult<()> {
        if status == OccurrenceStatus::Converted {
            return Err(RepoError::Conflict(
                "occurrences become converted only through conversion".to_string(),
            ));
        }

        let changed = self.conn.execute(
            "UPDATE occurrences
             SET
                status_ocorrencia = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2
               AND convertida_em_os = 0;",
            params![status.as_str(), id.to_string()],
        )?;

        if changed == 0 {
            return Err(missing_or_converted(self.conn, id)?);
        }
        Ok(())
    }

    fn convert_to_order(&self, id: OccurrenceId, order: &ServiceOrder) -> RepoResult<OrderId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE occurrences
             SET
                convertida_em_os = 1,
                status_ocorrencia = 'convertida_em_os',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND convertida_em_os = 0;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(missing_or_converted(&tx, id)?);
        }

        insert_order(&tx, order)?;
        tx.execute(
            "UPDATE occurrences SET id_os_gerada = ?1 WHERE id = ?2;",
            params![order.id.to_string(), id.to_string()],
        )?;
        tx.commit()?;

        Ok(order.id)
    }
}

/// Advances the named yearly counter and returns the new value.
fn next_sequence_value(conn: &Connection, name: &str, year: i32) -> RepoResult<u32> {
    conn.execute(
        "INSERT INTO number_sequences (name, year, last_value)
         VALUES (?1, ?2, 1)
         ON CONFLICT(name, year) DO UPDATE SET last_value = last_value + 1;",
        params![name, year],
    )?;
    let value: u32 = conn.query_row(
        "SELECT last_value FROM number_sequences WHERE name = ?1 AND year = ?2;",
        params![name, year],
        |row| row.get(0),
    )?;
    Ok(value)
}

/// Explains why a guarded occurrence write touched no rows.
fn missing_or_converted(conn: &Connection, id: OccurrenceId) -> RepoResult<RepoError> {
    let converted: Option<i64> = conn
        .query_row(
            "SELECT convertida_em_os FROM occurrences WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match converted {
        None => RepoError::NotFound {
            entity: "occurrence",
            id,
        },
        Some(_) => RepoError::Conflict(format!("occurrence {id} is already converted")),
    })
}

fn parse_occurrence_row(row: &Row<'_>) -> RepoResult<Occurrence> {
    let id_text: String = row.get("id")?;
    let customer_text: String = row.get("id_cliente")?;
    let prioridade_text: String = row.get("prioridade")?;
    let origem_text: String = row.get("origem")?;
    let garantia_text: String = row.get("situacao_garantia")?;
    let status_text: String = row.get("status_ocorrencia")?;

    let occurrence = Occurrence {
        id: parse_uuid(&id_text, "occurrences.id")?,
        numero: row.get("numero")?,
        titulo: row.get("titulo")?,
        descricao: row.get("descricao")?,
        prioridade: parse_enum(&prioridade_text, "occurrences.prioridade", Priority::parse)?,
        origem: parse_enum(&origem_text, "occurrences.origem", Origin::parse)?,
        situacao_garantia: parse_enum(
            &garantia_text,
            "occurrences.situacao_garantia",
            WarrantyStatus::parse,
        )?,
        id_cliente: parse_uuid(&customer_text, "occurrences.id_cliente")?,
        contato_cliente: row.get("contato_cliente")?,
        telefone_contato: row.get("telefone_contato")?,
        endereco_atendimento: row.get("endereco_atendimento")?,
        observacoes: row.get("observacoes")?,
        status: parse_enum(
            &status_text,
            "occurrences.status_ocorrencia",
            OccurrenceStatus::parse,
        )?,
        convertida_em_os: parse_bool(row.get("convertida_em_os")?, "occurrences.convertida_em_os")?,
        id_os_gerada: parse_optional_uuid(row.get("id_os_gerada")?, "occurrences.id_os_gerada")?,
        created_by: parse_optional_uuid(row.get("created_by")?, "occurrences.created_by")?,
    };
    occurrence.validate()?;
    Ok(occurrence)
}
