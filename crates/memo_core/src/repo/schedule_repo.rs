//! Technician schedule repository.
//!
//! # Invariants
//! - Range reads are half-open on `data_inicio`: `[start, end)`.
//! - Rows are returned ordered by `data_inicio`, then `id`.

use crate::model::schedule::{Reservation, ReservationId};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, map_write_error, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Reservation joined with its order number and technician name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationView {
    pub reservation: Reservation,
    pub order_numero: String,
    pub technician_nome: String,
}

pub trait ScheduleRepository {
    fn create_reservation(&self, reservation: &Reservation) -> RepoResult<ReservationId>;
    /// Reservations starting in `[start_ms, end_ms)`, optionally for one technician.
    fn list_reservations_between(
        &self,
        start_ms: i64,
        end_ms: i64,
        technician: Option<UserId>,
    ) -> RepoResult<Vec<ReservationView>>;
    fn delete_reservation(&self, id: ReservationId) -> RepoResult<()>;
}

pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["reservations"])?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn create_reservation(&self, reservation: &Reservation) -> RepoResult<ReservationId> {
        reservation.validate()?;

        self.conn
            .execute(
                "INSERT INTO reservations (
                    id,
                    id_os,
                    id_tecnico,
                    titulo,
                    descricao,
                    data_inicio,
                    data_fim
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    reservation.id.to_string(),
                    reservation.id_os.to_string(),
                    reservation.id_tecnico.to_string(),
                    reservation.titulo.trim(),
                    reservation.descricao.as_deref(),
                    reservation.data_inicio,
                    reservation.data_fim,
                ],
            )
            .map_err(|err| map_write_error(err, "reservation", reservation.id.to_string()))?;

        Ok(reservation.id)
    }

    fn list_reservations_between(
        &self,
        start_ms: i64,
        end_ms: i64,
        technician: Option<UserId>,
    ) -> RepoResult<Vec<ReservationView>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                r.id,
                r.id_os,
                r.id_tecnico,
                r.titulo,
                r.descricao,
                r.data_inicio,
                r.data_fim,
                o.numero AS order_numero,
                p.nome AS technician_nome
             FROM reservations r
             INNER JOIN service_orders o ON o.id = r.id_os
             INNER JOIN profiles p ON p.id = r.id_tecnico
             WHERE r.data_inicio >= ?1
               AND r.data_inicio < ?2
               AND (?3 IS NULL OR r.id_tecnico = ?3)
             ORDER BY r.data_inicio ASC, r.id ASC;",
        )?;
        let mut rows = stmt.query(params![
            start_ms,
            end_ms,
            technician.map(|id| id.to_string())
        ])?;

        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let order_text: String = row.get("id_os")?;
            let technician_text: String = row.get("id_tecnico")?;
            let reservation = Reservation {
                id: parse_uuid(&id_text, "reservations.id")?,
                id_os: parse_uuid(&order_text, "reservations.id_os")?,
                id_tecnico: parse_uuid(&technician_text, "reservations.id_tecnico")?,
                titulo: row.get("titulo")?,
                descricao: row.get("descricao")?,
                data_inicio: row.get("data_inicio")?,
                data_fim: row.get("data_fim")?,
            };
            reservation.validate()?;
            views.push(ReservationView {
                reservation,
                order_numero: row.get("order_numero")?,
                technician_nome: row.get("technician_nome")?,
            });
        }

        Ok(views)
    }

    fn delete_reservation(&self, id: ReservationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reservations WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "reservation",
                id,
            });
        }
        Ok(())
    }
}
