//! Technician agenda use-case service.
//!
//! # Invariants
//! - Only admins create or delete reservations.
//! - A day view covers `[00:00, 24:00)` UTC and is ordered by start.

use crate::model::order::OrderId;
use crate::model::schedule::{Reservation, ReservationId};
use crate::model::session::Session;
use crate::model::user::UserId;
use crate::model::validation::{non_blank, ValidationError};
use crate::repo::schedule_repo::{ReservationView, ScheduleRepository};
use crate::service::access::require_admin;
use crate::service::{Confirmation, ServiceResult};
use chrono::{Days, NaiveDate, NaiveTime};
use log::info;

/// Agenda form input; every field except `descricao` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReservation {
    pub id_os: Option<OrderId>,
    pub id_tecnico: Option<UserId>,
    pub titulo: String,
    pub descricao: Option<String>,
    /// Epoch milliseconds.
    pub data_inicio: Option<i64>,
    /// Epoch milliseconds.
    pub data_fim: Option<i64>,
}

impl NewReservation {
    fn into_reservation(self) -> Result<Reservation, ValidationError> {
        let id_os = self.id_os.ok_or(ValidationError::MissingField("id_os"))?;
        let id_tecnico = self
            .id_tecnico
            .ok_or(ValidationError::MissingField("id_tecnico"))?;
        let data_inicio = self
            .data_inicio
            .ok_or(ValidationError::MissingField("data_inicio"))?;
        let data_fim = self
            .data_fim
            .ok_or(ValidationError::MissingField("data_fim"))?;

        let mut reservation =
            Reservation::new(id_os, id_tecnico, self.titulo.trim(), data_inicio, data_fim);
        reservation.descricao = non_blank(self.descricao.as_deref());
        reservation.validate()?;
        Ok(reservation)
    }
}

pub struct ScheduleService<S: ScheduleRepository> {
    repo: S,
}

impl<S: ScheduleRepository> ScheduleService<S> {
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    pub fn create_reservation(
        &self,
        session: &Session,
        request: NewReservation,
    ) -> ServiceResult<Reservation> {
        require_admin(session, "schedule technician")?;

        let reservation = request.into_reservation()?;
        self.repo.create_reservation(&reservation)?;
        info!(
            "event=reservation_create module=service status=ok reservation_id={} order_id={} technician_id={}",
            reservation.id, reservation.id_os, reservation.id_tecnico
        );
        Ok(reservation)
    }

    /// Reservations starting on `day`; operators see only their own.
    pub fn reservations_for_day(
        &self,
        session: &Session,
        day: NaiveDate,
    ) -> ServiceResult<Vec<ReservationView>> {
        let (start, end) = day_bounds_ms(day);
        Ok(self
            .repo
            .list_reservations_between(start, end, session.technician_scope())?)
    }

    pub fn delete_reservation(
        &self,
        session: &Session,
        id: ReservationId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete reservation")?;
        confirmation.require("delete reservation")?;

        self.repo.delete_reservation(id)?;
        info!("event=reservation_delete module=service status=ok reservation_id={id}");
        Ok(())
    }
}

/// Epoch-millisecond bounds of one UTC day.
pub fn day_bounds_ms(day: NaiveDate) -> (i64, i64) {
    let start = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    let end = day
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
        .unwrap_or(i64::MAX);
    (start, end)
}
