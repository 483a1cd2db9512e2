mod common;

use chrono::NaiveDate;
use common::{open_order, setup, Fixture};
use memo_core::model::validation::ValidationError;
use memo_core::repo::schedule_repo::SqliteScheduleRepository;
use memo_core::service::schedule_service::{day_bounds_ms, NewReservation, ScheduleService};
use memo_core::{Confirmation, ServiceError};

const HOUR_MS: i64 = 60 * 60 * 1000;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

fn reservation(fixture: &Fixture, titulo: &str, start_hour: i64) -> NewReservation {
    let (day_start, _) = day_bounds_ms(day());
    NewReservation {
        id_os: Some(open_order(fixture).id),
        id_tecnico: Some(fixture.operator.user_id),
        titulo: titulo.to_string(),
        descricao: None,
        data_inicio: Some(day_start + start_hour * HOUR_MS),
        data_fim: Some(day_start + (start_hour + 2) * HOUR_MS),
    }
}

#[test]
fn day_view_is_ordered_and_bounded() {
    let fixture = setup();
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&fixture.conn).unwrap());

    let afternoon = service
        .create_reservation(&fixture.admin, reservation(&fixture, "Revisão", 14))
        .unwrap();
    let morning = service
        .create_reservation(&fixture.admin, reservation(&fixture, "Instalação", 8))
        .unwrap();
    service
        .create_reservation(&fixture.admin, reservation(&fixture, "Amanhã", 24))
        .unwrap();

    let views = service.reservations_for_day(&fixture.admin, day()).unwrap();
    let ids: Vec<_> = views.iter().map(|view| view.reservation.id).collect();
    assert_eq!(ids, vec![morning.id, afternoon.id]);
    assert_eq!(views[0].technician_nome, "Bruno Técnico");
    assert!(!views[0].order_numero.is_empty());
}

#[test]
fn operators_see_only_their_reservations() {
    let fixture = setup();
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&fixture.conn).unwrap());
    service
        .create_reservation(&fixture.admin, reservation(&fixture, "Revisão", 9))
        .unwrap();

    assert_eq!(
        service
            .reservations_for_day(&fixture.operator, day())
            .unwrap()
            .len(),
        1
    );
    assert!(service
        .reservations_for_day(&fixture.other_operator, day())
        .unwrap()
        .is_empty());
}

#[test]
fn reservation_form_requires_order_technician_and_interval() {
    let fixture = setup();
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&fixture.conn).unwrap());

    let mut missing_order = reservation(&fixture, "Revisão", 9);
    missing_order.id_os = None;
    assert!(matches!(
        service.create_reservation(&fixture.admin, missing_order),
        Err(ServiceError::Validation(ValidationError::MissingField("id_os")))
    ));

    let mut inverted = reservation(&fixture, "Revisão", 9);
    inverted.data_fim = inverted.data_inicio;
    assert!(matches!(
        service.create_reservation(&fixture.admin, inverted),
        Err(ServiceError::Validation(ValidationError::InvalidInterval { .. }))
    ));

    assert!(matches!(
        service.create_reservation(&fixture.operator, reservation(&fixture, "Revisão", 9)),
        Err(ServiceError::Forbidden { .. })
    ));
}

#[test]
fn delete_requires_confirmation() {
    let fixture = setup();
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&fixture.conn).unwrap());
    let created = service
        .create_reservation(&fixture.admin, reservation(&fixture, "Revisão", 9))
        .unwrap();

    assert!(matches!(
        service.delete_reservation(&fixture.admin, created.id, Confirmation::Unconfirmed),
        Err(ServiceError::ConfirmationRequired { .. })
    ));
    service
        .delete_reservation(&fixture.admin, created.id, Confirmation::Confirmed)
        .unwrap();
    assert!(service
        .reservations_for_day(&fixture.admin, day())
        .unwrap()
        .is_empty());
}
