mod common;

use chrono::{Datelike, Utc};
use common::{order_service, setup, Fixture};
use memo_core::model::classification::{Origin, Priority, WarrantyStatus};
use memo_core::model::occurrence::OccurrenceStatus;
use memo_core::repo::occurrence_repo::{OccurrenceListQuery, SqliteOccurrenceRepository};
use memo_core::repo::order_repo::SqliteOrderRepository;
use memo_core::service::occurrence_service::{NewOccurrence, OccurrenceService};
use memo_core::{OrderStatus, ServiceError};
use rusqlite::{params, Connection};

fn service(
    conn: &Connection,
) -> OccurrenceService<SqliteOccurrenceRepository<'_>, SqliteOrderRepository<'_>> {
    OccurrenceService::new(
        SqliteOccurrenceRepository::try_new(conn).unwrap(),
        SqliteOrderRepository::try_new(conn).unwrap(),
    )
}

fn request(fixture: &Fixture, titulo: &str) -> NewOccurrence {
    NewOccurrence {
        id_cliente: fixture.customer_id,
        titulo: titulo.to_string(),
        prioridade: Priority::High,
        origem: Origin::Field,
        situacao_garantia: WarrantyStatus::UnderWarranty,
        contato_cliente: Some("  ".to_string()),
        ..NewOccurrence::default()
    }
}

#[test]
fn occurrences_are_numbered_per_year() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let year = Utc::now().year();

    let first = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    let second = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Vazamento"))
        .unwrap();

    assert_eq!(first.numero, format!("OC-{year}-0001"));
    assert_eq!(second.numero, format!("OC-{year}-0002"));
    assert_eq!(first.created_by, Some(fixture.operator.user_id));
    assert_eq!(first.contato_cliente, None);
    assert_eq!(first.status, OccurrenceStatus::Open);
}

#[test]
fn blank_title_is_rejected() {
    let fixture = setup();
    let result = service(&fixture.conn).create_occurrence(&fixture.admin, request(&fixture, "   "));
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test]
fn conversion_creates_linked_open_order() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();

    let order = occurrences
        .convert_to_order(&fixture.admin, occurrence.id)
        .unwrap();
    assert_eq!(order.numero, format!("{}-001", Utc::now().year()));

    let stored = order_service(&fixture.conn)
        .get_order(&fixture.admin, order.id)
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Open);
    assert_eq!(stored.id_cliente, fixture.customer_id);
    assert_eq!(stored.id_ocorrencia, Some(occurrence.id));
    assert_eq!(stored.origem, Origin::Field);
    assert_eq!(stored.situacao_garantia, WarrantyStatus::UnderWarranty);
    assert_eq!(stored.prioridade, Some(Priority::High));
    assert_eq!(stored.created_by, Some(fixture.admin.user_id));

    let converted = occurrences
        .get_occurrence(&fixture.admin, occurrence.id)
        .unwrap();
    assert!(converted.convertida_em_os);
    assert_eq!(converted.status, OccurrenceStatus::Converted);
    assert_eq!(converted.id_os_gerada, Some(order.id));

    let listed = occurrences
        .list_occurrences(&fixture.admin, &OccurrenceListQuery::default())
        .unwrap();
    assert_eq!(listed[0].order_numero.as_deref(), Some(order.numero.as_str()));
    assert_eq!(listed[0].order_status, Some(OrderStatus::Open));
}

#[test]
fn second_conversion_is_rejected_without_a_second_order() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    occurrences
        .convert_to_order(&fixture.admin, occurrence.id)
        .unwrap();

    let again = occurrences.convert_to_order(&fixture.admin, occurrence.id);
    assert!(matches!(again, Err(ServiceError::AlreadyConverted(id)) if id == occurrence.id));

    let orders: i64 = fixture
        .conn
        .query_row(
            "SELECT COUNT(*) FROM service_orders WHERE id_ocorrencia = ?1;",
            params![occurrence.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orders, 1);
}

#[test]
fn converted_occurrence_status_is_frozen() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    occurrences
        .convert_to_order(&fixture.admin, occurrence.id)
        .unwrap();

    let result = occurrences.set_occurrence_status(
        &fixture.admin,
        occurrence.id,
        OccurrenceStatus::Cancelled,
    );
    assert!(matches!(result, Err(ServiceError::AlreadyConverted(_))));

    let manual = occurrences.set_occurrence_status(
        &fixture.admin,
        occurrence.id,
        OccurrenceStatus::Converted,
    );
    assert!(matches!(manual, Err(ServiceError::InvalidState(_))));
}

#[test]
fn storage_refuses_to_revert_conversion() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    occurrences
        .convert_to_order(&fixture.admin, occurrence.id)
        .unwrap();

    let revert = fixture.conn.execute(
        "UPDATE occurrences SET convertida_em_os = 0 WHERE id = ?1;",
        params![occurrence.id.to_string()],
    );
    assert!(revert.is_err());
}

#[test]
fn cancelled_occurrence_cannot_be_converted() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    occurrences
        .set_occurrence_status(&fixture.operator, occurrence.id, OccurrenceStatus::Cancelled)
        .unwrap();

    let result = occurrences.convert_to_order(&fixture.admin, occurrence.id);
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
}

#[test]
fn operators_cannot_convert() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let occurrence = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();

    let result = occurrences.convert_to_order(&fixture.operator, occurrence.id);
    assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    assert!(!occurrences
        .get_occurrence(&fixture.admin, occurrence.id)
        .unwrap()
        .convertida_em_os);
}

#[test]
fn listing_filters_by_status_and_search() {
    let fixture = setup();
    let occurrences = service(&fixture.conn);
    let pump = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Bomba travada"))
        .unwrap();
    let leak = occurrences
        .create_occurrence(&fixture.operator, request(&fixture, "Vazamento na válvula"))
        .unwrap();
    occurrences
        .set_occurrence_status(&fixture.admin, leak.id, OccurrenceStatus::UnderAnalysis)
        .unwrap();

    let analysing = occurrences
        .list_occurrences(
            &fixture.admin,
            &OccurrenceListQuery {
                status: Some(OccurrenceStatus::UnderAnalysis),
                search: None,
            },
        )
        .unwrap();
    assert_eq!(analysing.len(), 1);
    assert_eq!(analysing[0].occurrence.id, leak.id);

    let by_title = occurrences
        .list_occurrences(
            &fixture.admin,
            &OccurrenceListQuery {
                status: None,
                search: Some("VÁLVULA".to_string()),
            },
        )
        .unwrap();
    assert_eq!(by_title.len(), 1);

    let by_customer = occurrences
        .list_occurrences(
            &fixture.admin,
            &OccurrenceListQuery {
                status: None,
                search: Some("boa vista".to_string()),
            },
        )
        .unwrap();
    assert_eq!(by_customer.len(), 2);

    let by_number = occurrences
        .list_occurrences(
            &fixture.admin,
            &OccurrenceListQuery {
                status: None,
                search: Some(pump.numero.clone()),
            },
        )
        .unwrap();
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_number[0].occurrence.id, pump.id);
}
