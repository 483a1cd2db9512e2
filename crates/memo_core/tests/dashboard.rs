mod common;

use chrono::NaiveDate;
use common::{advance_to, open_order, order_service, setup};
use memo_core::repo::order_repo::SqliteOrderRepository;
use memo_core::repo::user_repo::SqliteUserRepository;
use memo_core::service::dashboard_service::{DashboardService, DashboardStats};
use memo_core::service::order_service::NewServiceOrder;
use memo_core::OrderStatus;
use rusqlite::Connection;

fn dashboard(
    conn: &Connection,
) -> DashboardService<SqliteOrderRepository<'_>, SqliteUserRepository<'_>> {
    DashboardService::new(
        SqliteOrderRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn counters_cover_progress_and_overdue_orders() {
    let fixture = setup();
    let service = order_service(&fixture.conn);
    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    let last_week = NaiveDate::from_ymd_opt(2026, 3, 3);

    let diagnosing = open_order(&fixture);
    advance_to(&fixture, &diagnosing, OrderStatus::InDiagnosis);
    service
        .set_deadline(&fixture.admin, diagnosing.id, last_week)
        .unwrap();

    let finished = open_order(&fixture);
    service
        .set_deadline(&fixture.admin, finished.id, last_week)
        .unwrap();
    advance_to(&fixture, &finished, OrderStatus::Finalized);

    service
        .create_order(
            &fixture.admin,
            NewServiceOrder {
                id_cliente: fixture.customer_id,
                id_tecnico_principal: Some(fixture.other_operator.user_id),
                prazo: NaiveDate::from_ymd_opt(2026, 3, 20),
                ..NewServiceOrder::default()
            },
        )
        .unwrap();

    let board = dashboard(&fixture.conn);
    assert_eq!(
        board.stats(&fixture.admin, today).unwrap(),
        DashboardStats {
            total_orders: 3,
            in_progress: 1,
            overdue: 1,
            technicians: 2,
        }
    );
    assert_eq!(
        board.stats(&fixture.operator, today).unwrap(),
        DashboardStats {
            total_orders: 2,
            in_progress: 1,
            overdue: 1,
            technicians: 0,
        }
    );
}

#[test]
fn recent_orders_are_newest_first_and_limited() {
    let fixture = setup();
    open_order(&fixture);
    open_order(&fixture);
    let newest = open_order(&fixture);

    let recent = dashboard(&fixture.conn)
        .recent_orders(&fixture.admin, 2)
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].order.id, newest.id);
    assert_eq!(recent[0].customer_display_name(), "Boa Vista Agro LTDA");
}

#[test]
fn recent_orders_follow_creation_order_past_number_width() {
    let fixture = setup();
    let service = order_service(&fixture.conn);
    let create = |numero: &str| {
        service
            .create_order(
                &fixture.admin,
                NewServiceOrder {
                    numero: Some(numero.to_string()),
                    id_cliente: fixture.customer_id,
                    ..NewServiceOrder::default()
                },
            )
            .unwrap()
    };
    create("2026-999");
    let later = create("2026-1000");

    let recent = dashboard(&fixture.conn)
        .recent_orders(&fixture.admin, 1)
        .unwrap();
    assert_eq!(recent[0].order.numero, later.numero);
}
