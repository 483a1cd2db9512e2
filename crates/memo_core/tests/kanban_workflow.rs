mod common;

use common::{advance_to, kanban, open_order, order_service, setup};
use memo_core::repo::order_repo::{OrderRepository, SqliteOrderRepository};
use memo_core::service::workflow::{MoveOutcome, UNASSIGNED_LABEL};
use memo_core::{OrderStatus, ServiceError};

#[test]
fn only_the_next_column_is_accepted_for_every_pair() {
    let fixture = setup();
    let board = kanban(&fixture.conn);
    let repo = SqliteOrderRepository::try_new(&fixture.conn).unwrap();

    for source in OrderStatus::ALL {
        for destination in OrderStatus::ALL {
            if source == destination {
                continue;
            }
            let order = open_order(&fixture);
            advance_to(&fixture, &order, source);
            let log_before = repo.list_status_changes(order.id).unwrap().len();

            let result = board.move_order(&fixture.admin, order.id, source, destination);
            let stored = repo.get_order(order.id).unwrap().unwrap();
            let log_after = repo.list_status_changes(order.id).unwrap().len();

            if destination.index() == source.index() + 1 {
                assert_eq!(
                    result.unwrap(),
                    MoveOutcome::Moved {
                        from: source,
                        to: destination
                    }
                );
                assert_eq!(stored.status, destination);
                assert_eq!(log_after, log_before + 1);
            } else {
                assert!(
                    matches!(result, Err(ServiceError::InvalidTransition { .. })),
                    "{} -> {} should be rejected",
                    source.as_str(),
                    destination.as_str()
                );
                assert_eq!(stored.status, source);
                assert_eq!(log_after, log_before);
            }
        }
    }
}

#[test]
fn same_column_drop_is_a_no_op() {
    let fixture = setup();
    let order = open_order(&fixture);
    let outcome = kanban(&fixture.conn)
        .move_order(&fixture.admin, order.id, OrderStatus::Open, OrderStatus::Open)
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Unchanged);
}

#[test]
fn move_from_stale_column_is_rejected() {
    let fixture = setup();
    let order = open_order(&fixture);
    advance_to(&fixture, &order, OrderStatus::Assigned);

    let result = kanban(&fixture.conn).move_order(
        &fixture.admin,
        order.id,
        OrderStatus::Open,
        OrderStatus::Assigned,
    );
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
}

#[test]
fn audit_log_records_previous_and_new_status() {
    let fixture = setup();
    let order = open_order(&fixture);
    advance_to(&fixture, &order, OrderStatus::InDiagnosis);

    let changes = SqliteOrderRepository::try_new(&fixture.conn)
        .unwrap()
        .list_status_changes(order.id)
        .unwrap();
    let pairs: Vec<_> = changes
        .iter()
        .map(|change| (change.status_anterior, change.status_novo))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (None, OrderStatus::Open),
            (Some(OrderStatus::Open), OrderStatus::Assigned),
            (Some(OrderStatus::Assigned), OrderStatus::InDiagnosis),
        ]
    );
    assert!(changes[1..]
        .iter()
        .all(|change| change.changed_by == Some(fixture.admin.user_id)));
}

#[test]
fn execution_window_is_stamped_on_entry_and_finish() {
    let fixture = setup();
    let order = open_order(&fixture);
    advance_to(&fixture, &order, OrderStatus::AwaitingParts);

    let service = order_service(&fixture.conn);
    let before = service.get_order(&fixture.admin, order.id).unwrap();
    assert_eq!(before.data_inicio_execucao, None);

    advance_to(&fixture, &before, OrderStatus::InExecution);
    let running = service.get_order(&fixture.admin, order.id).unwrap();
    assert!(running.data_inicio_execucao.is_some());
    assert_eq!(running.data_fim_execucao, None);

    advance_to(&fixture, &running, OrderStatus::Finalized);
    let done = service.get_order(&fixture.admin, order.id).unwrap();
    assert_eq!(done.data_inicio_execucao, running.data_inicio_execucao);
    assert!(done.data_fim_execucao >= done.data_inicio_execucao);
}

#[test]
fn operators_see_and_move_only_their_orders() {
    let fixture = setup();
    let mine = open_order(&fixture);
    let board = kanban(&fixture.conn);

    let columns = board.board(&fixture.other_operator).unwrap();
    assert_eq!(columns.len(), 7);
    assert!(columns.iter().all(|column| column.cards.is_empty()));

    let result = board.move_order(
        &fixture.other_operator,
        mine.id,
        OrderStatus::Open,
        OrderStatus::Assigned,
    );
    assert!(matches!(result, Err(ServiceError::Forbidden { .. })));

    board
        .move_order(&fixture.operator, mine.id, OrderStatus::Open, OrderStatus::Assigned)
        .unwrap();
    let columns = board.board(&fixture.operator).unwrap();
    assert_eq!(columns[OrderStatus::Assigned.index()].cards.len(), 1);
}

#[test]
fn operator_can_drag_own_order_past_approval_without_terms() {
    let fixture = setup();
    let order = open_order(&fixture);
    advance_to(&fixture, &order, OrderStatus::AwaitingApproval);

    let outcome = kanban(&fixture.conn)
        .move_order(
            &fixture.operator,
            order.id,
            OrderStatus::AwaitingApproval,
            OrderStatus::AwaitingParts,
        )
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { .. }));

    let moved = order_service(&fixture.conn)
        .get_order(&fixture.operator, order.id)
        .unwrap();
    assert_eq!(moved.status, OrderStatus::AwaitingParts);
    assert!(moved.condicao_pagamento.is_none());
}

#[test]
fn board_cards_carry_display_fields() {
    let fixture = setup();
    let assigned = open_order(&fixture);
    let service = order_service(&fixture.conn);
    let unassigned = service
        .assign_technician(&fixture.admin, open_order(&fixture).id, None)
        .unwrap();

    let columns = kanban(&fixture.conn).board(&fixture.admin).unwrap();
    let open_cards = &columns[0].cards;
    assert_eq!(columns[0].label(), OrderStatus::Open.label());
    assert_eq!(open_cards.len(), 2);

    let card = open_cards
        .iter()
        .find(|card| card.order_id == assigned.id)
        .unwrap();
    assert_eq!(card.customer_name, "Boa Vista Agro LTDA");
    assert_eq!(card.technician_name, "Bruno Técnico");

    let card = open_cards
        .iter()
        .find(|card| card.order_id == unassigned.id)
        .unwrap();
    assert_eq!(card.technician_name, UNASSIGNED_LABEL);
}
