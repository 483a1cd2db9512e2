#![allow(dead_code)]

use memo_core::db::open_db_in_memory;
use memo_core::model::customer::{Customer, CustomerId};
use memo_core::model::order::ServiceOrder;
use memo_core::model::product::{Product, ProductId};
use memo_core::model::user::UserProfile;
use memo_core::repo::customer_repo::{CustomerRepository, SqliteCustomerRepository};
use memo_core::repo::order_repo::SqliteOrderRepository;
use memo_core::repo::product_repo::{ProductRepository, SqliteProductRepository};
use memo_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use memo_core::service::order_service::{NewServiceOrder, OrderService};
use memo_core::service::workflow::KanbanService;
use memo_core::{OrderStatus, Role, Session};
use rusqlite::Connection;

pub struct Fixture {
    pub conn: Connection,
    pub admin: Session,
    pub operator: Session,
    pub other_operator: Session,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
}

fn register(conn: &Connection, nome: &str, email: &str, role: Role) -> Session {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let user = UserProfile::new(nome, email, role);
    repo.create_user(&user).unwrap();
    Session::new(user.id, role, nome)
}

pub fn setup() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let admin = register(&conn, "Ana Admin", "ana@memo.test", Role::Admin);
    let operator = register(&conn, "Bruno Técnico", "bruno@memo.test", Role::Operator);
    let other_operator = register(&conn, "Carla Técnica", "carla@memo.test", Role::Operator);

    let mut customer = Customer::new("Fazenda Boa Vista");
    customer.razao_social = Some("Boa Vista Agro LTDA".to_string());
    customer.id_dinamics = Some("CLI-001".to_string());
    SqliteCustomerRepository::try_new(&conn)
        .unwrap()
        .create_customer(&customer)
        .unwrap();

    let product = Product::new("P-100", "Bomba hidráulica");
    SqliteProductRepository::try_new(&conn)
        .unwrap()
        .create_product(&product)
        .unwrap();

    Fixture {
        conn,
        admin,
        operator,
        other_operator,
        customer_id: customer.id,
        product_id: product.id,
    }
}

pub fn order_service(
    conn: &Connection,
) -> OrderService<SqliteOrderRepository<'_>, SqliteProductRepository<'_>> {
    OrderService::new(
        SqliteOrderRepository::try_new(conn).unwrap(),
        SqliteProductRepository::try_new(conn).unwrap(),
    )
}

pub fn kanban(conn: &Connection) -> KanbanService<SqliteOrderRepository<'_>> {
    KanbanService::new(SqliteOrderRepository::try_new(conn).unwrap())
}

/// Opens an order assigned to the fixture operator.
pub fn open_order(fixture: &Fixture) -> ServiceOrder {
    order_service(&fixture.conn)
        .create_order(
            &fixture.admin,
            NewServiceOrder {
                id_cliente: fixture.customer_id,
                id_tecnico_principal: Some(fixture.operator.user_id),
                ..NewServiceOrder::default()
            },
        )
        .unwrap()
}

/// Walks `order` one column at a time until it reaches `target`.
pub fn advance_to(fixture: &Fixture, order: &ServiceOrder, target: OrderStatus) {
    let board = kanban(&fixture.conn);
    let mut current = order.status;
    while current != target {
        let next = current.next().unwrap();
        board
            .move_order(&fixture.admin, order.id, current, next)
            .unwrap();
        current = next;
    }
}
