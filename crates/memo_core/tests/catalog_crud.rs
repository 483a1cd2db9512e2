mod common;

use common::{open_order, setup};
use memo_core::model::customer::{Customer, CustomerStatus};
use memo_core::model::product::Product;
use memo_core::model::user::UserProfile;
use memo_core::repo::customer_repo::SqliteCustomerRepository;
use memo_core::repo::product_repo::SqliteProductRepository;
use memo_core::repo::user_repo::SqliteUserRepository;
use memo_core::service::customer_service::CustomerService;
use memo_core::service::product_service::ProductService;
use memo_core::service::user_service::UserService;
use memo_core::{Confirmation, Role, ServiceError};

#[test]
fn customer_search_matches_legal_name_and_email() {
    let fixture = setup();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&fixture.conn).unwrap());

    let mut customer = Customer::new("Sítio Esperança");
    customer.email = Some("contato@esperanca.test".to_string());
    customer.status = CustomerStatus::Inactive;
    service.create_customer(&fixture.admin, &customer).unwrap();

    let by_legal_name = service.list_customers(Some("AGRO")).unwrap();
    assert_eq!(by_legal_name.len(), 1);
    assert_eq!(by_legal_name[0].id, fixture.customer_id);

    let by_email = service.list_customers(Some("esperanca.test")).unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].nome, "Sítio Esperança");

    assert_eq!(service.list_customers(None).unwrap().len(), 2);
    let active = service.list_active_customers().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, fixture.customer_id);
}

#[test]
fn customer_writes_are_admin_only() {
    let fixture = setup();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&fixture.conn).unwrap());

    let customer = Customer::new("Fazenda Nova");
    assert!(matches!(
        service.create_customer(&fixture.operator, &customer),
        Err(ServiceError::Forbidden { .. })
    ));

    let mut existing = service.get_customer(fixture.customer_id).unwrap();
    existing.cidade = Some("Rio Verde".to_string());
    assert!(matches!(
        service.update_customer(&fixture.operator, &existing),
        Err(ServiceError::Forbidden { .. })
    ));
    service.update_customer(&fixture.admin, &existing).unwrap();
    assert_eq!(
        service.get_customer(fixture.customer_id).unwrap().cidade.as_deref(),
        Some("Rio Verde")
    );
}

#[test]
fn customer_delete_needs_confirmation_and_no_orders() {
    let fixture = setup();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&fixture.conn).unwrap());

    let spare = Customer::new("Fazenda Nova");
    service.create_customer(&fixture.admin, &spare).unwrap();
    assert!(matches!(
        service.delete_customer(&fixture.admin, spare.id, Confirmation::default()),
        Err(ServiceError::ConfirmationRequired { .. })
    ));
    service
        .delete_customer(&fixture.admin, spare.id, Confirmation::Confirmed)
        .unwrap();
    assert!(matches!(
        service.get_customer(spare.id),
        Err(ServiceError::NotFound { entity: "customer", .. })
    ));

    open_order(&fixture);
    let referenced =
        service.delete_customer(&fixture.admin, fixture.customer_id, Confirmation::Confirmed);
    assert!(matches!(referenced, Err(ServiceError::InvalidState(_))));
}

#[test]
fn product_codes_are_unique() {
    let fixture = setup();
    let service = ProductService::new(SqliteProductRepository::try_new(&fixture.conn).unwrap());

    let duplicate = Product::new("P-100", "Outra bomba");
    let result = service.create_product(&fixture.admin, &duplicate);
    assert!(matches!(result, Err(ServiceError::Repo(err)) if err.is_duplicate()));

    let valve = Product::new("V-200", "Válvula de alívio");
    service.create_product(&fixture.admin, &valve).unwrap();
    let found = service.list_products(Some("válvula")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].codigo, "V-200");
}

#[test]
fn product_writes_are_admin_only() {
    let fixture = setup();
    let service = ProductService::new(SqliteProductRepository::try_new(&fixture.conn).unwrap());

    assert!(matches!(
        service.create_product(&fixture.operator, &Product::new("X-1", "Filtro")),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        service.delete_product(&fixture.operator, fixture.product_id, Confirmation::Confirmed),
        Err(ServiceError::Forbidden { .. })
    ));
    service
        .delete_product(&fixture.admin, fixture.product_id, Confirmation::Confirmed)
        .unwrap();
    assert!(service.list_products(None).unwrap().is_empty());
}

#[test]
fn sessions_resolve_from_stored_roles() {
    let fixture = setup();
    let service = UserService::new(SqliteUserRepository::try_new(&fixture.conn).unwrap());

    let session = service.session_for_email("BRUNO@memo.test").unwrap();
    assert_eq!(session.user_id, fixture.operator.user_id);
    assert_eq!(session.role, Role::Operator);
    assert!(matches!(
        service.session_for_email("nobody@memo.test"),
        Err(ServiceError::NotFound { .. }) | Err(ServiceError::InvalidState(_))
    ));

    let technicians = service.list_technicians().unwrap();
    assert!(technicians.len() >= 2);
    assert!(matches!(
        service.list_users(&fixture.operator),
        Err(ServiceError::Forbidden { .. })
    ));
    assert_eq!(service.list_users(&fixture.admin).unwrap().len(), 3);
}

#[test]
fn admins_cannot_demote_or_delete_themselves() {
    let fixture = setup();
    let service = UserService::new(SqliteUserRepository::try_new(&fixture.conn).unwrap());

    assert!(matches!(
        service.change_role(&fixture.admin, fixture.admin.user_id, Role::Operator),
        Err(ServiceError::InvalidState(_))
    ));
    assert!(matches!(
        service.delete_user(&fixture.admin, fixture.admin.user_id, Confirmation::Confirmed),
        Err(ServiceError::InvalidState(_))
    ));

    service
        .change_role(&fixture.admin, fixture.other_operator.user_id, Role::Admin)
        .unwrap();
    assert_eq!(
        service.get_user(fixture.other_operator.user_id).unwrap().role,
        Role::Admin
    );
}

#[test]
fn user_lifecycle() {
    let fixture = setup();
    let service = UserService::new(SqliteUserRepository::try_new(&fixture.conn).unwrap());

    let user = UserProfile::new("Diego Campo", "diego@memo.test", Role::Operator);
    service.create_user(&fixture.admin, &user).unwrap();

    let clash = UserProfile::new("Diego Dois", "DIEGO@memo.test", Role::Operator);
    assert!(matches!(
        service.create_user(&fixture.admin, &clash),
        Err(ServiceError::Repo(err)) if err.is_duplicate()
    ));

    service
        .delete_user(&fixture.admin, user.id, Confirmation::Confirmed)
        .unwrap();
    assert!(matches!(
        service.get_user(user.id),
        Err(ServiceError::NotFound { entity: "user", .. })
    ));
}
