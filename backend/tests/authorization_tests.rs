//! Authorization tests
//!
//! - The role capability table, cell by cell
//! - Forbidden requests through the services never touch the ledger or audit trail

mod common;

use common::{actor, at, Harness};
use inventory_server::error::AppError;
use proptest::prelude::*;
use shared::{Action, Direction, ReportFilter, ReportTab, Resource, Role};

const RESOURCES: [Resource; 11] = [
    Resource::Dashboard,
    Resource::Profile,
    Resource::User,
    Resource::AuditLog,
    Resource::Settings,
    Resource::Brand,
    Resource::Category,
    Resource::Product,
    Resource::StockIn,
    Resource::StockOut,
    Resource::Report,
];

const ACTIONS: [Action; 5] = [
    Action::View,
    Action::Create,
    Action::Edit,
    Action::Delete,
    Action::Export,
];

/// The expected table, written out longhand.
fn expected(role: Role, resource: Resource, action: Action) -> bool {
    use Role::*;
    match resource {
        Resource::Dashboard => action == Action::View,
        Resource::Profile => matches!(action, Action::View | Action::Edit),
        Resource::User | Resource::AuditLog | Resource::Settings => role == Admin,
        Resource::Brand | Resource::Category => matches!(role, Admin | Staff),
        Resource::Product | Resource::StockIn => matches!(role, Admin | Staff | WarehouseManager),
        Resource::StockOut => match action {
            Action::Delete => role != Cashier,
            _ => true,
        },
        Resource::Report => {
            matches!(action, Action::View | Action::Export) && matches!(role, Admin | Staff)
        }
    }
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn resource_strategy() -> impl Strategy<Value = Resource> {
    prop::sample::select(RESOURCES.to_vec())
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop::sample::select(ACTIONS.to_vec())
}

#[test]
fn test_capability_table() {
    for role in Role::ALL {
        for resource in RESOURCES {
            for action in ACTIONS {
                assert_eq!(
                    role.can(resource, action),
                    expected(role, resource, action),
                    "{:?} {:?} {:?}",
                    role,
                    resource,
                    action
                );
            }
        }
    }
}

#[test]
fn test_admin_limits() {
    for resource in RESOURCES {
        for action in ACTIONS {
            let read_only = match resource {
                Resource::Dashboard => action != Action::View,
                Resource::Profile => !matches!(action, Action::View | Action::Edit),
                Resource::Report => !matches!(action, Action::View | Action::Export),
                _ => false,
            };
            assert_eq!(Role::Admin.can(resource, action), !read_only, "{:?} {:?}", resource, action);
        }
    }
}

#[test]
fn test_warehouse_staff_only_dispatches() {
    let role = Role::WarehouseStaff;
    assert!(role.can(Resource::StockOut, Action::Delete));
    assert!(!role.can(Resource::StockIn, Action::View));
    assert!(!role.can(Resource::Product, Action::View));
    assert!(!role.can(Resource::Report, Action::View));
}

proptest! {
    /// Authorize agrees with the table and names the refused operation.
    #[test]
    fn prop_authorize_matches_table(
        role in role_strategy(),
        resource in resource_strategy(),
        action in action_strategy(),
    ) {
        let user = actor(role);
        match user.authorize(resource, action) {
            Ok(()) => prop_assert!(role.can(resource, action)),
            Err(err) => {
                prop_assert!(!role.can(resource, action));
                let message = err.to_string();
                prop_assert!(message.contains(resource.as_str()));
                prop_assert!(message.contains(action.as_str()));
            }
        }
    }

    /// A refused stock movement leaves no trace.
    #[test]
    fn prop_refused_movement_has_no_side_effects(
        role in role_strategy(),
        inbound in any::<bool>(),
        quantity in 1i32..50,
    ) {
        let direction = if inbound { Direction::In } else { Direction::Out };
        let resource = if inbound { Resource::StockIn } else { Resource::StockOut };

        tokio_test::block_on(async {
            let h = Harness::new();
            let p = h.add_product("widget", "10", Some("12"));
            let user = actor(role);

            let result = h
                .ledger
                .record(&user, direction, common::input(p.id, quantity, Some(at(2024, 6, 1))))
                .await;

            if role.can(resource, Action::Create) {
                prop_assert!(result.is_ok());
                prop_assert_eq!(h.store.movement_count(direction).unwrap(), 1);
                prop_assert_eq!(h.audit.events().len(), 1);
            } else {
                prop_assert!(matches!(result, Err(AppError::Forbidden(_))));
                prop_assert_eq!(h.store.movement_count(direction).unwrap(), 0);
                prop_assert!(h.audit.events().is_empty());
            }
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_report_access_follows_table() {
    let h = Harness::new();
    for role in Role::ALL {
        let result = h
            .reports
            .build(&actor(role), ReportTab::Inventory, &ReportFilter::default(), Some(1))
            .await;
        if role.can(Resource::Report, Action::View) {
            assert!(result.is_ok(), "{:?}", role);
        } else {
            assert!(matches!(result, Err(AppError::Forbidden(_))), "{:?}", role);
        }
    }
}

#[tokio::test]
async fn test_valuation_requires_product_view() {
    let h = Harness::new();
    let p = h.add_product("widget", "10", None);

    assert!(h.valuation.product_valuation(&actor(Role::Staff), p.id).await.is_ok());
    assert!(matches!(
        h.valuation.product_valuation(&actor(Role::Cashier), p.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.valuation.inventory_valuation(&actor(Role::WarehouseStaff)).await,
        Err(AppError::Forbidden(_))
    ));
}
