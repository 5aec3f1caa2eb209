//! Stock ledger tests
//!
//! Exercises the ledger service against the in-memory store:
//! - Every movement has exactly one price snapshot
//! - Snapshot prices survive later product price edits
//! - Snapshot quantity follows movement edits
//! - Deleting a movement leaves no orphan snapshot
//! - Negative stock flag, audit events and role checks

mod common;

use common::{actor, at, dec, input, Harness};
use inventory_server::config::InventoryConfig;
use inventory_server::error::AppError;
use inventory_server::store::LedgerStore;
use proptest::prelude::*;
use shared::{AuditAction, Direction, LedgerFilter, Role};
use uuid::Uuid;

// ============================================================================
// Pairing and snapshot lifecycle
// ============================================================================

#[tokio::test]
async fn test_record_creates_paired_snapshot() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("rice", "50", Some("45"));

    let movement = h.record(&admin, Direction::In, p.id, 12, None).await;

    let snapshots = h.store.all_snapshots().unwrap();
    assert_eq!(snapshots.len(), 1);
    let snapshot = &snapshots[0];
    assert_eq!(snapshot.stock_in_id, Some(movement.id));
    assert_eq!(snapshot.stock_out_id, None);
    assert_eq!(snapshot.product_id, p.id);
    assert_eq!(snapshot.quantity, 12);
    assert_eq!(snapshot.unit_price, dec("50"));
    assert_eq!(snapshot.unit_sales_price, Some(dec("45")));
}

#[tokio::test]
async fn test_snapshot_prices_survive_product_price_change() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let mut p = h.add_product("soap", "50", Some("40"));
    let movement = h.record(&admin, Direction::Out, p.id, 3, None).await;

    p.price = dec("80");
    p.sales_price = None;
    h.store.put_product(p.clone()).unwrap();

    let snapshot = h.store.snapshot(Direction::Out, movement.id).await.unwrap().unwrap();
    assert_eq!(snapshot.unit_price, dec("50"));
    assert_eq!(snapshot.unit_sales_price, Some(dec("40")));

    let entries = h.store.entries(Direction::Out, &LedgerFilter::default()).await.unwrap();
    assert_eq!(entries[0].unit_price(), dec("50"));
    assert_eq!(entries[0].effective_unit(), dec("40"));
    assert_eq!(entries[0].live_price(), dec("80"));
}

#[tokio::test]
async fn test_update_syncs_quantity_but_not_prices() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let mut p = h.add_product("oil", "120", None);
    let movement = h.record(&admin, Direction::In, p.id, 5, Some(at(2024, 3, 1))).await;

    p.price = dec("150");
    h.store.put_product(p.clone()).unwrap();

    let updated = h
        .ledger
        .update(&admin, Direction::In, movement.id, input(p.id, 9, None))
        .await
        .unwrap();

    assert_eq!(updated.quantity, 9);
    assert_eq!(updated.occurred_at, at(2024, 3, 1));

    let snapshot = h.store.snapshot(Direction::In, movement.id).await.unwrap().unwrap();
    assert_eq!(snapshot.quantity, 9);
    assert_eq!(snapshot.unit_price, dec("120"));
    assert_eq!(h.store.all_snapshots().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_removes_movement_and_snapshot() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("salt", "10", None);
    let keep = h.record(&admin, Direction::Out, p.id, 1, None).await;
    let gone = h.record(&admin, Direction::Out, p.id, 2, None).await;

    h.ledger.delete(&admin, Direction::Out, gone.id).await.unwrap();

    assert_eq!(h.store.movement_count(Direction::Out).unwrap(), 1);
    let snapshots = h.store.all_snapshots().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].stock_out_id, Some(keep.id));

    let again = h.ledger.delete(&admin, Direction::Out, gone.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_duplicate_snapshot_is_rejected() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("tea", "30", None);
    let movement = h.record(&admin, Direction::In, p.id, 4, None).await;

    let result = h.store.insert_movement(&movement, &p).await;
    assert!(matches!(result, Err(AppError::Conflict { .. })));
    assert_eq!(h.store.all_snapshots().unwrap().len(), 1);
}

// ============================================================================
// Validation and stock checks
// ============================================================================

#[tokio::test]
async fn test_unknown_product_is_a_validation_error() {
    let h = Harness::new();
    let admin = actor(Role::Admin);

    let result = h
        .ledger
        .record(&admin, Direction::In, input(Uuid::new_v4(), 1, None))
        .await;

    assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "product_id"));
    assert_eq!(h.store.movement_count(Direction::In).unwrap(), 0);
    assert!(h.audit.events().is_empty());
}

#[tokio::test]
async fn test_zero_quantity_rejected() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("milk", "25", None);

    let result = h.ledger.record(&admin, Direction::Out, input(p.id, 0, None)).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(h.store.all_snapshots().unwrap().is_empty());
}

#[tokio::test]
async fn test_overselling_allowed_by_default() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("egg", "5", None);
    h.record(&admin, Direction::In, p.id, 2, None).await;

    h.record(&admin, Direction::Out, p.id, 5, None).await;
    assert_eq!(h.valuation.remaining_quantity(p.id).await.unwrap(), -3);
}

#[tokio::test]
async fn test_negative_stock_rejected_when_disabled() {
    let h = Harness::with_settings(InventoryConfig {
        allow_negative_stock: false,
        ..InventoryConfig::default()
    });
    let admin = actor(Role::Admin);
    let p = h.add_product("flour", "40", None);
    h.record(&admin, Direction::In, p.id, 10, None).await;

    let too_many = h.ledger.record(&admin, Direction::Out, input(p.id, 11, None)).await;
    assert!(matches!(too_many, Err(AppError::InsufficientStock(_))));

    let out = h.record(&admin, Direction::Out, p.id, 10, None).await;

    // Editing releases the movement's own quantity before checking.
    let same = h
        .ledger
        .update(&admin, Direction::Out, out.id, input(p.id, 10, None))
        .await;
    assert!(same.is_ok());

    let grow = h
        .ledger
        .update(&admin, Direction::Out, out.id, input(p.id, 11, None))
        .await;
    assert!(matches!(grow, Err(AppError::InsufficientStock(_))));
}

#[tokio::test]
async fn test_stock_in_removal_cannot_strand_stock_out() {
    let h = Harness::with_settings(InventoryConfig {
        allow_negative_stock: false,
        ..InventoryConfig::default()
    });
    let admin = actor(Role::Admin);
    let p = h.add_product("salt", "12", None);
    let other = h.add_product("pepper", "15", None);
    let received = h.record(&admin, Direction::In, p.id, 5, None).await;
    h.record(&admin, Direction::Out, p.id, 5, None).await;

    let deleted = h.ledger.delete(&admin, Direction::In, received.id).await;
    assert!(matches!(deleted, Err(AppError::InsufficientStock(_))));

    let lowered = h
        .ledger
        .update(&admin, Direction::In, received.id, input(p.id, 4, None))
        .await;
    assert!(matches!(lowered, Err(AppError::InsufficientStock(_))));

    let moved = h
        .ledger
        .update(&admin, Direction::In, received.id, input(other.id, 5, None))
        .await;
    assert!(matches!(moved, Err(AppError::InsufficientStock(_))));

    // Nothing changed, and the rejected writes left no audit trace.
    let remaining = h.valuation.remaining_quantity(p.id).await.unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(h.store.movement_count(Direction::In).unwrap(), 1);
    assert_eq!(h.audit.events().len(), 2);

    let raised = h
        .ledger
        .update(&admin, Direction::In, received.id, input(p.id, 8, None))
        .await;
    assert!(raised.is_ok());
    assert_eq!(h.valuation.remaining_quantity(p.id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_stock_in_removal_allowed_by_default() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("oil", "60", None);
    let received = h.record(&admin, Direction::In, p.id, 5, None).await;
    h.record(&admin, Direction::Out, p.id, 5, None).await;

    h.ledger.delete(&admin, Direction::In, received.id).await.unwrap();
    assert_eq!(h.valuation.remaining_quantity(p.id).await.unwrap(), -5);
}

// ============================================================================
// Audit trail
// ============================================================================

#[tokio::test]
async fn test_audit_events_follow_lifecycle() {
    let h = Harness::new();
    let staff = actor(Role::Staff);
    let p = h.add_product("sugar", "18", None);

    let movement = h.record(&staff, Direction::In, p.id, 6, None).await;
    h.ledger
        .update(&staff, Direction::In, movement.id, input(p.id, 7, None))
        .await
        .unwrap();
    h.ledger.delete(&staff, Direction::In, movement.id).await.unwrap();

    let events = h.audit.events();
    let actions: Vec<AuditAction> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::StockIn, AuditAction::Updated, AuditAction::Deleted]
    );
    assert!(events.iter().all(|e| e.module == "stock_in"));
    assert!(events.iter().all(|e| e.user_id == Some(staff.user_id)));
    assert_eq!(events[0].ip_address.as_deref(), Some("192.168.1.50"));

    let created: serde_json::Value = serde_json::from_str(&events[0].description).unwrap();
    assert_eq!(created["quantity"], 6);
    assert_eq!(created["product_id"], p.id.to_string());
    assert_eq!(created["id"], movement.id.to_string());

    // Deleted event carries the state before deletion.
    let deleted: serde_json::Value = serde_json::from_str(&events[2].description).unwrap();
    assert_eq!(deleted["quantity"], 7);
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_cashier_records_stock_out_but_cannot_delete() {
    let h = Harness::new();
    let cashier = actor(Role::Cashier);
    let p = h.add_product("bread", "35", None);

    let movement = h.record(&cashier, Direction::Out, p.id, 1, None).await;
    let result = h.ledger.delete(&cashier, Direction::Out, movement.id).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(h.store.movement_count(Direction::Out).unwrap(), 1);
    assert_eq!(h.audit.events().len(), 1);
}

#[tokio::test]
async fn test_forbidden_before_any_side_effect() {
    let h = Harness::new();
    let cashier = actor(Role::Cashier);

    // Product does not exist either; authorization is reported first.
    let result = h
        .ledger
        .record(&cashier, Direction::In, input(Uuid::new_v4(), 0, None))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(h.audit.events().is_empty());
}

// ============================================================================
// Listing and product search
// ============================================================================

#[tokio::test]
async fn test_product_search() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    for i in 0..12 {
        h.add_product(&format!("cola{i:02}"), "15", None);
    }
    h.add_product("water", "7", None);

    let blank = h.ledger.search_products(&admin, Direction::Out, Some("   ")).await.unwrap();
    assert!(blank.is_empty());

    let hits = h.ledger.search_products(&admin, Direction::Out, Some("COLA")).await.unwrap();
    assert_eq!(hits.len(), 10);
    assert_eq!(hits[0].name, "cola00");
}

#[tokio::test]
async fn test_stock_out_listing_defaults_to_trailing_window() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("juice", "50", Some("40"));
    let today = at(2024, 6, 30).date_naive();

    h.record(&admin, Direction::Out, p.id, 2, Some(at(2024, 6, 29))).await;
    h.record(&admin, Direction::Out, p.id, 3, Some(at(2024, 5, 31))).await;
    h.record(&admin, Direction::Out, p.id, 5, Some(at(2024, 5, 30))).await;

    let list = h
        .ledger
        .list(&admin, Direction::Out, LedgerFilter::default(), None, today)
        .await
        .unwrap();

    assert_eq!(list.movements.data.len(), 2);
    assert_eq!(list.filters.date_from, Some(at(2024, 5, 31).date_naive()));
    assert_eq!(list.filters.date_to, Some(today));
    let totals = list.range_totals.unwrap();
    assert_eq!(totals.total_qty, 5);
    assert_eq!(totals.sale_subtotal, dec("200"));
    assert_eq!(totals.final_total, dec("200"));

    let stock_in = h
        .ledger
        .list(&admin, Direction::In, LedgerFilter::default(), None, today)
        .await
        .unwrap();
    assert!(stock_in.range_totals.is_none());
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Record(Direction, i32),
    Update(usize, i32),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let direction = prop_oneof![Just(Direction::In), Just(Direction::Out)];
    prop_oneof![
        (direction, 1..50i32).prop_map(|(d, q)| Op::Record(d, q)),
        (any::<usize>(), 1..50i32).prop_map(|(i, q)| Op::Update(i, q)),
        any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any sequence of writes, every live movement has exactly one
    /// snapshot with the same quantity, and no snapshot lacks a movement.
    #[test]
    fn prop_movements_and_snapshots_stay_paired(ops in prop::collection::vec(op_strategy(), 1..30)) {
        tokio_test::block_on(async {
            let h = Harness::new();
            let admin = actor(Role::Admin);
            let p = h.add_product("widget", "10", Some("9"));
            let mut live: Vec<(Direction, Uuid)> = Vec::new();

            for op in ops {
                match op {
                    Op::Record(direction, qty) => {
                        let m = h.record(&admin, direction, p.id, qty, None).await;
                        live.push((direction, m.id));
                    }
                    Op::Update(i, qty) if !live.is_empty() => {
                        let (direction, id) = live[i % live.len()];
                        h.ledger.update(&admin, direction, id, input(p.id, qty, None)).await.unwrap();
                    }
                    Op::Delete(i) if !live.is_empty() => {
                        let (direction, id) = live.remove(i % live.len());
                        h.ledger.delete(&admin, direction, id).await.unwrap();
                    }
                    _ => {}
                }
            }

            let snapshots = h.store.all_snapshots().unwrap();
            prop_assert_eq!(snapshots.len(), live.len());
            for (direction, id) in &live {
                let movement = h.store.movement(*direction, *id).await.unwrap().unwrap();
                let paired: Vec<_> = snapshots.iter().filter(|s| s.belongs_to(*direction, *id)).collect();
                prop_assert_eq!(paired.len(), 1);
                prop_assert_eq!(paired[0].quantity, movement.quantity);
                prop_assert_eq!(paired[0].unit_price, dec("10"));
            }
            Ok(())
        })?;
    }
}
