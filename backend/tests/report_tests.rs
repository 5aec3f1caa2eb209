//! Report, valuation and dashboard scenarios
//!
//! Runs the aggregator over the in-memory ledger:
//! - Effective unit on stock-out rows
//! - Remaining quantity clamp and valuation at cost / sales price
//! - Historical (snapshot) vs live pricing
//! - Filtered subsets and paginated totals

mod common;

use common::{actor, at, dec, Harness};
use inventory_server::error::AppError;
use rust_decimal::Decimal;
use shared::{
    DashboardScope, Direction, InventoryRow, MovementRow, Report, ReportFilter, ReportTab, Role, Rows,
};

fn movement_rows(report: &Report) -> Vec<MovementRow> {
    match report {
        Report::Movements(r) => r.rows.items().to_vec(),
        Report::Inventory(_) => panic!("expected a movement report"),
    }
}

fn inventory_rows(report: &Report) -> Vec<InventoryRow> {
    match report {
        Report::Inventory(r) => r.rows.items().to_vec(),
        Report::Movements(_) => panic!("expected the inventory report"),
    }
}

#[tokio::test]
async fn test_sales_out_effective_unit() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let same = h.add_product("same", "50", Some("50"));
    let zero = h.add_product("zero", "50", Some("0"));
    let discounted = h.add_product("discounted", "50", Some("40"));

    h.record(&admin, Direction::Out, same.id, 1, Some(at(2024, 5, 1))).await;
    h.record(&admin, Direction::Out, zero.id, 1, Some(at(2024, 5, 2))).await;
    h.record(&admin, Direction::Out, discounted.id, 2, Some(at(2024, 5, 3))).await;

    let report = h
        .reports
        .build_for_export(&admin, ReportTab::SalesOut, &ReportFilter::default())
        .await
        .unwrap();
    let rows = movement_rows(&report);

    let unit_for = |id| rows.iter().find(|r| r.product.id == id).unwrap();
    assert_eq!(unit_for(same.id).effective_unit, Some(dec("50")));
    assert_eq!(unit_for(zero.id).effective_unit, Some(dec("50")));
    assert_eq!(unit_for(discounted.id).effective_unit, Some(dec("40")));
    assert_eq!(unit_for(discounted.id).amount, dec("80"));

    let Report::Movements(r) = &report else { unreachable!() };
    assert_eq!(r.totals.qty, 4);
    assert_eq!(r.totals.amount, dec("180"));
    assert_eq!(r.totals.sale_amount, None);
}

#[tokio::test]
async fn test_plain_stock_out_has_no_amounts() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("plain", "50", Some("40"));
    h.record(&admin, Direction::Out, p.id, 3, None).await;

    let report = h
        .reports
        .build_for_export(&admin, ReportTab::StockOut, &ReportFilter::default())
        .await
        .unwrap();
    let rows = movement_rows(&report);
    assert_eq!(rows[0].amount, Decimal::ZERO);
    assert_eq!(rows[0].effective_unit, Some(dec("40")));
}

#[tokio::test]
async fn test_remaining_quantity_clamped_in_inventory_tab() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("oversold", "12", None);
    h.record(&admin, Direction::In, p.id, 50, None).await;
    h.record(&admin, Direction::Out, p.id, 60, None).await;

    assert_eq!(h.valuation.remaining_quantity(p.id).await.unwrap(), -10);

    let report = h
        .reports
        .build_for_export(&admin, ReportTab::Inventory, &ReportFilter::default())
        .await
        .unwrap();
    let rows = inventory_rows(&report);
    assert_eq!(rows[0].remaining_qty, 0);
    assert_eq!(rows[0].total_value, Decimal::ZERO);
    assert_eq!(rows[0].total_value_sales, Decimal::ZERO);
}

#[tokio::test]
async fn test_valuation_at_cost_and_sales_price() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let priced = h.add_product("priced", "100", Some("120"));
    let unpriced = h.add_product("unpriced", "30", Some("0"));

    h.record(&admin, Direction::In, priced.id, 10, None).await;
    h.record(&admin, Direction::Out, priced.id, 3, None).await;
    h.record(&admin, Direction::In, unpriced.id, 4, None).await;

    let v = h.valuation.product_valuation(&admin, priced.id).await.unwrap();
    assert_eq!(v.remaining_qty, 7);
    assert_eq!(v.value_at_cost, dec("700"));
    assert_eq!(v.value_at_sales_price, dec("840"));

    let v = h.valuation.product_valuation(&admin, unpriced.id).await.unwrap();
    assert_eq!(v.value_at_sales_price, dec("120"));

    let total = h.valuation.inventory_valuation(&admin).await.unwrap();
    assert_eq!(total.inventory_value, dec("820"));
    assert_eq!(total.inventory_value_sales, dec("960"));
}

#[tokio::test]
async fn test_reports_use_snapshot_prices_and_dashboard_uses_live_prices() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let mut p = h.add_product("tea", "50", None);
    h.record(&admin, Direction::Out, p.id, 2, Some(at(2024, 5, 10))).await;

    p.price = dec("70");
    h.store.put_product(p.clone()).unwrap();

    let report = h
        .reports
        .build_for_export(&admin, ReportTab::SalesOut, &ReportFilter::default())
        .await
        .unwrap();
    assert_eq!(movement_rows(&report)[0].amount, dec("100"));

    let dashboard = h.valuation.dashboard(&admin, at(2024, 5, 10).date_naive()).await.unwrap();
    assert_eq!(dashboard.scope, DashboardScope::Global);
    assert_eq!(dashboard.totals.sales_out, dec("140"));
}

#[tokio::test]
async fn test_filtered_sales_out_subset() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let staff = actor(Role::Staff);
    h.store.put_user(staff.user_id, staff.name.clone()).unwrap();
    let a = h.add_product("alpha", "20", Some("15"));
    let b = h.add_product("beta", "10", None);

    h.record(&staff, Direction::Out, a.id, 2, Some(at(2024, 5, 1))).await;
    h.record(&staff, Direction::Out, a.id, 4, Some(at(2024, 5, 3))).await;
    h.record(&admin, Direction::Out, a.id, 8, Some(at(2024, 5, 2))).await;
    h.record(&staff, Direction::Out, b.id, 1, Some(at(2024, 5, 2))).await;
    h.record(&staff, Direction::Out, a.id, 16, Some(at(2024, 5, 9))).await;

    let filter = ReportFilter {
        date_from: Some(at(2024, 5, 1).date_naive()),
        date_to: Some(at(2024, 5, 3).date_naive()),
        product_id: Some(a.id),
        created_by: Some(staff.user_id),
    };
    let report = h
        .reports
        .build_for_export(&admin, ReportTab::SalesOut, &filter)
        .await
        .unwrap();

    let rows = movement_rows(&report);
    assert_eq!(rows.len(), 2);
    // Newest first
    assert_eq!(rows[0].quantity, 4);
    assert_eq!(rows[0].user.as_ref().map(|u| u.name.as_str()), Some(staff.name.as_str()));
    let Report::Movements(r) = &report else { unreachable!() };
    assert_eq!(r.totals.qty, 6);
    assert_eq!(r.totals.amount, dec("90"));
    assert_eq!(r.footer.total_products, 1);
}

#[tokio::test]
async fn test_paginated_report_totals_cover_every_row() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("bulk", "3", Some("2"));
    for day in 1..=20 {
        h.record(&admin, Direction::In, p.id, 1, Some(at(2024, 1, day))).await;
    }

    let report = h
        .reports
        .build(&admin, ReportTab::SalesIn, &ReportFilter::default(), Some(2))
        .await
        .unwrap();

    let Report::Movements(r) = &report else { panic!("expected a movement report") };
    let Rows::Paged(page) = &r.rows else { panic!("expected a page") };
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.pagination.total_items, 20);
    assert_eq!(r.totals.qty, 20);
    assert_eq!(r.totals.amount, dec("60"));
    assert_eq!(r.totals.sale_amount, Some(dec("40")));
}

#[tokio::test]
async fn test_aggregation_is_idempotent() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let p = h.add_product("steady", "9", Some("8"));
    h.record(&admin, Direction::In, p.id, 5, Some(at(2024, 2, 1))).await;
    h.record(&admin, Direction::Out, p.id, 2, Some(at(2024, 2, 2))).await;

    for tab in ReportTab::ALL {
        let first = h.reports.build_for_export(&admin, tab, &ReportFilter::default()).await.unwrap();
        let second = h.reports.build_for_export(&admin, tab, &ReportFilter::default()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}

#[tokio::test]
async fn test_inventory_tab_ignores_filters() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let a = h.add_product("a-item", "1", None);
    h.add_product("b-item", "2", None);

    let filter = ReportFilter {
        product_id: Some(a.id),
        ..Default::default()
    };
    let report = h
        .reports
        .build_for_export(&admin, ReportTab::Inventory, &filter)
        .await
        .unwrap();
    let names: Vec<String> = inventory_rows(&report).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["a-item", "b-item"]);
}

#[tokio::test]
async fn test_cashier_dashboard_is_scoped_to_own_stock_out() {
    let h = Harness::new();
    let admin = actor(Role::Admin);
    let cashier = actor(Role::Cashier);
    let p = h.add_product("snack", "10", None);

    h.record(&admin, Direction::In, p.id, 100, Some(at(2024, 7, 1))).await;
    h.record(&admin, Direction::Out, p.id, 9, Some(at(2024, 7, 2))).await;
    h.record(&cashier, Direction::Out, p.id, 3, Some(at(2024, 7, 3))).await;

    let today = at(2024, 7, 3).date_naive();
    let own = h.valuation.dashboard(&cashier, today).await.unwrap();
    assert_eq!(own.scope, DashboardScope::Own);
    assert_eq!(own.totals.stock_out_qty, 3);
    assert_eq!(own.totals.sales_out, dec("30"));
    assert_eq!(own.totals.stock_in_qty, 0);
    assert_eq!(own.graph_data.len(), 7);
    assert_eq!(own.graph_data.last().unwrap().stock_out, 3);

    let global = h.valuation.dashboard(&admin, today).await.unwrap();
    assert_eq!(global.totals.stock_out_qty, 12);
    assert_eq!(global.totals.stock_in_qty, 100);
    assert_eq!(global.totals.products, 1);
}

#[tokio::test]
async fn test_reports_closed_to_cashiers() {
    let h = Harness::new();
    let cashier = actor(Role::Cashier);
    let result = h
        .reports
        .build(&cashier, ReportTab::StockIn, &ReportFilter::default(), Some(1))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
