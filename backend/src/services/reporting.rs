//! Report aggregation over the ledger
//!
//! Produces `{tab, rows, totals, footer}` for the five report tabs. Running
//! the same query twice without writes in between yields identical output.

use std::sync::Arc;

use shared::{
    inventory_report, movement_report, Action, Actor, LedgerFilter, Pagination, Report,
    ReportFilter, ReportTab, Resource,
};

use crate::error::AppResult;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn LedgerStore>,
    page_size: u32,
}

impl ReportingService {
    pub fn new(store: Arc<dyn LedgerStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    /// Build a report. `page` paginates the rows; `None` returns every row
    /// (used by the exports).
    pub async fn build(
        &self,
        actor: &Actor,
        tab: ReportTab,
        filter: &ReportFilter,
        page: Option<u32>,
    ) -> AppResult<Report> {
        actor.authorize(Resource::Report, Action::View)?;
        self.aggregate(tab, filter, page.map(|p| Pagination::new(Some(p), self.page_size)))
            .await
    }

    /// Full, un-paginated report for export.
    pub async fn build_for_export(&self, actor: &Actor, tab: ReportTab, filter: &ReportFilter) -> AppResult<Report> {
        actor.authorize(Resource::Report, Action::Export)?;
        self.aggregate(tab, filter, None).await
    }

    async fn aggregate(
        &self,
        tab: ReportTab,
        filter: &ReportFilter,
        pagination: Option<Pagination>,
    ) -> AppResult<Report> {
        let report = match tab.direction() {
            None => {
                let stocks = self.store.product_stocks().await?;
                Report::Inventory(inventory_report(&stocks, pagination))
            }
            Some(direction) => {
                let entries = self
                    .store
                    .entries(direction, &LedgerFilter::from(filter))
                    .await?;
                Report::Movements(movement_report(tab, &entries, pagination))
            }
        };

        tracing::debug!(tab = %tab, "Report aggregated");

        Ok(report)
    }
}
