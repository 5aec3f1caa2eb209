//! Report handlers: JSON view and the CSV / PDF / print exports

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{Report, ReportFilter, ReportTab};
use uuid::Uuid;

use super::parse_date;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::{export, ReportingService, SettingsService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub product_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub page: Option<u32>,
    /// `false` returns every row
    pub paginate: Option<bool>,
}

impl ReportQuery {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            date_from: parse_date(self.date_from.as_deref()),
            date_to: parse_date(self.date_to.as_deref()),
            product_id: self.product_id,
            created_by: self.created_by,
        }
    }
}

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(state.ledger.clone(), state.config.inventory.report_page_size)
}

fn parse_tab(tab: &str) -> AppResult<ReportTab> {
    tab.parse::<ReportTab>().map_err(AppError::from)
}

/// Report for one tab
pub async fn get_report(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(tab): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Report>> {
    let tab = parse_tab(&tab)?;
    let page = match query.paginate {
        Some(false) => None,
        _ => Some(query.page.unwrap_or(1)),
    };
    let report = service(&state).build(&actor, tab, &query.filter(), page).await?;
    Ok(Json(report))
}

pub async fn export_report_csv(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(tab): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let tab = parse_tab(&tab)?;
    let report = service(&state)
        .build_for_export(&actor, tab, &query.filter())
        .await?;
    let csv = export::render_csv(&report)?;
    let disposition = format!("attachment; filename=\"{}\"", export::csv_filename(tab, Utc::now()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub async fn export_report_pdf(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(tab): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let tab = parse_tab(&tab)?;
    let filter = query.filter();
    let report = service(&state).build_for_export(&actor, tab, &filter).await?;
    let company = SettingsService::new(state.db.clone(), state.audit.clone())
        .get()
        .await?;

    let export_config = state.config.export.clone();
    let pdf = tokio::task::spawn_blocking(move || {
        export::render_pdf(&report, &company.company_name, &filter, &export_config)
    })
    .await
    .map_err(|e| AppError::Export(e.to_string()))??;

    let disposition = format!(
        "attachment; filename=\"report_{}_{}.pdf\"",
        tab.as_str(),
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// Printable HTML page that opens the browser print dialog
pub async fn print_report(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(tab): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Html<String>> {
    let tab = parse_tab(&tab)?;
    let filter = query.filter();
    let report = service(&state).build_for_export(&actor, tab, &filter).await?;
    let company = SettingsService::new(state.db.clone(), state.audit.clone())
        .get()
        .await?;

    Ok(Html(export::render_print_html(
        &report,
        &company.company_name,
        &filter,
        Utc::now(),
    )))
}
