//! Report export: CSV, printable HTML and PDF
//!
//! Pure formatting over an already aggregated, un-paginated [`Report`].

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use shared::{InventoryRow, MovementRow, Report, ReportFilter, ReportTab};

use crate::config::ExportConfig;
use crate::error::{AppError, AppResult};

pub const INVENTORY_HEADERS: [&str; 8] = [
    "Product",
    "SKU",
    "Barcode",
    "Remaining Qty",
    "Unit Price",
    "Unit Sales Price",
    "Total @ Price",
    "Total @ Sales Price",
];

pub const SALES_IN_HEADERS: [&str; 11] = [
    "Product",
    "SKU",
    "Barcode",
    "Qty",
    "Unit Price",
    "Unit Sales Price",
    "Total Amount",
    "Total Sale Amount",
    "Date",
    "By",
    "Note",
];

pub const SALES_OUT_HEADERS: [&str; 11] = [
    "Product",
    "SKU",
    "Barcode",
    "Qty",
    "Unit Price",
    "Unit Sales Price",
    "Effective Unit",
    "Amount",
    "Date",
    "By",
    "Note",
];

pub const MOVEMENT_HEADERS: [&str; 7] = ["Product", "SKU", "Barcode", "Qty", "Date", "By", "Note"];

pub fn headers(tab: ReportTab) -> &'static [&'static str] {
    match tab {
        ReportTab::Inventory => &INVENTORY_HEADERS,
        ReportTab::SalesIn => &SALES_IN_HEADERS,
        ReportTab::SalesOut => &SALES_OUT_HEADERS,
        ReportTab::StockIn | ReportTab::StockOut => &MOVEMENT_HEADERS,
    }
}

/// `report_{tab}_{YYYYmmdd_HHMMSS}.csv`
pub fn csv_filename(tab: ReportTab, now: DateTime<Utc>) -> String {
    format!("report_{}_{}.csv", tab.as_str(), now.format("%Y%m%d_%H%M%S"))
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn money(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

fn opt_money(value: Option<Decimal>) -> String {
    money(value.unwrap_or(Decimal::ZERO))
}

fn inventory_cells(row: &InventoryRow) -> Vec<String> {
    vec![
        row.name.clone(),
        opt(&row.sku),
        opt(&row.barcode),
        row.remaining_qty.to_string(),
        money(row.unit_price),
        opt_money(row.unit_sales_price),
        money(row.total_value),
        money(row.total_value_sales),
    ]
}

fn movement_cells(tab: ReportTab, row: &MovementRow) -> Vec<String> {
    let by = row
        .user
        .as_ref()
        .map(|u| u.name.clone())
        .unwrap_or_else(|| row.created_by.to_string());
    let head = [
        opt(&row.product.name),
        opt(&row.product.sku),
        opt(&row.product.barcode),
        row.quantity.to_string(),
    ];
    let tail = [row.timestamp.clone(), by, opt(&row.note)];

    let middle: Vec<String> = match tab {
        ReportTab::SalesIn => vec![
            money(row.unit_price),
            opt_money(row.unit_sales_price),
            money(row.amount),
            money(row.sale_amount),
        ],
        ReportTab::SalesOut => vec![
            money(row.unit_price),
            opt_money(row.unit_sales_price),
            opt_money(row.effective_unit),
            money(row.amount),
        ],
        _ => Vec::new(),
    };

    head.into_iter().chain(middle).chain(tail).collect()
}

/// Header row and data rows for a report, in display order.
pub fn table(report: &Report) -> (&'static [&'static str], Vec<Vec<String>>) {
    let tab = report.tab();
    let rows = match report {
        Report::Inventory(r) => r.rows.items().iter().map(inventory_cells).collect(),
        Report::Movements(r) => r.rows.items().iter().map(|row| movement_cells(tab, row)).collect(),
    };
    (headers(tab), rows)
}

/// Label/value pairs summarising totals and footer.
pub fn summary(report: &Report) -> Vec<(String, String)> {
    let mut lines = match report {
        Report::Inventory(r) => vec![
            ("Remaining Qty".to_string(), r.totals.remaining_qty.to_string()),
            ("Inventory Value".to_string(), money(r.totals.inventory_value)),
            ("Inventory Value @ Sales Price".to_string(), money(r.totals.inventory_value_sales)),
        ],
        Report::Movements(r) => {
            let mut lines = vec![("Total Qty".to_string(), r.totals.qty.to_string())];
            if report.tab().is_sales() {
                lines.push(("Total Amount".to_string(), money(r.totals.amount)));
                if let Some(sale_amount) = r.totals.sale_amount {
                    lines.push(("Total Sale Amount".to_string(), money(sale_amount)));
                }
            }
            lines
        }
    };
    let footer = report.footer();
    lines.push(("Products".to_string(), footer.total_products.to_string()));
    lines.push(("Sum of Unit Prices".to_string(), money(footer.total_price)));
    lines.push(("Sum of Unit Sales Prices".to_string(), money(footer.total_sales_price)));
    lines
}

fn filter_caption(filter: &ReportFilter) -> String {
    match (filter.date_from, filter.date_to) {
        (Some(from), Some(to)) => format!("{} to {}", from, to),
        (Some(from), None) => format!("From {}", from),
        (None, Some(to)) => format!("Until {}", to),
        (None, None) => "All dates".to_string(),
    }
}

pub fn render_csv(report: &Report) -> AppResult<String> {
    let (headers, rows) = table(report);
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(headers)
        .map_err(|e| AppError::Export(e.to_string()))?;
    for row in rows {
        wtr.write_record(&row)
            .map_err(|e| AppError::Export(e.to_string()))?;
    }

    let bytes = wtr.into_inner().map_err(|e| AppError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone HTML page that prints the report.
pub fn render_print_html(
    report: &Report,
    company_name: &str,
    filter: &ReportFilter,
    generated_at: DateTime<Utc>,
) -> String {
    let (headers, rows) = table(report);
    let title = format!("{} Report", report.tab().title());

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{} - {}</title>\n", escape_html(&title), escape_html(company_name)));
    html.push_str(
        "<style>\n\
         @page { size: A4 landscape; margin: 12mm; }\n\
         body { font-family: sans-serif; font-size: 11px; }\n\
         table { width: 100%; border-collapse: collapse; }\n\
         th, td { border: 1px solid #999; padding: 3px 5px; }\n\
         th { background: #eee; }\n\
         tr { page-break-inside: avoid; }\n\
         </style>\n",
    );
    html.push_str("</head>\n<body onload=\"window.print()\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(company_name)));
    html.push_str(&format!(
        "<h2>{}</h2>\n<p>{} &middot; Generated {}</p>\n",
        escape_html(&title),
        escape_html(&filter_caption(filter)),
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    html.push_str("<table>\n<thead><tr>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n<table class=\"summary\">\n");
    for (label, value) in summary(report) {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape_html(&label),
            escape_html(&value)
        ));
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// A4 landscape PDF of the report.
pub fn render_pdf(
    report: &Report,
    company_name: &str,
    filter: &ReportFilter,
    fonts: &ExportConfig,
) -> AppResult<Vec<u8>> {
    let font_family = genpdf::fonts::from_files(&fonts.font_dir, &fonts.font_family, None)
        .map_err(|e| AppError::Export(format!("Font {} not found in {}: {}", fonts.font_family, fonts.font_dir, e)))?;

    let (headers, rows) = table(report);
    let title = format!("{} Report", report.tab().title());

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("{} - {}", company_name, title));
    doc.set_paper_size(genpdf::Size::new(297, 210));
    doc.set_font_size(8);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(elements::Paragraph::new(company_name).styled(style::Style::new().bold().with_font_size(14)));
    doc.push(elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(11)));
    doc.push(elements::Paragraph::new(filter_caption(filter)));
    doc.push(elements::Break::new(1));

    let mut table = elements::TableLayout::new(vec![1; headers.len()]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    let mut header_row = table.row();
    for h in headers {
        header_row.push_element(elements::Paragraph::new(*h).styled(bold));
    }
    header_row.push().map_err(|e| AppError::Export(e.to_string()))?;

    for cells in rows {
        let mut row = table.row();
        for cell in cells {
            row.push_element(elements::Paragraph::new(cell));
        }
        row.push().map_err(|e| AppError::Export(e.to_string()))?;
    }
    doc.push(table);
    doc.push(elements::Break::new(1));

    for (label, value) in summary(report) {
        doc.push(elements::Paragraph::new(format!("{}: {}", label, value)).styled(bold));
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| AppError::Export(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_csv_filename_format() {
        let at = Utc.with_ymd_and_hms(2024, 7, 9, 14, 5, 3).unwrap();
        assert_eq!(csv_filename(ReportTab::SalesOut, at), "report_sales_out_20240709_140503.csv");
    }

    #[test]
    fn test_header_widths() {
        assert_eq!(headers(ReportTab::Inventory).len(), 8);
        assert_eq!(headers(ReportTab::SalesIn).len(), 11);
        assert_eq!(headers(ReportTab::SalesOut).len(), 11);
        assert_eq!(headers(ReportTab::StockIn).len(), 7);
        assert_eq!(headers(ReportTab::StockOut).len(), 7);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
    }
}
