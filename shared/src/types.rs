//! Common types used across the platform

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Pagination parameters (1-based pages)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    /// 1-based position of the first item on this page, if any
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = u64::from(pagination.per_page.max(1));
        let total_pages = u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX);
        let start = pagination.offset();
        let (from, to) = if start < total_items {
            (Some(start + 1), Some((start + per_page).min(total_items)))
        } else {
            (None, None)
        };

        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages,
            from,
            to,
        }
    }
}

impl<T> PaginatedResponse<T> {
    /// Cut one page out of an already ordered, fully materialised list.
    pub fn from_items(items: Vec<T>, pagination: Pagination) -> Self {
        let total_items = items.len() as u64;
        let meta = PaginationMeta::new(pagination, total_items);
        let start = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(start)
            .take(pagination.per_page as usize)
            .collect();

        Self {
            data,
            pagination: meta,
        }
    }

    /// Wrap a page that was already sliced by the database.
    pub fn from_page(data: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(pagination, total_items),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Either one page of rows or the complete list, depending on what the caller asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows<T> {
    Paged(PaginatedResponse<T>),
    All(Vec<T>),
}

impl<T> Rows<T> {
    pub fn build(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        match pagination {
            Some(p) => Rows::Paged(PaginatedResponse::from_items(items, p)),
            None => Rows::All(items),
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Rows::Paged(page) => &page.data,
            Rows::All(items) => items,
        }
    }
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The last `days` calendar days ending with `today`.
    pub fn trailing_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: today - Duration::days(span),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
