//! Search, filter, sort and paginate a user's records in memory.
//!
//! Stages run in a fixed order: search, category filter, date-range filter,
//! sort, pagination. Counts and totals, including the per-category
//! breakdown, are taken after filtering and before pagination.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::constants::RECORDS_PER_PAGE;
use crate::models::{Category, CreditRecord, ExpenseRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Inclusive on both ends; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| start <= date) && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Matched case-insensitively.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub date_range: DateRange,
    pub date_sort: Option<SortOrder>,
    pub amount_sort: Option<SortOrder>,
    /// 1-based.
    pub page: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            search: None,
            category: None,
            date_range: DateRange::default(),
            date_sort: None,
            amount_sort: None,
            page: 1,
        }
    }
}

/// What the query pipeline needs to know about a record.
pub trait LedgerEntry {
    fn description(&self) -> &str;
    fn category(&self) -> Option<Category>;
    fn date(&self) -> Date;
    fn amount(&self) -> Decimal;
}

impl LedgerEntry for ExpenseRecord {
    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<Category> {
        Some(self.category)
    }

    fn date(&self) -> Date {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount.value()
    }
}

impl LedgerEntry for CreditRecord {
    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<Category> {
        None
    }

    fn date(&self) -> Date {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount.value()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QueryPage<T> {
    pub records: Vec<T>,
    pub total_count: usize,
    pub total_amount: Decimal,
    /// Only categories with matching records appear. Always empty for credits.
    pub category_totals: BTreeMap<Category, Decimal>,
    pub page: u32,
    pub total_pages: usize,
}

fn matches_search<T: LedgerEntry>(record: &T, term: &str) -> bool {
    record.description().to_lowercase().contains(term)
        || record
            .category()
            .is_some_and(|category| category.as_str().contains(term))
}

/// Amount order first, date order breaking ties. Records equal on every
/// selected key keep their incoming order.
fn compare<T: LedgerEntry>(a: &T, b: &T, options: &QueryOptions) -> Ordering {
    let by_amount = options
        .amount_sort
        .map_or(Ordering::Equal, |order| order.apply(a.amount().cmp(&b.amount())));
    let by_date = options
        .date_sort
        .map_or(Ordering::Equal, |order| order.apply(a.date().cmp(&b.date())));
    by_amount.then(by_date)
}

/// Runs the full pipeline over `records`, which should be in creation order.
pub fn run_query<T: LedgerEntry>(records: Vec<T>, options: &QueryOptions) -> QueryPage<T> {
    let search = options.search.as_deref().map(str::to_lowercase);
    let mut matching: Vec<T> = records
        .into_iter()
        .filter(|record| {
            search
                .as_deref()
                .is_none_or(|term| matches_search(record, term))
        })
        .filter(|record| {
            options
                .category
                .is_none_or(|category| record.category() == Some(category))
        })
        .filter(|record| options.date_range.contains(record.date()))
        .collect();

    if options.amount_sort.is_some() || options.date_sort.is_some() {
        matching.sort_by(|a, b| compare(a, b, options));
    }

    let total_count = matching.len();
    let total_amount: Decimal = matching.iter().map(|record| record.amount()).sum();
    let mut category_totals: BTreeMap<Category, Decimal> = BTreeMap::new();
    for record in &matching {
        if let Some(category) = record.category() {
            *category_totals.entry(category).or_default() += record.amount();
        }
    }
    let total_pages = total_count.div_ceil(RECORDS_PER_PAGE);

    let start = (options.page.max(1) as usize - 1).saturating_mul(RECORDS_PER_PAGE);
    let records = matching
        .into_iter()
        .skip(start)
        .take(RECORDS_PER_PAGE)
        .collect();

    QueryPage {
        records,
        total_count,
        total_amount,
        category_totals,
        page: options.page,
        total_pages,
    }
}
