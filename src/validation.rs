//! Input validation shared by the create and edit paths of both record kinds.
//!
//! Every check runs before a transaction is opened, so a validation failure
//! never reaches the store.
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use time::{Date, Month};

use crate::constants::*;
use crate::models::{
    Amount, Category, CreditPayload, ExpensePayload, ListRecordsQuery, NewCredit, NewExpense,
};
use crate::query::{DateRange, QueryOptions, SortOrder};
use crate::summary::SummaryPeriod;

static DATE_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("date grammar is valid")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("description required")]
    DescriptionRequired,
    #[error("description must be at most {} characters", MAX_DESCRIPTION_LENGTH)]
    DescriptionTooLong,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("amount must be at most {}", MAX_AMOUNT)]
    AmountTooLarge,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid category")]
    InvalidCategory,
    #[error("invalid sort order")]
    InvalidSortOrder,
    #[error("invalid page")]
    InvalidPage,
    #[error("invalid period")]
    InvalidPeriod,
    #[error("search term must be at most {} characters", MAX_SEARCH_TERM_LENGTH)]
    SearchTooLong,
}

pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::DescriptionRequired);
    }
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(description.to_string())
}

/// Accepts plain (`12.50`) and exponent (`1.25e1`) notation.
pub fn parse_amount(amount: &str) -> Result<Amount, ValidationError> {
    let amount = amount.trim();
    let value = Decimal::from_str(amount)
        .or_else(|_| Decimal::from_scientific(amount))
        .map_err(|_| ValidationError::InvalidAmount)?;
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::AmountTooLarge);
    }
    Amount::new(value).ok_or(ValidationError::InvalidAmount)
}

/// Parses a `YYYY-MM-DD` string that must also name a real calendar day.
pub fn parse_date(date: &str) -> Result<Date, ValidationError> {
    let captures = DATE_GRAMMAR
        .captures(date.trim())
        .ok_or(ValidationError::InvalidDate)?;

    let year: i32 = captures[1].parse().map_err(|_| ValidationError::InvalidDate)?;
    let month: u8 = captures[2].parse().map_err(|_| ValidationError::InvalidDate)?;
    let day: u8 = captures[3].parse().map_err(|_| ValidationError::InvalidDate)?;
    let month = Month::try_from(month).map_err(|_| ValidationError::InvalidDate)?;

    Date::from_calendar_date(year, month, day).map_err(|_| ValidationError::InvalidDate)
}

pub fn parse_category(category: &str) -> Result<Category, ValidationError> {
    Category::parse(category).ok_or(ValidationError::InvalidCategory)
}

pub fn validate_expense(payload: &ExpensePayload) -> Result<NewExpense, ValidationError> {
    Ok(NewExpense {
        description: validate_description(&payload.description)?,
        amount: parse_amount(&payload.amount.as_text())?,
        date: parse_date(&payload.date)?,
        category: parse_category(&payload.category)?,
    })
}

pub fn validate_credit(payload: &CreditPayload) -> Result<NewCredit, ValidationError> {
    Ok(NewCredit {
        description: validate_description(&payload.description)?,
        amount: parse_amount(&payload.amount.as_text())?,
        date: parse_date(&payload.date)?,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn parse_sort_order(value: &str) -> Result<SortOrder, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(ValidationError::InvalidSortOrder),
    }
}

pub fn parse_page(page: Option<&str>) -> Result<u32, ValidationError> {
    match page {
        None => Ok(1),
        Some(page) => match page.parse::<u32>() {
            Ok(page) if (1..=MAX_PAGE).contains(&page) => Ok(page),
            _ => Err(ValidationError::InvalidPage),
        },
    }
}

pub fn parse_period(period: Option<&str>) -> Result<SummaryPeriod, ValidationError> {
    match period.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(SummaryPeriod::default()),
        Some("weekly") => Ok(SummaryPeriod::Weekly),
        Some("monthly") => Ok(SummaryPeriod::Monthly),
        Some("yearly") => Ok(SummaryPeriod::Yearly),
        Some("all") => Ok(SummaryPeriod::All),
        Some(_) => Err(ValidationError::InvalidPeriod),
    }
}

/// Turns raw list parameters into [`QueryOptions`].
pub fn parse_query_options(query: &ListRecordsQuery) -> Result<QueryOptions, ValidationError> {
    let search = match non_empty(&query.search) {
        Some(term) if term.len() > MAX_SEARCH_TERM_LENGTH => {
            return Err(ValidationError::SearchTooLong);
        }
        Some(term) => Some(term.to_lowercase()),
        None => None,
    };

    Ok(QueryOptions {
        search,
        category: non_empty(&query.category).map(parse_category).transpose()?,
        date_range: DateRange {
            start: non_empty(&query.start_date).map(parse_date).transpose()?,
            end: non_empty(&query.end_date).map(parse_date).transpose()?,
        },
        date_sort: non_empty(&query.date_sort)
            .map(parse_sort_order)
            .transpose()?,
        amount_sort: non_empty(&query.amount_sort)
            .map(parse_sort_order)
            .transpose()?,
        page: parse_page(non_empty(&query.page))?,
    })
}
