use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::constants::MAX_AMOUNT;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// The fixed set of expense categories.
///
/// Declaration order is the order used by summaries.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Education,
    Utilities,
    Entertainment,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Education,
        Category::Utilities,
        Category::Entertainment,
        Category::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Education => "education",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Others => "others",
        }
    }

    /// Case-insensitive lookup against the fixed set.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strictly positive decimal quantity no larger than [`MAX_AMOUNT`].
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO && value <= Decimal::from(MAX_AMOUNT)).then_some(Amount(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub id: String,
    pub amount: Amount,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub category: Category,
}

impl ExpenseRecord {
    pub fn from_new(id: String, expense: NewExpense) -> Self {
        ExpenseRecord {
            id,
            amount: expense.amount,
            description: expense.description,
            date: expense.date,
            category: expense.category,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreditRecord {
    pub id: String,
    pub amount: Amount,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
}

impl CreditRecord {
    pub fn from_new(id: String, credit: NewCredit) -> Self {
        CreditRecord {
            id,
            amount: credit.amount,
            description: credit.description,
            date: credit.date,
        }
    }
}

/// Validated field values for creating or editing an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: Amount,
    pub description: String,
    pub date: Date,
    pub category: Category,
}

/// Validated field values for creating or editing a credit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCredit {
    pub amount: Amount,
    pub description: String,
    pub date: Date,
}

/// An amount as sent by a client: either a JSON string or a JSON number.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(Decimal),
}

impl AmountInput {
    pub fn as_text(&self) -> String {
        match self {
            AmountInput::Text(text) => text.clone(),
            AmountInput::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExpensePayload {
    pub amount: AmountInput,
    pub description: String,
    pub date: String,
    pub category: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreditPayload {
    pub amount: AmountInput,
    pub description: String,
    pub date: String,
}

/// Raw list parameters. Empty strings count as unset.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListRecordsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_sort: Option<String>,
    pub amount_sort: Option<String>,
    pub page: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecordWithBalance<T> {
    pub record: T,
    pub balance: Decimal,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BalanceCheck {
    pub stored: Decimal,
    pub computed: Decimal,
    pub consistent: bool,
}
