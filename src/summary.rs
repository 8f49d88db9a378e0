use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::constants::*;
use crate::models::{Category, ExpenseRecord};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
    All,
}

impl SummaryPeriod {
    /// Length of the period in days.
    pub fn max_age_days(self) -> Option<i64> {
        match self {
            SummaryPeriod::Weekly => Some(WEEKLY_PERIOD_DAYS),
            SummaryPeriod::Monthly => Some(MONTHLY_PERIOD_DAYS),
            SummaryPeriod::Yearly => Some(YEARLY_PERIOD_DAYS),
            SummaryPeriod::All => None,
        }
    }

    /// Counts expenses less than the period length old, so a weekly summary
    /// covers today and the six days before it. Future-dated expenses have a
    /// negative age and are always included.
    pub fn includes(self, date: Date, today: Date) -> bool {
        self.max_age_days()
            .is_none_or(|max| (today - date).whole_days() < max)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub period: SummaryPeriod,
    /// Every category is present, zero when it has no expenses.
    pub category_totals: BTreeMap<Category, Decimal>,
    pub total: Decimal,
    /// Largest category total.
    pub highest: Decimal,
    /// Smallest non-zero category total.
    pub lowest: Decimal,
}

pub fn summarize(expenses: &[ExpenseRecord], period: SummaryPeriod, today: Date) -> ExpenseSummary {
    let mut category_totals: BTreeMap<Category, Decimal> = Category::ALL
        .into_iter()
        .map(|category| (category, Decimal::ZERO))
        .collect();

    for expense in expenses
        .iter()
        .filter(|expense| period.includes(expense.date, today))
    {
        *category_totals.entry(expense.category).or_default() += expense.amount.value();
    }

    let total = category_totals.values().copied().sum();
    let highest = category_totals
        .values()
        .copied()
        .max()
        .unwrap_or(Decimal::ZERO);
    let lowest = category_totals
        .values()
        .copied()
        .filter(|amount| !amount.is_zero())
        .min()
        .unwrap_or(Decimal::ZERO);

    ExpenseSummary {
        period,
        category_totals,
        total,
        highest,
        lowest,
    }
}
