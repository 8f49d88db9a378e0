//! Balance reconciliation.
//!
//! The reconciler keeps the account balance equal to
//! `sum(credits) - sum(expenses)` by turning each record mutation into a
//! [`WriteSet`]: the record write plus the balance transition it implies.
//! It performs no I/O; [`crate::store`] applies the write-set inside a single
//! transaction.
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::LedgerError;
use crate::models::{Amount, CreditRecord, ExpenseRecord};

/// Whether a new expense may push the balance below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    /// Reject expenses larger than the current balance.
    #[default]
    Reject,
    /// Accept every expense, letting the balance go negative.
    Allow,
}

impl FromStr for OverdraftPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(OverdraftPolicy::Reject),
            "allow" => Ok(OverdraftPolicy::Allow),
            other => Err(other.to_string()),
        }
    }
}

/// A record mutation, with any previous state already loaded by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateExpense(ExpenseRecord),
    EditExpense {
        previous: ExpenseRecord,
        updated: ExpenseRecord,
    },
    DeleteExpense(ExpenseRecord),
    CreateCredit(CreditRecord),
    EditCredit {
        previous: CreditRecord,
        updated: CreditRecord,
    },
    DeleteCredit(CreditRecord),
}

/// The record half of a write-set.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    InsertExpense(ExpenseRecord),
    UpdateExpense(ExpenseRecord),
    DeleteExpense(String),
    InsertCredit(CreditRecord),
    UpdateCredit(CreditRecord),
    DeleteCredit(String),
}

/// The balance half of a write-set.
///
/// `previous` is the value the computation started from; the store only
/// writes `updated` if the stored balance still equals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceWrite {
    pub previous: Decimal,
    pub updated: Decimal,
}

impl BalanceWrite {
    pub fn delta(&self) -> Decimal {
        self.updated - self.previous
    }
}

/// Both writes a mutation requires. They must be applied as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSet {
    pub record: RecordWrite,
    pub balance: BalanceWrite,
}

/// `balance + delta`, failing instead of overflowing.
fn shift(balance: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    balance
        .checked_add(delta)
        .ok_or(LedgerError::BalanceOutOfRange)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerReconciler {
    overdraft: OverdraftPolicy,
}

impl LedgerReconciler {
    pub fn new(overdraft: OverdraftPolicy) -> Self {
        LedgerReconciler { overdraft }
    }

    pub fn overdraft_policy(&self) -> OverdraftPolicy {
        self.overdraft
    }

    pub fn apply_new_expense(&self, balance: Decimal, amount: Amount) -> Result<Decimal, LedgerError> {
        if self.overdraft == OverdraftPolicy::Reject && amount.value() > balance {
            return Err(LedgerError::InsufficientFunds {
                balance,
                amount: amount.value(),
            });
        }
        shift(balance, -amount.value())
    }

    pub fn apply_new_credit(&self, balance: Decimal, amount: Amount) -> Result<Decimal, LedgerError> {
        shift(balance, amount.value())
    }

    /// A larger expense lowers the balance by the difference, a smaller one
    /// raises it.
    pub fn apply_expense_edit(
        &self,
        balance: Decimal,
        old: Amount,
        new: Amount,
    ) -> Result<Decimal, LedgerError> {
        shift(balance, old.value() - new.value())
    }

    pub fn apply_expense_delete(&self, balance: Decimal, deleted: Amount) -> Result<Decimal, LedgerError> {
        shift(balance, deleted.value())
    }

    pub fn apply_credit_edit(
        &self,
        balance: Decimal,
        old: Amount,
        new: Amount,
    ) -> Result<Decimal, LedgerError> {
        shift(balance, new.value() - old.value())
    }

    pub fn apply_credit_delete(&self, balance: Decimal, deleted: Amount) -> Result<Decimal, LedgerError> {
        shift(balance, -deleted.value())
    }

    /// Computes the write-set for `mutation` against `balance`.
    pub fn plan(&self, balance: Decimal, mutation: Mutation) -> Result<WriteSet, LedgerError> {
        let (record, next) = match mutation {
            Mutation::CreateExpense(expense) => {
                let next = self.apply_new_expense(balance, expense.amount)?;
                (RecordWrite::InsertExpense(expense), next)
            }
            Mutation::EditExpense { previous, updated } => {
                if previous.id != updated.id {
                    return Err(LedgerError::NotFound("expense"));
                }
                let next = self.apply_expense_edit(balance, previous.amount, updated.amount)?;
                (RecordWrite::UpdateExpense(updated), next)
            }
            Mutation::DeleteExpense(expense) => {
                let next = self.apply_expense_delete(balance, expense.amount)?;
                (RecordWrite::DeleteExpense(expense.id), next)
            }
            Mutation::CreateCredit(credit) => {
                let next = self.apply_new_credit(balance, credit.amount)?;
                (RecordWrite::InsertCredit(credit), next)
            }
            Mutation::EditCredit { previous, updated } => {
                if previous.id != updated.id {
                    return Err(LedgerError::NotFound("credit"));
                }
                let next = self.apply_credit_edit(balance, previous.amount, updated.amount)?;
                (RecordWrite::UpdateCredit(updated), next)
            }
            Mutation::DeleteCredit(credit) => {
                let next = self.apply_credit_delete(balance, credit.amount)?;
                (RecordWrite::DeleteCredit(credit.id), next)
            }
        };

        Ok(WriteSet {
            record,
            balance: BalanceWrite {
                previous: balance,
                updated: next,
            },
        })
    }
}

/// `sum(credits) - sum(expenses)`, the value the stored balance should hold.
pub fn expected_balance(credits: &[CreditRecord], expenses: &[ExpenseRecord]) -> Decimal {
    let credited: Decimal = credits.iter().map(|credit| credit.amount.value()).sum();
    let spent: Decimal = expenses.iter().map(|expense| expense.amount.value()).sum();
    credited - spent
}
