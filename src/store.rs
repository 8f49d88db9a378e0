//! Persistence of records and the balance in a user's database.
//!
//! Every mutation reads the balance, plans the write-set and applies both of
//! its writes inside one immediate transaction. Either both writes land or
//! neither does.
use std::str::FromStr;

use libsql::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::constants::BALANCE_ROW_ID;
use crate::database::Db;
use crate::error::LedgerError;
use crate::ledger::{LedgerReconciler, Mutation, RecordWrite, WriteSet, expected_balance};
use crate::models::{
    Amount, BalanceCheck, Category, CreditRecord, ExpenseRecord, NewCredit, NewExpense,
    format_date,
};
use crate::validation::parse_date;

const EXPENSE_COLUMNS: &str = "id, amount, description, date, category";
const CREDIT_COLUMNS: &str = "id, amount, description, date";

fn corrupt(what: &str) -> LedgerError {
    LedgerError::Store(format!("corrupt {what} in database"))
}

fn stored_decimal(text: &str, what: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str(text).map_err(|_| corrupt(what))
}

fn stored_amount(text: &str) -> Result<Amount, LedgerError> {
    stored_decimal(text, "amount")
        .ok()
        .and_then(Amount::new)
        .ok_or_else(|| corrupt("amount"))
}

pub fn expense_from_row(row: libsql::Row) -> Result<ExpenseRecord, LedgerError> {
    let id: String = row.get(0)?;
    let amount: String = row.get(1)?;
    let description: String = row.get(2)?;
    let date: String = row.get(3)?;
    let category: String = row.get(4)?;

    Ok(ExpenseRecord {
        id,
        amount: stored_amount(&amount)?,
        description,
        date: parse_date(&date).map_err(|_| corrupt("date"))?,
        category: Category::parse(&category).ok_or_else(|| corrupt("category"))?,
    })
}

pub fn credit_from_row(row: libsql::Row) -> Result<CreditRecord, LedgerError> {
    let id: String = row.get(0)?;
    let amount: String = row.get(1)?;
    let description: String = row.get(2)?;
    let date: String = row.get(3)?;

    Ok(CreditRecord {
        id,
        amount: stored_amount(&amount)?,
        description,
        date: parse_date(&date).map_err(|_| corrupt("date"))?,
    })
}

/// The stored balance as text plus its parsed value.
async fn balance_row(conn: &Connection) -> Result<(String, Decimal), LedgerError> {
    let mut rows = conn
        .query("SELECT balance FROM account WHERE id = ?", [BALANCE_ROW_ID])
        .await?;
    let row = rows.next().await?.ok_or_else(|| corrupt("account"))?;
    let text: String = row.get(0)?;
    let value = stored_decimal(&text, "balance")?;
    Ok((text, value))
}

async fn fetch_expenses(conn: &Connection) -> Result<Vec<ExpenseRecord>, LedgerError> {
    let mut rows = conn
        .query(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY seq ASC"),
            (),
        )
        .await?;

    let mut expenses = Vec::new();
    while let Some(row) = rows.next().await? {
        expenses.push(expense_from_row(row)?);
    }
    Ok(expenses)
}

async fn fetch_credits(conn: &Connection) -> Result<Vec<CreditRecord>, LedgerError> {
    let mut rows = conn
        .query(
            &format!("SELECT {CREDIT_COLUMNS} FROM credits ORDER BY seq ASC"),
            (),
        )
        .await?;

    let mut credits = Vec::new();
    while let Some(row) = rows.next().await? {
        credits.push(credit_from_row(row)?);
    }
    Ok(credits)
}

async fn fetch_expense(conn: &Connection, id: &str) -> Result<ExpenseRecord, LedgerError> {
    let mut rows = conn
        .query(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?"),
            [id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => expense_from_row(row),
        None => Err(LedgerError::NotFound("expense")),
    }
}

async fn fetch_credit(conn: &Connection, id: &str) -> Result<CreditRecord, LedgerError> {
    let mut rows = conn
        .query(
            &format!("SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?"),
            [id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => credit_from_row(row),
        None => Err(LedgerError::NotFound("credit")),
    }
}

pub async fn read_balance(db: &Db) -> Result<Decimal, LedgerError> {
    let conn = db.read().await;
    let (_, balance) = balance_row(&conn).await?;
    Ok(balance)
}

pub async fn list_expenses(db: &Db) -> Result<Vec<ExpenseRecord>, LedgerError> {
    let conn = db.read().await;
    fetch_expenses(&conn).await
}

pub async fn list_credits(db: &Db) -> Result<Vec<CreditRecord>, LedgerError> {
    let conn = db.read().await;
    fetch_credits(&conn).await
}

pub async fn get_expense(db: &Db, id: &str) -> Result<ExpenseRecord, LedgerError> {
    let conn = db.read().await;
    fetch_expense(&conn, id).await
}

pub async fn get_credit(db: &Db, id: &str) -> Result<CreditRecord, LedgerError> {
    let conn = db.read().await;
    fetch_credit(&conn, id).await
}

/// Recomputes the balance from the records and compares it with the stored
/// value.
pub async fn verify_balance(db: &Db) -> Result<BalanceCheck, LedgerError> {
    let conn = db.read().await;
    let (_, stored) = balance_row(&conn).await?;
    let credits = fetch_credits(&conn).await?;
    let expenses = fetch_expenses(&conn).await?;
    let computed = expected_balance(&credits, &expenses);

    Ok(BalanceCheck {
        stored,
        computed,
        consistent: stored == computed,
    })
}

/// A mutation as requested by a caller, before previous state is loaded.
#[derive(Debug, Clone)]
pub enum Request {
    CreateExpense(NewExpense),
    UpdateExpense { id: String, fields: NewExpense },
    DeleteExpense { id: String },
    CreateCredit(NewCredit),
    UpdateCredit { id: String, fields: NewCredit },
    DeleteCredit { id: String },
}

async fn resolve(conn: &Connection, request: Request) -> Result<Mutation, LedgerError> {
    Ok(match request {
        Request::CreateExpense(fields) => {
            Mutation::CreateExpense(ExpenseRecord::from_new(Uuid::new_v4().to_string(), fields))
        }
        Request::UpdateExpense { id, fields } => {
            let previous = fetch_expense(conn, &id).await?;
            Mutation::EditExpense {
                previous,
                updated: ExpenseRecord::from_new(id, fields),
            }
        }
        Request::DeleteExpense { id } => Mutation::DeleteExpense(fetch_expense(conn, &id).await?),
        Request::CreateCredit(fields) => {
            Mutation::CreateCredit(CreditRecord::from_new(Uuid::new_v4().to_string(), fields))
        }
        Request::UpdateCredit { id, fields } => {
            let previous = fetch_credit(conn, &id).await?;
            Mutation::EditCredit {
                previous,
                updated: CreditRecord::from_new(id, fields),
            }
        }
        Request::DeleteCredit { id } => Mutation::DeleteCredit(fetch_credit(conn, &id).await?),
    })
}

async fn write_record(conn: &Connection, record: &RecordWrite) -> Result<(), LedgerError> {
    let affected = match record {
        RecordWrite::InsertExpense(expense) => {
            conn.execute(
                "INSERT INTO expenses (id, amount, description, date, category) VALUES (?, ?, ?, ?, ?)",
                (
                    expense.id.as_str(),
                    expense.amount.to_string(),
                    expense.description.as_str(),
                    format_date(expense.date),
                    expense.category.as_str(),
                ),
            )
            .await?
        }
        RecordWrite::UpdateExpense(expense) => {
            conn.execute(
                "UPDATE expenses SET amount = ?, description = ?, date = ?, category = ? WHERE id = ?",
                (
                    expense.amount.to_string(),
                    expense.description.as_str(),
                    format_date(expense.date),
                    expense.category.as_str(),
                    expense.id.as_str(),
                ),
            )
            .await?
        }
        RecordWrite::DeleteExpense(id) => {
            conn.execute("DELETE FROM expenses WHERE id = ?", [id.as_str()])
                .await?
        }
        RecordWrite::InsertCredit(credit) => {
            conn.execute(
                "INSERT INTO credits (id, amount, description, date) VALUES (?, ?, ?, ?)",
                (
                    credit.id.as_str(),
                    credit.amount.to_string(),
                    credit.description.as_str(),
                    format_date(credit.date),
                ),
            )
            .await?
        }
        RecordWrite::UpdateCredit(credit) => {
            conn.execute(
                "UPDATE credits SET amount = ?, description = ?, date = ? WHERE id = ?",
                (
                    credit.amount.to_string(),
                    credit.description.as_str(),
                    format_date(credit.date),
                    credit.id.as_str(),
                ),
            )
            .await?
        }
        RecordWrite::DeleteCredit(id) => {
            conn.execute("DELETE FROM credits WHERE id = ?", [id.as_str()])
                .await?
        }
    };

    if affected != 1 {
        let kind = match record {
            RecordWrite::InsertExpense(_)
            | RecordWrite::UpdateExpense(_)
            | RecordWrite::DeleteExpense(_) => "expense",
            _ => "credit",
        };
        return Err(LedgerError::NotFound(kind));
    }
    Ok(())
}

async fn apply_in_transaction(
    conn: &Connection,
    ledger: &LedgerReconciler,
    request: Request,
) -> Result<WriteSet, LedgerError> {
    let (stored_text, balance) = balance_row(conn).await?;
    let mutation = resolve(conn, request).await?;
    let write_set = ledger.plan(balance, mutation)?;

    write_record(conn, &write_set.record).await?;

    // Compare-and-swap against the exact text read above.
    let swapped = conn
        .execute(
            "UPDATE account SET balance = ? WHERE id = ? AND balance = ?",
            (
                write_set.balance.updated.to_string(),
                BALANCE_ROW_ID,
                stored_text,
            ),
        )
        .await?;
    if swapped != 1 {
        return Err(LedgerError::Conflict);
    }

    Ok(write_set)
}

/// Applies `request` atomically and returns the write-set that was committed.
pub async fn apply(
    db: &Db,
    ledger: &LedgerReconciler,
    request: Request,
) -> Result<WriteSet, LedgerError> {
    let conn = db.write().await;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?;

    match apply_in_transaction(&tx, ledger, request).await {
        Ok(write_set) => {
            tx.commit().await?;
            Ok(write_set)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::error!("rollback failed: {rollback_error}");
            }
            Err(error)
        }
    }
}

pub async fn create_expense(
    db: &Db,
    ledger: &LedgerReconciler,
    fields: NewExpense,
) -> Result<(ExpenseRecord, Decimal), LedgerError> {
    let write_set = apply(db, ledger, Request::CreateExpense(fields)).await?;
    match write_set.record {
        RecordWrite::InsertExpense(expense) => Ok((expense, write_set.balance.updated)),
        _ => Err(LedgerError::Store("unexpected write for expense creation".into())),
    }
}

pub async fn update_expense(
    db: &Db,
    ledger: &LedgerReconciler,
    id: &str,
    fields: NewExpense,
) -> Result<(ExpenseRecord, Decimal), LedgerError> {
    let request = Request::UpdateExpense {
        id: id.to_string(),
        fields,
    };
    let write_set = apply(db, ledger, request).await?;
    match write_set.record {
        RecordWrite::UpdateExpense(expense) => Ok((expense, write_set.balance.updated)),
        _ => Err(LedgerError::Store("unexpected write for expense update".into())),
    }
}

pub async fn delete_expense(
    db: &Db,
    ledger: &LedgerReconciler,
    id: &str,
) -> Result<Decimal, LedgerError> {
    let request = Request::DeleteExpense { id: id.to_string() };
    let write_set = apply(db, ledger, request).await?;
    Ok(write_set.balance.updated)
}

pub async fn create_credit(
    db: &Db,
    ledger: &LedgerReconciler,
    fields: NewCredit,
) -> Result<(CreditRecord, Decimal), LedgerError> {
    let write_set = apply(db, ledger, Request::CreateCredit(fields)).await?;
    match write_set.record {
        RecordWrite::InsertCredit(credit) => Ok((credit, write_set.balance.updated)),
        _ => Err(LedgerError::Store("unexpected write for credit creation".into())),
    }
}

pub async fn update_credit(
    db: &Db,
    ledger: &LedgerReconciler,
    id: &str,
    fields: NewCredit,
) -> Result<(CreditRecord, Decimal), LedgerError> {
    let request = Request::UpdateCredit {
        id: id.to_string(),
        fields,
    };
    let write_set = apply(db, ledger, request).await?;
    match write_set.record {
        RecordWrite::UpdateCredit(credit) => Ok((credit, write_set.balance.updated)),
        _ => Err(LedgerError::Store("unexpected write for credit update".into())),
    }
}

pub async fn delete_credit(
    db: &Db,
    ledger: &LedgerReconciler,
    id: &str,
) -> Result<Decimal, LedgerError> {
    let request = Request::DeleteCredit { id: id.to_string() };
    let write_set = apply(db, ledger, request).await?;
    Ok(write_set.balance.updated)
}
