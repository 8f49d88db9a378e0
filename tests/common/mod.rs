#![allow(dead_code)]

use expense_ledger_server::database::{Db, get_user_db, init_main_db};
use expense_ledger_server::models::{
    Amount, Category, CreditRecord, ExpenseRecord, NewCredit, NewExpense,
};
use expense_ledger_server::validation::{parse_amount, parse_date};
use tempfile::{TempDir, tempdir};
use time::Date;
use uuid::Uuid;

pub async fn setup_test_environment() -> (String, String, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();
    let user_id = Uuid::new_v4().to_string();

    init_main_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize main database at {}: {}", data_path, e));

    get_user_db(&data_path, &user_id).await.unwrap_or_else(|e| {
        panic!(
            "Failed to initialize user database for user {} at {}: {}",
            user_id, data_path, e
        )
    });

    (data_path, user_id, temp_dir)
}

/// A fresh user ledger. Keep the `TempDir` alive for the test's duration.
pub async fn open_test_ledger() -> (Db, String, String, TempDir) {
    let (data_path, user_id, temp_dir) = setup_test_environment().await;
    let db = get_user_db(&data_path, &user_id)
        .await
        .unwrap_or_else(|e| panic!("Failed to open user database for {}: {}", user_id, e));
    (db, data_path, user_id, temp_dir)
}

pub fn amount(value: &str) -> Amount {
    parse_amount(value).unwrap_or_else(|e| panic!("bad test amount {}: {}", value, e))
}

pub fn date(value: &str) -> Date {
    parse_date(value).unwrap_or_else(|e| panic!("bad test date {}: {}", value, e))
}

pub fn new_expense(value: &str, description: &str, on: &str, category: Category) -> NewExpense {
    NewExpense {
        amount: amount(value),
        description: description.to_string(),
        date: date(on),
        category,
    }
}

pub fn new_credit(value: &str, description: &str, on: &str) -> NewCredit {
    NewCredit {
        amount: amount(value),
        description: description.to_string(),
        date: date(on),
    }
}

pub fn expense_record(
    id: &str,
    value: &str,
    description: &str,
    on: &str,
    category: Category,
) -> ExpenseRecord {
    ExpenseRecord::from_new(id.to_string(), new_expense(value, description, on, category))
}

pub fn credit_record(id: &str, value: &str, description: &str, on: &str) -> CreditRecord {
    CreditRecord::from_new(id.to_string(), new_credit(value, description, on))
}
