//! Ledger errors and their mapping onto HTTP responses.
use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::constants::ERR_DATABASE_OPERATION;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LedgerError {
    /// Bad user input. Always raised before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The expense is larger than the balance and overdrafts are rejected.
    #[error("insufficient funds: balance is {balance}, expense is {amount}")]
    InsufficientFunds { balance: Decimal, amount: Decimal },

    /// The resulting balance cannot be represented.
    #[error("balance out of range")]
    BalanceOutOfRange,

    /// The record does not exist for this user, e.g. it was deleted by
    /// another session.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The stored balance changed between the read and the write.
    #[error("balance was modified concurrently, retry the operation")]
    Conflict,

    /// The backing database failed. Detail is for logs only.
    #[error("store error: {0}")]
    Store(String),
}

impl From<libsql::Error> for LedgerError {
    fn from(error: libsql::Error) -> Self {
        LedgerError::Store(error.to_string())
    }
}

impl From<LedgerError> for (StatusCode, String) {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ (LedgerError::InsufficientFunds { .. } | LedgerError::BalanceOutOfRange) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            e @ LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
            e @ LedgerError::Conflict => (StatusCode::CONFLICT, e.to_string()),
            LedgerError::Store(detail) => {
                tracing::error!("store error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ERR_DATABASE_OPERATION.to_string(),
                )
            }
        }
    }
}

impl From<ValidationError> for (StatusCode, String) {
    fn from(error: ValidationError) -> Self {
        (StatusCode::BAD_REQUEST, error.to_string())
    }
}
