use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::models::{
    BalanceResponse, ExpensePayload, ExpenseRecord, ListRecordsQuery, RecordWithBalance,
    SummaryQuery,
};
use crate::query::{QueryPage, run_query};
use crate::store;
use crate::summary::{ExpenseSummary, summarize};
use crate::utils::current_user_db;
use crate::validation::{parse_period, parse_query_options, validate_expense};

pub async fn create_expense(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<RecordWithBalance<ExpenseRecord>>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let fields = validate_expense(&payload)?;

    let (record, balance) = store::create_expense(&db, &state.ledger, fields)
        .await
        .inspect_err(|e| tracing::warn!(user_id = %user.id, "expense rejected: {e}"))?;

    tracing::info!(user_id = %user.id, expense_id = %record.id, %balance, "expense created");
    Ok((
        StatusCode::CREATED,
        Json(RecordWithBalance { record, balance }),
    ))
}

pub async fn get_expenses(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListRecordsQuery>,
) -> Result<(StatusCode, Json<QueryPage<ExpenseRecord>>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let options = parse_query_options(&query)?;

    let expenses = store::list_expenses(&db).await?;
    Ok((StatusCode::OK, Json(run_query(expenses, &options))))
}

pub async fn get_expense(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ExpenseRecord>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let expense = store::get_expense(&db, &id).await?;
    Ok((StatusCode::OK, Json(expense)))
}

pub async fn update_expense(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<RecordWithBalance<ExpenseRecord>>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let fields = validate_expense(&payload)?;

    let (record, balance) = store::update_expense(&db, &state.ledger, &id, fields).await?;

    tracing::info!(user_id = %user.id, expense_id = %record.id, %balance, "expense updated");
    Ok((StatusCode::OK, Json(RecordWithBalance { record, balance })))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<BalanceResponse>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let balance = store::delete_expense(&db, &state.ledger, &id).await?;

    tracing::info!(user_id = %user.id, expense_id = %id, %balance, "expense deleted");
    Ok((StatusCode::OK, Json(BalanceResponse { balance })))
}

pub async fn get_summary(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<(StatusCode, Json<ExpenseSummary>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let period = parse_period(query.period.as_deref().filter(|p| !p.trim().is_empty()))?;

    let expenses = store::list_expenses(&db).await?;
    let today = time::OffsetDateTime::now_utc().date();
    Ok((StatusCode::OK, Json(summarize(&expenses, period, today))))
}
