use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::models::{
    BalanceResponse, CreditPayload, CreditRecord, ListRecordsQuery, RecordWithBalance,
};
use crate::query::{QueryPage, run_query};
use crate::store;
use crate::utils::current_user_db;
use crate::validation::{parse_query_options, validate_credit};

pub async fn create_credit(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreditPayload>,
) -> Result<(StatusCode, Json<RecordWithBalance<CreditRecord>>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let fields = validate_credit(&payload)?;

    let (record, balance) = store::create_credit(&db, &state.ledger, fields).await?;

    tracing::info!(user_id = %user.id, credit_id = %record.id, %balance, "credit created");
    Ok((
        StatusCode::CREATED,
        Json(RecordWithBalance { record, balance }),
    ))
}

pub async fn get_credits(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListRecordsQuery>,
) -> Result<(StatusCode, Json<QueryPage<CreditRecord>>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let options = parse_query_options(&query)?;

    let credits = store::list_credits(&db).await?;
    Ok((StatusCode::OK, Json(run_query(credits, &options))))
}

pub async fn get_credit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CreditRecord>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let credit = store::get_credit(&db, &id).await?;
    Ok((StatusCode::OK, Json(credit)))
}

pub async fn update_credit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<CreditPayload>,
) -> Result<(StatusCode, Json<RecordWithBalance<CreditRecord>>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let fields = validate_credit(&payload)?;

    let (record, balance) = store::update_credit(&db, &state.ledger, &id, fields).await?;

    tracing::info!(user_id = %user.id, credit_id = %record.id, %balance, "credit updated");
    Ok((StatusCode::OK, Json(RecordWithBalance { record, balance })))
}

pub async fn delete_credit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<BalanceResponse>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let balance = store::delete_credit(&db, &state.ledger, &id).await?;

    tracing::info!(user_id = %user.id, credit_id = %id, %balance, "credit deleted");
    Ok((StatusCode::OK, Json(BalanceResponse { balance })))
}
