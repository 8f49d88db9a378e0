use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;

use crate::AppState;
use crate::models::{BalanceCheck, BalanceResponse};
use crate::store;
use crate::utils::current_user_db;

pub async fn get_balance(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<BalanceResponse>), (StatusCode, String)> {
    let (_user, db) = current_user_db(&state, &session).await?;
    let balance = store::read_balance(&db).await?;
    Ok((StatusCode::OK, Json(BalanceResponse { balance })))
}

pub async fn verify_balance(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<BalanceCheck>), (StatusCode, String)> {
    let (user, db) = current_user_db(&state, &session).await?;
    let check = store::verify_balance(&db).await?;

    if !check.consistent {
        tracing::warn!(
            user_id = %user.id,
            stored = %check.stored,
            computed = %check.computed,
            "balance drifted from records"
        );
    }
    Ok((StatusCode::OK, Json(check)))
}
