use axum::http::StatusCode;
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::database::{Db, UserDatabases};
use crate::models::PublicUser;

pub async fn get_user_database(
    user_dbs: &UserDatabases,
    user_id: &str,
) -> Result<Db, (StatusCode, String)> {
    user_dbs.get(user_id).await.map_err(|e| {
        tracing::error!(user_id, "failed to open user database: {e:#}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ERR_DATABASE_ACCESS.to_string(),
        )
    })
}

pub fn db_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ERR_DATABASE_OPERATION.to_string(),
    )
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    min_length: usize,
    max_length: usize,
) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} cannot be empty", field_name),
        ));
    }
    let length = value.chars().count();
    if length < min_length || length > max_length {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "{} must be between {} and {} characters",
                field_name, min_length, max_length
            ),
        ));
    }
    Ok(())
}

/// Resolves the logged-in user and opens their ledger.
pub async fn current_user_db(
    state: &AppState,
    session: &Session,
) -> Result<(PublicUser, Db), (StatusCode, String)> {
    let user = get_current_user(session).await?;
    let db = get_user_database(&state.user_dbs, &user.id).await?;
    Ok((user, db))
}
