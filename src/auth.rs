//! Accounts and cookie sessions.
//!
//! Registering creates the user in the main database and opens a fresh
//! ledger for them. A session carries the user id and name; every ledger
//! handler resolves it through [`get_current_user`].
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::models::{LoginPayload, PublicUser, RegisterPayload, User};
use crate::utils::{db_error, get_user_database, validate_string_length};

const SESSION_USER_ID: &str = "user_id";
const SESSION_USERNAME: &str = "username";

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

fn invalid_credentials() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
}

fn session_error(error: tower_sessions::session::Error) -> (StatusCode, String) {
    tracing::error!("session store failed: {error}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Session unavailable".to_string(),
    )
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Errors only when `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn user_from_row(row: libsql::Row) -> libsql::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

pub async fn create_user(db: &Db, username: &str, password: &str) -> anyhow::Result<PublicUser> {
    let user = PublicUser {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
    };
    let password_hash = hash_password(password)?;

    db.write()
        .await
        .execute(
            "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
            (user.id.as_str(), username, password_hash.as_str()),
        )
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(db: &Db, username: &str) -> anyhow::Result<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, password_hash FROM users WHERE name = ?",
            [username],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(user_from_row(row)?)),
        None => Ok(None),
    }
}

fn is_duplicate_username(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"))
}

pub fn validate_registration(payload: &RegisterPayload) -> Result<(), (StatusCode, String)> {
    validate_string_length(
        &payload.username,
        "Username",
        MIN_USERNAME_LENGTH,
        MAX_USERNAME_LENGTH,
    )?;

    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    if !payload.username.chars().all(allowed) {
        return Err(bad_request(
            "Username may only contain letters, digits, underscores and hyphens",
        ));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(bad_request(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Looks the user up and checks the password. Unknown users and wrong
/// passwords get the same answer.
pub async fn authenticate(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<PublicUser, (StatusCode, String)> {
    let user = get_user_by_username(db, username)
        .await
        .map_err(|e| {
            tracing::error!("failed to look up user: {e:#}");
            db_error()
        })?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(password, &user.password_hash).map_err(|e| {
        tracing::error!(user_id = %user.id, "unreadable password hash: {e:#}");
        db_error()
    })?;
    if !valid {
        tracing::warn!(username, "rejected login");
        return Err(invalid_credentials());
    }

    Ok(PublicUser {
        id: user.id,
        username: user.username,
    })
}

/// Binds `user` to a fresh session id.
async fn start_session(session: &Session, user: &PublicUser) -> Result<(), (StatusCode, String)> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_ID, &user.id)
        .await
        .map_err(session_error)?;
    session
        .insert(SESSION_USERNAME, &user.username)
        .await
        .map_err(session_error)
}

pub async fn get_current_user(session: &Session) -> Result<PublicUser, (StatusCode, String)> {
    let id: Option<String> = session.get(SESSION_USER_ID).await.map_err(session_error)?;
    let username: Option<String> = session
        .get(SESSION_USERNAME)
        .await
        .map_err(session_error)?;

    id.zip(username)
        .map(|(id, username)| PublicUser { id, username })
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, ERR_UNAUTHORIZED.to_string()))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    validate_registration(&payload)?;

    let user = match create_user(&state.main_db, &payload.username, &payload.password).await {
        Ok(user) => user,
        Err(e) if is_duplicate_username(&e) => {
            return Err((StatusCode::CONFLICT, "Username already exists".to_string()));
        }
        Err(e) => {
            tracing::error!("failed to create user: {e:#}");
            return Err(db_error());
        }
    };

    // Opening the ledger creates it with a zero balance.
    get_user_database(&state.user_dbs, &user.id).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(bad_request("Username and password are required"));
    }

    let user = authenticate(&state.main_db, &payload.username, &payload.password).await?;
    start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, "logged in");
    Ok((StatusCode::OK, Json(user)))
}

pub async fn me(session: Session) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn logout(session: Session) -> Result<StatusCode, (StatusCode, String)> {
    session.flush().await.map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}
