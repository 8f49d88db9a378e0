//! A personal expense ledger served over JSON.
//!
//! Users record expenses and credits; the account balance is kept equal to
//! `sum(credits) - sum(expenses)` by [`ledger::LedgerReconciler`], whose
//! write-sets [`store`] applies atomically in each user's own database.
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

pub mod auth;
pub mod balance;
pub mod config;
pub mod constants;
pub mod credits;
pub mod database;
pub mod error;
pub mod expenses;
pub mod ledger;
pub mod models;
pub mod query;
pub mod store;
pub mod summary;
pub mod utils;
pub mod validation;

use config::Config;
use constants::*;
use database::{Db, UserDatabases};
use ledger::LedgerReconciler;

#[derive(Clone)]
pub struct AppState {
    pub main_db: Db,
    pub user_dbs: UserDatabases,
    pub ledger: LedgerReconciler,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let main_db = database::init_main_db(&config.data_path).await?;
        Ok(AppState {
            main_db,
            user_dbs: UserDatabases::new(&config.data_path),
            ledger: LedgerReconciler::new(config.overdraft_policy),
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let key = Key::try_from(state.config.session_secret.as_bytes())
        .map_err(|e| anyhow!("invalid session secret: {e}"))?;
    // TODO: swap MemoryStore for a persistent store so sessions survive restarts.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(key);

    let cors = match &state.config.allowed_origin {
        Some(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin.parse::<HeaderValue>()?)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        ),
        None => None,
    };

    let router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/balance", get(balance::get_balance))
        .route("/balance/verify", get(balance::verify_balance))
        .route(
            "/expenses",
            post(expenses::create_expense).get(expenses::get_expenses),
        )
        .route("/expenses/summary", get(expenses::get_summary))
        .route(
            "/expenses/{id}",
            get(expenses::get_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .route(
            "/credits",
            post(credits::create_credit).get(credits::get_credits),
        )
        .route(
            "/credits/{id}",
            get(credits::get_credit)
                .put(credits::update_credit)
                .delete(credits::delete_credit),
        )
        .layer(session_layer)
        .with_state(state);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(router.layer(TraceLayer::new_for_http()))
}
