use anyhow::{Result, bail};
use libsql::{Builder, Connection};
use std::{collections::HashMap, path::Path, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::{Mutex, RwLock};

use crate::constants::*;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

// Amounts and the balance are decimal strings; SQLite REAL would round them.
const CREATE_LEDGER_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT    UNIQUE NOT NULL,
    amount       TEXT    NOT NULL,
    description  TEXT    NOT NULL,
    date         TEXT    NOT NULL,
    category     TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS credits (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT    UNIQUE NOT NULL,
    amount       TEXT    NOT NULL,
    description  TEXT    NOT NULL,
    date         TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS account (
    id       INTEGER PRIMARY KEY CHECK (id = 1),
    balance  TEXT    NOT NULL
);
INSERT OR IGNORE INTO account (id, balance) VALUES (1, '0');
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Main users registry DB (users.db)
pub async fn init_main_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(MAIN_DB_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    Ok(Arc::new(RwLock::new(conn)))
}

/// Per-user isolated DB (user_{id}.db), created with a zero balance on first
/// open.
pub async fn get_user_db(data_dir: &str, user_id: &str) -> Result<Db> {
    if user_id.is_empty()
        || !user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("invalid user id {user_id:?}");
    }

    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(format!("user_{}.db", user_id));
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;

    conn.execute_batch(CREATE_LEDGER_TABLES).await?;
    Ok(Arc::new(RwLock::new(conn)))
}

/// Keeps one open connection per user so that requests from the same user
/// share its lock.
#[derive(Clone)]
pub struct UserDatabases {
    data_dir: Arc<PathBuf>,
    open: Arc<Mutex<HashMap<String, Db>>>,
}

impl UserDatabases {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        UserDatabases {
            data_dir: Arc::new(data_dir.into()),
            open: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, user_id: &str) -> Result<Db> {
        let mut open = self.open.lock().await;
        if let Some(db) = open.get(user_id) {
            return Ok(db.clone());
        }

        let data_dir = self.data_dir.to_string_lossy();
        let db = get_user_db(&data_dir, user_id).await?;
        open.insert(user_id.to_string(), db.clone());
        tracing::debug!(user_id, "opened user database");
        Ok(db)
    }
}
