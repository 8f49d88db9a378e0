// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_LOG_FILTER: &str = "info";

// Session configuration
pub const SESSION_NAME: &str = "ledger_session";
pub const SESSION_EXPIRY_DAYS: i64 = 3;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

// Database
pub const MAIN_DB_FILE: &str = "users.db";
pub const BUSY_TIMEOUT_MS: u64 = 5_000;
pub const BALANCE_ROW_ID: i64 = 1;

// Query view
pub const RECORDS_PER_PAGE: usize = 10;
pub const MAX_PAGE: u32 = 100_000;

// Summary periods, in days
pub const WEEKLY_PERIOD_DAYS: i64 = 7;
pub const MONTHLY_PERIOD_DAYS: i64 = 30;
pub const YEARLY_PERIOD_DAYS: i64 = 365;

// Validation limits
/// Largest accepted amount, in currency units.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Error messages
pub const ERR_DATABASE_ACCESS: &str = "Database access error";
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_UNAUTHORIZED: &str = "Not logged in";
