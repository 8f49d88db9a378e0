use crate::constants::*;
use crate::ledger::OverdraftPolicy;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub session_secret: String,
    pub overdraft_policy: OverdraftPolicy,
    pub allowed_origin: Option<String>,
    pub secure_cookies: bool,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("SESSION_SECRET environment variable is required")]
    MissingSessionSecret,
    #[error("Invalid session secret: {0}")]
    InvalidSessionSecret(String),
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid overdraft policy: {0} (expected \"reject\" or \"allow\")")]
    InvalidOverdraftPolicy(String),
    #[error("Invalid boolean for {0}: {1}")]
    InvalidFlag(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let data_path = lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(port));
        }

        let session_secret = lookup("SESSION_SECRET").ok_or(ConfigError::MissingSessionSecret)?;

        // Signed cookies need at least 64 bytes of key material.
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::InvalidSessionSecret(format!(
                "must be at least {} bytes long",
                MIN_SESSION_SECRET_LENGTH
            )));
        }

        let overdraft_policy = match lookup("OVERDRAFT_POLICY") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidOverdraftPolicy(value))?,
            None => OverdraftPolicy::default(),
        };

        let allowed_origin = lookup("ALLOWED_ORIGIN").filter(|origin| !origin.trim().is_empty());

        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(value) => parse_flag("SECURE_COOKIES", &value)?,
            None => false,
        };

        Ok(Config {
            host,
            port,
            data_path,
            session_secret,
            overdraft_policy,
            allowed_origin,
            secure_cookies,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(name, value.to_string())),
    }
}
