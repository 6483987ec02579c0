//! Runtime configuration, resolved once at startup.
//!
//! Values come from the process environment (with `.env` loaded through
//! `dotenvy`). Parsing goes through [`AppConfig::from_lookup`] so tests can
//! feed values without touching process-wide state.

use std::env;

use thiserror::Error;

use crate::models::{parse_amount, DEFAULT_BALANCE_CENTS};
use crate::transaction::TransactionIdStyle;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub port: u16,
    pub pool_size: u32,
    pub ipfs_api_url: Option<String>,
    pub transaction_id_style: TransactionIdStyle,
    pub default_balance_cents: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let invalid = |name: &'static str, value: &str, reason: String| ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason,
        };

        let backend = match var("HOSPITAL_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(invalid(
                    "HOSPITAL_STORE",
                    other,
                    "expected 'postgres' or 'memory'".into(),
                ));
            }
        };

        let database_url = var("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| invalid("PORT", &raw, e.to_string()))?,
            None => 8080,
        };

        let pool_size = match var("DB_POOL_SIZE") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => return Err(invalid("DB_POOL_SIZE", &raw, "must be at least 1".into())),
                Ok(n) => n,
                Err(e) => return Err(invalid("DB_POOL_SIZE", &raw, e.to_string())),
            },
            None => 10,
        };

        let transaction_id_style = match var("TRANSACTION_ID_STYLE") {
            Some(raw) => raw
                .parse()
                .map_err(|e: crate::error::ValidationError| {
                    invalid("TRANSACTION_ID_STYLE", &raw, e.reason)
                })?,
            None => TransactionIdStyle::default(),
        };

        let default_balance_cents = match var("DEFAULT_ACCOUNT_BALANCE") {
            Some(raw) => parse_amount(&raw)
                .map_err(|e| invalid("DEFAULT_ACCOUNT_BALANCE", &raw, e.reason))?,
            None => DEFAULT_BALANCE_CENTS,
        };

        Ok(AppConfig {
            backend,
            database_url,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".into()),
            port,
            pool_size,
            ipfs_api_url: var("IPFS_API_URL"),
            transaction_id_style,
            default_balance_cents,
        })
    }
}
