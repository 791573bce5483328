//! Configuration module for the party backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Organizer account created on startup when it does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub first_name: String,
    pub birthday: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional deployment-wide pre-shared key for the `/api` routes
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Bootstrap organizer
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("PARTY_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("PARTY_DB_PATH")
            .unwrap_or_else(|_| "./data/party.sqlite".to_string())
            .into();

        let bind_addr = env::var("PARTY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("PARTY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_seed = match (
            env::var("PARTY_ADMIN_NAME"),
            env::var("PARTY_ADMIN_FIRST_NAME"),
            env::var("PARTY_ADMIN_BIRTHDAY"),
        ) {
            (Ok(name), Ok(first_name), Ok(birthday)) => Some(AdminSeed {
                name,
                first_name,
                birthday,
            }),
            _ => None,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            admin_seed,
        })
    }
}
