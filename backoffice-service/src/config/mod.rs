//! Configuration module for backoffice-service.

use crate::services::calendar::CalendarCredentials;
use ops_core::config as core_config;
use ops_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub calendar: CalendarConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Google Calendar OAuth material. Sync silently degrades to warnings when
/// any of it is missing.
#[derive(Debug, Clone, Default)]
pub struct CalendarConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl CalendarConfig {
    pub fn credentials(&self) -> Option<CalendarCredentials> {
        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(CalendarCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub max_upload_bytes: usize,
}

impl BackofficeConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "backoffice-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            calendar: CalendarConfig {
                client_id: env::var("GOOGLE_CLIENT_ID").ok(),
                client_secret: env::var("GOOGLE_CLIENT_SECRET").ok(),
                refresh_token: env::var("GOOGLE_REFRESH_TOKEN").ok(),
            },
            import: ImportConfig {
                max_upload_bytes: env::var("IMPORT_MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10 * 1024 * 1024),
            },
        })
    }
}
