mod file_config;

pub use file_config::{AuthFileConfig, CatalogFileConfig, FileConfig};

use crate::catalog::SpotifyCredentials;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_CATALOG_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_CATALOG_MARKET: &str = "ES";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub catalog_api_url: Option<String>,
    pub catalog_accounts_url: Option<String>,
    pub catalog_market: Option<String>,
    pub catalog_timeout_sec: u64,
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,
    pub reset_token_ttl_minutes: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    pub catalog: CatalogSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_url: String,
    pub accounts_url: String,
    pub market: String,
    pub timeout_sec: u64,
    /// None when no client credentials were configured.
    pub credentials: Option<SpotifyCredentials>,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,
    pub reset_token_ttl_minutes: u64,
}

impl AuthSettings {
    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_minutes * 60)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ, both are {}", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let catalog_file = file.catalog.unwrap_or_default();
        let client_id = non_blank(catalog_file.client_id)
            .or_else(|| non_blank(cli.catalog_client_id.clone()));
        let client_secret = non_blank(catalog_file.client_secret)
            .or_else(|| non_blank(cli.catalog_client_secret.clone()));
        let credentials = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("Catalog client id and client secret must be provided together"),
        };
        let catalog = CatalogSettings {
            api_url: catalog_file
                .api_url
                .or_else(|| cli.catalog_api_url.clone())
                .unwrap_or_else(|| DEFAULT_CATALOG_API_URL.to_string()),
            accounts_url: catalog_file
                .accounts_url
                .or_else(|| cli.catalog_accounts_url.clone())
                .unwrap_or_else(|| DEFAULT_CATALOG_ACCOUNTS_URL.to_string()),
            market: catalog_file
                .market
                .or_else(|| cli.catalog_market.clone())
                .unwrap_or_else(|| DEFAULT_CATALOG_MARKET.to_string()),
            timeout_sec: catalog_file.timeout_sec.unwrap_or(cli.catalog_timeout_sec),
            credentials,
        };

        let auth_file = file.auth.unwrap_or_default();
        let auth = AuthSettings {
            token_retention_days: auth_file
                .token_retention_days
                .unwrap_or(cli.token_retention_days),
            prune_interval_hours: auth_file
                .prune_interval_hours
                .unwrap_or(cli.prune_interval_hours),
            reset_token_ttl_minutes: auth_file
                .reset_token_ttl_minutes
                .unwrap_or(cli.reset_token_ttl_minutes),
        };
        if auth.reset_token_ttl_minutes == 0 {
            bail!("reset_token_ttl_minutes must be positive");
        }

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            catalog,
            auth,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join("companion.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
