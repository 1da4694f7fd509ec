use anyhow::{Context, Result};
use cadenza_server::account::{AccountManager, LoggingResetTokenSink, ResetTokenSink};
use cadenza_server::catalog::{CatalogGateway, InMemoryCatalog, SpotifyCatalogClient};
use cadenza_server::config::{AppConfig, CliConfig, FileConfig};
use cadenza_server::metrics;
use cadenza_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use cadenza_server::store::{FullStore, SqliteCompanionStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Optional TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding companion.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Base URL of the catalog web API.
    #[clap(long)]
    pub catalog_api_url: Option<String>,

    /// Base URL of the catalog accounts service, for client credentials.
    #[clap(long)]
    pub catalog_accounts_url: Option<String>,

    /// Market used for catalog lookups.
    #[clap(long)]
    pub catalog_market: Option<String>,

    /// Timeout in seconds for catalog requests.
    #[clap(long, default_value_t = 10)]
    pub catalog_timeout_sec: u64,

    #[clap(long, env = "CATALOG_CLIENT_ID", hide_env_values = true)]
    pub catalog_client_id: Option<String>,

    #[clap(long, env = "CATALOG_CLIENT_SECRET", hide_env_values = true)]
    pub catalog_client_secret: Option<String>,

    /// Number of days an unused session token is kept. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 30)]
    pub token_retention_days: u64,

    /// Interval in hours between pruning runs. Only used if token_retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// Minutes a password reset token stays valid.
    #[clap(long, default_value_t = 60)]
    pub reset_token_ttl_minutes: u64,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            catalog_api_url: args.catalog_api_url.clone(),
            catalog_accounts_url: args.catalog_accounts_url.clone(),
            catalog_market: args.catalog_market.clone(),
            catalog_timeout_sec: args.catalog_timeout_sec,
            catalog_client_id: args.catalog_client_id.clone(),
            catalog_client_secret: args.catalog_client_secret.clone(),
            token_retention_days: args.token_retention_days,
            prune_interval_hours: args.prune_interval_hours,
            reset_token_ttl_minutes: args.reset_token_ttl_minutes,
        }
    }
}

fn make_catalog(config: &AppConfig) -> Result<Arc<dyn CatalogGateway>> {
    match &config.catalog.credentials {
        Some(credentials) => {
            info!("Using catalog at {}", config.catalog.api_url);
            Ok(Arc::new(SpotifyCatalogClient::new(
                &config.catalog.api_url,
                &config.catalog.accounts_url,
                &config.catalog.market,
                credentials.clone(),
                config.catalog.timeout_sec,
            )?))
        }
        None => {
            warn!("No catalog credentials configured, serving an empty in-memory catalog");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
    }
}

fn spawn_token_pruning(
    config: &AppConfig,
    store: Arc<dyn FullStore>,
    reset_sink: Arc<dyn ResetTokenSink>,
) {
    let retention_days = config.auth.token_retention_days;
    let interval_hours = config.auth.prune_interval_hours.max(1);
    if retention_days == 0 {
        info!("Token pruning disabled");
        return;
    }
    info!(
        "Token pruning enabled: retaining {} days, pruning every {} hours",
        retention_days, interval_hours
    );

    let account_manager =
        AccountManager::new(store, reset_sink, config.auth.reset_token_ttl());
    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = account_manager.prune_tokens(retention_days) {
                error!("Failed to prune tokens: {}", e);
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Opening SQLite database at {:?}...", config.db_path());
    let store: Arc<dyn FullStore> = Arc::new(SqliteCompanionStore::new(config.db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::run_metrics_server(metrics_port).await {
            error!("Metrics server stopped: {:#}", e);
        }
    });

    let reset_sink: Arc<dyn ResetTokenSink> = Arc::new(LoggingResetTokenSink);
    spawn_token_pruning(&config, store.clone(), reset_sink.clone());

    let catalog = make_catalog(&config)?;

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        server_config,
        store,
        catalog,
        reset_sink,
        config.auth.reset_token_ttl(),
    )
    .await
}
