//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database and catalog.

use super::constants::*;
use super::fixtures::{
    create_account_with_password, create_test_catalog, RecordingResetTokenSink,
};
use cadenza_server::catalog::InMemoryCatalog;
use cadenza_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use cadenza_server::store::{FullStore, SqliteCompanionStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// Store for direct database access in tests
    pub store: Arc<dyn FullStore>,

    /// The fake catalog behind /api/spotify and catalog imports
    pub catalog: Arc<InMemoryCatalog>,

    /// Every password reset token the server issued
    pub reset_tokens: Arc<RecordingResetTokenSink>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, with the two test
    /// accounts and the test catalog in place.
    ///
    /// # Panics
    ///
    /// Panics if any part of the setup fails or the server doesn't become
    /// ready within timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let sqlite_store = SqliteCompanionStore::new(temp_db_dir.path().join("companion.db"))
            .expect("Failed to open companion store");
        create_account_with_password(&sqlite_store, TEST_NAME, TEST_EMAIL, TEST_PASS)
            .expect("Failed to create test account");
        create_account_with_password(&sqlite_store, OTHER_NAME, OTHER_EMAIL, OTHER_PASS)
            .expect("Failed to create second test account");
        let store: Arc<dyn FullStore> = Arc::new(sqlite_store);

        let catalog = Arc::new(create_test_catalog().expect("Failed to create test catalog"));

        let reset_tokens = Arc::new(RecordingResetTokenSink::default());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let app = make_app(
            config,
            store.clone(),
            catalog.clone(),
            reset_tokens.clone(),
            Duration::from_secs(3600),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            catalog,
            reset_tokens,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
