//! Test server management

use keyvault_mock_secrets::KeyVaultState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::STARTUP_TIMEOUT_SECS;

/// A keyvault-mock server running on a background task
pub struct TestServer {
    handle: JoinHandle<()>,
    addr: SocketAddr,
    base_url: String,
    state: Arc<KeyVaultState>,
}

impl TestServer {
    /// Start a server with a fresh store on a random local port
    pub async fn start() -> Result<Self, TestError> {
        Self::start_with_state(KeyVaultState::new()).await
    }

    /// Start a server around an existing state
    pub async fn start_with_state(state: KeyVaultState) -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TestError::StartFailed(e.to_string()))?;

        let state = Arc::new(state);
        let router = keyvault_mock_secrets::router(state.clone());

        info!(addr = %addr, "Starting keyvault-mock test server");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        let server = Self {
            handle,
            addr,
            base_url: format!("http://{addr}"),
            state,
        };
        server.wait_for_ready().await?;
        Ok(server)
    }

    /// Poll `/debug` (no auth needed) until the server answers
    async fn wait_for_ready(&self) -> Result<(), TestError> {
        let url = format!("{}/debug", self.base_url);
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if let Ok(response) = reqwest::get(&url).await {
                if response.status().is_success() {
                    info!(addr = %self.addr, "keyvault-mock ready");
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// State shared with the running server
    pub fn state(&self) -> &Arc<KeyVaultState> {
        &self.state
    }

    /// Get a client that sends a bearer token
    pub fn client(&self) -> crate::KeyVaultClient {
        crate::KeyVaultClient::new(self.base_url.clone()).with_token("test-token")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Errors that can occur with test server
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Failed to start server: {0}")]
    StartFailed(String),

    #[error("Server startup timed out")]
    StartupTimeout,
}
