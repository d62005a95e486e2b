//! HTTP router and listeners for keyvault-mock

use axum::Router;
use keyvault_mock_secrets::KeyVaultState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the application router for one listener
pub fn create_router(state: KeyVaultState) -> Router {
    keyvault_mock_secrets::router(Arc::new(state)).layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `app` until the process exits
pub async fn serve(addr: SocketAddr, app: Router, label: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(listener = label, "Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
