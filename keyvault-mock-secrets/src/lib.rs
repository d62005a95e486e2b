//! Azure Key Vault secrets emulation for keyvault-mock
//!
//! Provides an in-memory secret store behind the Key Vault REST shape:
//! - Set secret (`PUT /secrets/{name}`) and get secret (`GET /secrets/{name}`)
//! - Presence-only bearer token gate with the service's 401 challenge
//! - Unauthenticated `/debug` dump of all stored secrets

pub mod handlers;
pub mod headers;
mod storage;

use axum::Router;
use std::sync::Arc;

pub use handlers::{handle_request, KeyVaultState, Route, SecretAttributes, SecretBundle};
pub use headers::{CommonHeaders, HeaderFixtures};
pub use storage::{Clock, Secret, SecretStore, StoreError, SystemClock};

/// Router that sends every path through [`handle_request`]
pub fn router(state: Arc<KeyVaultState>) -> Router {
    Router::new().fallback(handle_request).with_state(state)
}
