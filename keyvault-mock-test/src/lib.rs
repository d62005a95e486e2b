//! Test utilities for keyvault-mock
//!
//! Provides utilities for integration testing against the mock:
//! - Start/stop the mock on a random local port
//! - Wait for the server to be ready
//! - A small Key Vault secrets client
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyvault_mock_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_secret() {
//!     let server = TestServer::start().await.unwrap();
//!     let client = server.client();
//!
//!     client.set_secret("TestSecret", "TestValue").await.unwrap();
//!     let secret = client.get_secret("TestSecret").await.unwrap();
//!     assert_eq!(secret.value, "TestValue");
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, KeyVaultClient};
pub use server::{TestError, TestServer};

/// Key Vault REST API version sent by the client
pub const API_VERSION: &str = "7.0";

/// Timeout for waiting on the server
pub const STARTUP_TIMEOUT_SECS: u64 = 30;
