//! Core types for keyvault-mock
//!
//! This crate provides the error envelope and identifiers shared by the
//! mock's service and test crates.

pub mod error;
pub mod request_id;

pub use error::{ErrorCode, VaultError, MISSING_TOKEN_MESSAGE};
pub use request_id::{new_version_id, RequestId};
