//! Request ID generation

use uuid::Uuid;

/// Key Vault request ID (x-ms-request-id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh hyphenated request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a secret version ID: 32 lowercase hex characters
pub fn new_version_id() -> String {
    Uuid::new_v4().simple().to_string()
}
