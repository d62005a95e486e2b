//! Key Vault secret in-memory storage

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use keyvault_mock_core::new_version_id;

/// The current version of a named secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Secret value
    pub value: String,
    /// Version ID, regenerated on every write
    pub id: String,
    /// Time of the first write to this name
    pub created: DateTime<Utc>,
    /// Time of the latest write to this name
    pub updated: DateTime<Utc>,
}

/// Source of timestamps for the store
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// In-memory storage for secrets
#[derive(Debug)]
pub struct SecretStore {
    /// Secrets indexed by name
    secrets: DashMap<String, Secret>,
    clock: Arc<dyn Clock>,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            secrets: DashMap::new(),
            clock,
        }
    }

    /// Create or overwrite a secret
    ///
    /// Every write gets a fresh version ID. `created` is kept from the first
    /// write, `updated` is never earlier than `created`.
    pub fn put(&self, name: &str, value: impl Into<String>) -> Secret {
        let now = self.clock.now();
        let value = value.into();
        let id = new_version_id();

        match self.secrets.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let secret = entry.get_mut();
                secret.value = value;
                secret.id = id;
                secret.updated = now.max(secret.created);
                secret.clone()
            }
            Entry::Vacant(entry) => {
                let secret = Secret {
                    value,
                    id,
                    created: now,
                    updated: now,
                };
                entry.insert(secret.clone());
                secret
            }
        }
    }

    /// Get a secret by name
    pub fn get(&self, name: &str) -> Result<Secret, StoreError> {
        self.secrets
            .get(name)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::SecretNotFound(name.to_string()))
    }

    /// All current secrets, in no particular order
    pub fn snapshot(&self) -> Vec<(String, Secret)> {
        self.secrets
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

/// Secret store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Secret not found: {0}")]
    SecretNotFound(String),
}
