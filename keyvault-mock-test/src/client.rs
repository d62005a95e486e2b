//! Client for the Key Vault secrets REST surface

use keyvault_mock_secrets::SecretBundle;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::API_VERSION;

/// Client for a Key Vault endpoint, real or mocked
#[derive(Clone)]
pub struct KeyVaultClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl KeyVaultClient {
    /// Create a new client without credentials
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` on every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn secret_url(&self, name: &str) -> String {
        format!("{}/secrets/{}", self.base_url, name)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Create or overwrite a secret
    pub async fn set_secret(&self, name: &str, value: &str) -> Result<SecretBundle, ClientError> {
        let request = self
            .client
            .put(self.secret_url(name))
            .query(&[("api-version", API_VERSION)])
            .json(&serde_json::json!({ "value": value }));

        let response = self.authorize(request).send().await?;
        parse_bundle(response).await
    }

    /// Read the current version of a secret
    pub async fn get_secret(&self, name: &str) -> Result<SecretBundle, ClientError> {
        let request = self
            .client
            .get(self.secret_url(name))
            .query(&[("api-version", API_VERSION)]);

        let response = self.authorize(request).send().await?;
        parse_bundle(response).await
    }

    /// Delete a secret
    pub async fn delete_secret(&self, name: &str) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.secret_url(name))
            .query(&[("api-version", API_VERSION)]);

        let response = self.authorize(request).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(service_error(response).await)
        }
    }

    /// Ask the server to log its secrets
    pub async fn debug(&self) -> Result<StatusCode, ClientError> {
        let response = self
            .client
            .get(format!("{}/debug", self.base_url))
            .send()
            .await?;
        Ok(response.status())
    }
}

async fn parse_bundle(response: Response) -> Result<SecretBundle, ClientError> {
    if !response.status().is_success() {
        return Err(service_error(response).await);
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::ParseError(e.to_string()))
}

async fn service_error(response: Response) -> ClientError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Inner,
    }

    #[derive(Deserialize)]
    struct Inner {
        code: String,
        message: String,
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<Envelope>(&text) {
        Ok(envelope) => ClientError::Service {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Service {
            status,
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: text,
        },
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Service error {status} {code}: {message}")]
    Service {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Key Vault error code, if the service answered with one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}
