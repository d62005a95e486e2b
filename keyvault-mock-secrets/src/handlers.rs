//! HTTP handlers for the Key Vault secrets surface

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use keyvault_mock_core::VaultError;

use crate::headers::{CommonHeaders, HeaderFixtures};
use crate::storage::{Secret, SecretStore, StoreError};

/// Resource the challenge points callers at
const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Header a TLS terminator sets to report the original scheme
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Shared state for Key Vault handlers
#[derive(Debug, Clone)]
pub struct KeyVaultState {
    pub store: Arc<SecretStore>,
    headers: CommonHeaders,
    /// Scheme used in rendered URLs when the request doesn't say
    default_scheme: String,
}

impl KeyVaultState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(SecretStore::new()), CommonHeaders::default())
    }

    pub fn with_store(store: Arc<SecretStore>, headers: CommonHeaders) -> Self {
        Self {
            store,
            headers,
            default_scheme: "http".to_string(),
        }
    }

    pub fn from_fixtures(fixtures: &HeaderFixtures) -> Result<Self, header::InvalidHeaderValue> {
        Ok(Self::with_store(
            Arc::new(SecretStore::new()),
            CommonHeaders::new(fixtures)?,
        ))
    }

    /// Same store and headers, different default scheme
    pub fn with_default_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_scheme = scheme.into();
        self
    }
}

impl Default for KeyVaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Debug,
    Unauthorized,
    SetSecret(&'a str),
    GetSecret(&'a str),
    SecretMethodNotAllowed,
    NotFound,
}

impl<'a> Route<'a> {
    pub fn classify(method: &Method, path: &'a str, authorized: bool) -> Self {
        if path.eq_ignore_ascii_case("/debug") {
            return Route::Debug;
        }
        if !authorized {
            return Route::Unauthorized;
        }
        if !is_secrets_path(path) {
            return Route::NotFound;
        }
        if path.trim_end_matches('/').eq_ignore_ascii_case("/secrets") {
            // No list operation
            return Route::NotFound;
        }

        let name = secret_name(path);
        match *method {
            Method::PUT => Route::SetSecret(name),
            Method::GET => Route::GetSecret(name),
            _ => Route::SecretMethodNotAllowed,
        }
    }
}

/// Handle every Key Vault request
pub async fn handle_request(
    State(state): State<Arc<KeyVaultState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path();
    let authorized = headers.contains_key(header::AUTHORIZATION);
    let route = Route::classify(&method, path, authorized);

    info!(method = %method, path = %path, route = ?route, "Key Vault request");

    match route {
        Route::Debug => handle_debug(&state),
        Route::Unauthorized => {
            let origin = request_origin(&state, &uri, &headers);
            handle_unauthorized(&state, &origin)
        }
        Route::SetSecret(name) => {
            let origin = request_origin(&state, &uri, &headers);
            handle_set_secret(&state, &origin, path, name, &body)
        }
        Route::GetSecret(name) => {
            let origin = request_origin(&state, &uri, &headers);
            handle_get_secret(&state, &origin, path, name)
        }
        Route::SecretMethodNotAllowed => {
            warn!(method = %method, path = %path, "Unsupported method on secret");
            let err = VaultError::method_not_allowed(method.as_str());
            let mut response = error_response(&state, &err);
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, PUT"));
            response
        }
        Route::NotFound => {
            warn!(path = %path, "No route");
            error_response(&state, &VaultError::not_found(path))
        }
    }
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
struct SetSecretRequest {
    value: String,
}

/// Body returned by both set and get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretBundle {
    pub value: String,
    pub id: String,
    pub attributes: SecretAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretAttributes {
    pub enabled: bool,
    pub created: f64,
    pub updated: f64,
    pub recovery_level: String,
}

impl SecretBundle {
    fn render(origin: &str, path: &str, secret: Secret) -> Self {
        Self {
            id: format!("{}{}/{}", origin, path, secret.id),
            value: secret.value,
            attributes: SecretAttributes {
                enabled: true,
                created: epoch_seconds(secret.created),
                updated: epoch_seconds(secret.updated),
                recovery_level: "Purgeable".to_string(),
            },
        }
    }

    /// Trailing version segment of `id`
    pub fn version(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or_default()
    }
}

// === Handlers ===

fn handle_debug(state: &KeyVaultState) -> Response {
    let secrets = state.store.snapshot();

    info!(count = secrets.len(), "Debug dump");
    for (name, secret) in &secrets {
        info!(name = %name, value = %secret.value, "Secret");
    }

    StatusCode::OK.into_response()
}

fn handle_unauthorized(state: &KeyVaultState, origin: &str) -> Response {
    let mut response = error_response(state, &VaultError::unauthorized());

    let challenge = format!(r#"Bearer authorization="{origin}/auth", resource="{VAULT_RESOURCE}""#);
    match HeaderValue::from_str(&challenge) {
        Ok(value) => {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        Err(e) => warn!(error = %e, "Challenge is not a valid header value"),
    }

    response
}

fn handle_set_secret(
    state: &KeyVaultState,
    origin: &str,
    path: &str,
    name: &str,
    body: &Bytes,
) -> Response {
    let req: SetSecretRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            warn!(name = %name, error = %e, "Malformed set secret body");
            return error_response(state, &VaultError::bad_parameter(e.to_string()));
        }
    };

    // Render what this write produced, not a later lookup
    let secret = state.store.put(name, req.value);
    info!(name = %name, version = %secret.id, "Secret set");

    json_response(state, StatusCode::OK, &SecretBundle::render(origin, path, secret))
}

fn handle_get_secret(state: &KeyVaultState, origin: &str, path: &str, name: &str) -> Response {
    match state.store.get(name) {
        Ok(secret) => {
            json_response(state, StatusCode::OK, &SecretBundle::render(origin, path, secret))
        }
        Err(StoreError::SecretNotFound(name)) => {
            error_response(state, &VaultError::secret_not_found(&name))
        }
    }
}

// === Helpers ===

/// Whether the first path segment is `secrets`
fn is_secrets_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    let first = rest.split('/').next().unwrap_or_default();
    first.eq_ignore_ascii_case("secrets")
}

/// Last segment of the path once trailing slashes are dropped
pub fn secret_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// `<scheme>://<host>` as the caller addressed us
fn request_origin(state: &KeyVaultState, uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = uri
        .scheme_str()
        .or_else(|| headers.get(X_FORWARDED_PROTO).and_then(|v| v.to_str().ok()))
        .unwrap_or(state.default_scheme.as_str());

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

/// Seconds since the Unix epoch with microsecond precision
#[allow(clippy::cast_precision_loss)]
fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn json_response<T: Serialize>(state: &KeyVaultState, status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_common_headers(state, status, Body::from(bytes)),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(state: &KeyVaultState, err: &VaultError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    with_common_headers(state, status, Body::from(err.to_json()))
}

fn with_common_headers(state: &KeyVaultState, status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = state.headers.for_response();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::ManualClock;
    use axum::{body::to_bytes, http::Request, Router};
    use chrono::Duration;
    use tower::ServiceExt;

    fn state_with_clock(clock: Arc<ManualClock>) -> Arc<KeyVaultState> {
        Arc::new(KeyVaultState::with_store(
            Arc::new(SecretStore::with_clock(clock)),
            CommonHeaders::default(),
        ))
    }

    async fn send(
        router: &Router,
        method: Method,
        path: &str,
        body: &str,
    ) -> (StatusCode, SecretBundle) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, "vault.test:5000")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_secret_name_extraction() {
        assert_eq!(secret_name("/secrets/foo"), "foo");
        assert_eq!(secret_name("/secrets/foo/"), "foo");
        assert_eq!(secret_name("/secrets/foo//"), "foo");
        assert_eq!(secret_name("/secrets/foo/0123abcd"), "0123abcd");
        assert_eq!(secret_name("/secrets/MixedCase"), "MixedCase");
    }

    #[test]
    fn test_classify_debug_skips_auth() {
        assert_eq!(Route::classify(&Method::GET, "/debug", false), Route::Debug);
        assert_eq!(Route::classify(&Method::POST, "/DEBUG", false), Route::Debug);
        assert_eq!(Route::classify(&Method::GET, "/debug/", false), Route::Unauthorized);
    }

    #[test]
    fn test_classify_requires_auth() {
        assert_eq!(Route::classify(&Method::GET, "/secrets/a", false), Route::Unauthorized);
        assert_eq!(Route::classify(&Method::PUT, "/anything", false), Route::Unauthorized);
        assert_eq!(Route::classify(&Method::GET, "/", false), Route::Unauthorized);
    }

    #[test]
    fn test_classify_secret_routes() {
        assert_eq!(Route::classify(&Method::PUT, "/secrets/a", true), Route::SetSecret("a"));
        assert_eq!(Route::classify(&Method::GET, "/secrets/a/", true), Route::GetSecret("a"));
        assert_eq!(Route::classify(&Method::GET, "/Secrets/a", true), Route::GetSecret("a"));
        assert_eq!(
            Route::classify(&Method::DELETE, "/secrets/a", true),
            Route::SecretMethodNotAllowed
        );
        assert_eq!(
            Route::classify(&Method::POST, "/secrets/a", true),
            Route::SecretMethodNotAllowed
        );
    }

    #[test]
    fn test_classify_unmatched() {
        assert_eq!(Route::classify(&Method::GET, "/secrets", true), Route::NotFound);
        assert_eq!(Route::classify(&Method::GET, "/secrets/", true), Route::NotFound);
        assert_eq!(Route::classify(&Method::GET, "/secretsfoo/a", true), Route::NotFound);
        assert_eq!(Route::classify(&Method::GET, "/keys/a", true), Route::NotFound);
        assert_eq!(Route::classify(&Method::GET, "/", true), Route::NotFound);
    }

    #[test]
    fn test_origin_resolution() {
        let state = KeyVaultState::new();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("vault.test:5001"));

        let uri: Uri = "/secrets/a".parse().unwrap();
        assert_eq!(request_origin(&state, &uri, &headers), "http://vault.test:5001");

        let https = state.clone().with_default_scheme("https");
        assert_eq!(request_origin(&https, &uri, &headers), "https://vault.test:5001");

        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
        assert_eq!(request_origin(&state, &uri, &headers), "https://vault.test:5001");

        let absolute: Uri = "http://other:80/secrets/a".parse().unwrap();
        assert_eq!(request_origin(&state, &absolute, &HeaderMap::new()), "http://other:80");
    }

    #[test]
    fn test_epoch_seconds_keeps_fraction() {
        let at = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        assert!((epoch_seconds(at) - 1_700_000_000.25).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_rewrite_changes_updated_and_id_only() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let router = crate::router(state_with_clock(clock.clone()));

        let (status, first) =
            send(&router, Method::PUT, "/secrets/TestSecret", r#"{"value":"A"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first.attributes.created, 1_700_000_000.0);
        assert_eq!(first.attributes.updated, 1_700_000_000.0);

        clock.advance(Duration::milliseconds(1500));
        let (_, second) =
            send(&router, Method::PUT, "/secrets/TestSecret", r#"{"value":"B"}"#).await;

        assert_eq!(second.value, "B");
        assert_eq!(second.attributes.created, first.attributes.created);
        assert_eq!(second.attributes.updated, 1_700_000_001.5);
        assert_ne!(second.version(), first.version());

        let (_, read) = send(&router, Method::GET, "/secrets/TestSecret", "").await;
        assert_eq!(read, second);
    }

    #[tokio::test]
    async fn test_id_uses_host_and_original_path() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let router = crate::router(state_with_clock(clock));

        let (_, bundle) = send(
            &router,
            Method::PUT,
            "/secrets/foo?api-version=7.0",
            r#"{"value":"v"}"#,
        )
        .await;

        assert_eq!(
            bundle.id,
            format!("http://vault.test:5000/secrets/foo/{}", bundle.version())
        );
        assert_eq!(bundle.version().len(), 32);
    }
}
