//! Response headers the real service attaches to every JSON response

use axum::http::{
    header::{self, InvalidHeaderValue},
    HeaderMap, HeaderName, HeaderValue,
};
use serde::Deserialize;

use keyvault_mock_core::RequestId;

pub const X_MS_REQUEST_ID: HeaderName = HeaderName::from_static("x-ms-request-id");
pub const X_MS_KEYVAULT_REGION: HeaderName = HeaderName::from_static("x-ms-keyvault-region");
pub const X_MS_KEYVAULT_SERVICE_VERSION: HeaderName =
    HeaderName::from_static("x-ms-keyvault-service-version");
pub const X_MS_KEYVAULT_NETWORK_INFO: HeaderName =
    HeaderName::from_static("x-ms-keyvault-network-info");
pub const X_ASPNET_VERSION: HeaderName = HeaderName::from_static("x-aspnet-version");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Configurable values of the fixed response headers
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeaderFixtures {
    pub server: String,
    pub region: String,
    pub service_version: String,
    pub network_info: String,
    pub aspnet_version: String,
    pub powered_by: String,
    pub strict_transport_security: String,
}

impl Default for HeaderFixtures {
    fn default() -> Self {
        Self {
            // Spelled the way the recorded service responses spell it
            server: "Micrsoft-IIS/10.0".to_string(),
            region: "westus2".to_string(),
            service_version: "1.1.0.876".to_string(),
            network_info: "addr=127.0.0.1;act_addr_fam=InterNetwork;".to_string(),
            aspnet_version: "4.0.30319".to_string(),
            powered_by: "ASP.NET".to_string(),
            strict_transport_security: "max-age=31536000;includeSubDomains".to_string(),
        }
    }
}

/// Pre-validated common header set
#[derive(Debug, Clone)]
pub struct CommonHeaders {
    headers: HeaderMap,
}

impl CommonHeaders {
    pub fn new(fixtures: &HeaderFixtures) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();

        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(header::EXPIRES, HeaderValue::from_static("-1"));
        headers.insert(header::SERVER, HeaderValue::from_str(&fixtures.server)?);
        headers.insert(X_MS_KEYVAULT_REGION, HeaderValue::from_str(&fixtures.region)?);
        headers.insert(
            X_MS_KEYVAULT_SERVICE_VERSION,
            HeaderValue::from_str(&fixtures.service_version)?,
        );
        headers.insert(
            X_MS_KEYVAULT_NETWORK_INFO,
            HeaderValue::from_str(&fixtures.network_info)?,
        );
        headers.insert(X_ASPNET_VERSION, HeaderValue::from_str(&fixtures.aspnet_version)?);
        headers.insert(X_POWERED_BY, HeaderValue::from_str(&fixtures.powered_by)?);
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_str(&fixtures.strict_transport_security)?,
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

        Ok(Self { headers })
    }

    /// The header set for one response, stamped with a fresh request ID
    pub fn for_response(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        let request_id = RequestId::new();
        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            headers.insert(X_MS_REQUEST_ID, value);
        }
        headers
    }
}

impl Default for CommonHeaders {
    fn default() -> Self {
        // Default fixtures are plain ASCII
        Self::new(&HeaderFixtures::default()).unwrap_or_else(|_| Self {
            headers: HeaderMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header_set() {
        let headers = CommonHeaders::default().for_response();

        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(headers[header::EXPIRES], "-1");
        assert_eq!(headers[header::SERVER], "Micrsoft-IIS/10.0");
        assert_eq!(headers["x-ms-keyvault-region"], "westus2");
        assert_eq!(headers["x-ms-keyvault-service-version"], "1.1.0.876");
        assert_eq!(
            headers["x-ms-keyvault-network-info"],
            "addr=127.0.0.1;act_addr_fam=InterNetwork;"
        );
        assert_eq!(headers["X-AspNet-Version"], "4.0.30319");
        assert_eq!(headers["X-Powered-By"], "ASP.NET");
        assert_eq!(
            headers[header::STRICT_TRANSPORT_SECURITY],
            "max-age=31536000;includeSubDomains"
        );
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::CONNECTION], "close");
        assert_eq!(headers.len(), 14);
    }

    #[test]
    fn test_request_id_is_fresh_per_response() {
        let common = CommonHeaders::default();

        let first = common.for_response();
        let second = common.for_response();

        assert_ne!(first[X_MS_REQUEST_ID], second[X_MS_REQUEST_ID]);
    }

    #[test]
    fn test_fixture_override() {
        let fixtures = HeaderFixtures {
            region: "eastus".to_string(),
            ..HeaderFixtures::default()
        };

        let headers = CommonHeaders::new(&fixtures).unwrap().for_response();
        assert_eq!(headers["x-ms-keyvault-region"], "eastus");
    }

    #[test]
    fn test_invalid_fixture_is_rejected() {
        let fixtures = HeaderFixtures {
            server: "bad\nvalue".to_string(),
            ..HeaderFixtures::default()
        };

        assert!(CommonHeaders::new(&fixtures).is_err());
    }
}
