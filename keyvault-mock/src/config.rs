//! Configuration management

use keyvault_mock_secrets::HeaderFixtures;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Values of the fixed response headers
    #[serde(default)]
    pub headers: HeaderFixtures,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Scheme rendered for requests on the main listener
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Second listener, plain HTTP; needs an external TLS terminator in front
    #[serde(default)]
    pub forwarded_https_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            scheme: default_scheme(),
            forwarded_https_port: None,
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path an optional `keyvault-mock.*` file in the
    /// working directory is used. `KEYVAULT_MOCK__SERVER__PORT` style
    /// variables override file values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path),
            None => config::File::with_name("keyvault-mock").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("KEYVAULT_MOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.scheme, "http");
        assert!(config.server.forwarded_https_port.is_none());
        assert_eq!(config.headers, HeaderFixtures::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse(
            r#"
            [server]
            port = 8443
            forwarded_https_port = 5001

            [headers]
            region = "eastus"
            "#,
        );

        assert_eq!(config.server.port, 8443);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.forwarded_https_port, Some(5001));
        assert_eq!(config.headers.region, "eastus");
        assert_eq!(config.headers.service_version, "1.1.0.876");
    }
}
