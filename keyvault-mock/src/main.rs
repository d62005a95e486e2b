//! keyvault-mock - local Azure Key Vault secrets endpoint
//!
//! Serves the Key Vault secrets REST surface from memory so clients and
//! benchmarks can run without the remote service.

mod config;
mod router;

use clap::Parser;
use keyvault_mock_secrets::KeyVaultState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "keyvault-mock")]
#[command(about = "Local Azure Key Vault secrets mock", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "KEYVAULT_MOCK_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "KEYVAULT_MOCK_HOST")]
    host: Option<String>,

    /// Port for a second, plain-HTTP listener that renders https URLs.
    /// TLS is not served here; put a TLS terminator in front of this port.
    #[arg(long, env = "KEYVAULT_MOCK_FORWARDED_HTTPS_PORT")]
    forwarded_https_port: Option<u16>,

    /// Configuration file
    #[arg(short, long, env = "KEYVAULT_MOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "KEYVAULT_MOCK_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("keyvault_mock={},tower_http=debug", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if args.forwarded_https_port.is_some() {
        config.server.forwarded_https_port = args.forwarded_https_port;
    }

    // One store behind every listener
    let state = KeyVaultState::from_fixtures(&config.headers)?;

    info!("Starting keyvault-mock...");
    info!(
        "  Key Vault URL: \"{}://<hostname>:{}\"",
        config.server.scheme, config.server.port
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = router::create_router(state.clone().with_default_scheme(&config.server.scheme));
    let primary = router::serve(addr, app, "primary");

    match config.server.forwarded_https_port {
        Some(port) => {
            info!("  Key Vault URL (behind TLS): \"https://<hostname>:{}\"", port);
            let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;
            let app = router::create_router(state.with_default_scheme("https"));
            tokio::try_join!(primary, router::serve(addr, app, "forwarded-https"))?;
        }
        None => primary.await?,
    }

    Ok(())
}
