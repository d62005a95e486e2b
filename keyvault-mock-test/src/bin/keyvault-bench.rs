//! Set/get latency loop against a Key Vault endpoint
//!
//! Each iteration writes `TestSecret`, reads it back, and logs the elapsed
//! time. Point `KEY_VAULT_URL` at the mock or at a real vault.

use clap::Parser;
use keyvault_mock_test::KeyVaultClient;
use std::time::Instant;
use tracing::{info, warn};

const SECRET_NAME: &str = "TestSecret";
const SECRET_VALUE: &str = "TestValue";

#[derive(Parser, Debug)]
#[command(name = "keyvault-bench")]
#[command(about = "Time set/get round trips against a Key Vault endpoint", long_about = None)]
struct Args {
    /// Number of iterations
    #[arg(short, long, default_value = "10")]
    iterations: u32,

    /// Delete the secret between iterations
    #[arg(short, long)]
    delete: bool,

    /// Create a new client for every iteration
    #[arg(short, long)]
    new_client_per_iteration: bool,

    /// Bearer token to send (any value satisfies the mock)
    #[arg(short, long, default_value = "test-token", env = "KEY_VAULT_TOKEN")]
    token: String,

    /// Vault base URL
    #[arg(long, env = "KEY_VAULT_URL")]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyvault_bench=info".into()),
        )
        .init();

    let new_client = || KeyVaultClient::new(args.url.clone()).with_token(args.token.clone());

    let mut client = new_client();
    for i in 0..args.iterations {
        if args.new_client_per_iteration {
            client = new_client();
        }

        let start = Instant::now();
        client.set_secret(SECRET_NAME, SECRET_VALUE).await?;
        let result = client.get_secret(SECRET_NAME).await?;
        let elapsed = start.elapsed();

        info!("{} {} {}ms", i, result.value, elapsed.as_millis());

        if args.delete {
            if let Err(e) = client.delete_secret(SECRET_NAME).await {
                warn!(error = %e, "Delete failed");
            }
        }
    }

    Ok(())
}
