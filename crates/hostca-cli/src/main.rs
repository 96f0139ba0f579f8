//! hostca - host identity certificate authority

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    hostca_cli::run().await
}
