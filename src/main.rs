use anyhow::Result;
use snapcook::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
