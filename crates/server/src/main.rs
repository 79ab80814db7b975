//! wmgate server binary.

use server::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
