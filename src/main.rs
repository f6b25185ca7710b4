use anyhow::Context;
use tracing::info;

use userbase::{api, store, telemetry, Server, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let path = Settings::path_from_env();
    let settings = Settings::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    info!(config = %path.display(), "configuration loaded");

    let store = store::connect(&settings.storage())
        .await
        .context("connecting to storage")?;

    Server::bind(&settings.listen)
        .await?
        .max_body_bytes(settings.max_body_bytes)
        .serve(api::routes(store))
        .await?;
    Ok(())
}
