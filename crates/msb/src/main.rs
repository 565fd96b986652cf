use std::sync::Arc;

use anyhow::Context as _;

use msb_core::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Arc::new(Settings::load().context("loading settings")?);
    msb_core::logging::init("msb", settings.debug)?;

    tracing::info!(
        prefix = %settings.prefix,
        ratelimit = settings.ratelimit,
        debug = settings.debug,
        "starting self bot"
    );

    msb_matrix::router::run(settings).await
}
