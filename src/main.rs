use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use urbanheat::api::AppState;
use urbanheat::{Analyzer, FjallQueryLog, QueryLog, UrbanHeatConfig, telemetry, web};

/// `--config <path>` is the only recognized argument
fn config_path_from_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => match args.next() {
            Some(path) => Ok(Some(PathBuf::from(path))),
            None => bail!("--config requires a path"),
        },
        Some(other) => bail!("Unrecognized argument '{other}'. Usage: urbanheat [--config <path>]"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = UrbanHeatConfig::load_from_path(config_path_from_args()?)?;
    let provider = telemetry::init(&config.logging)?;

    let result = serve(&config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }

    telemetry::shutdown(provider);
    result
}

async fn serve(config: &UrbanHeatConfig) -> Result<()> {
    let log: Arc<dyn QueryLog> = Arc::new(
        FjallQueryLog::open(&config.storage.path)
            .with_context(|| format!("Failed to open query log at {}", config.storage.path))?,
    );
    let analyzer = Arc::new(Analyzer::from_config(config, log)?);

    tracing::info!(
        "Loaded {} city presets; prediction service at {}",
        analyzer.catalog().keys().count(),
        config.services.predictor_url
    );

    web::run(&config.server, AppState::new(analyzer)).await
}
