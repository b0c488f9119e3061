//! Headless alert agent speaking newline-delimited JSON on stdin/stdout.
//!
//! Usage: `alfred-host [CONFIG_PATH]`. Without a path, `ALFRED_CONFIG` or the
//! platform config directory is used; a missing file means defaults.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use alfred::AlfredConfig;
use anyhow::Context;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AlfredConfig::default_config_path);

    let config = AlfredConfig::load_or_default(&config_path)
        .with_context(|| format!("cannot load config from {}", config_path.display()))?;
    config.validate().context("invalid config")?;

    let _log_guard = alfred::logging::init(&config.logging).context("cannot initialise logging")?;

    tracing::info!(config = %config_path.display(), "alfred-host starting");

    alfred::host::run_stdio_bridge(config).await.map_err(|e| {
        tracing::error!(error = %e, "alfred-host exited with error");
        anyhow::anyhow!("alfred-host failed: {e}")
    })?;

    tracing::info!("alfred-host shut down cleanly");
    Ok(())
}
