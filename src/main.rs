//! RatticWeb settings inspector
//!
//! Loads the layered configuration, installs it as the process-wide settings
//! and prints the resolved values (secrets redacted) as JSON

use anyhow::{Context, Result};
use tracing::info;

use ratticweb_settings::utils::logging::{init_logging, LogFormat};
use ratticweb_settings::{version_info, ConfSources, Settings};

fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    let sources = ConfSources::from_env();
    let settings = Settings::load(&sources)
        .with_context(|| format!("Failed to load settings from {:?}", sources.defaults))?;

    init_logging(&settings.logging, LogFormat::from_env())
        .context("Failed to set tracing subscriber")?;

    info!("{}", version_info());
    info!("📁 Configured by: {:?}", settings.configured_by);
    info!("🔐 Authentication backends: {:?}", settings.auth.backends);
    if settings.is_debug() {
        info!("🔧 Debug mode enabled");
    }

    let settings = settings.install().context("Failed to install settings")?;

    let rendered = serde_json::to_string_pretty(settings).context("Failed to render settings")?;
    println!("{}", rendered);

    Ok(())
}
