use anyhow::{Context, Result};
use std::path::Path;
use taskspec::ValidationConfig;

/// Logs go to stderr so reports on stdout stay machine-readable.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Load the config at `path`, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<ValidationConfig> {
    match path {
        Some(path) => ValidationConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ValidationConfig::default()),
    }
}
