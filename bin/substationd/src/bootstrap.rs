//! First-start configuration checks.

use tracing::warn;

use crate::config::ServerConfig;

/// Verify the configuration is usable before opening any storage.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("storage.data_dir is empty in configuration");
    }
    config.image_mode()?;

    if config.auth.username.is_none() || config.auth.password.is_none() {
        warn!("operator credentials are not configured; login will fail until auth.username and auth.password are set");
    }
    if config.auth.secret.is_none() {
        warn!("auth.secret is not set; falling back to the development signing secret — do not run this in production");
    }
    Ok(())
}
