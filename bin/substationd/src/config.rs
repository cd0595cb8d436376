//! Server configuration.
//!
//! Loaded from a TOML file. A bare context name resolves to
//! `/etc/substation/<name>.toml`; anything containing `/` or `.` is used as a
//! path directly.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use substation_nameplate::service::ImageMode;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub station: StationSection,

    pub storage: StorageSection,

    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationSection {
    #[serde(default = "default_station")]
    pub name: String,
}

impl Default for StationSection {
    fn default() -> Self {
        Self {
            name: default_station(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Directory holding all persistent state.
    pub data_dir: String,

    /// `uploads` (files under `{data_dir}/uploads`, served at `/uploads/`)
    /// or `inline` (base64 data URIs embedded in records).
    #[serde(default = "default_image_mode")]
    pub image_mode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSection {
    /// Operator username. Login returns a server error until both
    /// credentials are configured.
    pub username: Option<String>,
    pub password: Option<String>,

    /// Token signing secret. Unset falls back to the development secret.
    pub secret: Option<String>,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_station() -> String {
    "400kV Shankarpally".to_string()
}

fn default_image_mode() -> String {
    "uploads".to_string()
}

fn default_token_ttl() -> i64 {
    8 * 60 * 60
}

impl Default for ServerConfig {
    /// Development defaults: everything under `./data`, no credentials.
    fn default() -> Self {
        Self {
            listen: default_listen(),
            station: StationSection::default(),
            storage: StorageSection {
                data_dir: "data".to_string(),
                image_mode: default_image_mode(),
            },
            auth: AuthSection::default(),
        }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/substation/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn image_mode(&self) -> anyhow::Result<ImageMode> {
        match self.storage.image_mode.as_str() {
            "uploads" => Ok(ImageMode::Uploads),
            "inline" => Ok(ImageMode::Inline),
            other => anyhow::bail!("unknown image_mode '{}': expected 'uploads' or 'inline'", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let config: ServerConfig = toml::from_str(
            r#"
            listen = "127.0.0.1:8090"

            [station]
            name = "220kV Parigi"

            [storage]
            data_dir = "/var/lib/substation"
            image_mode = "inline"

            [auth]
            username = "operator"
            password = "hunter2"
            secret = "prod-secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "127.0.0.1:8090");
        assert_eq!(config.station.name, "220kV Parigi");
        assert_eq!(config.image_mode().unwrap(), ImageMode::Inline);
        assert_eq!(config.auth.token_ttl_secs, 8 * 60 * 60);
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/tmp/substation"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:5000");
        assert_eq!(config.station.name, "400kV Shankarpally");
        assert_eq!(config.image_mode().unwrap(), ImageMode::Uploads);
        assert!(config.auth.username.is_none());
    }

    #[test]
    fn rejects_unknown_image_mode() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/tmp/substation"
            image_mode = "s3"
            "#,
        )
        .unwrap();
        assert!(config.image_mode().is_err());
    }

    #[test]
    fn context_name_resolution() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/substation/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }
}
