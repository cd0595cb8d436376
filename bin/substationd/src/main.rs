//! `substationd` — the substation nameplate registry server.
//!
//! Usage:
//!   substationd [-c <context-name-or-path>] [--listen <addr>]
//!
//! The context name resolves to `/etc/substation/<name>.toml`; a value with
//! `/` or `.` is used as a path directly. Without `-c` the server runs with
//! development defaults under `./data`.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use substation_core::Module;
use tracing::info;

use config::ServerConfig;
use substation_auth::{AuthConfig, AuthModule, AuthService};
use substation_nameplate::NameplateModule;
use substation_nameplate::service::{ImageMode, NameplateService};

/// Substation nameplate registry server.
#[derive(Parser, Debug)]
#[command(name = "substationd", about = "Substation nameplate registry server")]
struct Cli {
    /// Context name or path to config file. Omit to run with development
    /// defaults (everything under ./data).
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen address (overrides the configured one).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let server_config = match cli.config.as_deref() {
        Some(name_or_path) => {
            let config_path = ServerConfig::resolve_path(name_or_path);
            info!("Loading configuration from {}", config_path.display());
            ServerConfig::load(&config_path)?
        }
        None => {
            info!("No configuration given; running with development defaults");
            ServerConfig::default()
        }
    };
    bootstrap::verify_config(&server_config)?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let listen = cli.listen.unwrap_or_else(|| server_config.listen.clone());
    let core_config = substation_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: listen.clone(),
        ..Default::default()
    };

    let sql = substation_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
        .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?;

    let image_mode = server_config.image_mode()?;
    let uploads_dir = core_config.resolve_uploads_dir();
    let blob = substation_blob::FileStore::open(&uploads_dir)
        .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?;

    // Serving handle for /uploads; only needed when photos live on disk.
    let uploads_serving = match image_mode {
        ImageMode::Uploads => Some(Arc::new(
            substation_blob::FileStore::open(&uploads_dir)
                .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
        )),
        ImageMode::Inline => None,
    };

    let auth_module = AuthModule::new(AuthService::new(AuthConfig {
        username: server_config.auth.username.clone(),
        password: server_config.auth.password.clone(),
        secret: server_config.auth.secret.clone(),
        token_ttl_secs: server_config.auth.token_ttl_secs,
    }));
    info!("Auth module initialized");

    let nameplate_service = NameplateService::new(
        Box::new(sql),
        Box::new(blob),
        server_config.station.name.clone(),
        image_mode,
    )?;
    let nameplate_module = NameplateModule::new(nameplate_service);
    info!("Nameplate module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (nameplate_module.name(), nameplate_module.routes()),
    ];

    let app = routes::build_router(module_routes, auth_module.authenticator(), uploads_serving);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("substationd listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}
