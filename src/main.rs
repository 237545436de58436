use std::time::Duration;

use tracing::{error, info, warn};

use filevault::{ApiToken, Config, Database, UserRepository};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = filevault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        filevault::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    info!("filevault - Multi-user file vault");

    let timeout = Duration::from_secs(config.database.busy_timeout_secs);
    let db = match Database::open_with_timeout(&config.database.path, timeout).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };
    info!("Database ready at {}", config.database.path);

    let token = match ApiToken::from_config(&config.api) {
        Some(token) => token,
        None => {
            let (token, secret) = ApiToken::generate();
            warn!("No api.token configured; generated an ephemeral token for this run");
            println!("API token: {secret}");
            token
        }
    };
    info!(fingerprint = %token.fingerprint(), "API token loaded");

    match UserRepository::new(db.pool()).count().await {
        Ok(count) => info!(users = count, "Store opened"),
        Err(e) => warn!("Failed to count users: {e}"),
    }
    info!(
        max_upload_mb = config.storage.max_upload_size_mb,
        recent_files_limit = config.storage.recent_files_limit,
        "Storage limits"
    );

    db.close().await;
}
