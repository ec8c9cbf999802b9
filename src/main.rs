use std::env;

use genstudio::{logger, proxy, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    genstudio::logger::init_with_config(
        logger::LoggerConfig::development().with_level(logger::LogLevel::Debug),
    )?;

    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    log::info!("🔍 Checking environment...");

    // Presence checks only, secret values are never printed.
    match env::var("GATEWAY_API_KEY") {
        Ok(key) => {
            log::info!("✅ Gateway API key found in environment");
            log::debug!("Key starts with: {}...", &key[..5.min(key.len())]);
        }
        Err(_) => {
            log::error!("❌ GATEWAY_API_KEY is not set");
            log::error!("❌ The generation proxy cannot serve requests without a gateway key");
        }
    }

    match (env::var("STORAGE_URL"), env::var("STORAGE_SERVICE_KEY")) {
        (Ok(_), Ok(_)) => {
            log::info!("✅ Object storage credentials found in environment");
        }
        _ => {
            log::warn!("⚠️  No object storage credentials, generated images will be returned inline");
        }
    }

    match (env::var("HISTORY_URL"), env::var("HISTORY_SERVICE_KEY")) {
        (Ok(_), Ok(_)) => {
            log::info!("✅ History store credentials found in environment");
        }
        _ => {
            log::warn!("⚠️  No history store credentials, generations will not be recorded");
        }
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let port = config.port.unwrap_or(8080);
    logger::log_startup_info("genstudio", env!("CARGO_PKG_VERSION"), port);

    proxy::serve(config).await?;

    Ok(())
}
