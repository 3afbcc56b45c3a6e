use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub identity: Identity,
    pub media: Media,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        // Check in current directory
        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in mingle-server directory (for development)
        let dev_path = PathBuf::from("mingle-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        // 2. Defaults, overridable by environment variables below
        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "mingle.db")?
            .set_default("identity.base_url", "http://localhost:8081")?
            .set_default("media.base_url", "http://localhost:8082")?;

        // 3. Environment variables (highest priority)
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(identity_url) = std::env::var("IDENTITY_BASE_URL") {
            builder = builder.set_override("identity.base_url", identity_url)?;
        }
        if let Ok(media_url) = std::env::var("MEDIA_BASE_URL") {
            builder = builder.set_override("media.base_url", media_url)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}
