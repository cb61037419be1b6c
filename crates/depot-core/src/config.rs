//! Configuration module
//!
//! Runtime settings for the upload service, read from the process environment
//! (and a `.env` file when present).

use std::env;
use std::path::PathBuf;

const SERVER_PORT: u16 = 4000;
const IMAGE_MAX_BYTES: u64 = 10 * 1024 * 1024;
const FILE_MAX_BYTES: u64 = 50 * 1024 * 1024;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Pre-existing, writable directory that receives uploads. Never created by the service.
    pub storage_dir: PathBuf,
    pub image_max_bytes: u64,
    pub file_max_bytes: u64,
    pub http_concurrency_limit: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .map_err(|_| anyhow::anyhow!("STORAGE_DIR must be set to an existing directory"))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            storage_dir,
            image_max_bytes: env::var("IMAGE_MAX_BYTES")
                .unwrap_or_else(|_| IMAGE_MAX_BYTES.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("IMAGE_MAX_BYTES must be a byte count"))?,
            file_max_bytes: env::var("FILE_MAX_BYTES")
                .unwrap_or_else(|_| FILE_MAX_BYTES.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FILE_MAX_BYTES must be a byte count"))?,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            cors_origins,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_max_bytes == 0 || self.file_max_bytes == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_MAX_BYTES and FILE_MAX_BYTES must be greater than zero"
            ));
        }

        if !self.storage_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "STORAGE_DIR {} does not exist or is not a directory",
                self.storage_dir.display()
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}
