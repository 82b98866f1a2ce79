/// Configuration management for library-service
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;
use std::path::PathBuf;
use video_core::constants::DEFAULT_QUALITY;
use video_core::QualityTier;

const DEFAULT_PORT: u16 = 8085;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    /// Holds original uploads and one directory of renditions per video
    pub media_root: PathBuf,
    pub default_quality: QualityTier,
    pub stream_chunk_size: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_public_key_pem: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let quality_raw =
            std::env::var("DEFAULT_QUALITY").unwrap_or_else(|_| DEFAULT_QUALITY.to_string());
        let default_quality = QualityTier::from_str(&quality_raw)
            .ok_or_else(|| format!("DEFAULT_QUALITY has unknown tier {quality_raw:?}"))?;

        Ok(Config {
            app: AppConfig {
                host: std::env::var("LIBRARY_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("LIBRARY_SERVICE_PORT", DEFAULT_PORT),
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_format: match std::env::var("LOG_FORMAT").as_deref() {
                    Ok("json") => LogFormat::Json,
                    _ => LogFormat::Text,
                },
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/library".to_string()),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            },
            storage: StorageConfig {
                media_root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./uploads")),
                default_quality,
                stream_chunk_size: parse_env("STREAM_CHUNK_SIZE", DEFAULT_STREAM_CHUNK_SIZE)
                    .max(1),
            },
            auth: AuthConfig {
                jwt_public_key_pem: std::env::var("JWT_PUBLIC_KEY_PEM").ok(),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
