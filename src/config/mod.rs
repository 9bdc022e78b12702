use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_MAX_VIDEO_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error)]
#[error("{key} must be a valid {expected}, got {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub expected: &'static str,
}

// Top-level configuration container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub uploads: UploadsConfig,
    pub cors: CorsConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

// Where uploaded media lives and how it is addressed from outside
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    pub dir: PathBuf,
    pub public_url: String,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

// Settings for the calendrix-notifier binary
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    pub api_url: String,
    pub poll_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or("PORT", 3000, "port number")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "calendrix=debug,tower_http=debug"),
                log_format: match var_or("LOG_FORMAT", "text").to_lowercase().as_str() {
                    "text" => LogFormat::Text,
                    "json" => LogFormat::Json,
                    other => {
                        return Err(ConfigError {
                            key: "LOG_FORMAT",
                            value: other.to_string(),
                            expected: "log format (text or json)",
                        })
                    }
                },
            },
            uploads: UploadsConfig {
                dir: PathBuf::from(var_or("UPLOADS_DIR", "./uploads")),
                public_url: var_or("PUBLIC_URL", "http://localhost:3000")
                    .trim_end_matches('/')
                    .to_string(),
                max_image_bytes: parse_or("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES, "byte count")?,
                max_video_bytes: parse_or("MAX_VIDEO_BYTES", DEFAULT_MAX_VIDEO_BYTES, "byte count")?,
            },
            cors: CorsConfig {
                allowed_origin: var_or("CORS_ALLOWED_ORIGIN", "http://localhost:3001"),
            },
            notifier: NotifierConfig {
                api_url: var_or("API_URL", "http://localhost:3000")
                    .trim_end_matches('/')
                    .to_string(),
                poll_seconds: parse_or("NOTIFIER_POLL_SECONDS", 30, "number of seconds")?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl UploadsConfig {
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        UploadsConfig {
            dir: dir.into(),
            public_url: "http://localhost:3000".to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError {
            key,
            value: raw,
            expected,
        }),
        Err(_) => Ok(default),
    }
}
