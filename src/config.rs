use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub uploads: UploadsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// On-disk layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the review collection file; never served to clients
    pub data_dir: PathBuf,
    /// Directory holding uploaded hero images
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            upload_dir: PathBuf::from("public/uploads"),
        }
    }
}

/// Upload handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// URL prefix under which stored images are served
    pub public_prefix: String,
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            public_prefix: "/uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (review-board.yml)
    pub fn load_default() -> Result<Self> {
        Self::load("review-board.yml")
    }

    /// Path of the review collection file inside the data directory
    pub fn reviews_file(&self) -> PathBuf {
        self.storage.data_dir.join("reviews.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr.port(), 3000);
        assert_eq!(config.uploads.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.reviews_file(), PathBuf::from("data/reviews.json"));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  bind_addr: 0.0.0.0:8080

storage:
  data_dir: /var/lib/review-board
  upload_dir: /var/lib/review-board/uploads

uploads:
  max_bytes: 1048576
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.bind_addr.port(), 8080);
        assert_eq!(
            config.reviews_file(),
            PathBuf::from("/var/lib/review-board/reviews.json")
        );
        assert_eq!(config.uploads.max_bytes, 1024 * 1024);
        // Sections not present fall back to defaults.
        assert_eq!(config.uploads.public_prefix, "/uploads");
    }
}
