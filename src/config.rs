//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Parametri di configurazione:
//! - `max_width`: Larghezza massima in pixel (default: 1920, le immagini più
//!   strette restano alla risoluzione nativa)
//! - `jpeg_quality`: Qualità JPEG (1-100, default: 85)
//! - `webp_quality`: Qualità WebP (1-100, default: 85)
//! - `png_compression`: Livello compressione PNG (0-9, default: 6)
//! - `backup_dir`: Directory di backup (default: None = sibling `<root>_backup`)
//!
//! ## Validazione:
//! - Controlla che max_width sia > 0
//! - Controlla che jpeg_quality e webp_quality siano 1-100
//! - Controlla che png_compression sia 0-9
//!
//! ## Esempio:
//! ```rust
//! use gallery_asset_pipeline::Config;
//!
//! let config = Config {
//!     max_width: 1280,
//!     jpeg_quality: 80,
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the image optimization pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum image width in pixels (ceiling, not a target)
    pub max_width: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// WebP quality (1-100)
    pub webp_quality: u8,
    /// PNG compression level (0-9)
    pub png_compression: u8,
    /// Backup directory (None = sibling directory named `<root>_backup`)
    pub backup_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_width: 1920,
            jpeg_quality: 85,
            webp_quality: 85,
            png_compression: 6,
            backup_dir: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(anyhow::anyhow!("Max width must be greater than 0"));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("JPEG quality must be between 1 and 100"));
        }

        if self.webp_quality == 0 || self.webp_quality > 100 {
            return Err(anyhow::anyhow!("WebP quality must be between 1 and 100"));
        }

        if self.png_compression > 9 {
            return Err(anyhow::anyhow!("PNG compression must be between 0 and 9"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_quality = 85;
        config.webp_quality = 101;
        assert!(config.validate().is_err());

        config.webp_quality = 85;
        config.png_compression = 10;
        assert!(config.validate().is_err());

        config.png_compression = 6;
        config.max_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_width, 1920);
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.webp_quality, 85);
        assert_eq!(config.png_compression, 6);
        assert!(config.backup_dir.is_none());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            max_width: 1280,
            jpeg_quality: 80,
            webp_quality: 75,
            png_compression: 9,
            backup_dir: Some(PathBuf::from("/tmp/backup")),
        };

        // Save config
        original_config.save_to_file(&config_path).await.unwrap();

        // Load config
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.max_width, 1280);
        assert_eq!(loaded_config.jpeg_quality, 80);
        assert_eq!(loaded_config.webp_quality, 75);
        assert_eq!(loaded_config.png_compression, 9);
        assert_eq!(loaded_config.backup_dir, Some(PathBuf::from("/tmp/backup")));
    }

    #[tokio::test]
    async fn test_config_missing_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("missing.json");

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.max_width, Config::default().max_width);
    }
}
