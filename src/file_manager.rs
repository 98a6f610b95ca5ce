//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery immagini.
//!
//! ## Responsabilità:
//! - Classificazione dei file per estensione (ottimizzabili vs solo-catalogo)
//! - Enumerazione delle categorie (sottodirectory dirette della root)
//! - Enumerazione dei file di una categoria in ordine lessicale
//! - Utilità per dimensioni e percentuali
//!
//! ## Formati supportati:
//! - **Ottimizzabili**: JPG, JPEG, PNG, WebP
//! - **Solo catalogo**: GIF (mai modificato dalla pipeline)

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Manages file classification and directory enumeration
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).await?;
        Ok(metadata.len())
    }

    /// Check if a file can be optimized (resized and re-encoded)
    pub fn is_optimizable(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png" | "webp")
        } else {
            false
        }
    }

    /// Check if a file belongs in the catalog (optimizable formats plus GIF)
    pub fn is_catalog_format(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png" | "webp" | "gif")
        } else {
            false
        }
    }

    /// List the category directories directly under the images root.
    ///
    /// Order is the directory-listing order, deliberately not the fixed
    /// category order the catalog uses.
    pub fn list_categories(images_root: &Path) -> Result<Vec<PathBuf>> {
        let mut categories = Vec::new();

        for entry in std::fs::read_dir(images_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                categories.push(entry.path());
            }
        }

        Ok(categories)
    }

    /// List the optimizable files directly inside a category, sorted by name.
    ///
    /// Plain lexical sort; nested subdirectories and non-optimizable
    /// extensions are skipped silently.
    pub fn list_category_files(category_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in std::fs::read_dir(category_dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && Self::is_optimizable(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
