//! # Batch Orchestrator Module
//!
//! Orchestratore del processo batch: backup come precondizione
//! transazionale, walk delle categorie, un file alla volta, accumulo
//! esplicito dei risultati in un `BatchReport`.
//!
//! ## Flusso di esecuzione:
//! 1. Valida la configurazione e l'esistenza della images root (fail fast)
//! 2. Esegue lo snapshot di backup; qualsiasi errore abortisce il run prima
//!    che un originale venga toccato
//! 3. Enumera le categorie (ordine di directory listing) e i file di ogni
//!    categoria (ordine lessicale, solo figli diretti)
//! 4. Ricodifica ogni file in-place e registra il risultato
//! 5. Restituisce il report aggregato
//!
//! Esecuzione strettamente sequenziale: nessun file viene elaborato prima
//! che il backup dell'intero albero sia completo.

use crate::{
    backup,
    config::Config,
    file_manager::FileManager,
    progress::ProgressManager,
    report::{self, BatchReport, OptimizationResult},
    transcoder::ImageTranscoder,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Drives one optimization run over the category tree.
pub struct BatchOptimizer {
    config: Config,
    images_root: PathBuf,
    backup_root: PathBuf,
    transcoder: ImageTranscoder,
}

impl BatchOptimizer {
    /// Creates the orchestrator, failing fast (before any side effect) when
    /// the images root is missing or the configuration is invalid.
    pub fn new(images_root: &Path, config: Config) -> Result<Self> {
        config.validate()?;

        if !images_root.is_dir() {
            return Err(anyhow::anyhow!(
                "Images root does not exist: {}",
                images_root.display()
            ));
        }

        let backup_root = match &config.backup_dir {
            Some(dir) => dir.clone(),
            None => default_backup_root(images_root)?,
        };

        Ok(Self {
            transcoder: ImageTranscoder::new(config.clone()),
            config,
            images_root: images_root.to_path_buf(),
            backup_root,
        })
    }

    /// Where this run keeps its rollback snapshot.
    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Runs the whole batch: snapshot, then category-by-category, file-by-file
    /// in-place optimization, returning the aggregate report.
    ///
    /// Per-file failures are logged and tallied but never stop the batch;
    /// only the backup acts as a transactional gate.
    pub async fn run(&self) -> Result<BatchReport> {
        info!(
            "📦 Backing up original images to {}",
            self.backup_root.display()
        );
        let copied = backup::snapshot(&self.images_root, &self.backup_root)
            .await
            .map_err(|e| {
                anyhow::anyhow!("Backup failed, aborting before any file is touched: {}", e)
            })?;
        info!("✅ Backup complete ({} files)", copied);

        // Enumerate everything up front so the progress bar knows its length.
        let mut batches = Vec::new();
        let mut total_files = 0;
        for category in FileManager::list_categories(&self.images_root)? {
            let files = FileManager::list_category_files(&category)?;
            total_files += files.len();
            batches.push((category, files));
        }

        info!(
            "🖼️ Optimizing {} images (max width: {}px)",
            total_files, self.config.max_width
        );

        let progress = ProgressManager::new(total_files as u64);
        let mut batch_report = BatchReport::new();

        for (category, files) in batches {
            let category_name = category
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            info!("📁 Processing category: {}/", category_name);

            let mut category_count = 0;
            for file in files {
                let result = self.optimize_file(&file).await;
                log_itemized(&result);
                progress.update(
                    &file
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy(),
                );
                batch_report.record(&result);
                category_count += 1;
            }

            if category_count > 0 {
                info!("  ✅ Processed {} images", category_count);
            }
        }

        progress.finish(&format!(
            "Optimized {}/{} files, saved {}",
            batch_report.succeeded,
            batch_report.total_files,
            FileManager::format_size(batch_report.bytes_saved())
        ));

        Ok(batch_report)
    }

    /// Optimizes a single file in place and reports the outcome as a value.
    async fn optimize_file(&self, path: &Path) -> OptimizationResult {
        let original_bytes = match FileManager::file_size(path).await {
            Ok(size) => size,
            Err(e) => {
                warn!("❌ Cannot read {}: {}", path.display(), e);
                return OptimizationResult::failure(path.to_path_buf(), 0);
            }
        };

        match self
            .transcoder
            .transcode(path, path, self.config.max_width)
        {
            Ok(()) => match FileManager::file_size(path).await {
                Ok(optimized_bytes) => {
                    OptimizationResult::success(path.to_path_buf(), original_bytes, optimized_bytes)
                }
                Err(e) => {
                    warn!("❌ Cannot read optimized {}: {}", path.display(), e);
                    OptimizationResult::failure(path.to_path_buf(), original_bytes)
                }
            },
            Err(e) => {
                warn!("❌ Error processing {}: {}", path.display(), e);
                OptimizationResult::failure(path.to_path_buf(), original_bytes)
            }
        }
    }
}

/// Logs the per-file savings line, suppressing noise below the threshold.
fn log_itemized(result: &OptimizationResult) {
    let Some(optimized) = result.optimized_bytes else {
        return;
    };

    let percent = result.percent_saved();
    if percent > report::ITEMIZED_MIN_PERCENT {
        info!(
            "  ✓ {} {} → {} (-{:.1}%)",
            result
                .path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy(),
            FileManager::format_size(result.original_bytes),
            FileManager::format_size(optimized),
            percent
        );
    }
}

/// Sibling directory named after the images root: `<root>_backup`.
fn default_backup_root(images_root: &Path) -> Result<PathBuf> {
    let name = images_root
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Cannot derive a backup directory for {}", images_root.display()))?;
    let parent = images_root.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{}_backup", name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn small_config(backup_dir: PathBuf) -> Config {
        Config {
            max_width: 64,
            backup_dir: Some(backup_dir),
            ..Default::default()
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([40, 80, 120]))
            .save(path)
            .unwrap();
    }

    fn write_jpg(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save(path)
            .unwrap();
    }

    async fn build_tree(root: &Path) {
        tokio::fs::create_dir_all(root.join("CH")).await.unwrap();
        tokio::fs::create_dir_all(root.join("MT")).await.unwrap();
        write_jpg(&root.join("CH/ch_1.jpg"), 128, 64);
        write_png(&root.join("CH/ch_2.png"), 32, 32);
        tokio::fs::write(root.join("CH/anim.gif"), b"GIF89a").await.unwrap();
        write_png(&root.join("MT/mt_1.png"), 200, 100);
    }

    #[test]
    fn missing_root_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(BatchOptimizer::new(&missing, Config::default()).is_err());
    }

    #[test]
    fn default_backup_root_is_a_sibling() {
        let root = default_backup_root(Path::new("/data/public/images")).unwrap();
        assert_eq!(root, PathBuf::from("/data/public/images_backup"));
    }

    #[tokio::test]
    async fn run_optimizes_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        build_tree(&images).await;

        let original_bytes = std::fs::read(images.join("CH/ch_1.jpg")).unwrap();

        let optimizer =
            BatchOptimizer::new(&images, small_config(backup.clone())).unwrap();
        let report = optimizer.run().await.unwrap();

        // GIF is not counted; 3 optimizable files, all valid.
        assert_eq!(report.total_files, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed(), 0);

        // Oversized images were brought down to the ceiling.
        assert_eq!(image::open(images.join("CH/ch_1.jpg")).unwrap().width(), 64);
        assert_eq!(image::open(images.join("MT/mt_1.png")).unwrap().width(), 64);
        // Narrow image untouched in dimensions.
        assert_eq!(image::open(images.join("CH/ch_2.png")).unwrap().width(), 32);

        // Backup holds the pre-mutation bytes; GIF was not backed up.
        assert_eq!(
            std::fs::read(backup.join("CH/ch_1.jpg")).unwrap(),
            original_bytes
        );
        assert!(!backup.join("CH/anim.gif").exists());
    }

    #[tokio::test]
    async fn corrupt_and_empty_files_are_nonfatal() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        tokio::fs::create_dir_all(images.join("CH")).await.unwrap();
        write_png(&images.join("CH/ch_1.png"), 16, 16);
        tokio::fs::write(images.join("CH/broken.jpg"), b"not a jpeg")
            .await
            .unwrap();
        tokio::fs::write(images.join("CH/empty.png"), b"").await.unwrap();

        let optimizer =
            BatchOptimizer::new(&images, small_config(backup)).unwrap();
        let report = optimizer.run().await.unwrap();

        assert_eq!(report.total_files, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.total_files, report.succeeded + report.failed());

        // The corrupt file was left as-is rather than truncated.
        assert_eq!(
            std::fs::read(images.join("CH/broken.jpg")).unwrap(),
            b"not a jpeg"
        );
    }

    #[tokio::test]
    async fn second_run_is_nearly_stable() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        tokio::fs::create_dir_all(images.join("CH")).await.unwrap();
        write_jpg(&images.join("CH/ch_1.jpg"), 128, 64);
        write_png(&images.join("CH/ch_2.png"), 96, 48);

        let optimizer =
            BatchOptimizer::new(&images, small_config(backup)).unwrap();
        let first = optimizer.run().await.unwrap();
        let second = optimizer.run().await.unwrap();

        // Re-encoding already-optimized content must stay near-stable.
        assert_eq!(second.total_original_bytes, first.total_optimized_bytes);
        assert!(
            second.total_optimized_bytes as f64
                <= first.total_optimized_bytes as f64 * 1.05 + 64.0
        );
    }

    #[tokio::test]
    async fn alpha_png_survives_as_opaque_white_blend() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        tokio::fs::create_dir_all(images.join("CH")).await.unwrap();
        RgbaImage::from_pixel(24, 24, Rgba([0, 0, 0, 0]))
            .save(images.join("CH/ch_ghost.png"))
            .unwrap();

        let optimizer =
            BatchOptimizer::new(&images, small_config(backup)).unwrap();
        optimizer.run().await.unwrap();

        let out = image::open(images.join("CH/ch_ghost.png")).unwrap();
        assert!(!out.color().has_alpha());
        assert!(out.to_rgb8().pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
