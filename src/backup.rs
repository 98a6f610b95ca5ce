//! # Backup Manager Module
//!
//! Snapshot completo dell'albero sorgente prima di qualsiasi modifica.
//! Lo snapshot è l'unico meccanismo di rollback del batch: deve completare
//! per intero prima che la prima immagine venga sovrascritta.
//!
//! ## Regole:
//! - Il backup precedente viene eliminato e ricreato (nessuno storico)
//! - Vengono copiati solo i file ottimizzabili (GIF e altri formati non
//!   vengono mai modificati, quindi non serve copiarli)
//! - La copia preserva i timestamp del file originale
//! - Un `backup_root` dentro `source_root` viene rifiutato

use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use std::fs::FileTimes;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Mirrors every optimizable file under `source_root` into `backup_root`.
///
/// The previous backup, if any, is removed first; the resulting tree is a
/// path-mirrored, read-only rollback point for the whole run. Returns the
/// number of files copied.
///
/// Any error aborts the snapshot and must abort the run: a partial backup
/// followed by mutation would leave no way to recover the originals.
pub async fn snapshot(source_root: &Path, backup_root: &Path) -> Result<usize, OptimizeError> {
    if backup_root.starts_with(source_root) {
        return Err(OptimizeError::Backup(format!(
            "backup directory {} is inside the source tree {}",
            backup_root.display(),
            source_root.display()
        )));
    }

    if backup_root.exists() {
        tokio::fs::remove_dir_all(backup_root).await?;
    }
    tokio::fs::create_dir_all(backup_root).await?;

    let mut copied = 0;
    for entry in WalkDir::new(source_root) {
        let entry = entry.map_err(|e| OptimizeError::Backup(e.to_string()))?;
        if !entry.file_type().is_file() || !FileManager::is_optimizable(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_root)
            .map_err(|e| OptimizeError::Backup(e.to_string()))?;
        let destination = backup_root.join(relative);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        copy_preserving_times(entry.path(), &destination)?;
        debug!("Backed up {} -> {}", entry.path().display(), destination.display());
        copied += 1;
    }

    Ok(copied)
}

/// Copies a file and carries over its accessed/modified timestamps.
fn copy_preserving_times(source: &Path, destination: &Path) -> Result<(), OptimizeError> {
    std::fs::copy(source, destination)?;

    let metadata = std::fs::metadata(source)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    let file = std::fs::File::options().write(true).open(destination)?;
    file.set_times(times)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn build_tree(root: &Path) {
        tokio::fs::create_dir_all(root.join("CH")).await.unwrap();
        tokio::fs::create_dir_all(root.join("MT/nested")).await.unwrap();
        tokio::fs::write(root.join("CH/ch_1.jpg"), b"jpeg bytes").await.unwrap();
        tokio::fs::write(root.join("CH/ch_2.png"), b"png bytes").await.unwrap();
        tokio::fs::write(root.join("CH/anim.gif"), b"gif bytes").await.unwrap();
        tokio::fs::write(root.join("CH/readme.txt"), b"text").await.unwrap();
        tokio::fs::write(root.join("MT/nested/mt_9.webp"), b"webp bytes")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn snapshot_mirrors_optimizable_files() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        build_tree(&source).await;

        let copied = snapshot(&source, &backup).await.unwrap();
        assert_eq!(copied, 3);

        assert_eq!(
            std::fs::read(backup.join("CH/ch_1.jpg")).unwrap(),
            b"jpeg bytes"
        );
        assert_eq!(
            std::fs::read(backup.join("MT/nested/mt_9.webp")).unwrap(),
            b"webp bytes"
        );
        assert!(!backup.join("CH/anim.gif").exists());
        assert!(!backup.join("CH/readme.txt").exists());
    }

    #[tokio::test]
    async fn snapshot_replaces_previous_backup() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        build_tree(&source).await;

        tokio::fs::create_dir_all(&backup).await.unwrap();
        tokio::fs::write(backup.join("stale.jpg"), b"old run").await.unwrap();

        snapshot(&source, &backup).await.unwrap();

        assert!(!backup.join("stale.jpg").exists());
        assert!(backup.join("CH/ch_1.jpg").exists());
    }

    #[tokio::test]
    async fn snapshot_preserves_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("images");
        let backup = temp_dir.path().join("images_backup");
        build_tree(&source).await;

        let original_mtime = std::fs::metadata(source.join("CH/ch_1.jpg"))
            .unwrap()
            .modified()
            .unwrap();

        snapshot(&source, &backup).await.unwrap();

        let backup_mtime = std::fs::metadata(backup.join("CH/ch_1.jpg"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(original_mtime, backup_mtime);
    }

    #[tokio::test]
    async fn snapshot_rejects_backup_inside_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("images");
        build_tree(&source).await;

        let err = snapshot(&source, &source.join("backup")).await.unwrap_err();
        assert!(matches!(err, OptimizeError::Backup(_)));
    }
}
