//! # Batch Report Module
//!
//! Accumulo dei risultati per-file e formattazione del report finale.
//! Il report è un valore esplicito restituito dall'orchestratore (fold sui
//! file), non uno stato globale condiviso.

use crate::file_manager::FileManager;
use std::path::{Path, PathBuf};

/// Per-file savings below this percentage are left out of the itemized
/// listing (noise reduction) but still count toward the aggregate totals.
pub const ITEMIZED_MIN_PERCENT: f64 = 5.0;

/// Outcome of optimizing a single file. Transient: produced and consumed
/// within one batch run, never persisted.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Path of the asset (identity, stable across optimization)
    pub path: PathBuf,
    /// Whether transcoding completed
    pub succeeded: bool,
    /// Size before optimization, in bytes
    pub original_bytes: u64,
    /// Size after optimization; only present when `succeeded`
    pub optimized_bytes: Option<u64>,
}

impl OptimizationResult {
    pub fn success(path: PathBuf, original_bytes: u64, optimized_bytes: u64) -> Self {
        Self {
            path,
            succeeded: true,
            original_bytes,
            optimized_bytes: Some(optimized_bytes),
        }
    }

    pub fn failure(path: PathBuf, original_bytes: u64) -> Self {
        Self {
            path,
            succeeded: false,
            original_bytes,
            optimized_bytes: None,
        }
    }

    /// Percentage saved for this file (0 when failed or empty).
    pub fn percent_saved(&self) -> f64 {
        match self.optimized_bytes {
            Some(optimized) => FileManager::calculate_reduction(self.original_bytes, optimized),
            None => 0.0,
        }
    }
}

/// Aggregate of all per-file results for one run. Recomputed every run.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub total_files: usize,
    pub succeeded: usize,
    pub total_original_bytes: u64,
    pub total_optimized_bytes: u64,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one per-file result into the aggregate.
    pub fn record(&mut self, result: &OptimizationResult) {
        self.total_files += 1;
        self.total_original_bytes += result.original_bytes;
        if let Some(optimized) = result.optimized_bytes {
            self.succeeded += 1;
            self.total_optimized_bytes += optimized;
        }
    }

    pub fn failed(&self) -> usize {
        self.total_files - self.succeeded
    }

    pub fn bytes_saved(&self) -> u64 {
        self.total_original_bytes
            .saturating_sub(self.total_optimized_bytes)
    }

    /// Overall percentage saved, 0% when nothing was measured.
    pub fn percent_saved(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_bytes, self.total_optimized_bytes)
    }
}

/// Bytes as binary megabytes (bytes / 1024²).
fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Renders the fixed-format console summary, including the backup location
/// for manual rollback.
pub fn format_report(report: &BatchReport, backup_root: &Path) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(60));
    out.push_str("\n Optimization summary\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("Total files:     {}\n", report.total_files));
    out.push_str(&format!("Succeeded:       {}\n", report.succeeded));
    out.push_str(&format!(
        "Original size:   {:.2} MB\n",
        to_mb(report.total_original_bytes)
    ));
    out.push_str(&format!(
        "Optimized size:  {:.2} MB\n",
        to_mb(report.total_optimized_bytes)
    ));
    out.push_str(&format!(
        "Saved:           {:.2} MB ({:.1}%)\n",
        to_mb(report.bytes_saved()),
        report.percent_saved()
    ));
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!(
        "\nBackup of the originals kept at: {}\n",
        backup_root.display()
    ));
    out.push_str("Restore by copying files back from the backup.\n");
    out
}
