//! # Gallery Asset Pipeline - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Avvio della pipeline richiesta (optimize o catalog)
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (subcommand + parametri)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Valida che la images root esista
//! 4. `optimize`: backup + ricodifica in-place + report finale
//! 5. `catalog`: walk + ordinamento naturale + emissione TypeScript
//!
//! ## Esempio di utilizzo:
//! ```bash
//! gallery-assets optimize public/images --max-width 1920
//! gallery-assets catalog public/images src/data/imagesData.ts
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use gallery_asset_pipeline::{report, BatchOptimizer, CatalogGenerator, Config};

#[derive(Parser)]
#[command(name = "gallery-assets")]
#[command(about = "Optimize gallery images in place and generate the typed catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Shrink every image under the category tree, in place, after a full backup
    Optimize {
        /// Root directory containing one subdirectory per category
        images_root: PathBuf,

        /// Maximum image width in pixels (ceiling, never upscales)
        #[arg(short, long, default_value = "1920")]
        max_width: u32,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value = "85")]
        jpeg_quality: u8,

        /// WebP quality (1-100)
        #[arg(short, long, default_value = "85")]
        webp_quality: u8,

        /// PNG compression level (0-9)
        #[arg(short, long, default_value = "6")]
        png_compression: u8,

        /// Backup directory (default: sibling "<images_root>_backup")
        #[arg(short, long)]
        backup_dir: Option<PathBuf>,
    },

    /// Generate the typed image catalog consumed by the front-end
    Catalog {
        /// Root directory containing one subdirectory per category
        images_root: PathBuf,

        /// Output TypeScript file
        output: PathBuf,

        /// Web root the src paths are relative to (default: parent of images_root)
        #[arg(long)]
        public_root: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Optimize {
            images_root,
            max_width,
            jpeg_quality,
            webp_quality,
            png_compression,
            backup_dir,
        } => {
            if !images_root.exists() {
                return Err(anyhow::anyhow!(
                    "Images root does not exist: {}",
                    images_root.display()
                ));
            }

            let config = Config {
                max_width,
                jpeg_quality,
                webp_quality,
                png_compression,
                backup_dir,
            };

            let optimizer = BatchOptimizer::new(&images_root, config)?;
            let batch_report = optimizer.run().await?;

            println!("{}", report::format_report(&batch_report, optimizer.backup_root()));
        }

        Command::Catalog {
            images_root,
            output,
            public_root,
        } => {
            let public_root = public_root.unwrap_or_else(|| {
                images_root
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
            });

            let generator = CatalogGenerator::new(&images_root, &public_root);
            let catalog = generator.build()?;
            CatalogGenerator::write(&catalog, &output).await?;

            info!("Wrote {} with {} images", output.display(), catalog.entries.len());
            for warning in &catalog.warnings {
                warn!("{}", warning);
            }
        }
    }

    Ok(())
}
