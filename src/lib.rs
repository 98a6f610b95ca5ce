//! # Gallery Asset Pipeline Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `file_manager`: Operazioni sui file e discovery immagini
//! - `transcoder`: Ricodifica immagini (JPEG/PNG/WebP) in-place
//! - `backup`: Snapshot dell'albero sorgente prima di ogni modifica
//! - `optimizer`: Orchestratore del processo batch
//! - `report`: Accumulo risultati e report finale
//! - `progress`: Progress tracking
//! - `catalog`: Generazione del catalogo tipizzato per il front-end
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use gallery_asset_pipeline::{BatchOptimizer, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let optimizer = BatchOptimizer::new(std::path::Path::new("public/images"), config)?;
//! let report = optimizer.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod catalog;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod optimizer;
pub mod progress;
pub mod report;
pub mod transcoder;

pub use catalog::{Catalog, CatalogEntry, CatalogGenerator};
pub use config::Config;
pub use error::OptimizeError;
pub use optimizer::BatchOptimizer;
pub use report::{BatchReport, OptimizationResult};
pub use transcoder::ImageTranscoder;
