//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Image`: Errori di decodifica/codifica immagini (file corrotti, etc.)
//! - `WebPEncode`: Errori del codificatore WebP lossy
//! - `UnsupportedFormat`: Estensione non supportata dalla pipeline
//! - `Backup`: Errori durante lo snapshot di backup
//! - `Validation`: Errori di validazione input

/// Custom error types for the asset pipeline
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("WebP encoding error: {0}")]
    WebPEncode(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("File validation error: {0}")]
    Validation(String),
}
