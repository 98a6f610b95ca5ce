//! # Image Transcoder Module
//!
//! Questo modulo ricodifica una singola immagine nel suo formato originale,
//! interamente in memoria: decodifica, normalizzazione colore, downsampling
//! condizionale e ricodifica con i parametri di qualità fissati dalla policy.
//!
//! ## Formati supportati
//!
//! | Formato | Input | Output | Codifica |
//! |---------|-------|--------|----------|
//! | JPEG    | ✅    | ✅     | lossy, qualità configurabile |
//! | PNG     | ✅    | ✅     | lossless, livello compressione configurabile |
//! | WebP    | ✅    | ✅     | lossy, qualità + method 6 |
//! | Altri   | ❌    | ❌     | `UnsupportedFormat` |
//!
//! ## Pipeline di ricodifica
//!
//! 1. **Rilevamento formato**: estensione file (case-insensitive), mai cambiata
//! 2. **Decodifica**: fallimento = errore per-file, non fatale per il batch
//! 3. **Normalizzazione colore**: canali alpha compositati su bianco opaco,
//!    altri modi convertiti a RGB
//! 4. **Downsampling**: solo se la larghezza supera `max_width` (Lanczos3)
//! 5. **Ricodifica** nel formato originale
//! 6. **Scrittura atomica**: file temporaneo + rename sull'originale

use crate::config::Config;
use crate::error::OptimizeError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageEncoder, Rgb, RgbImage};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Re-encodes single images in place, preserving their format.
///
/// The transcoder holds the quality/compression policy and performs every
/// step in memory; the destination file is only replaced once the encoded
/// bytes are complete, so a failed decode or encode leaves the original
/// untouched.
pub struct ImageTranscoder {
    /// Quality and compression settings for re-encoding
    config: Config,
}

impl ImageTranscoder {
    /// Creates a new ImageTranscoder with the provided configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Transcodes one image from `input_path` to `output_path`.
    ///
    /// The output format is implied by the *input* extension and never
    /// changes. Images wider than `max_width` are downsampled with a
    /// Lanczos3 filter, scaling height by the same ratio; narrower images
    /// keep their native resolution.
    ///
    /// Alpha and palette-derived transparency are composited onto an opaque
    /// white background before encoding. The JPEG path has no alpha channel,
    /// and a naive conversion would turn transparent pixels black.
    ///
    /// # Arguments
    /// * `input_path` - Image to read
    /// * `output_path` - Destination (the orchestrator passes the same path
    ///   for in-place overwrite)
    /// * `max_width` - Width ceiling in pixels
    ///
    /// # Errors
    /// * `UnsupportedFormat` for extensions outside jpg/jpeg/png/webp
    /// * `Image` for decode/encode failures (corrupt or truncated files)
    /// * `Io` for filesystem failures
    pub fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
        max_width: u32,
    ) -> Result<(), OptimizeError> {
        let ext = input_path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        let ext = match ext.as_deref() {
            Some(e @ ("jpg" | "jpeg" | "png" | "webp")) => e.to_string(),
            _ => {
                return Err(OptimizeError::UnsupportedFormat(format!(
                    "{}",
                    input_path.display()
                )))
            }
        };

        let decoded = image::open(input_path)?;
        let mut rgb = normalize_color(&decoded);

        if rgb.width() > max_width {
            let new_height = scaled_height(rgb.width(), rgb.height(), max_width);
            debug!(
                "Downsampling {} from {}x{} to {}x{}",
                input_path.display(),
                rgb.width(),
                rgb.height(),
                max_width,
                new_height
            );
            rgb = imageops::resize(&rgb, max_width, new_height, FilterType::Lanczos3);
        }

        let encoded = match ext.as_str() {
            "jpg" | "jpeg" => self.encode_jpeg(&rgb)?,
            "png" => self.encode_png(&rgb)?,
            "webp" => self.encode_webp(&rgb)?,
            _ => unreachable!("extension checked above"),
        };

        write_atomic(output_path, &encoded)
    }

    /// Encodes to JPEG with the configured quality (1-100 scale).
    fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, OptimizeError> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder.encode_image(image)?;
        Ok(buf)
    }

    /// Encodes to PNG, lossless, mapping the 0-9 compression level onto the
    /// encoder's presets (the deflate default level 6 maps to `Default`).
    fn encode_png(&self, image: &RgbImage) -> Result<Vec<u8>, OptimizeError> {
        let compression = match self.config.png_compression {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };

        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buf, compression, PngFilterType::Adaptive);
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::Rgb8,
        )?;
        Ok(buf)
    }

    /// Encodes to lossy WebP with the configured quality and the most
    /// exhaustive compression effort (method 6).
    fn encode_webp(&self, image: &RgbImage) -> Result<Vec<u8>, OptimizeError> {
        let mut webp_config = webp::WebPConfig::new().map_err(|_| {
            OptimizeError::WebPEncode("failed to initialize encoder configuration".to_string())
        })?;
        webp_config.quality = f32::from(self.config.webp_quality);
        webp_config.method = 6;

        let encoder = webp::Encoder::from_rgb(image.as_raw(), image.width(), image.height());
        let memory = encoder
            .encode_advanced(&webp_config)
            .map_err(|e| OptimizeError::WebPEncode(format!("{:?}", e)))?;
        Ok(memory.to_vec())
    }
}

/// Converts a decoded image to opaque RGB.
///
/// Sources with an alpha channel (palette images arrive from the decoder
/// already expanded to RGBA) are composited onto a white background using
/// the alpha channel as blend mask; every other mode converts to RGB
/// directly.
fn normalize_color(image: &DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        flatten_onto_white(image)
    } else {
        image.to_rgb8()
    }
}

/// Alpha-composites an image onto an opaque white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        // out = fg * a + 255 * (1 - a), with rounding
        let blend =
            |fg: u8| ((u16::from(fg) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        flat.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    flat
}

/// Proportionally scaled height for a target width: round(h * max_w / w).
fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
    scaled.max(1.0) as u32
}

/// Writes the encoded bytes next to the destination and atomically renames
/// them over it, so a crash mid-write cannot leave a truncated file.
fn write_atomic(output_path: &Path, bytes: &[u8]) -> Result<(), OptimizeError> {
    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(output_path).map_err(|e| OptimizeError::Io(e.error))?;
    Ok(())
}
