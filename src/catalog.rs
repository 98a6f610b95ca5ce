//! # Catalog Generator Module
//!
//! Genera il catalogo tipizzato consumato dal front-end della gallery:
//! una lista ordinata di record `{id, category, label, src}` emessa come
//! modulo TypeScript.
//!
//! ## Responsabilità:
//! - Walk ricorsivo delle categorie in ordine fisso (`CATEGORY_ORDER`)
//! - Ordinamento naturale (numeric-aware) dei file di ogni categoria
//! - Validazione convenzione label (`<CAT>_` o `<CAT>-`) con warning non fatali
//! - Rilevamento label duplicate
//! - Emissione del modulo TypeScript
//!
//! Il catalogo condivide l'albero su disco con la pipeline di ottimizzazione
//! ma non dipende da essa: rieseguirlo dopo un'ottimizzazione produce gli
//! stessi path (l'ottimizzazione non rinomina mai i file).

use crate::file_manager::FileManager;
use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fixed, order-significant category set of the gallery.
pub const CATEGORY_ORDER: &[&str] = &["CH", "MT", "M4", "M5", "M6"];

/// One catalog record; `src` is a root-relative web path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub category: String,
    pub label: String,
    pub src: String,
}

/// The full ordered catalog plus the non-fatal warnings collected while
/// building it.
#[derive(Debug, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub warnings: Vec<String>,
}

/// Walks the image tree and produces the typed catalog.
pub struct CatalogGenerator {
    images_root: PathBuf,
    /// Web root the `src` paths are made relative to (typically the parent
    /// of the images root, i.e. the static `public/` directory)
    public_root: PathBuf,
}

impl CatalogGenerator {
    pub fn new(images_root: &Path, public_root: &Path) -> Self {
        Self {
            images_root: images_root.to_path_buf(),
            public_root: public_root.to_path_buf(),
        }
    }

    /// Builds the catalog: categories in fixed order, files of each category
    /// in natural order. Convention violations and duplicates become
    /// warnings, never errors.
    pub fn build(&self) -> Result<Catalog> {
        if !self.images_root.is_dir() {
            return Err(anyhow::anyhow!(
                "Missing folder: {}",
                self.images_root.display()
            ));
        }

        let mut catalog = Catalog::default();

        for &category in CATEGORY_ORDER {
            let category_dir = self.images_root.join(category);
            if !category_dir.is_dir() {
                catalog
                    .warnings
                    .push(format!("Missing category folder: {}", category_dir.display()));
                continue;
            }

            let mut files: Vec<PathBuf> = WalkDir::new(&category_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| FileManager::is_catalog_format(p))
                .collect();
            files.sort_by(|a, b| {
                natural_cmp(
                    &a.file_name().unwrap_or_default().to_string_lossy(),
                    &b.file_name().unwrap_or_default().to_string_lossy(),
                )
            });

            for file in files {
                let label = file
                    .file_stem()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned();

                let upper = label.to_uppercase();
                if !upper.starts_with(&format!("{}_", category))
                    && !upper.starts_with(&format!("{}-", category))
                {
                    catalog.warnings.push(format!(
                        "Label '{}' in {} does not start with '{}_' or '{}-'",
                        label, category, category, category
                    ));
                }

                catalog.entries.push(CatalogEntry {
                    id: label.clone(),
                    category: category.to_string(),
                    label,
                    src: self.web_path(&file),
                });
            }
        }

        self.check_duplicates(&mut catalog);
        Ok(catalog)
    }

    /// `/`-prefixed POSIX path relative to the public root.
    fn web_path(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.public_root).unwrap_or(file);
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}", joined.trim_start_matches('/'))
    }

    /// Duplicate labels across the whole catalog become one warning listing
    /// the offenders in natural order.
    fn check_duplicates(&self, catalog: &mut Catalog) {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();

        for entry in &catalog.entries {
            if !seen.insert(entry.label.clone()) {
                dupes.push(entry.label.clone());
            }
        }

        if !dupes.is_empty() {
            dupes.sort_by(|a, b| natural_cmp(a, b));
            dupes.dedup();
            catalog
                .warnings
                .push(format!("Duplicate labels found: {}", dupes.join(", ")));
        }
    }

    /// Renders the catalog as a TypeScript module: category union type,
    /// record interface, and the ordered data array grouped by category.
    pub fn render_typescript(catalog: &Catalog) -> String {
        let union = CATEGORY_ORDER
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(" | ");

        let mut out = String::new();
        out.push_str(&format!("export type ImageCategory = {}\n\n", union));
        out.push_str("export interface GalleryImage {\n");
        out.push_str("  id: string\n");
        out.push_str("  category: ImageCategory\n");
        out.push_str("  label: string\n");
        out.push_str("  src: string\n");
        out.push_str("}\n\n");
        out.push_str("export const imagesData: GalleryImage[] = [\n");

        for &category in CATEGORY_ORDER {
            let group: Vec<_> = catalog
                .entries
                .iter()
                .filter(|e| e.category == category)
                .collect();
            if group.is_empty() {
                continue;
            }

            out.push_str(&format!("  // {}\n", category));
            for entry in group {
                out.push_str("  {\n");
                out.push_str(&format!("    id: \"{}\",\n", entry.id));
                out.push_str(&format!("    category: \"{}\",\n", entry.category));
                out.push_str(&format!("    label: \"{}\",\n", entry.label));
                out.push_str(&format!("    src: \"{}\",\n", entry.src));
                out.push_str("  },\n");
            }
            out.push('\n');
        }

        out.push_str("]\n");
        out
    }

    /// Writes the rendered module, creating parent directories as needed.
    pub async fn write(catalog: &Catalog, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, Self::render_typescript(catalog)).await?;
        Ok(())
    }
}

/// A filename split into digit runs and text runs for natural comparison.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPart {
    Number(u128),
    Text(String),
}

fn natural_key(s: &str) -> Vec<NaturalPart> {
    let mut key = Vec::new();
    let mut buf = String::new();
    let mut buf_is_digits = false;

    for ch in s.chars() {
        let is_digit = ch.is_ascii_digit();
        if !buf.is_empty() && is_digit != buf_is_digits {
            push_part(&mut key, &buf, buf_is_digits);
            buf.clear();
        }
        buf_is_digits = is_digit;
        buf.push(ch);
    }
    if !buf.is_empty() {
        push_part(&mut key, &buf, buf_is_digits);
    }

    key
}

fn push_part(key: &mut Vec<NaturalPart>, buf: &str, is_digits: bool) {
    if is_digits {
        key.push(NaturalPart::Number(buf.parse().unwrap_or(u128::MAX)));
    } else {
        key.push(NaturalPart::Text(buf.to_lowercase()));
    }
}

/// Natural (numeric-aware, case-insensitive) string ordering:
/// embedded numbers compare by value, so `img2` sorts before `img10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}
