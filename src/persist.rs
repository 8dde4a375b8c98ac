//! # Glyph Persistence
//!
//! Writes accepted glyphs of one page as PNG files together with
//! `metadata.json` and `quality_stats.json` under `<output_root>/<page stem>/`.
//! Existing files with the same names are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ExtractionConfig, NamingScheme};
use crate::errors::{error_logging, ExtractionError, ExtractionResult};
use crate::glyph::{BoundingBox, Glyph};
use crate::pipeline::PageExtraction;

pub const METADATA_FILE: &str = "metadata.json";
pub const QUALITY_STATS_FILE: &str = "quality_stats.json";

/// A page output directory that exists on disk.
///
/// Obtained only through [`OutputDir::create`], so every write goes to a
/// directory that was successfully created first.
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Creates `<root>/<stem>/` (and missing parents).
    pub fn create(root: &Path, stem: &str) -> ExtractionResult<Self> {
        let path = root.join(stem);
        fs::create_dir_all(&path).map_err(|e| {
            error_logging::log_filesystem_error(
                &e,
                "create_output_dir",
                Some(&path.display().to_string()),
            );
            ExtractionError::FileSystem(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// One entry of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRecord {
    pub id: usize,
    pub key: String,
    /// PNG file name relative to the page directory
    pub file: String,
    /// Same as `file`; read by tools that expect this field name
    pub filename: String,
    pub source_image: String,
    pub line: usize,
    pub bbox: BoundingBox,
    pub quality: f32,
    pub is_omega: bool,
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub source_image: String,
    pub characters: Vec<GlyphRecord>,
}

/// Glyph counts per quality band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    /// quality > 0.7
    pub excellent: usize,
    /// 0.5 < quality <= 0.7
    pub good: usize,
    /// 0.3 < quality <= 0.5
    pub fair: usize,
    /// quality <= 0.3
    pub poor: usize,
}

/// Contents of `quality_stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub total_extracted: usize,
    pub saved: usize,
    pub avg_quality: f32,
    pub quality_distribution: QualityDistribution,
    pub omega_detected: usize,
    pub generated_at: DateTime<Utc>,
}

impl QualityStats {
    /// Statistics over all extracted glyphs of a page
    pub fn from_glyphs(glyphs: &[Glyph], saved: usize) -> Self {
        let mut distribution = QualityDistribution::default();
        for glyph in glyphs {
            match glyph.quality {
                q if q > 0.7 => distribution.excellent += 1,
                q if q > 0.5 => distribution.good += 1,
                q if q > 0.3 => distribution.fair += 1,
                _ => distribution.poor += 1,
            }
        }

        let avg_quality = if glyphs.is_empty() {
            0.0
        } else {
            glyphs.iter().map(|g| g.quality).sum::<f32>() / glyphs.len() as f32
        };

        Self {
            total_extracted: glyphs.len(),
            saved,
            avg_quality,
            quality_distribution: distribution,
            omega_detected: glyphs.iter().filter(|g| g.is_omega).count(),
            generated_at: Utc::now(),
        }
    }
}

/// Result of persisting one page
#[derive(Debug, Clone)]
pub struct SavedPage {
    pub directory: PathBuf,
    pub metadata: PageMetadata,
    pub stats: QualityStats,
}

/// PNG file name of a glyph under the given naming scheme
pub fn glyph_filename(glyph: &Glyph, naming: NamingScheme) -> String {
    match naming {
        NamingScheme::Sequential => format!(
            "char_{:04}_q{:02}.png",
            glyph.id,
            (glyph.quality * 100.0) as u32
        ),
        NamingScheme::ContentKey => format!("char_{}.png", glyph.key),
    }
}

/// Page directory name: the source file name without its extension
pub fn page_stem(source_image: &str) -> String {
    Path::new(source_image)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_image.to_string())
}

/// Persists the accepted glyphs of a page, best first.
pub fn save_page(
    extraction: &PageExtraction,
    config: &ExtractionConfig,
) -> ExtractionResult<SavedPage> {
    let root = &config.output.output_dir;
    let stem = page_stem(&extraction.source_image);
    let output_dir = OutputDir::create(root, &stem)?;

    if config.output.save_preprocessed {
        let debug_path = root.join(format!("{}_preprocessed.png", stem));
        extraction.binary.save(&debug_path)?;
    }

    let mut accepted = extraction.accepted(config.quality.cutoff);
    accepted.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    if let Some(max) = config.output.max_glyphs_per_page {
        accepted.truncate(max);
    }

    let mut characters = Vec::with_capacity(accepted.len());
    for glyph in accepted {
        let filename = glyph_filename(glyph, config.output.naming);
        glyph.bitmap.save(output_dir.file(&filename))?;

        characters.push(GlyphRecord {
            id: glyph.id,
            key: glyph.key.clone(),
            file: filename.clone(),
            filename,
            source_image: glyph.source_image.clone(),
            line: glyph.line,
            bbox: glyph.bbox,
            quality: glyph.quality,
            is_omega: glyph.is_omega,
        });
    }

    let metadata = PageMetadata {
        source_image: extraction.source_image.clone(),
        characters,
    };
    write_json(&output_dir.file(METADATA_FILE), &metadata)?;

    let stats = QualityStats::from_glyphs(&extraction.glyphs, metadata.characters.len());
    write_json(&output_dir.file(QUALITY_STATS_FILE), &stats)?;

    debug!(
        target: "glyph_extraction",
        "Saved {} of {} glyphs to {}",
        stats.saved,
        stats.total_extracted,
        output_dir.path().display()
    );

    Ok(SavedPage {
        directory: output_dir.path().to_path_buf(),
        metadata,
        stats,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ExtractionResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads a page's `metadata.json`
pub fn load_metadata(page_dir: &Path) -> ExtractionResult<PageMetadata> {
    let content = fs::read_to_string(page_dir.join(METADATA_FILE))?;
    Ok(serde_json::from_str(&content)?)
}
