//! # Review Manifest
//!
//! Collects the glyph PNGs of every page directory under a glyphs root into
//! one flat review directory, renamed `letter_00000.png`, `letter_00001.png`,
//! ... best quality first, and describes them in `manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ExtractionError, ExtractionResult};
use crate::glyph::BoundingBox;
use crate::observability;
use crate::persist::METADATA_FILE;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Quality assigned when neither metadata nor the file name carries one
pub const DEFAULT_QUALITY: u32 = 85;

/// Size assigned when a PNG header cannot be read
pub const FALLBACK_SIZE: (u32, u32) = (40, 40);

// Quality tag in generated file names, e.g. `char_0042_q67`
lazy_static! {
    static ref QUALITY_TAG: Regex =
        Regex::new(r"(?:^|_)q(\d+)(?:_|$)").expect("Quality tag pattern should be valid");
}

/// One reviewed letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: usize,
    /// File name inside the review directory
    pub filename: String,
    /// Page directory the glyph came from
    pub source: String,
    pub source_image: String,
    /// Quality as an integer percentage
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewManifest {
    pub letters: Vec<ManifestEntry>,
}

impl ReviewManifest {
    pub fn with_bbox_count(&self) -> usize {
        self.letters.iter().filter(|l| l.bbox.is_some()).count()
    }
}

// Lenient view of `metadata.json`; tolerates files written by older runs
#[derive(Debug, Default, Deserialize)]
struct StoredMetadata {
    #[serde(default)]
    source_image: Option<String>,
    #[serde(default)]
    characters: Vec<StoredCharacter>,
}

#[derive(Debug, Deserialize)]
struct StoredCharacter {
    file: String,
    #[serde(default)]
    quality: Option<f32>,
    #[serde(default)]
    source_image: Option<String>,
    #[serde(default)]
    bbox: Option<BoundingBox>,
}

#[derive(Debug)]
struct Collected {
    path: PathBuf,
    source: String,
    source_image: String,
    quality: u32,
    width: u32,
    height: u32,
    bbox: Option<BoundingBox>,
}

/// Parses the `q<NN>` segment of a glyph file stem.
///
/// ```
/// use sinaiticus_glyphs::review::quality_from_filename;
///
/// assert_eq!(quality_from_filename("char_0042_q67"), Some(67));
/// assert_eq!(quality_from_filename("char_3f2a"), None);
/// ```
pub fn quality_from_filename(stem: &str) -> Option<u32> {
    QUALITY_TAG
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn sorted_entries(dir: &Path) -> ExtractionResult<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();
    Ok(paths)
}

fn read_metadata(page_dir: &Path) -> Option<StoredMetadata> {
    let path = page_dir.join(METADATA_FILE);
    if !path.exists() {
        return None;
    }
    let parsed = fs::read_to_string(&path)
        .map_err(ExtractionError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(ExtractionError::from));
    match parsed {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Ignoring unreadable page metadata"
            );
            None
        }
    }
}

fn collect_page(page_dir: &Path) -> ExtractionResult<Vec<Collected>> {
    let source = page_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let metadata = read_metadata(page_dir);
    let has_metadata = metadata.is_some();
    let metadata = metadata.unwrap_or_default();
    let page_source_image = metadata
        .source_image
        .clone()
        .unwrap_or_else(|| format!("{}.jpg", source));

    // First record wins when a file is listed twice
    let mut records: HashMap<&str, &StoredCharacter> = HashMap::new();
    for character in &metadata.characters {
        records.entry(character.file.as_str()).or_insert(character);
    }

    let mut collected = Vec::new();
    for path in sorted_entries(page_dir)? {
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if !path.is_file() || !is_png {
            continue;
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = records.get(filename.as_str()).copied();

        let quality = record
            .and_then(|r| r.quality)
            .map(|q| (q * 100.0) as u32)
            .or_else(|| quality_from_filename(&stem))
            .unwrap_or(DEFAULT_QUALITY);

        let (width, height) = image::image_dimensions(&path).unwrap_or(FALLBACK_SIZE);

        collected.push(Collected {
            source: source.clone(),
            source_image: record
                .and_then(|r| r.source_image.clone())
                .unwrap_or_else(|| page_source_image.clone()),
            quality,
            width,
            height,
            bbox: record.and_then(|r| r.bbox),
            path,
        });
    }

    debug!(
        source = %source,
        glyphs = collected.len(),
        has_metadata = has_metadata,
        "Collected page glyphs for review"
    );

    Ok(collected)
}

/// Builds the review directory and its manifest from a glyphs root.
///
/// Existing `letter_*.png` files and `manifest.json` in `review_dir` are
/// overwritten.
pub fn build_review_manifest(
    glyphs_root: &Path,
    review_dir: &Path,
) -> ExtractionResult<ReviewManifest> {
    let start_time = Instant::now();
    let span = observability::review_span(&glyphs_root.display().to_string());
    let _guard = span.enter();

    if !glyphs_root.is_dir() {
        return Err(ExtractionError::InputDirectory(format!(
            "{}: not a directory",
            glyphs_root.display()
        )));
    }
    fs::create_dir_all(review_dir)?;

    let mut collected = Vec::new();
    for page_dir in sorted_entries(glyphs_root)? {
        if page_dir.is_dir() {
            collected.extend(collect_page(&page_dir)?);
        }
    }

    // Stable: equal qualities keep directory order
    collected.sort_by(|a, b| b.quality.cmp(&a.quality));

    let mut manifest = ReviewManifest::default();
    for (id, item) in collected.into_iter().enumerate() {
        let filename = format!("letter_{:05}.png", id);
        fs::copy(&item.path, review_dir.join(&filename))?;

        manifest.letters.push(ManifestEntry {
            id,
            filename,
            source: item.source,
            source_image: item.source_image,
            quality: item.quality,
            width: item.width,
            height: item.height,
            bbox: item.bbox,
        });

        if (id + 1) % 500 == 0 {
            info!(copied = id + 1, "Review preparation progress");
        }
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(review_dir.join(MANIFEST_FILE), json)?;

    observability::record_review_metrics(manifest.letters.len(), start_time.elapsed());
    info!(
        letters = manifest.letters.len(),
        with_bbox = manifest.with_bbox_count(),
        review_dir = %review_dir.display(),
        "Review manifest written"
    );

    Ok(manifest)
}
