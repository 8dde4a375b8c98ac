//! # Extraction Pipeline
//!
//! Runs preprocessing, line detection, segmentation and scoring on one page,
//! and drives a whole input directory through it. Pages share no state; a
//! page that fails is logged and skipped while the run continues.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::errors::{error_logging, ExtractionError, ExtractionResult};
use crate::glyph::{glyph_key, BoundingBox, Glyph};
use crate::lines::{detect_lines, TextLine};
use crate::observability;
use crate::persist::{save_page, SavedPage};
use crate::preprocessing::{assess_glyph_quality, preprocess_page};
use crate::segmentation::segment_line;

/// Page image extensions picked up by [`list_page_images`]
pub const PAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Everything extracted from one page, before persistence
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// File name of the source page
    pub source_image: String,
    pub page_width: u32,
    pub page_height: u32,
    pub lines: Vec<TextLine>,
    /// Every scored glyph in extraction order, including the ones that will
    /// not pass the quality cutoff
    pub glyphs: Vec<Glyph>,
    /// Binary mask the glyphs were cut from
    pub binary: GrayImage,
}

impl PageExtraction {
    /// Glyphs scoring strictly above the cutoff, in extraction order
    pub fn accepted(&self, cutoff: f32) -> Vec<&Glyph> {
        self.glyphs.iter().filter(|g| g.quality > cutoff).collect()
    }

    pub fn omega_count(&self) -> usize {
        self.glyphs.iter().filter(|g| g.is_omega).count()
    }
}

/// Aggregated counters of one batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub pages_found: usize,
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub glyphs_extracted: usize,
    pub glyphs_saved: usize,
    pub omega_detected: usize,
}

/// Extracts and scores every glyph of a decoded page.
///
/// Glyph ids are assigned in extraction order (line by line, left to right
/// within a line); boxes are in page coordinates.
pub fn process_page(
    image: &DynamicImage,
    source_image: &str,
    config: &ExtractionConfig,
) -> ExtractionResult<PageExtraction> {
    let start_time = Instant::now();

    let preprocessed = preprocess_page(image, &config.preprocess)?;
    let binary = preprocessed.binary;
    let (page_width, page_height) = binary.dimensions();

    let lines = detect_lines(&binary, &config.lines);

    let mut glyphs = Vec::new();
    for (line_index, line) in lines.iter().enumerate() {
        let line_mask =
            image::imageops::crop_imm(&binary, 0, line.start_row, page_width, line.height())
                .to_image();

        for candidate in segment_line(&line_mask, &config.segmentation) {
            let bbox = BoundingBox {
                y: line.start_row + candidate.bbox.y,
                ..candidate.bbox
            };
            let quality = assess_glyph_quality(&candidate.bitmap, config.quality.profile);

            glyphs.push(Glyph {
                id: glyphs.len(),
                key: glyph_key(source_image, &bbox),
                source_image: source_image.to_string(),
                line: line_index,
                bbox,
                bitmap: candidate.bitmap,
                quality: quality.score,
                is_omega: candidate.is_omega,
            });
        }
    }

    debug!(
        target: "glyph_extraction",
        "Page {} processed in {}ms: lines={}, glyphs={}, inverted={}",
        source_image,
        start_time.elapsed().as_millis(),
        lines.len(),
        glyphs.len(),
        preprocessed.inverted
    );

    Ok(PageExtraction {
        source_image: source_image.to_string(),
        page_width,
        page_height,
        lines,
        glyphs,
        binary,
    })
}

/// Loads, processes and persists one page file.
pub fn extract_page(path: &Path, config: &ExtractionConfig) -> ExtractionResult<SavedPage> {
    let source_image = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ExtractionError::ImageLoad(format!("Not a page file: {}", path.display()))
        })?;

    // Decoder chosen from the file header, the extension only breaks ties
    let image = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let extraction = process_page(&image, &source_image, config)?;
    observability::record_line_metrics(extraction.lines.len());

    save_page(&extraction, config)
}

/// Page image files of a directory, sorted by path.
///
/// A missing or unreadable directory is an [`ExtractionError::InputDirectory`].
pub fn list_page_images(input_dir: &Path) -> ExtractionResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| {
        ExtractionError::InputDirectory(format!("{}: {}", input_dir.display(), e))
    })?;

    let mut pages: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_page_extension(path))
        .collect();
    pages.sort();
    Ok(pages)
}

fn has_page_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Runs the pipeline over every page image of `input_dir`.
///
/// Only a missing input directory fails the run; page-level failures are
/// logged, counted in [`RunSummary::pages_skipped`] and skipped.
pub fn run_batch(input_dir: &Path, config: &ExtractionConfig) -> ExtractionResult<RunSummary> {
    let pages = list_page_images(input_dir)?;
    let mut summary = RunSummary {
        pages_found: pages.len(),
        ..RunSummary::default()
    };

    info!(
        input_dir = %input_dir.display(),
        output_dir = %config.output.output_dir.display(),
        pages = pages.len(),
        "Starting glyph extraction"
    );

    for (index, path) in pages.iter().enumerate() {
        let page_name = path.display().to_string();
        let span = observability::page_span(&page_name);
        let _guard = span.enter();

        let page_start = Instant::now();
        match extract_page(path, config) {
            Ok(saved) => {
                let duration = page_start.elapsed();
                observability::record_page_metrics(true, duration);
                observability::record_glyph_metrics(
                    saved.stats.total_extracted,
                    saved.stats.saved,
                    saved.stats.omega_detected,
                );

                summary.pages_processed += 1;
                summary.glyphs_extracted += saved.stats.total_extracted;
                summary.glyphs_saved += saved.stats.saved;
                summary.omega_detected += saved.stats.omega_detected;

                info!(
                    page = %page_name,
                    progress = format!("{}/{}", index + 1, pages.len()),
                    extracted = saved.stats.total_extracted,
                    saved = saved.stats.saved,
                    avg_quality = saved.stats.avg_quality,
                    output = %saved.directory.display(),
                    duration_ms = duration.as_millis() as u64,
                    "Page processed"
                );
            }
            Err(e) => {
                let duration = page_start.elapsed();
                observability::record_page_metrics(false, duration);
                observability::record_error_metrics(error_kind(&e), "page");
                error_logging::log_page_skipped(&e, &page_name, error_kind(&e), Some(duration));
                summary.pages_skipped += 1;
            }
        }
    }

    info!(
        pages_processed = summary.pages_processed,
        pages_skipped = summary.pages_skipped,
        glyphs_extracted = summary.glyphs_extracted,
        glyphs_saved = summary.glyphs_saved,
        omega_detected = summary.omega_detected,
        "Glyph extraction complete"
    );

    Ok(summary)
}

fn error_kind(error: &ExtractionError) -> &'static str {
    match error {
        ExtractionError::Config(_) => "config",
        ExtractionError::ImageLoad(_) => "image_load",
        ExtractionError::Processing(_) => "processing",
        ExtractionError::FileSystem(_) => "filesystem",
        ExtractionError::Metadata(_) => "metadata",
        ExtractionError::InputDirectory(_) => "input_directory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_extension_filter() {
        assert!(has_page_extension(Path::new("folio_1r.jpg")));
        assert!(has_page_extension(Path::new("folio_1r.JPEG")));
        assert!(has_page_extension(Path::new("folio_1r.png")));
        assert!(!has_page_extension(Path::new("metadata.json")));
        assert!(!has_page_extension(Path::new("README")));
    }

    #[test]
    fn test_list_page_images_sorted() {
        let dir = TempDir::new().expect("temp dir should be created");
        for name in ["b.png", "a.jpg", "notes.txt", "c.JPG"] {
            std::fs::write(dir.path().join(name), b"x").expect("write should succeed");
        }

        let pages = list_page_images(dir.path()).expect("listing should succeed");
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.JPG"]);
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let dir = TempDir::new().expect("temp dir should be created");
        let missing = dir.path().join("missing");

        let err = run_batch(&missing, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::InputDirectory(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_blank_page_has_no_glyphs() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 200, image::Luma([235])));
        let extraction = process_page(&page, "blank.png", &ExtractionConfig::default())
            .expect("blank page should process");

        assert!(extraction.lines.is_empty());
        assert!(extraction.glyphs.is_empty());
        assert_eq!(extraction.page_width, 300);
        assert_eq!(extraction.page_height, 200);
    }

    #[test]
    fn test_accepted_uses_strict_cutoff() {
        let bitmap = GrayImage::new(1, 1);
        let glyph = |id: usize, quality: f32| Glyph {
            id,
            key: String::new(),
            source_image: "p.png".to_string(),
            line: 0,
            bbox: BoundingBox {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            bitmap: bitmap.clone(),
            quality,
            is_omega: id == 2,
        };
        let extraction = PageExtraction {
            source_image: "p.png".to_string(),
            page_width: 1,
            page_height: 1,
            lines: Vec::new(),
            glyphs: vec![glyph(0, 0.3), glyph(1, 0.31), glyph(2, 0.9)],
            binary: bitmap.clone(),
        };

        let ids: Vec<_> = extraction.accepted(0.3).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(extraction.omega_count(), 1);
    }
}
