//! # Page Preprocessing Chain
//!
//! Grayscale conversion, CLAHE, multi-scale binarization and cleanup, run in
//! that order on one manuscript page.

use image::DynamicImage;

use super::filtering::{apply_clahe, apply_morphological_operation, reduce_noise};
use super::thresholding::apply_multiscale_threshold;
use super::types::{PreprocessedPage, PreprocessingError};
use crate::config::PreprocessConfig;

/// Turns a scanned page into a clean binary mask.
///
/// Steps:
/// 1. Convert to grayscale
/// 2. CLAHE contrast enhancement (if enabled)
/// 3. Multi-scale adaptive thresholding with polarity normalization
/// 4. Median filter against salt-and-pepper noise (skipped at radius 0)
/// 5. The configured morphology steps in order; by default a close with a
///    3x3 ellipse followed by an open with a 2x2 ellipse
///
/// # Examples
///
/// ```no_run
/// use sinaiticus_glyphs::config::PreprocessConfig;
/// use sinaiticus_glyphs::preprocessing::preprocess_page;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let page = image::open("data/quire_36_folio_1r.jpg")?;
/// let result = preprocess_page(&page, &PreprocessConfig::default())?;
/// result.binary.save("preprocessed.png")?;
/// # Ok(())
/// # }
/// ```
pub fn preprocess_page(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<PreprocessedPage, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PreprocessingError::EmptyImage);
    }

    let enhanced = if config.clahe_enabled {
        apply_clahe(&gray, config.clahe_clip_limit, config.clahe_tile_grid)?.image
    } else {
        gray
    };

    let thresholded = apply_multiscale_threshold(
        &enhanced,
        &config.threshold_scales,
        config.combine,
        config.polarity,
    )?;

    let mut binary = reduce_noise(&thresholded.image, config.median_radius);

    for step in &config.morphology {
        binary = apply_morphological_operation(&binary, step.operation, step.element)?.image;
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "glyph_extraction",
        "Page preprocessing completed in {}ms: dimensions={}x{}, inverted={}, clahe={}",
        processing_time.as_millis(),
        binary.width(),
        binary.height(),
        thresholded.inverted,
        config.clahe_enabled
    );

    Ok(PreprocessedPage {
        binary,
        enhanced,
        inverted: thresholded.inverted,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
