//! # Image Thresholding Module
//!
//! Multi-scale Gaussian adaptive thresholding. Each scale compares a pixel
//! with the Gaussian-weighted mean of its neighbourhood; the scales are then
//! merged into one mask and the polarity is normalized so that ink is black.

use image::{GrayImage, Luma};

use super::types::{PreprocessingError, ThresholdedImageResult, BACKGROUND, INK};
use crate::config::{PolarityCheck, ScaleCombine, ThresholdScale};


/// Gaussian sigma matching a square neighbourhood of `block_size` pixels.
pub fn sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Binarizes an image against its Gaussian-weighted local mean.
///
/// A pixel becomes background when it is brighter than the local mean minus
/// `scale.offset`, ink otherwise. Uniform regions therefore turn into
/// background regardless of their brightness.
pub fn apply_adaptive_threshold(
    image: &GrayImage,
    scale: ThresholdScale,
) -> Result<GrayImage, PreprocessingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessingError::EmptyImage);
    }
    if scale.block_size < 3 || scale.block_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!(
                "Block size must be odd and >= 3, got {}",
                scale.block_size
            ),
        });
    }

    let mean = imageproc::filter::gaussian_blur_f32(image, sigma_for_block(scale.block_size));

    let mut binary = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let local = mean.get_pixel(x, y)[0] as f32;
        let value = if pixel[0] as f32 > local - scale.offset {
            BACKGROUND
        } else {
            INK
        };
        binary.put_pixel(x, y, Luma([value]));
    }

    Ok(binary)
}

/// Whether a merged mask has ink and background swapped.
///
/// [`PolarityCheck::CentralMean`] looks at the central half of the page in
/// both directions, falling back to the whole mask when that region is empty.
pub fn needs_inversion(mask: &GrayImage, polarity: PolarityCheck) -> bool {
    let (width, height) = mask.dimensions();
    match polarity {
        PolarityCheck::InkMajority => {
            let total = width as u64 * height as u64;
            let ink = mask.pixels().filter(|p| p[0] == INK).count() as u64;
            ink > total - ink
        }
        PolarityCheck::CentralMean => {
            let (x0, x1) = (width / 4, 3 * width / 4);
            let (y0, y1) = (height / 4, 3 * height / 4);
            let (x0, x1, y0, y1) = if x0 < x1 && y0 < y1 {
                (x0, x1, y0, y1)
            } else {
                (0, width, 0, height)
            };

            let mut sum = 0u64;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += mask.get_pixel(x, y)[0] as u64;
                }
            }
            let count = ((x1 - x0) as u64 * (y1 - y0) as u64).max(1);
            (sum as f64 / count as f64) < 127.0
        }
    }
}

/// Runs every threshold scale and merges the results into one page mask.
///
/// After merging, the mask is inverted when `polarity` says ink and
/// background are swapped, which happens on scans with a dark background.
///
/// # Arguments
///
/// * `image` - Contrast-enhanced grayscale page
/// * `scales` - Threshold passes to run
/// * `combine` - Merge rule for the passes
/// * `polarity` - Inversion rule for the merged mask
///
/// # Examples
///
/// ```no_run
/// use sinaiticus_glyphs::config::PreprocessConfig;
/// use sinaiticus_glyphs::preprocessing::apply_multiscale_threshold;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gray = image::open("page.jpg")?.to_luma8();
/// let config = PreprocessConfig::default();
/// let result = apply_multiscale_threshold(
///     &gray,
///     &config.threshold_scales,
///     config.combine,
///     config.polarity,
/// )?;
/// println!("ink ratio: {:.3}", result.ink_ratio);
/// # Ok(())
/// # }
/// ```
pub fn apply_multiscale_threshold(
    image: &GrayImage,
    scales: &[ThresholdScale],
    combine: ScaleCombine,
    polarity: PolarityCheck,
) -> Result<ThresholdedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let Some((first, rest)) = scales.split_first() else {
        return Err(PreprocessingError::InvalidParameter {
            message: "At least one threshold scale is required".to_string(),
        });
    };

    let mut merged = apply_adaptive_threshold(image, *first)?;
    for scale in rest {
        let next = apply_adaptive_threshold(image, *scale)?;
        for (acc, other) in merged.pixels_mut().zip(next.pixels()) {
            let acc_ink = acc[0] == INK;
            let other_ink = other[0] == INK;
            let ink = match combine {
                ScaleCombine::Unanimous => acc_ink && other_ink,
                ScaleCombine::Any => acc_ink || other_ink,
            };
            acc[0] = if ink { INK } else { BACKGROUND };
        }
    }

    let total = (merged.width() as u64 * merged.height() as u64).max(1);
    let mut ink = merged.pixels().filter(|p| p[0] == INK).count() as u64;
    let inverted = needs_inversion(&merged, polarity);
    if inverted {
        image::imageops::invert(&mut merged);
        ink = total - ink;
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "glyph_extraction",
        "Multi-scale thresholding completed in {}ms: scales={}, combine={:?}, polarity={:?}, inverted={}, dimensions={}x{}",
        processing_time.as_millis(),
        scales.len(),
        combine,
        polarity,
        inverted,
        merged.width(),
        merged.height()
    );

    Ok(ThresholdedImageResult {
        image: merged,
        scales: scales.len(),
        inverted,
        ink_ratio: ink as f32 / total as f32,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
