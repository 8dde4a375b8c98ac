//! # Character Segmentation
//!
//! Splits one text line of a binary page mask into glyph candidates.
//! Connected ink components are filtered by size and aspect ratio, cropped
//! with neighbouring ink masked out, checked for the double-bowl omega shape,
//! and wide non-omega components are split at a vertical projection valley
//! when one exists. The splitter is a best-effort heuristic: ligatures and
//! decorative marks can be mis-split and nothing corrects that afterwards.

use image::{GrayImage, Luma};

use crate::components::{count_ink_components, label_ink, ComponentStats, LabelImage};
use crate::config::SegmentationConfig;
use crate::glyph::{BoundingBox, GlyphCandidate};
use crate::preprocessing::filtering::dilate;
use crate::preprocessing::types::{StructuringElement, BACKGROUND, INK};

/// Segments one line crop into glyph candidates ordered left to right.
///
/// Candidate boxes are relative to the line crop; since lines span the full
/// page width, `x` is already a page column.
pub fn segment_line(line_mask: &GrayImage, config: &SegmentationConfig) -> Vec<GlyphCandidate> {
    if line_mask.width() == 0 || line_mask.height() == 0 {
        return Vec::new();
    }

    let (labels, stats) = label_ink(line_mask);
    let total_components = stats.len();

    let mut candidates: Vec<GlyphCandidate> = stats
        .iter()
        .filter(|component| passes_size_gates(component, config))
        .map(|component| {
            let mut bitmap = crop_component(&labels, component);
            if config.polarity_fix {
                normalize_polarity(&mut bitmap);
            }
            let is_omega = config.omega_detection && detect_omega(&bitmap, config);
            GlyphCandidate {
                bbox: BoundingBox {
                    x: component.x,
                    y: component.y,
                    width: component.width,
                    height: component.height,
                },
                bitmap,
                is_omega,
            }
        })
        .collect();

    candidates.sort_by_key(|candidate| candidate.bbox.x);

    let accepted = candidates.len();
    let mut segmented = Vec::with_capacity(accepted);
    for candidate in candidates {
        if config.split_touching && !candidate.is_omega {
            if let Some((left, right)) = split_touching(&candidate, config) {
                segmented.push(left);
                segmented.push(right);
                continue;
            }
        }
        segmented.push(candidate);
    }

    tracing::trace!(
        target: "glyph_extraction",
        components = total_components,
        accepted = accepted,
        glyphs = segmented.len(),
        "Line segmented"
    );

    segmented
        .into_iter()
        .map(|candidate| GlyphCandidate {
            bitmap: pad_bitmap(&candidate.bitmap, config.padding),
            ..candidate
        })
        .collect()
}

/// Size, area and aspect-ratio gates for a raw component.
pub fn passes_size_gates(component: &ComponentStats, config: &SegmentationConfig) -> bool {
    if component.width < config.min_width || component.height < config.min_height {
        return false;
    }
    if component.width > config.max_width || component.height > config.max_height {
        return false;
    }
    if component.area < config.min_area {
        return false;
    }
    let aspect = component.aspect_ratio();
    (config.min_aspect..=config.max_aspect).contains(&aspect)
}

/// Crops a component's bounding box, keeping only that component's ink.
fn crop_component(labels: &LabelImage, component: &ComponentStats) -> GrayImage {
    GrayImage::from_fn(component.width, component.height, |x, y| {
        if labels.get_pixel(component.x + x, component.y + y)[0] == component.label {
            Luma([INK])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Inverts a bitmap whose mean intensity says it is mostly ink.
fn normalize_polarity(bitmap: &mut GrayImage) {
    let total = (bitmap.width() as u64 * bitmap.height() as u64).max(1);
    let sum: u64 = bitmap.pixels().map(|p| p[0] as u64).sum();
    if sum / total < 127 {
        image::imageops::invert(bitmap);
    }
}

/// Detects the omega letterform: wider than tall, and its ink falls apart
/// into two or three pieces after a light erosion.
///
/// # Examples
///
/// ```
/// use image::{GrayImage, Luma};
/// use sinaiticus_glyphs::config::SegmentationConfig;
/// use sinaiticus_glyphs::segmentation::detect_omega;
///
/// // A single solid square is not an omega
/// let square = GrayImage::from_pixel(30, 30, Luma([0]));
/// assert!(!detect_omega(&square, &SegmentationConfig::default()));
/// ```
pub fn detect_omega(bitmap: &GrayImage, config: &SegmentationConfig) -> bool {
    let (width, height) = bitmap.dimensions();
    if height == 0 || (width as f32 / height as f32) < config.omega_min_aspect {
        return false;
    }

    // Growing the white background shrinks the ink strokes
    let eroded_ink = dilate(bitmap, StructuringElement::Ellipse3);
    let parts = count_ink_components(&eroded_ink) as u32;

    (config.omega_parts.0..=config.omega_parts.1).contains(&parts)
}

/// Ink pixels per column.
pub fn vertical_projection(bitmap: &GrayImage) -> Vec<u32> {
    let (width, height) = bitmap.dimensions();
    (0..width)
        .map(|x| (0..height).filter(|&y| bitmap.get_pixel(x, y)[0] == INK).count() as u32)
        .collect()
}

/// Splits a wide candidate into two at the deepest column of its middle third.
///
/// Returns `None` when the candidate is not wide enough, when the middle
/// third has no valley below `split_valley_ratio` of its maximum, or when
/// either half would be too narrow.
pub fn split_touching(
    candidate: &GlyphCandidate,
    config: &SegmentationConfig,
) -> Option<(GlyphCandidate, GlyphCandidate)> {
    let BoundingBox {
        x,
        y,
        width,
        height,
    } = candidate.bbox;
    if height == 0 || (width as f32 / height as f32) <= config.split_min_aspect {
        return None;
    }

    let projection = vertical_projection(&candidate.bitmap);
    let mid_start = (width / 3) as usize;
    let mid_end = (2 * width / 3) as usize;
    if mid_start >= mid_end || mid_end > projection.len() {
        return None;
    }

    let middle = &projection[mid_start..mid_end];
    let max = *middle.iter().max()?;
    let (offset, min) = middle
        .iter()
        .enumerate()
        .min_by_key(|&(index, value)| (*value, index))
        .map(|(index, value)| (index, *value))?;

    if (min as f32) >= max as f32 * config.split_valley_ratio {
        return None;
    }

    let split = (mid_start + offset) as u32;
    if split <= config.min_split_width || width - split <= config.min_split_width {
        return None;
    }

    let left_bitmap = image::imageops::crop_imm(&candidate.bitmap, 0, 0, split, height).to_image();
    let right_bitmap =
        image::imageops::crop_imm(&candidate.bitmap, split, 0, width - split, height).to_image();

    tracing::trace!(
        target: "glyph_extraction",
        x = x,
        width = width,
        split = split,
        "Split touching characters"
    );

    Some((
        GlyphCandidate {
            bbox: BoundingBox {
                x,
                y,
                width: split,
                height,
            },
            bitmap: left_bitmap,
            is_omega: false,
        },
        GlyphCandidate {
            bbox: BoundingBox {
                x: x + split,
                y,
                width: width - split,
                height,
            },
            bitmap: right_bitmap,
            is_omega: false,
        },
    ))
}

/// Surrounds a bitmap with a uniform white border.
pub fn pad_bitmap(bitmap: &GrayImage, padding: u32) -> GrayImage {
    if padding == 0 {
        return bitmap.clone();
    }
    let mut padded = GrayImage::from_pixel(
        bitmap.width() + 2 * padding,
        bitmap.height() + 2 * padding,
        Luma([BACKGROUND]),
    );
    image::imageops::replace(&mut padded, bitmap, padding as i64, padding as i64);
    padded
}
