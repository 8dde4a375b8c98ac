//! # Glyph Quality Assessment Module
//!
//! Scores an extracted glyph bitmap for ranking and filtering. The score is a
//! weighted combination of ink density, edge sharpness, connectivity and size
//! plausibility; the exact formula depends on the [`ScoringProfile`].

use image::{GrayImage, Luma};

use super::types::{GlyphQualityResult, BACKGROUND, INK};
use crate::components::count_ink_components;
use crate::config::ScoringProfile;

/// Canny hysteresis thresholds used for the edge term.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Assesses the quality of a padded glyph bitmap.
///
/// A blank bitmap has no ink, no edges and no components, so every term
/// except size plausibility is zero and the total stays below the default
/// cutoff of 0.3 under both profiles.
///
/// # Arguments
///
/// * `bitmap` - Padded glyph bitmap, ink dark on a white background
/// * `profile` - Scoring formula to apply
///
/// # Examples
///
/// ```
/// use image::{GrayImage, Luma};
/// use sinaiticus_glyphs::config::ScoringProfile;
/// use sinaiticus_glyphs::preprocessing::assess_glyph_quality;
///
/// let blank = GrayImage::from_pixel(40, 40, Luma([255]));
/// let quality = assess_glyph_quality(&blank, ScoringProfile::Refined);
/// assert!(quality.score < 0.3);
/// ```
pub fn assess_glyph_quality(bitmap: &GrayImage, profile: ScoringProfile) -> GlyphQualityResult {
    let (width, height) = bitmap.dimensions();
    let total_pixels = width as u64 * height as u64;
    if total_pixels == 0 {
        return GlyphQualityResult {
            score: 0.0,
            ink_ratio: 0.0,
            density_score: 0.0,
            edge_score: 0.0,
            connectivity_score: 0.0,
            size_score: 0.0,
        };
    }

    let binary = binarize(bitmap);
    let ink_pixels = binary.pixels().filter(|p| p[0] == INK).count() as u64;
    let ink_ratio = ink_pixels as f32 / total_pixels as f32;
    let edge_ratio = calculate_edge_ratio(&binary);

    let components = count_ink_components(&binary);
    let connectivity_score = if components == 0 {
        0.0
    } else {
        1.0 / components as f32
    };

    let size_score = if 20 < height && height < 120 && 15 < width && width < 100 {
        1.0
    } else {
        0.5
    };

    let (density_score, edge_score, score) = match profile {
        ScoringProfile::Refined => {
            let density = (1.0 - (ink_ratio - 0.15).abs() / 0.15).clamp(0.0, 1.0);
            let edge = (edge_ratio / 0.05).min(1.0);
            let score = density * 0.3 + edge * 0.3 + connectivity_score * 0.2 + size_score * 0.2;
            (density, edge, score)
        }
        ScoringProfile::Baseline => {
            let density = if (0.1..=0.4).contains(&ink_ratio) {
                1.0
            } else {
                (1.0 - (ink_ratio - 0.25).abs() * 2.0).max(0.0)
            };
            let edge = (edge_ratio * 20.0).min(1.0);
            let score = density * 0.4 + connectivity_score * 0.3 + edge * 0.3;
            (density, edge, score)
        }
    };

    GlyphQualityResult {
        score: score.clamp(0.0, 1.0),
        ink_ratio,
        density_score,
        edge_score,
        connectivity_score,
        size_score,
    }
}

/// Normalizes a glyph bitmap to strict ink/background values.
fn binarize(bitmap: &GrayImage) -> GrayImage {
    GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        if bitmap.get_pixel(x, y)[0] < 127 {
            Luma([INK])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Fraction of pixels marked as edges by the Canny detector.
fn calculate_edge_ratio(bitmap: &GrayImage) -> f32 {
    let (width, height) = bitmap.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let edges = imageproc::edges::canny(bitmap, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
    edge_pixels as f32 / (width as f32 * height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
    }

    /// Ring-shaped glyph with a stroke of 4px, padded by 8px
    fn create_ring_glyph() -> GrayImage {
        let size = 46u32;
        GrayImage::from_fn(size, size, |x, y| {
            let dx = x as f32 - 22.5;
            let dy = y as f32 - 22.5;
            let r = (dx * dx + dy * dy).sqrt();
            if (11.0..15.0).contains(&r) {
                Luma([INK])
            } else {
                Luma([BACKGROUND])
            }
        })
    }

    #[test]
    fn test_blank_glyph_scores_below_cutoff() {
        let blank = create_blank(40, 50);
        for profile in [ScoringProfile::Refined, ScoringProfile::Baseline] {
            let quality = assess_glyph_quality(&blank, profile);
            assert_eq!(quality.ink_ratio, 0.0);
            assert_eq!(quality.connectivity_score, 0.0);
            assert_eq!(quality.edge_score, 0.0);
            assert!(quality.score <= 0.2 + f32::EPSILON, "{:?}: {}", profile, quality.score);
        }
    }

    #[test]
    fn test_empty_bitmap() {
        let quality = assess_glyph_quality(&GrayImage::new(0, 0), ScoringProfile::Refined);
        assert_eq!(quality.score, 0.0);
    }

    #[test]
    fn test_ring_glyph_scores_above_cutoff() {
        let glyph = create_ring_glyph();
        let quality = assess_glyph_quality(&glyph, ScoringProfile::Refined);

        assert_eq!(quality.connectivity_score, 1.0);
        assert_eq!(quality.size_score, 1.0);
        assert!(quality.edge_score > 0.0);
        assert!(quality.score > 0.3, "score was {}", quality.score);
        assert!(quality.score <= 1.0);
    }

    #[test]
    fn test_fragmented_glyph_scores_lower_connectivity() {
        let mut glyph = create_blank(40, 40);
        for (x0, y0) in [(5u32, 5u32), (25, 5), (5, 25), (25, 25)] {
            for y in y0..y0 + 6 {
                for x in x0..x0 + 6 {
                    glyph.put_pixel(x, y, Luma([INK]));
                }
            }
        }
        let quality = assess_glyph_quality(&glyph, ScoringProfile::Refined);
        assert!((quality.connectivity_score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_solid_glyph_density_is_clamped() {
        let solid = GrayImage::from_pixel(40, 40, Luma([INK]));
        let quality = assess_glyph_quality(&solid, ScoringProfile::Refined);
        assert_eq!(quality.density_score, 0.0);
        assert!(quality.score >= 0.0 && quality.score <= 1.0);
    }

    #[test]
    fn test_baseline_density_band() {
        // 20% ink falls inside the 10-40% band
        let glyph = GrayImage::from_fn(50, 50, |_, y| {
            if y < 10 {
                Luma([INK])
            } else {
                Luma([BACKGROUND])
            }
        });
        let quality = assess_glyph_quality(&glyph, ScoringProfile::Baseline);
        assert_eq!(quality.density_score, 1.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let glyph = create_ring_glyph();
        let a = assess_glyph_quality(&glyph, ScoringProfile::Refined);
        let b = assess_glyph_quality(&glyph, ScoringProfile::Refined);
        assert_eq!(a, b);
    }
}
