//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, structs, and enums used across
//! the preprocessing sub-modules.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Pixel value of ink in a binary mask.
pub const INK: u8 = 0;
/// Pixel value of background in a binary mask.
pub const BACKGROUND: u8 = 255;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone)]
pub enum PreprocessingError {
    /// A parameter is outside its accepted range
    InvalidParameter { message: String },
    /// Image has zero width or height
    EmptyImage,
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::InvalidParameter { message } => {
                write!(f, "Invalid preprocessing parameter: {}", message)
            }
            PreprocessingError::EmptyImage => write!(f, "Image has no pixels"),
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Result of CLAHE contrast enhancement operation.
#[derive(Debug, Clone)]
pub struct ClaheImageResult {
    /// The contrast-enhanced image
    pub image: GrayImage,
    /// Clip limit used for histogram clipping
    pub clip_limit: f32,
    /// Tile grid (columns, rows) used for local equalization
    pub tile_grid: (u32, u32),
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of multi-scale adaptive thresholding.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// Binary mask, ink = [`INK`], background = [`BACKGROUND`]
    pub image: GrayImage,
    /// Number of threshold passes merged
    pub scales: usize,
    /// Whether the polarity check flipped the mask
    pub inverted: bool,
    /// Fraction of pixels classified as ink after the polarity check
    pub ink_ratio: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of morphological operations on binary images.
#[derive(Debug, Clone)]
pub struct MorphologicalImageResult {
    /// The morphologically processed image
    pub image: GrayImage,
    /// Type of morphological operation applied
    pub operation: MorphologicalOperation,
    /// Structuring element used
    pub element: StructuringElement,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Morphological cleanup operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphologicalOperation {
    /// Opening operation (erosion followed by dilation - removes bright specks)
    Opening,
    /// Closing operation (dilation followed by erosion - fills dark gaps)
    Closing,
}

/// Structuring elements used by the cleanup passes.
///
/// Even-sized elements are anchored at their bottom-right cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuringElement {
    /// 2x2 ellipse: the square without its top-left cell
    Ellipse2,
    /// 3x3 ellipse, which at this size is a plus-shaped cross
    Ellipse3,
    /// Full 2x2 square
    Square2,
}

impl StructuringElement {
    /// Offsets (dx, dy) of the active cells relative to the anchor.
    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            StructuringElement::Ellipse2 => &[(0, -1), (-1, 0), (0, 0)],
            StructuringElement::Ellipse3 => &[(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)],
            StructuringElement::Square2 => &[(-1, -1), (0, -1), (-1, 0), (0, 0)],
        }
    }
}

/// One cleanup pass of the page chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyStep {
    pub operation: MorphologicalOperation,
    pub element: StructuringElement,
}

/// Output of the full page preprocessing chain.
#[derive(Debug, Clone)]
pub struct PreprocessedPage {
    /// Cleaned binary mask, ink = [`INK`], background = [`BACKGROUND`]
    pub binary: GrayImage,
    /// Contrast-enhanced grayscale copy of the page
    pub enhanced: GrayImage,
    /// Whether the polarity check flipped the mask
    pub inverted: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Per-glyph quality assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQualityResult {
    /// Weighted total, clamped to 0.0-1.0
    pub score: f32,
    /// Fraction of ink pixels in the padded bitmap
    pub ink_ratio: f32,
    /// Closeness of the ink ratio to the ideal (0.0-1.0)
    pub density_score: f32,
    /// Normalized edge pixel ratio (0.0-1.0)
    pub edge_score: f32,
    /// Inverse ink component count, 0.0 for a blank bitmap
    pub connectivity_score: f32,
    /// 1.0 inside the plausible size band, 0.5 outside
    pub size_score: f32,
}
