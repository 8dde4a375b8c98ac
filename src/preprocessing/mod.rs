//! # Image Preprocessing Module
//!
//! Turns scanned manuscript pages into binary masks and scores extracted
//! glyph bitmaps.
//!
//! The module is organized into focused sub-modules:
//! - `filtering`: CLAHE, median filter and morphological operations
//! - `thresholding`: Multi-scale Gaussian adaptive thresholding
//! - `page`: The full page preprocessing chain
//! - `quality`: Glyph quality scoring
//! - `types`: Shared types and error definitions

pub mod filtering;
pub mod page;
pub mod quality;
pub mod thresholding;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use types::{
    ClaheImageResult, GlyphQualityResult, MorphologicalImageResult, MorphologicalOperation,
    MorphologyStep, PreprocessedPage, PreprocessingError, StructuringElement,
    ThresholdedImageResult, BACKGROUND, INK,
};

pub use filtering::{apply_clahe, apply_morphological_operation, dilate, erode, reduce_noise};
pub use page::preprocess_page;
pub use quality::assess_glyph_quality;
pub use thresholding::{apply_adaptive_threshold, apply_multiscale_threshold, needs_inversion};
