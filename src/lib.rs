//! # Sinaiticus Glyphs
//!
//! Extracts individual letter glyphs from scanned Codex Sinaiticus pages:
//! page binarization, text line detection, character segmentation, quality
//! scoring and persistence of glyph PNGs with metadata, plus a review
//! manifest builder that gathers the results for classification.

pub mod components;
pub mod config;
pub mod errors;
pub mod glyph;
pub mod lines;
pub mod observability;
pub mod persist;
pub mod pipeline;
pub mod preprocessing;
pub mod review;
pub mod segmentation;

// Re-export types for easier access
pub use config::{ExtractionConfig, NamingScheme, ScoringProfile};
pub use errors::{ExtractionError, ExtractionResult};
pub use glyph::{BoundingBox, Glyph};
pub use lines::TextLine;
pub use pipeline::{process_page, run_batch, PageExtraction, RunSummary};
pub use review::{build_review_manifest, ManifestEntry, ReviewManifest};
