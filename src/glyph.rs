//! Glyph types shared by the segmenter, the pipeline and the persister.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Axis-aligned rectangle in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the box lies entirely inside an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// A segmented glyph before scoring, in line coordinates.
#[derive(Debug, Clone)]
pub struct GlyphCandidate {
    /// Box relative to the line crop; `x` is also the page column
    pub bbox: BoundingBox,
    /// Cropped and masked bitmap, ink dark on white; padded only once
    /// `segment_line` returns it
    pub bitmap: GrayImage,
    pub is_omega: bool,
}

/// A scored glyph in page coordinates.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Extraction order within the page
    pub id: usize,
    /// Stable identifier derived from the page name and bounding box
    pub key: String,
    /// File name of the source page
    pub source_image: String,
    /// Index of the text line the glyph was found in
    pub line: usize,
    pub bbox: BoundingBox,
    pub bitmap: GrayImage,
    pub quality: f32,
    pub is_omega: bool,
}

/// Content-derived glyph key: the first 16 hex digits of
/// SHA-256(`source|x|y|width|height`).
///
/// Unlike the extraction index, the key survives changes in filtering or
/// iteration order as long as the glyph keeps its bounding box.
pub fn glyph_key(source_image: &str, bbox: &BoundingBox) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}|{}|{}|{}|{}",
            source_image, bbox.x, bbox.y, bbox.width, bbox.height
        )
        .as_bytes(),
    );
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
