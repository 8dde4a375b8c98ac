//! # Test Helper Library
//!
//! Builders for synthetic manuscript pages shared by the integration tests.
//! Pages are light parchment gray with dark ring-shaped "letters" laid out in
//! horizontal lines, so every stage of the pipeline has something realistic
//! to work on while the expected output stays predictable.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use std::path::{Path, PathBuf};

pub const PARCHMENT: u8 = 230;
pub const INK: u8 = 30;

pub const LETTER_WIDTH: u32 = 30;
pub const LETTER_HEIGHT: u32 = 40;
pub const LETTER_PITCH: u32 = 50;
pub const LETTER_STROKE: f32 = 4.0;

/// Where a synthetic letter was drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnLetter {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DrawnLetter {
    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Draws an elliptical ring of the given stroke inside a box
pub fn draw_ring(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, stroke: f32, value: u8) {
    let cx = x0 as f32 + w as f32 / 2.0;
    let cy = y0 as f32 + h as f32 / 2.0;
    let (a, b) = (w as f32 / 2.0, h as f32 / 2.0);
    for y in y0..(y0 + h).min(img.height()) {
        for x in x0..(x0 + w).min(img.width()) {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let outer = (dx / a).powi(2) + (dy / b).powi(2);
            let inner = (dx / (a - stroke)).powi(2) + (dy / (b - stroke)).powi(2);
            if outer <= 1.0 && inner >= 1.0 {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }
}

/// A page with `letters_per_line` ring letters on each of the given line tops
pub fn synthetic_page(
    width: u32,
    height: u32,
    line_tops: &[u32],
    letters_per_line: u32,
) -> (DynamicImage, Vec<DrawnLetter>) {
    let mut page = GrayImage::from_pixel(width, height, Luma([PARCHMENT]));
    let mut letters = Vec::new();

    for &top in line_tops {
        for i in 0..letters_per_line {
            let x = 40 + i * LETTER_PITCH;
            draw_ring(&mut page, x, top, LETTER_WIDTH, LETTER_HEIGHT, LETTER_STROKE, INK);
            letters.push(DrawnLetter {
                x,
                y: top,
                width: LETTER_WIDTH,
                height: LETTER_HEIGHT,
            });
        }
    }

    (DynamicImage::ImageLuma8(page), letters)
}

/// The standard three-line test page: 600x400, ten letters per line
pub fn three_line_page() -> (DynamicImage, Vec<DrawnLetter>) {
    synthetic_page(600, 400, &[60, 180, 300], 10)
}

/// A binary mask (ink 0, background 255) with solid horizontal bands
pub fn banded_mask(width: u32, height: u32, bands: &[(u32, u32)]) -> GrayImage {
    GrayImage::from_fn(width, height, |_, y| {
        if bands
            .iter()
            .any(|&(start, band)| y >= start && y < start + band)
        {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Saves a page as PNG into `dir` and returns its path
pub fn write_page(dir: &Path, name: &str, page: &DynamicImage) -> PathBuf {
    let path = dir.join(name);
    page.save(&path).expect("Failed to write test page");
    path
}
