//! # Text Line Detection
//!
//! Finds horizontal text lines in a binary page mask from its row ink
//! profile. The profile is smoothed with a 1-D Gaussian, thresholded at a
//! percentile of its positive values, and every long enough run above the
//! threshold becomes a line, padded to keep ascenders and descenders.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::LineConfig;
use crate::preprocessing::types::INK;

/// A band of page rows, `start_row` inclusive, `end_row` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextLine {
    pub start_row: u32,
    pub end_row: u32,
}

impl TextLine {
    pub fn height(&self) -> u32 {
        self.end_row - self.start_row
    }

    /// Whether rows `start..end` lie entirely inside this line.
    pub fn contains_rows(&self, start: u32, end: u32) -> bool {
        self.start_row <= start && end <= self.end_row
    }
}

/// Number of ink pixels in every row of the mask.
pub fn horizontal_projection(mask: &GrayImage) -> Vec<f32> {
    let (width, height) = mask.dimensions();
    (0..height)
        .map(|y| (0..width).filter(|&x| mask.get_pixel(x, y)[0] == INK).count() as f32)
        .collect()
}

/// Gaussian smoothing of a 1-D signal.
///
/// The kernel is truncated at four standard deviations and the signal is
/// mirrored at both ends (`d c b a | a b c d | d c b a`).
pub fn gaussian_smooth_1d(signal: &[f32], sigma: f32) -> Vec<f32> {
    let len = signal.len();
    if len == 0 || sigma <= 0.0 {
        return signal.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as i64;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f32 / sigma).powi(2)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let reflect = |index: i64| -> usize {
        let period = 2 * len as i64;
        let wrapped = index.rem_euclid(period);
        if wrapped >= len as i64 {
            (period - 1 - wrapped) as usize
        } else {
            wrapped as usize
        }
    };

    (0..len as i64)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * signal[reflect(i + k as i64 - radius)])
                .sum()
        })
        .collect()
}

/// Percentile with linear interpolation between the closest ranks.
///
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f32], q: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f32;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Detects text lines in a binary page mask, ordered top to bottom.
///
/// A mask without ink yields no lines; this is an empty result, not an error.
///
/// # Examples
///
/// ```
/// use image::{GrayImage, Luma};
/// use sinaiticus_glyphs::config::LineConfig;
/// use sinaiticus_glyphs::lines::detect_lines;
///
/// let blank = GrayImage::from_pixel(100, 100, Luma([255]));
/// assert!(detect_lines(&blank, &LineConfig::default()).is_empty());
/// ```
pub fn detect_lines(mask: &GrayImage, config: &LineConfig) -> Vec<TextLine> {
    let start_time = std::time::Instant::now();

    let projection = horizontal_projection(mask);
    let smoothed = gaussian_smooth_1d(&projection, config.smoothing_sigma);

    let positive: Vec<f32> = smoothed.iter().copied().filter(|v| *v > 0.0).collect();
    let Some(threshold) = percentile(&positive, config.threshold_percentile) else {
        tracing::debug!(target: "glyph_extraction", "No ink rows found, no lines detected");
        return Vec::new();
    };

    let rows = smoothed.len() as u32;
    let mut lines = Vec::new();
    let mut line_start: Option<u32> = None;

    let close_run = |start: u32, end: u32, lines: &mut Vec<TextLine>| {
        if end - start >= config.min_line_height {
            lines.push(TextLine {
                start_row: start.saturating_sub(config.padding),
                end_row: (end + config.padding).min(rows),
            });
        }
    };

    for (row, value) in smoothed.iter().enumerate() {
        let row = row as u32;
        match line_start {
            None if *value > threshold => line_start = Some(row),
            Some(start) if *value <= threshold => {
                close_run(start, row, &mut lines);
                line_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = line_start {
        close_run(start, rows, &mut lines);
    }

    tracing::debug!(
        target: "glyph_extraction",
        "Line detection completed in {}ms: lines={}, threshold={:.2}, rows={}",
        start_time.elapsed().as_millis(),
        lines.len(),
        threshold,
        rows
    );

    lines
}
