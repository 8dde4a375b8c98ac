//! Connected-component labeling of ink pixels.
//!
//! Thin wrapper over `imageproc::region_labelling` that treats [`INK`] pixels
//! of a binary mask as foreground and collects per-component statistics.

use std::collections::BTreeMap;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::preprocessing::types::BACKGROUND;

/// Label image produced by [`label_ink`]; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Bounding box and pixel count of one ink component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStats {
    pub label: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of ink pixels in the component
    pub area: u32,
}

impl ComponentStats {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Labels 8-connected ink regions of a binary mask.
///
/// Returns the label image and the statistics of every component ordered by
/// label.
pub fn label_ink(mask: &GrayImage) -> (LabelImage, Vec<ComponentStats>) {
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

    let mut stats: BTreeMap<u32, (u32, u32, u32, u32, u32)> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        let entry = stats.entry(label).or_insert((x, y, x, y, 0));
        entry.0 = entry.0.min(x);
        entry.1 = entry.1.min(y);
        entry.2 = entry.2.max(x);
        entry.3 = entry.3.max(y);
        entry.4 += 1;
    }

    let stats = stats
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, area))| ComponentStats {
            label,
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
            area,
        })
        .collect();

    (labels, stats)
}

/// Number of 8-connected ink regions in a binary mask.
pub fn count_ink_components(mask: &GrayImage) -> usize {
    if mask.width() == 0 || mask.height() == 0 {
        return 0;
    }
    label_ink(mask).1.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::types::INK;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
    }

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([INK]));
            }
        }
    }

    #[test]
    fn test_blank_mask_has_no_components() {
        assert_eq!(count_ink_components(&blank(20, 20)), 0);
        assert_eq!(count_ink_components(&GrayImage::new(0, 0)), 0);
    }

    #[test]
    fn test_component_statistics() {
        let mut img = blank(40, 20);
        fill(&mut img, 2, 3, 5, 4);
        fill(&mut img, 20, 10, 8, 6);

        let (_, stats) = label_ink(&img);
        assert_eq!(stats.len(), 2);

        let mut boxes: Vec<_> = stats.iter().map(|s| (s.x, s.y, s.width, s.height, s.area)).collect();
        boxes.sort();
        assert_eq!(boxes[0], (2, 3, 5, 4, 20));
        assert_eq!(boxes[1], (20, 10, 8, 6, 48));
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let mut img = blank(5, 5);
        img.put_pixel(1, 1, Luma([INK]));
        img.put_pixel(2, 2, Luma([INK]));
        img.put_pixel(3, 3, Luma([INK]));
        assert_eq!(count_ink_components(&img), 1);
    }
}
