//! # Image Filtering Module
//!
//! Contrast enhancement, noise reduction and morphological cleanup for page
//! preprocessing. CLAHE and the morphological filters are implemented here;
//! the median filter comes from `imageproc`.

use image::{GrayImage, Luma};

use super::types::{
    ClaheImageResult, MorphologicalImageResult, MorphologicalOperation, PreprocessingError,
    StructuringElement,
};

/// Removes salt-and-pepper noise with a square median filter.
///
/// # Arguments
///
/// * `image` - The grayscale or binary image to filter
/// * `radius` - Filter radius; 1 gives a 3x3 window
pub fn reduce_noise(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    let start_time = std::time::Instant::now();
    let filtered = imageproc::filter::median_filter(image, radius, radius);

    tracing::debug!(
        target: "glyph_extraction",
        "Median filter completed in {}ms: radius={}, dimensions={}x{}",
        start_time.elapsed().as_millis(),
        radius,
        filtered.width(),
        filtered.height()
    );

    filtered
}

/// Applies a morphological operation to a grayscale or binary image.
///
/// The operation acts on bright regions: on a page mask where the
/// background is white, `Closing` removes thin dark features and `Opening`
/// removes isolated bright specks. Neighbours outside the image are ignored,
/// so borders never erode or grow by themselves.
///
/// # Arguments
///
/// * `image` - The input image to process
/// * `operation` - The morphological operation to apply
/// * `element` - Structuring element
///
/// # Returns
///
/// Returns a `Result` containing the processed image and metadata, or a `PreprocessingError`
///
/// # Examples
///
/// ```no_run
/// use sinaiticus_glyphs::preprocessing::{
///     apply_morphological_operation, MorphologicalOperation, StructuringElement,
/// };
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mask = image::open("page_mask.png")?.to_luma8();
/// let cleaned = apply_morphological_operation(
///     &mask,
///     MorphologicalOperation::Closing,
///     StructuringElement::Ellipse3,
/// )?;
/// cleaned.image.save("page_mask_closed.png")?;
/// # Ok(())
/// # }
/// ```
pub fn apply_morphological_operation(
    image: &GrayImage,
    operation: MorphologicalOperation,
    element: StructuringElement,
) -> Result<MorphologicalImageResult, PreprocessingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessingError::EmptyImage);
    }

    let start_time = std::time::Instant::now();

    let processed = match operation {
        MorphologicalOperation::Opening => dilate(&erode(image, element), element),
        MorphologicalOperation::Closing => erode(&dilate(image, element), element),
    };

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "glyph_extraction",
        "Morphological operation completed in {}ms: operation={:?}, element={:?}, dimensions={}x{}",
        processing_time.as_millis(),
        operation,
        element,
        processed.width(),
        processed.height()
    );

    Ok(MorphologicalImageResult {
        image: processed,
        operation,
        element,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Erosion: every pixel becomes the minimum over the element placed at it.
pub fn erode(image: &GrayImage, element: StructuringElement) -> GrayImage {
    rank_filter(image, element, 1, u8::MAX, u8::min)
}

/// Dilation: every pixel becomes the maximum over the reflected element.
///
/// Reflection makes opening and closing exact for asymmetric elements such
/// as [`StructuringElement::Ellipse2`]: an opening leaves any shape that
/// contains the element unchanged.
pub fn dilate(image: &GrayImage, element: StructuringElement) -> GrayImage {
    rank_filter(image, element, -1, u8::MIN, u8::max)
}

fn rank_filter(
    image: &GrayImage,
    element: StructuringElement,
    direction: i64,
    identity: u8,
    pick: fn(u8, u8) -> u8,
) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    let offsets = element.offsets();

    for y in 0..height {
        for x in 0..width {
            let mut value = identity;
            for &(dx, dy) in offsets {
                let nx = x as i64 + direction * dx as i64;
                let ny = y as i64 + direction * dy as i64;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                value = pick(value, image.get_pixel(nx as u32, ny as u32)[0]);
            }
            result.put_pixel(x, y, Luma([value]));
        }
    }

    result
}

/// Applies Contrast Limited Adaptive Histogram Equalization (CLAHE).
///
/// The image is divided into a grid of tiles. Each tile gets a clipped,
/// equalized lookup table, and every pixel is mapped through a bilinear
/// blend of the four nearest tile tables so that tile seams do not show up
/// as steps in the output.
///
/// # Arguments
///
/// * `image` - The grayscale image to enhance
/// * `clip_limit` - Histogram clip limit relative to a uniform histogram (2.0 is typical)
/// * `tile_grid` - Number of tiles (columns, rows), typically (8, 8)
///
/// # Returns
///
/// Returns a `Result` containing the contrast-enhanced image and metadata, or a `PreprocessingError`
pub fn apply_clahe(
    image: &GrayImage,
    clip_limit: f32,
    tile_grid: (u32, u32),
) -> Result<ClaheImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if clip_limit <= 0.0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("Invalid clip limit: {}. Must be > 0.0", clip_limit),
        });
    }
    if tile_grid.0 == 0 || tile_grid.1 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: "Invalid tile grid: dimensions must be > 0".to_string(),
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessingError::EmptyImage);
    }

    let tile_width = width.div_ceil(tile_grid.0.min(width)).max(1);
    let tile_height = height.div_ceil(tile_grid.1.min(height)).max(1);
    let tiles_x = width.div_ceil(tile_width) as usize;
    let tiles_y = height.div_ceil(tile_height) as usize;

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for tile_y in 0..tiles_y {
        for tile_x in 0..tiles_x {
            let start_x = tile_x as u32 * tile_width;
            let start_y = tile_y as u32 * tile_height;
            let end_x = (start_x + tile_width).min(width);
            let end_y = (start_y + tile_height).min(height);
            luts.push(tile_lut(image, start_x, start_y, end_x, end_y, clip_limit));
        }
    }

    let lut_at = |tx: usize, ty: usize, value: u8| luts[ty * tiles_x + tx][value as usize] as f32;
    let inv_tile_width = 1.0 / tile_width as f32;
    let inv_tile_height = 1.0 / tile_height as f32;

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        let tyf = y as f32 * inv_tile_height - 0.5;
        let ty1 = tyf.floor();
        let ya = tyf - ty1;
        let ty2 = ((ty1 as i64 + 1).min(tiles_y as i64 - 1)).max(0) as usize;
        let ty1 = (ty1 as i64).max(0) as usize;

        for x in 0..width {
            let txf = x as f32 * inv_tile_width - 0.5;
            let tx1 = txf.floor();
            let xa = txf - tx1;
            let tx2 = ((tx1 as i64 + 1).min(tiles_x as i64 - 1)).max(0) as usize;
            let tx1 = (tx1 as i64).max(0) as usize;

            let value = image.get_pixel(x, y)[0];
            let top = lut_at(tx1, ty1, value) * (1.0 - xa) + lut_at(tx2, ty1, value) * xa;
            let bottom = lut_at(tx1, ty2, value) * (1.0 - xa) + lut_at(tx2, ty2, value) * xa;
            let blended = top * (1.0 - ya) + bottom * ya;

            output.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "glyph_extraction",
        "CLAHE applied in {}ms: clip_limit={}, tile_grid={:?}, tile_size={}x{}",
        processing_time.as_millis(),
        clip_limit,
        tile_grid,
        tile_width,
        tile_height
    );

    Ok(ClaheImageResult {
        image: output,
        clip_limit,
        tile_grid,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Builds the clipped equalization lookup table of one tile.
fn tile_lut(
    image: &GrayImage,
    start_x: u32,
    start_y: u32,
    end_x: u32,
    end_y: u32,
    clip_limit: f32,
) -> [u8; 256] {
    let area = ((end_x - start_x) * (end_y - start_y)).max(1);

    let mut histogram = [0u32; 256];
    for y in start_y..end_y {
        for x in start_x..end_x {
            histogram[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for count in &mut histogram {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    // Redistribute clipped pixels uniformly, remainder spread at a fixed stride
    let increment = excess / 256;
    let remainder = (excess % 256) as usize;
    for count in &mut histogram {
        *count += increment;
    }
    if remainder > 0 {
        let step = (256 / remainder).max(1);
        for bin in (0..256).step_by(step).take(remainder) {
            histogram[bin] += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (bin, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[bin] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }

    lut
}
