use crate::{FeatureError, Result};
use cv_core::FloatImage;
use cv_imgproc::{border_index, sobel_derivatives, BorderMode};
use image::{GrayImage, Luma};
use rayon::prelude::*;

/// Harris corner response `det(M) - k * trace(M)^2` for every pixel.
///
/// `M` is the structure tensor of Sobel derivatives (aperture `ksize`)
/// summed over a `block_size x block_size` window. Derivatives are scaled by
/// `1 / (2^(ksize-1) * block_size * 255)` so responses do not depend on the
/// 8-bit range. Borders reflect without repeating the edge pixel.
pub fn harris_response(image: &GrayImage, block_size: usize, ksize: usize, k: f32) -> Result<FloatImage> {
    if block_size == 0 {
        return Err(FeatureError::InvalidParameter(
            "block_size must be >= 1".to_string(),
        ));
    }
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return Ok(FloatImage::new(image.width(), image.height()));
    }

    let (ix, iy) = sobel_derivatives(image, ksize, BorderMode::Reflect101)?;
    let scale = 1.0 / ((1u32 << (ksize - 1)) as f32 * block_size as f32 * 255.0);

    let cov: Vec<(f32, f32, f32)> = ix
        .as_raw()
        .par_iter()
        .zip(iy.as_raw().par_iter())
        .map(|(&gx, &gy)| {
            let dx = gx * scale;
            let dy = gy * scale;
            (dx * dx, dx * dy, dy * dy)
        })
        .collect();

    // Unnormalized box sum; the anchor sits at block_size / 2 as for any
    // centered kernel, so even windows lean towards the top-left.
    let anchor = (block_size / 2) as isize;
    let mut responses = vec![0.0f32; width * height];

    responses
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut i_xx = 0.0f32;
                let mut i_xy = 0.0f32;
                let mut i_yy = 0.0f32;

                for by in 0..block_size as isize {
                    let sy = border_index(y as isize - anchor + by, height, BorderMode::Reflect101);
                    for bx in 0..block_size as isize {
                        let sx = border_index(x as isize - anchor + bx, width, BorderMode::Reflect101);
                        let (a, b, c) = cov[sy * width + sx];
                        i_xx += a;
                        i_xy += b;
                        i_yy += c;
                    }
                }

                let det = i_xx * i_yy - i_xy * i_xy;
                let trace = i_xx + i_yy;
                *out = det - k * trace * trace;
            }
        });

    FloatImage::from_raw(image.width(), image.height(), responses).ok_or_else(|| {
        FeatureError::InvalidParameter("response map does not match image size".to_string())
    })
}

/// Largest value in a response map, or `None` for an empty map.
pub fn response_max(map: &FloatImage) -> Option<f32> {
    map.as_raw().iter().copied().reduce(f32::max)
}

/// 255 where `map > ratio * max(map)`, 0 elsewhere.
pub fn corner_mask(map: &FloatImage, ratio: f32) -> GrayImage {
    let Some(max) = response_max(map) else {
        return GrayImage::new(map.width(), map.height());
    };
    let cutoff = ratio * max;
    GrayImage::from_fn(map.width(), map.height(), |x, y| {
        Luma([if map.get_pixel(x, y)[0] > cutoff { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_square() -> GrayImage {
        let mut img = GrayImage::new(32, 32);
        for y in 8..24 {
            for x in 8..24 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn flat_image_has_zero_response() {
        let img = GrayImage::from_pixel(16, 16, Luma([90]));
        let map = harris_response(&img, 2, 3, 0.04).unwrap();
        assert!(map.as_raw().iter().all(|&v| v == 0.0));
        assert!(corner_mask(&map, 0.01).as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn square_corners_dominate() {
        let map = harris_response(&white_square(), 2, 3, 0.04).unwrap();
        let max = response_max(&map).unwrap();
        assert!(max > 0.0);

        let (mut best_x, mut best_y) = (0u32, 0u32);
        for (x, y, p) in map.enumerate_pixels() {
            if p[0] == max {
                best_x = x;
                best_y = y;
            }
        }
        let near_corner = [(8i32, 8i32), (23, 8), (8, 23), (23, 23)]
            .iter()
            .any(|&(cx, cy)| (best_x as i32 - cx).abs() <= 3 && (best_y as i32 - cy).abs() <= 3);
        assert!(near_corner, "max at ({best_x}, {best_y})");
    }

    #[test]
    fn straight_edge_response_is_negative() {
        let map = harris_response(&white_square(), 2, 3, 0.04).unwrap();
        assert!(map.get_pixel(16, 8)[0] < 0.0);
        assert_eq!(map.get_pixel(16, 16)[0], 0.0);
    }

    #[test]
    fn mask_marks_only_strong_responses() {
        let map = harris_response(&white_square(), 2, 3, 0.04).unwrap();
        let mask = corner_mask(&map, 0.01);
        let cutoff = 0.01 * response_max(&map).unwrap();
        for (x, y, p) in mask.enumerate_pixels() {
            assert_eq!(p[0] == 255, map.get_pixel(x, y)[0] > cutoff);
        }
        assert_eq!(mask.get_pixel(16, 16)[0], 0);
    }

    #[test]
    fn rejects_zero_block() {
        assert!(harris_response(&white_square(), 0, 3, 0.04).is_err());
    }
}
