use crate::convolve::{separable_filter, BorderMode};
use crate::{ImgprocError, Result};
use cv_core::FloatImage;
use image::GrayImage;
use rayon::prelude::*;

fn sobel_kernels_1d(ksize: usize) -> Option<(Vec<f32>, Vec<f32>)> {
    match ksize {
        3 => Some((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])),
        5 => Some((
            vec![-1.0, -2.0, 0.0, 2.0, 1.0],
            vec![1.0, 4.0, 6.0, 4.0, 1.0],
        )),
        7 => Some((
            vec![-1.0, -4.0, -5.0, 0.0, 5.0, 4.0, 1.0],
            vec![1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0],
        )),
        _ => None,
    }
}

/// First-order Sobel derivatives `(d/dx, d/dy)` with an unscaled kernel of
/// aperture `ksize` (3, 5 or 7).
pub fn sobel_derivatives(
    src: &GrayImage,
    ksize: usize,
    border: BorderMode,
) -> Result<(FloatImage, FloatImage)> {
    let (deriv, smooth) = sobel_kernels_1d(ksize).ok_or_else(|| {
        ImgprocError::InvalidParameter(format!("sobel aperture must be 3, 5 or 7, got {ksize}"))
    })?;
    let (gx, gy) = rayon::join(
        || separable_filter(src, &deriv, &smooth, border),
        || separable_filter(src, &smooth, &deriv, border),
    );
    Ok((gx, gy))
}

// Quantized gradient direction used by non-maximum suppression.
const DIR_0: u8 = 0;
const DIR_45: u8 = 1;
const DIR_90: u8 = 2;
const DIR_135: u8 = 3;

fn gradients_and_directions(gx: &FloatImage, gy: &FloatImage) -> (Vec<f32>, Vec<u8>) {
    const TAN_22_5: f32 = 0.414_213_56;

    gx.as_raw()
        .par_iter()
        .zip(gy.as_raw().par_iter())
        .map(|(&dx, &dy)| {
            let abs_gx = dx.abs();
            let abs_gy = dy.abs();
            let dir = if abs_gy <= abs_gx * TAN_22_5 {
                DIR_0
            } else if abs_gx <= abs_gy * TAN_22_5 {
                DIR_90
            } else if dx * dy > 0.0 {
                DIR_45
            } else {
                DIR_135
            };
            (abs_gx + abs_gy, dir)
        })
        .unzip()
}

fn non_max_suppression(width: usize, height: usize, mag: &[f32], dir: &[u8]) -> Vec<f32> {
    let mut out = vec![0.0f32; width * height];
    let at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0.0
        } else {
            mag[y as usize * width + x as usize]
        }
    };

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let yi = y as isize;
            for (x, out) in out_row.iter_mut().enumerate() {
                let xi = x as isize;
                let m = mag[y * width + x];
                if m <= 0.0 {
                    continue;
                }
                // Image rows grow downwards, so a positive dx*dy gradient
                // runs from top-left to bottom-right.
                let (m1, m2) = match dir[y * width + x] {
                    DIR_0 => (at(xi - 1, yi), at(xi + 1, yi)),
                    DIR_90 => (at(xi, yi - 1), at(xi, yi + 1)),
                    DIR_45 => (at(xi - 1, yi - 1), at(xi + 1, yi + 1)),
                    _ => (at(xi + 1, yi - 1), at(xi - 1, yi + 1)),
                };

                if m > m1 && m >= m2 {
                    *out = m;
                }
            }
        });

    out
}

fn hysteresis(width: usize, height: usize, nms: &[f32], low: f32, high: f32) -> GrayImage {
    const STRONG: u8 = 255;
    const WEAK: u8 = 75;

    let mut state = vec![0u8; width * height];
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let v = nms[idx];
            if v > high {
                state[idx] = STRONG;
                stack.push((x, y));
            } else if v > low {
                state[idx] = WEAK;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(height - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(width - 1);
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * width + nx;
                if state[nidx] == WEAK {
                    state[nidx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let data: Vec<u8> = state
        .par_iter()
        .map(|&s| if s == STRONG { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(width as u32, height as u32, data)
        .unwrap_or_else(|| GrayImage::new(width as u32, height as u32))
}

/// Canny edge detector with a 3x3 Sobel aperture and L1 gradient magnitude.
///
/// Pixels whose suppressed magnitude exceeds `high_threshold` seed edges;
/// pixels above `low_threshold` join an edge when 8-connected to a seed.
/// The thresholds are swapped when given in the wrong order. Output pixels
/// are 255 on edges and 0 elsewhere.
pub fn canny(src: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = if low_threshold > high_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };
    let width = src.width() as usize;
    let height = src.height() as usize;
    if width == 0 || height == 0 {
        return GrayImage::new(src.width(), src.height());
    }

    let (gx, gy) = match sobel_derivatives(src, 3, BorderMode::Replicate) {
        Ok(d) => d,
        Err(_) => return GrayImage::new(src.width(), src.height()),
    };
    let (mag, dir) = gradients_and_directions(&gx, &gy);
    let nms = non_max_suppression(width, height, &mag, &dir);
    hysteresis(width, height, &nms, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(size: u32, lo: u32, hi: u32) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        for y in lo..hi {
            for x in lo..hi {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn sobel_constant_image_is_zero() {
        let img = GrayImage::from_pixel(16, 16, Luma([100]));
        let (gx, gy) = sobel_derivatives(&img, 3, BorderMode::Reflect101).unwrap();
        assert!(gx.as_raw().iter().all(|&v| v == 0.0));
        assert!(gy.as_raw().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sobel_vertical_edge() {
        let mut img = GrayImage::new(16, 16);
        for y in 0..16 {
            for x in 8..16 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let (gx, gy) = sobel_derivatives(&img, 3, BorderMode::Replicate).unwrap();
        assert_eq!(gx.get_pixel(8, 8)[0], 4.0 * 255.0);
        assert_eq!(gy.get_pixel(8, 8)[0], 0.0);
    }

    #[test]
    fn sobel_rejects_unknown_aperture() {
        let img = GrayImage::new(4, 4);
        assert!(sobel_derivatives(&img, 4, BorderMode::Replicate).is_err());
    }

    #[test]
    fn canny_basic() {
        let edges = canny(&square(32, 8, 24), 100.0, 200.0);

        assert_eq!(edges.dimensions(), (32, 32));
        assert!(edges.as_raw().iter().all(|&v| v == 0 || v == 255));
        assert!(edges.as_raw().iter().any(|&v| v > 0));
        // Flat interior and flat background carry no edges.
        assert_eq!(edges.get_pixel(16, 16)[0], 0);
        assert_eq!(edges.get_pixel(2, 2)[0], 0);
    }

    #[test]
    fn canny_edges_are_thin() {
        let edges = canny(&square(32, 8, 24), 100.0, 200.0);
        // Along a row through the middle of the square, each vertical side
        // yields a one-pixel-wide response.
        let row: Vec<u8> = (0..32).map(|x| edges.get_pixel(x, 16)[0]).collect();
        let hits = row.iter().filter(|&&v| v == 255).count();
        assert_eq!(hits, 2);
    }

    #[test]
    fn canny_uniform_image() {
        let img = GrayImage::new(32, 32);
        let edges = canny(&img, 100.0, 200.0);
        assert!(edges.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_threshold_effect() {
        let mut img = GrayImage::new(32, 32);
        for y in 8..24 {
            for x in 8..24 {
                img.put_pixel(x, y, Luma([((x + y) * 4) as u8]));
            }
        }

        let edges_low = canny(&img, 10.0, 50.0);
        let edges_high = canny(&img, 100.0, 200.0);

        let low_count = edges_low.as_raw().iter().filter(|&&v| v > 0).count();
        let high_count = edges_high.as_raw().iter().filter(|&&v| v > 0).count();
        assert!(low_count >= high_count);
    }

    #[test]
    fn canny_swaps_inverted_thresholds() {
        let img = square(32, 8, 24);
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 200.0));
    }
}
