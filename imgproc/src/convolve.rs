use crate::{ImgprocError, Result};
use cv_core::{FloatImage, PixelBuffer};
use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// `aaa|abcd|ddd`
    Replicate,
    /// `dcb|abcd|cba`
    Reflect101,
}

/// Map an out-of-range coordinate back into `0..len`.
pub fn border_index(coord: isize, len: usize, mode: BorderMode) -> usize {
    let n = len as isize;
    if n <= 1 {
        return 0;
    }

    match mode {
        BorderMode::Replicate => coord.clamp(0, n - 1) as usize,
        BorderMode::Reflect101 => {
            let period = 2 * n - 2;
            let mut c = coord % period;
            if c < 0 {
                c += period;
            }
            if c >= n {
                c = period - c;
            }
            c as usize
        }
    }
}

/// Sigma used when a Gaussian is requested with `sigma <= 0`.
pub fn sigma_for_kernel_size(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_kernel_1d(sigma: f32, size: usize) -> Vec<f32> {
    assert!(size % 2 == 1, "gaussian kernel size must be odd");
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_kernel_size(size)
    };
    let mut kernel = Vec::with_capacity(size);
    let center = (size / 2) as isize;
    let sigma2 = sigma * sigma;
    let mut sum = 0.0f32;

    for i in 0..size {
        let x = (i as isize - center) as f32;
        let v = (-(x * x) / (2.0 * sigma2)).exp();
        kernel.push(v);
        sum += v;
    }

    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }

    kernel
}

/// Separable correlation with a horizontal kernel `kx` and a vertical
/// kernel `ky`, both centered. Output keeps full `f32` precision.
pub fn separable_filter(src: &GrayImage, kx: &[f32], ky: &[f32], border: BorderMode) -> FloatImage {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let data = src.as_raw();
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; width * height];
    horizontal
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &data[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (i, &k) in kx.iter().enumerate() {
                    let sx = border_index(x as isize + i as isize - rx, width, border);
                    acc += k * src_row[sx] as f32;
                }
                *out = acc;
            }
        });

    let mut out = vec![0.0f32; width * height];
    out.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (i, &k) in ky.iter().enumerate() {
                let sy = border_index(y as isize + i as isize - ry, height, border);
                let src_row = &horizontal[sy * width..(sy + 1) * width];
                for (o, &v) in row.iter_mut().zip(src_row) {
                    *o += k * v;
                }
            }
        });

    FloatImage::from_raw(src.width(), src.height(), out)
        .unwrap_or_else(|| FloatImage::new(src.width(), src.height()))
}

pub fn separable_convolve(src: &GrayImage, kx: &[f32], ky: &[f32], border: BorderMode) -> GrayImage {
    let filtered = separable_filter(src, kx, ky, border);
    let data: Vec<u8> = filtered
        .as_raw()
        .par_iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage::from_raw(src.width(), src.height(), data)
        .unwrap_or_else(|| GrayImage::new(src.width(), src.height()))
}

fn validate_kernel_size(ksize: usize) -> Result<()> {
    if ksize == 0 || ksize % 2 == 0 {
        return Err(ImgprocError::InvalidParameter(format!(
            "gaussian kernel size must be odd and positive, got {ksize}"
        )));
    }
    Ok(())
}

/// Gaussian blur with a square `ksize x ksize` kernel. `sigma <= 0` derives
/// sigma from the kernel size. Borders reflect without repeating the edge.
pub fn gaussian_blur(src: &GrayImage, ksize: usize, sigma: f32) -> Result<GrayImage> {
    validate_kernel_size(ksize)?;
    let kernel = gaussian_kernel_1d(sigma, ksize);
    Ok(separable_convolve(src, &kernel, &kernel, BorderMode::Reflect101))
}

/// Gaussian blur applied to every channel of a buffer independently.
pub fn gaussian_blur_buffer(src: &PixelBuffer, ksize: usize, sigma: f32) -> Result<PixelBuffer> {
    validate_kernel_size(ksize)?;
    let kernel = gaussian_kernel_1d(sigma, ksize);
    let planes: Vec<GrayImage> = src
        .split_planes()
        .par_iter()
        .map(|plane| separable_convolve(plane, &kernel, &kernel, BorderMode::Reflect101))
        .collect();
    Ok(PixelBuffer::from_planes(src.order(), &planes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::ChannelOrder;
    use image::Luma;

    #[test]
    fn reflect101_does_not_repeat_edge() {
        assert_eq!(border_index(-1, 5, BorderMode::Reflect101), 1);
        assert_eq!(border_index(-2, 5, BorderMode::Reflect101), 2);
        assert_eq!(border_index(5, 5, BorderMode::Reflect101), 3);
        assert_eq!(border_index(-3, 5, BorderMode::Replicate), 0);
        assert_eq!(border_index(9, 5, BorderMode::Replicate), 4);
    }

    #[test]
    fn default_sigma_for_fifteen_tap_kernel() {
        assert!((sigma_for_kernel_size(15) - 2.6).abs() < 1e-6);
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel_1d(0.0, 15);
        assert_eq!(k.len(), 15);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..7 {
            assert!((k[i] - k[14 - i]).abs() < 1e-7);
        }
        assert!(k[7] > k[6]);
    }

    #[test]
    fn blur_preserves_constant_image() {
        let img = GrayImage::from_pixel(20, 10, Luma([140]));
        let out = gaussian_blur(&img, 15, 0.0).unwrap();
        assert!(out.as_raw().iter().all(|&v| v == 140));
    }

    #[test]
    fn blur_spreads_a_single_bright_pixel() {
        let mut img = GrayImage::new(31, 31);
        img.put_pixel(15, 15, Luma([255]));
        let out = gaussian_blur(&img, 15, 0.0).unwrap();
        assert!(out.get_pixel(15, 15)[0] < 255);
        assert!(out.get_pixel(16, 15)[0] > 0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn blur_rejects_even_kernel() {
        let img = GrayImage::new(4, 4);
        assert!(gaussian_blur(&img, 4, 0.0).is_err());
    }

    #[test]
    fn buffer_blur_keeps_layout() {
        let buf = PixelBuffer::from_pixel(8, 6, ChannelOrder::Bgr, &[10, 20, 30]).unwrap();
        let out = gaussian_blur_buffer(&buf, 15, 0.0).unwrap();
        assert_eq!(out.dimensions(), (8, 6));
        assert_eq!(out.order(), ChannelOrder::Bgr);
        assert_eq!(out.pixel(3, 3), &[10, 20, 30]);
    }
}
