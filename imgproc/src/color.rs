use crate::Result;
use cv_core::{ChannelOrder, PixelBuffer};
use image::GrayImage;
use rayon::prelude::*;
use rayon::ThreadPool;

// BT.601 luma weights in 14-bit fixed point; they sum to 1 << 14 so a
// pixel with equal channels keeps its value.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let acc = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B + (1 << (LUMA_SHIFT - 1));
    (acc >> LUMA_SHIFT) as u8
}

/// Single-channel luma of a buffer. Gray buffers are copied unchanged.
pub fn to_grayscale(src: &PixelBuffer) -> GrayImage {
    to_grayscale_in_pool(src, None)
}

pub fn to_grayscale_in_pool(src: &PixelBuffer, pool: Option<&ThreadPool>) -> GrayImage {
    let run = || {
        let (w, h) = src.dimensions();
        let data = src.as_slice();
        let gray_data: Vec<u8> = match src.order() {
            ChannelOrder::Gray => data.to_vec(),
            ChannelOrder::Bgr => data
                .par_chunks_exact(3)
                .map(|px| luma(px[2], px[1], px[0]))
                .collect(),
            ChannelOrder::Rgb => data
                .par_chunks_exact(3)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
        };
        GrayImage::from_raw(w, h, gray_data).unwrap_or_else(|| GrayImage::new(w, h))
    };

    if let Some(p) = pool {
        p.install(run)
    } else {
        run()
    }
}

/// Expand a gray image into a three-channel BGR buffer.
pub fn gray_to_bgr(gray: &GrayImage) -> Result<PixelBuffer> {
    let buf = PixelBuffer::from_gray(gray.clone())?;
    Ok(buf.to_order(ChannelOrder::Bgr)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_keeps_neutral_values() {
        for v in [0u8, 1, 50, 127, 128, 200, 255] {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn luma_weights_green_highest() {
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
        assert!(luma(255, 0, 0) > luma(0, 0, 255));
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn grayscale_respects_channel_order() {
        let bgr = PixelBuffer::new(1, 1, ChannelOrder::Bgr, vec![0, 0, 255]).unwrap();
        let rgb = PixelBuffer::new(1, 1, ChannelOrder::Rgb, vec![255, 0, 0]).unwrap();
        assert_eq!(to_grayscale(&bgr).as_raw(), to_grayscale(&rgb).as_raw());
        assert_eq!(to_grayscale(&bgr).as_raw()[0], 76);
    }

    #[test]
    fn grayscale_of_gray_is_identity() {
        let gray = PixelBuffer::new(2, 1, ChannelOrder::Gray, vec![9, 200]).unwrap();
        assert_eq!(to_grayscale(&gray).as_raw(), &vec![9, 200]);
    }

    #[test]
    fn gray_to_bgr_replicates() {
        let gray = GrayImage::from_raw(2, 1, vec![7, 8]).unwrap();
        let bgr = gray_to_bgr(&gray).unwrap();
        assert_eq!(bgr.order(), ChannelOrder::Bgr);
        assert_eq!(bgr.as_slice(), &[7, 7, 7, 8, 8, 8]);
    }
}
