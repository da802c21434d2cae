use image::GrayImage;
use rayon::prelude::*;

/// Binary threshold: `max_value` where the source is at or above `thresh`,
/// zero elsewhere.
pub fn threshold_binary(src: &GrayImage, thresh: u8, max_value: u8) -> GrayImage {
    let data: Vec<u8> = src
        .as_raw()
        .par_iter()
        .map(|&value| apply_threshold(value, thresh, max_value))
        .collect();
    GrayImage::from_raw(src.width(), src.height(), data)
        .unwrap_or_else(|| GrayImage::new(src.width(), src.height()))
}

#[inline]
fn apply_threshold(value: u8, thresh: u8, max_value: u8) -> u8 {
    if value >= thresh {
        max_value
    } else {
        0
    }
}
