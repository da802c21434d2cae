use crate::{Error, Result};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use rayon::prelude::*;

/// Single-channel `f32` map, used for detector response images.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Channel layout of a [`PixelBuffer`].
///
/// Vision routines store color as blue-green-red; display surfaces expect
/// red-green-blue. The order always travels with the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    Gray,
    Bgr,
    Rgb,
}

impl ChannelOrder {
    pub fn channels(self) -> usize {
        match self {
            ChannelOrder::Gray => 1,
            ChannelOrder::Bgr | ChannelOrder::Rgb => 3,
        }
    }

    pub fn is_color(self) -> bool {
        self.channels() == 3
    }
}

/// Owned 8-bit raster image with an explicit channel layout.
///
/// The data is row-major and interleaved; its length is always
/// `width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> Result<Self> {
        validate_dimensions(width, height)?;
        let expected = width as usize * height as usize * order.channels();
        if data.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Buffer with every pixel set to `pixel`.
    pub fn from_pixel(width: u32, height: u32, order: ChannelOrder, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != order.channels() {
            return Err(Error::ChannelLayout(format!(
                "{:?} pixels have {} channels, got {}",
                order,
                order.channels(),
                pixel.len()
            )));
        }
        validate_dimensions(width, height)?;
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * pixel.len())
            .collect();
        Self::new(width, height, order, data)
    }

    pub fn from_gray(gray: GrayImage) -> Result<Self> {
        let (w, h) = gray.dimensions();
        Self::new(w, h, ChannelOrder::Gray, gray.into_raw())
    }

    /// Decoded RGB image stored in BGR order.
    pub fn from_rgb_image(rgb: &RgbImage) -> Result<Self> {
        let (w, h) = rgb.dimensions();
        validate_dimensions(w, h)?;
        let mut data = rgb.as_raw().clone();
        data.par_chunks_mut(3).for_each(|px| px.swap(0, 2));
        Self::new(w, h, ChannelOrder::Bgr, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn channels(&self) -> usize {
        self.order.channels()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels()
    }

    /// Channels of the pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let start = self.offset(x, y);
        &self.data[start..start + self.channels()]
    }

    /// Overwrite the pixel at `(x, y)`. Panics when out of bounds or when
    /// `value` has the wrong channel count.
    pub fn put_pixel(&mut self, x: u32, y: u32, value: &[u8]) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        assert_eq!(value.len(), self.channels());
        let start = self.offset(x, y);
        let channels = self.channels();
        self.data[start..start + channels].copy_from_slice(value);
    }

    /// Iterator over `(x, y, channels)` for every pixel, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, &[u8])> + '_ {
        let width = self.width;
        self.data
            .chunks_exact(self.channels())
            .enumerate()
            .map(move |(i, px)| ((i as u32) % width, (i as u32) / width, px))
    }

    /// Reinterpret the buffer in another channel order.
    ///
    /// Bgr and Rgb swap the first and third channel, Gray expands into three
    /// equal channels. Color to Gray is rejected: luma conversion is a vision
    /// operation, not a relabeling.
    pub fn to_order(&self, order: ChannelOrder) -> Result<Self> {
        if order == self.order {
            return Ok(self.clone());
        }
        let data = match (self.order, order) {
            (ChannelOrder::Gray, _) => {
                let mut out = vec![0u8; self.data.len() * 3];
                out.par_chunks_mut(3)
                    .zip(self.data.par_iter())
                    .for_each(|(px, &g)| px.fill(g));
                out
            }
            (_, ChannelOrder::Gray) => {
                return Err(Error::ChannelLayout(format!(
                    "cannot relabel {:?} as Gray",
                    self.order
                )))
            }
            _ => {
                let mut out = self.data.clone();
                out.par_chunks_mut(3).for_each(|px| px.swap(0, 2));
                out
            }
        };
        Self::new(self.width, self.height, order, data)
    }

    /// Split into one gray plane per channel, in storage order.
    pub fn split_planes(&self) -> Vec<GrayImage> {
        let channels = self.channels();
        (0..channels)
            .into_par_iter()
            .map(|c| {
                let plane: Vec<u8> = self.data.iter().skip(c).step_by(channels).copied().collect();
                GrayImage::from_raw(self.width, self.height, plane)
                    .unwrap_or_else(|| GrayImage::new(self.width, self.height))
            })
            .collect()
    }

    /// Interleave planes (storage order) back into a buffer.
    pub fn from_planes(order: ChannelOrder, planes: &[GrayImage]) -> Result<Self> {
        if planes.len() != order.channels() {
            return Err(Error::ChannelLayout(format!(
                "{:?} needs {} planes, got {}",
                order,
                order.channels(),
                planes.len()
            )));
        }
        let (w, h) = planes[0].dimensions();
        if planes.iter().any(|p| p.dimensions() != (w, h)) {
            return Err(Error::InvalidDimensions(
                "planes must share dimensions".to_string(),
            ));
        }
        let channels = planes.len();
        let mut data = vec![0u8; w as usize * h as usize * channels];
        data.par_chunks_mut(channels).enumerate().for_each(|(i, px)| {
            for (c, plane) in planes.iter().enumerate() {
                px[c] = plane.as_raw()[i];
            }
        });
        Self::new(w, h, order, data)
    }
}

pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}
