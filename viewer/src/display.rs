use cv_core::{ChannelOrder, PixelBuffer};
use egui::{Color32, ColorImage, Context, TextureHandle, TextureOptions};

const TEXTURE_NAME: &str = "current-image";

/// Convert a buffer into an opaque RGBA image for upload.
///
/// BGR is reordered to RGB, RGB is copied and gray is replicated into all
/// three channels.
pub fn to_color_image(buffer: &PixelBuffer) -> ColorImage {
    let size = [buffer.width() as usize, buffer.height() as usize];
    let data = buffer.as_slice();
    let pixels = match buffer.order() {
        ChannelOrder::Bgr => data
            .chunks_exact(3)
            .map(|px| Color32::from_rgb(px[2], px[1], px[0]))
            .collect(),
        ChannelOrder::Rgb => data
            .chunks_exact(3)
            .map(|px| Color32::from_rgb(px[0], px[1], px[2]))
            .collect(),
        ChannelOrder::Gray => data.iter().map(|&v| Color32::from_gray(v)).collect(),
    };
    ColorImage { size, pixels }
}

/// Holds the texture of the image currently on screen.
#[derive(Default)]
pub struct DisplayAdapter {
    texture: Option<TextureHandle>,
}

impl DisplayAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `buffer`, replacing the previous texture. egui frees the old
    /// texture when its handle is dropped here.
    pub fn render(&mut self, ctx: &Context, buffer: &PixelBuffer) -> &TextureHandle {
        let image = to_color_image(buffer);
        tracing::debug!(width = image.size[0], height = image.size[1], "uploading texture");
        self.texture
            .insert(ctx.load_texture(TEXTURE_NAME, image, TextureOptions::LINEAR))
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    /// Size in pixels of the displayed image.
    pub fn size(&self) -> Option<[usize; 2]> {
        self.texture.as_ref().map(|t| t.size())
    }

    pub fn clear(&mut self) {
        self.texture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_is_reordered() {
        let buf = PixelBuffer::new(2, 1, ChannelOrder::Bgr, vec![10, 20, 30, 0, 0, 255]).unwrap();
        let image = to_color_image(&buf);
        assert_eq!(image.size, [2, 1]);
        assert_eq!(image.pixels[0], Color32::from_rgb(30, 20, 10));
        assert_eq!(image.pixels[1], Color32::from_rgb(255, 0, 0));
        assert!(image.pixels.iter().all(|p| p.a() == 255));
    }

    #[test]
    fn gray_and_rgb_inputs() {
        let gray = PixelBuffer::new(1, 2, ChannelOrder::Gray, vec![7, 200]).unwrap();
        let image = to_color_image(&gray);
        assert_eq!(image.size, [1, 2]);
        assert_eq!(image.pixels[1], Color32::from_rgb(200, 200, 200));

        let rgb = PixelBuffer::new(1, 1, ChannelOrder::Rgb, vec![1, 2, 3]).unwrap();
        assert_eq!(to_color_image(&rgb).pixels[0], Color32::from_rgb(1, 2, 3));
    }

    #[test]
    fn render_replaces_texture() {
        let ctx = Context::default();
        let mut adapter = DisplayAdapter::new();
        assert_eq!(adapter.size(), None);

        let small = PixelBuffer::from_pixel(4, 3, ChannelOrder::Bgr, &[1, 2, 3]).unwrap();
        let first = adapter.render(&ctx, &small).id();
        assert_eq!(adapter.size(), Some([4, 3]));

        let large = PixelBuffer::from_pixel(8, 5, ChannelOrder::Bgr, &[9, 9, 9]).unwrap();
        let second = adapter.render(&ctx, &large).id();
        assert_ne!(first, second);
        assert_eq!(adapter.size(), Some([8, 5]));

        adapter.clear();
        assert!(adapter.texture().is_none());
    }
}
