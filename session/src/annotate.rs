use cv_core::{PixelBuffer, Rect};
use image::GrayImage;

/// Draw the outline of `rect` with corners `(x, y)` and `(x + w, y + h)`,
/// `thickness` pixels wide. The stroke grows inwards from those corners, so
/// nothing is painted outside `x..=x + w` and `y..=y + h`; OpenCV centres
/// thick strokes on the edge instead, which differs by one pixel at
/// thickness 2. Parts outside the buffer are clipped.
pub fn draw_rect_outline(buf: &mut PixelBuffer, rect: Rect, color: &[u8], thickness: u32) {
    let (width, height) = buf.dimensions();
    if thickness == 0 || rect.x >= width || rect.y >= height {
        return;
    }
    let x0 = rect.x;
    let y0 = rect.y;
    let x1 = rect.right().min(width - 1);
    let y1 = rect.bottom().min(height - 1);
    let right_visible = rect.right() < width;
    let bottom_visible = rect.bottom() < height;

    for t in 0..thickness {
        for x in x0..=x1 {
            if y0 + t <= y1 {
                buf.put_pixel(x, y0 + t, color);
            }
            if bottom_visible && rect.bottom() >= y0 + t {
                buf.put_pixel(x, rect.bottom() - t, color);
            }
        }
        for y in y0..=y1 {
            if x0 + t <= x1 {
                buf.put_pixel(x0 + t, y, color);
            }
            if right_visible && rect.right() >= x0 + t {
                buf.put_pixel(rect.right() - t, y, color);
            }
        }
    }
}

/// Paint `color` wherever `mask` is non-zero. Returns the number of pixels
/// painted.
pub fn recolor_masked(buf: &mut PixelBuffer, mask: &GrayImage, color: &[u8]) -> usize {
    let mut painted = 0;
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] != 0 {
            buf.put_pixel(x, y, color);
            painted += 1;
        }
    }
    painted
}
