use cv_core::Rect;
use image::GrayImage;

/// Summed-area tables of pixel values and squared pixel values.
///
/// Both tables are `(w + 1) x (h + 1)` with a zero first row and column, so
/// any rectangle sum is `I(x1,y1) + I(x0,y0) - I(x1,y0) - I(x0,y1)`.
pub(crate) struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl IntegralImage {
    pub(crate) fn new(src: &GrayImage) -> Self {
        let (w, h) = src.dimensions();
        let w = w as usize;
        let h = h as usize;
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sq_sum = vec![0u64; stride * (h + 1)];
        let src_raw = src.as_raw();

        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = src_raw[y * w + x] as u64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[idx - stride] + row_sum;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sq_sum,
        }
    }

    fn lookup(&self, table: &[u64], r: &Rect) -> u64 {
        let x0 = r.x as usize;
        let y0 = r.y as usize;
        let x1 = r.right() as usize;
        let y1 = r.bottom() as usize;
        let s = self.stride;
        table[y1 * s + x1] + table[y0 * s + x0] - table[y0 * s + x1] - table[y1 * s + x0]
    }

    pub(crate) fn sum(&self, r: &Rect) -> u64 {
        self.lookup(&self.sum, r)
    }

    pub(crate) fn sq_sum(&self, r: &Rect) -> u64 {
        self.lookup(&self.sq_sum, r)
    }
}
