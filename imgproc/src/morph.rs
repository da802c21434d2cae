use image::{ImageBuffer, Luma, Primitive};
use rayon::prelude::*;

/// Offsets of a `width x height` rectangular structuring element, anchored
/// at its center.
pub fn rect_kernel(width: u32, height: u32) -> Vec<(i32, i32)> {
    let cx = width as i32 / 2;
    let cy = height as i32 / 2;
    let mut kernel = Vec::with_capacity((width * height) as usize);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            kernel.push((x - cx, y - cy));
        }
    }
    kernel
}

/// Grayscale dilation: every output pixel is the maximum of its neighborhood
/// under `kernel`. Neighbors outside the image are ignored.
///
/// Works for any single-channel primitive, including `f32` response maps.
pub fn dilate<T>(
    src: &ImageBuffer<Luma<T>, Vec<T>>,
    kernel: &[(i32, i32)],
    iterations: u32,
) -> ImageBuffer<Luma<T>, Vec<T>>
where
    T: Primitive + Send + Sync,
{
    let mut output = src.clone();

    for _ in 0..iterations {
        output = dilate_once(&output, kernel);
    }

    output
}

fn dilate_once<T>(src: &ImageBuffer<Luma<T>, Vec<T>>, kernel: &[(i32, i32)]) -> ImageBuffer<Luma<T>, Vec<T>>
where
    T: Primitive + Send + Sync,
{
    let width = src.width() as i32;
    let height = src.height() as i32;
    let data: &[T] = src.as_raw();
    let mut out = data.to_vec();

    out.par_chunks_mut(width.max(1) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for (x, px) in row.iter_mut().enumerate() {
                let x = x as i32;
                let mut max_val = *px;

                for &(kx, ky) in kernel {
                    let nx = x + kx;
                    let ny = y + ky;

                    if nx >= 0 && nx < width && ny >= 0 && ny < height {
                        let val = data[(ny * width + nx) as usize];
                        if val > max_val {
                            max_val = val;
                        }
                    }
                }

                *px = max_val;
            }
        });

    ImageBuffer::from_raw(src.width(), src.height(), out).unwrap_or_else(|| src.clone())
}
