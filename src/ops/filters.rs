// ============================================================================
// CONVOLUTION FILTERS: smooth, sharpen, gradient, laplacian, gaussian, emboss
// ============================================================================
//
// Each output pixel is a weighted sum over a neighbourhood of the source.
// Single-channel inputs (HSV value, luminance) are extracted into a plane
// before the neighbourhood pass so workers index plain bytes.
// ============================================================================

use crate::buffer::{CHANNELS, PixelBuffer, hsv_value, luma, with_value};
use crate::error::Result;
use crate::ops::kernel::Kernel;
use crate::ops::workers::Workers;

/// Bias added to the emboss difference so flat regions render mid-gray.
pub const EMBOSS_BIAS: f64 = 128.0;

/// How neighbourhood reads near the image edge are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Coordinates wrap modulo width/height (toroidal image).
    Wrap,
    /// Only pixels whose whole neighbourhood is inside the image are filtered;
    /// the border keeps the source pixel.
    SkipBorder,
}

impl Boundary {
    #[inline]
    fn covers(self, i: u32, len: u32, radius: u32) -> bool {
        match self {
            Boundary::Wrap => true,
            Boundary::SkipBorder => i >= radius && i + radius < len,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// One byte per pixel, row-major.
struct Plane {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Plane {
    /// Reduce every pixel of `src` to one byte. Call inside the worker pool.
    fn extract<F>(src: &PixelBuffer, workers: &Workers, f: F) -> Self
    where
        F: Fn(u8, u8, u8) -> u8 + Sync,
    {
        let (w, h) = src.dimensions();
        let data = workers
            .map_bands(h as usize, |rows| {
                let mut band = Vec::with_capacity(rows.len() * w as usize);
                for y in rows {
                    band.extend(
                        src.row(y as u32)
                            .chunks_exact(CHANNELS)
                            .map(|p| f(p[0], p[1], p[2])),
                    );
                }
                band
            })
            .concat();
        Self {
            width: w as usize,
            height: h as usize,
            data,
        }
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    fn correlate(&self, kernel: &Kernel, x: u32, y: u32) -> f64 {
        weighted_sum(&self.data, 1, 0, self.width, self.height, x, y, kernel)
    }
}

/// Sum of `kernel` weights times channel `channel` of the neighbourhood around
/// `(x, y)`, with coordinates wrapped at the edges.
#[inline]
fn weighted_sum(
    data: &[u8],
    stride_px: usize,
    channel: usize,
    width: usize,
    height: usize,
    x: u32,
    y: u32,
    kernel: &Kernel,
) -> f64 {
    let r = kernel.radius();
    let mut acc = 0.0f64;
    for dy in -r..=r {
        let sy = wrap(y as isize + dy, height);
        for dx in -r..=r {
            let sx = wrap(x as isize + dx, width);
            let v = data[(sy * width + sx) * stride_px + channel];
            acc += kernel.weight(dy, dx) * v as f64;
        }
    }
    acc
}

#[inline]
fn wrap(i: isize, len: usize) -> usize {
    i.rem_euclid(len as isize) as usize
}

/// Slack added before truncation so a weighted sum that is mathematically an
/// integer is not pushed one level down by rounding error.
const TRUNCATION_SLACK: f64 = 1e-9;

/// Clamp to [0, 255] and truncate.
#[inline]
fn to_u8(v: f64) -> u8 {
    (v + TRUNCATION_SLACK).clamp(0.0, 255.0) as u8
}

// ============================================================================
// GENERIC ENGINES
// ============================================================================

/// Convolve R, G and B independently. Alpha is taken from the center pixel.
pub fn convolve_rgb(
    src: &PixelBuffer,
    kernel: &Kernel,
    boundary: Boundary,
    workers: &Workers,
) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let radius = kernel.radius() as u32;
    let data = src.as_raw();
    let raw = workers.install(|| {
        workers.map_rows(w, h, |y, row_out| {
            row_out.copy_from_slice(src.row(y));
            if !boundary.covers(y, h, radius) {
                return;
            }
            for x in (0..w).filter(|&x| boundary.covers(x, w, radius)) {
                let pi = x as usize * CHANNELS;
                for c in 0..3 {
                    let v = weighted_sum(data, CHANNELS, c, w as usize, h as usize, x, y, kernel);
                    row_out[pi + c] = to_u8(v);
                }
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

/// Convolve the HSV value channel and write it back with the source pixel's
/// hue and saturation.
pub fn convolve_value(
    src: &PixelBuffer,
    kernel: &Kernel,
    boundary: Boundary,
    workers: &Workers,
) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let radius = kernel.radius() as u32;
    let raw = workers.install(|| {
        let value = Plane::extract(src, workers, hsv_value);
        workers.map_rows(w, h, |y, row_out| {
            row_out.copy_from_slice(src.row(y));
            if !boundary.covers(y, h, radius) {
                return;
            }
            for x in (0..w).filter(|&x| boundary.covers(x, w, radius)) {
                let pi = x as usize * CHANNELS;
                let v = to_u8(value.correlate(kernel, x, y));
                let rgb = with_value([row_out[pi], row_out[pi + 1], row_out[pi + 2]], v);
                row_out[pi..pi + 3].copy_from_slice(&rgb);
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

// ============================================================================
// FILTERS
// ============================================================================

/// 3×3 box blur on the value channel, wrapping at the edges.
pub fn smooth(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    convolve_value(src, &Kernel::box_blur3(), Boundary::Wrap, workers)
}

/// 5×5 Gaussian blur on the value channel, wrapping at the edges.
pub fn gaussian(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    convolve_value(src, &Kernel::gaussian5(), Boundary::Wrap, workers)
}

/// 3×3 sharpen on R, G, B. The 1-pixel border is left as in the source.
pub fn sharpen(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    convolve_rgb(src, &Kernel::sharpen3(), Boundary::SkipBorder, workers)
}

/// Sobel gradient magnitude of the luminance, written as the value channel
/// of the source color.
pub fn gradient(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let kx = Kernel::sobel_x();
    let ky = Kernel::sobel_y();
    let raw = workers.install(|| {
        let lum = Plane::extract(src, workers, luma);
        workers.map_rows(w, h, |y, row_out| {
            row_out.copy_from_slice(src.row(y));
            for x in 0..w {
                let gx = lum.correlate(&kx, x, y);
                let gy = lum.correlate(&ky, x, y);
                let mag = to_u8((gx * gx + gy * gy).sqrt());
                let pi = x as usize * CHANNELS;
                let rgb = with_value([row_out[pi], row_out[pi + 1], row_out[pi + 2]], mag);
                row_out[pi..pi + 3].copy_from_slice(&rgb);
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

/// Laplacian of the luminance, clamped, as a gray image.
pub fn laplacian(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let kernel = Kernel::laplacian3();
    let raw = workers.install(|| {
        let lum = Plane::extract(src, workers, luma);
        workers.map_rows(w, h, |y, row_out| {
            let row_in = src.row(y);
            for x in 0..w {
                let v = to_u8(lum.correlate(&kernel, x, y));
                let pi = x as usize * CHANNELS;
                row_out[pi..pi + 3].fill(v);
                row_out[pi + 3] = row_in[pi + 3];
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

/// Luminance difference against the lower-right neighbour, biased to mid-gray.
///
/// The last row and column have no diagonal neighbour and render as flat
/// [`EMBOSS_BIAS`] gray.
pub fn emboss(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let raw = workers.install(|| {
        let lum = Plane::extract(src, workers, luma);
        workers.map_rows(w, h, |y, row_out| {
            let row_in = src.row(y);
            let (y0, y1) = (y as usize, y as usize + 1);
            for x in 0..w as usize {
                let v = if y1 < lum.height && x + 1 < lum.width {
                    let diff = lum.get(x, y0) as f64 - lum.get(x + 1, y1) as f64;
                    to_u8(diff + EMBOSS_BIAS)
                } else {
                    EMBOSS_BIAS as u8
                };
                let pi = x * CHANNELS;
                row_out[pi..pi + 3].fill(v);
                row_out[pi + 3] = row_in[pi + 3];
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}
