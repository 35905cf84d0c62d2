// ============================================================================
// FREQUENCY SPECTRUM: separable 2-D DFT and centered log-magnitude view
// ============================================================================
//
// Direct summation, O(W²H + H²W): every row is transformed, then every column
// of the row result. The magnitude pass reduces per-band min/max partials into
// one global range before the normalize-and-center pass.
// ============================================================================

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::buffer::{CHANNELS, PixelBuffer};
use crate::error::Result;
use crate::ops::workers::Workers;

/// 2-D frequency coefficients, row-major (`v * width + u`).
#[derive(Debug, Clone)]
pub struct FrequencyPlane {
    width: usize,
    height: usize,
    coeffs: Vec<Complex64>,
}

impl FrequencyPlane {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Coefficient for horizontal frequency `u`, vertical frequency `v`.
    pub fn get(&self, u: usize, v: usize) -> Complex64 {
        self.coeffs[v * self.width + u]
    }

    pub fn real(&self) -> Vec<f64> {
        self.coeffs.iter().map(|c| c.re).collect()
    }

    pub fn imag(&self) -> Vec<f64> {
        self.coeffs.iter().map(|c| c.im).collect()
    }
}

/// Running min/max of finite log-magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MagnitudeRange {
    min: f64,
    max: f64,
}

impl MagnitudeRange {
    const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// `log(0)` is `-inf`; such bins do not widen the range.
    fn include(self, m: f64) -> Self {
        if !m.is_finite() {
            return self;
        }
        Self {
            min: self.min.min(m),
            max: self.max.max(m),
        }
    }

    fn combine(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Map `m` onto [0, 255]. A degenerate range (uniform spectrum, or no
    /// finite bins at all) and non-finite bins render as 0.
    fn normalize(&self, m: f64) -> u8 {
        if !m.is_finite() || !(self.max > self.min) {
            return 0;
        }
        ((m - self.min) / (self.max - self.min) * 255.0).clamp(0.0, 255.0) as u8
    }
}

/// `e^(-2πik/n)` for `k` in `0..n`.
fn twiddles(n: usize) -> Vec<Complex64> {
    (0..n)
        .map(|k| Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64))
        .collect()
}

/// Gray level fed to the transform: plain RGB average.
#[inline]
fn gray_level(px: &[u8]) -> f64 {
    ((px[0] as u32 + px[1] as u32 + px[2] as u32) / 3) as f64
}

/// Both DFT passes. Call inside the worker pool.
fn dft_2d(src: &PixelBuffer, workers: &Workers) -> FrequencyPlane {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let tw_row = twiddles(w);
    let tw_col = twiddles(h);

    // Pass 1: each row of the gray image.
    let rows: Vec<Complex64> = workers
        .map_bands(h, |band| {
            let mut out = Vec::with_capacity(band.len() * w);
            for y in band {
                let gray: Vec<f64> = src.row(y as u32).chunks_exact(CHANNELS).map(gray_level).collect();
                for u in 0..w {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (i, &g) in gray.iter().enumerate() {
                        acc += tw_row[(u * i) % w] * g;
                    }
                    out.push(acc);
                }
            }
            out
        })
        .concat();

    // Pass 2: each column of the row result. Bands come back column-major.
    let columns = workers.map_bands(w, |band| {
        let start = band.start;
        let mut out = Vec::with_capacity(band.len() * h);
        for x in band {
            for v in 0..h {
                let mut acc = Complex64::new(0.0, 0.0);
                for i in 0..h {
                    acc += tw_col[(v * i) % h] * rows[i * w + x];
                }
                out.push(acc);
            }
        }
        (start, out)
    });

    let mut coeffs = vec![Complex64::new(0.0, 0.0); w * h];
    for (start, band) in columns {
        for (k, column) in band.chunks_exact(h).enumerate() {
            let x = start + k;
            for (v, &c) in column.iter().enumerate() {
                coeffs[v * w + x] = c;
            }
        }
    }

    FrequencyPlane {
        width: w,
        height: h,
        coeffs,
    }
}

/// Log-magnitude, normalized and shifted so frequency (0, 0) sits at the
/// image center. Call inside the worker pool.
fn magnitude_image(plane: &FrequencyPlane, workers: &Workers) -> PixelBuffer {
    let (w, h) = (plane.width, plane.height);

    let partials = workers.map_bands(h, |band| {
        let mut range = MagnitudeRange::EMPTY;
        let mut mags = Vec::with_capacity(band.len() * w);
        for i in band.start * w..band.end * w {
            let m = plane.coeffs[i].norm().ln();
            range = range.include(m);
            mags.push(m);
        }
        (mags, range)
    });

    let mut magnitude = Vec::with_capacity(w * h);
    let mut range = MagnitudeRange::EMPTY;
    for (mags, partial) in partials {
        magnitude.extend(mags);
        range = range.combine(partial);
    }
    log::debug!(
        "spectrum log-magnitude range [{:.3}, {:.3}] over {}x{}",
        range.min,
        range.max,
        w,
        h
    );

    let (half_w, half_h) = (w / 2, h / 2);
    let raw = workers.map_rows(w as u32, h as u32, |y, row_out| {
        let sy = (y as usize + h - half_h) % h;
        for x in 0..w {
            let sx = (x + w - half_w) % w;
            let v = range.normalize(magnitude[sy * w + sx]);
            let pi = x * CHANNELS;
            row_out[pi..pi + 3].fill(v);
            row_out[pi + 3] = 255;
        }
    });
    PixelBuffer::from_parts(w as u32, h as u32, raw)
}

/// Forward 2-D DFT of the gray image.
pub fn forward_dft(src: &PixelBuffer, workers: &Workers) -> Result<FrequencyPlane> {
    workers.install(|| dft_2d(src, workers))
}

/// Centered log-magnitude spectrum of `src` as an opaque gray image.
pub fn spectrum(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    workers.install(|| {
        let plane = dft_2d(src, workers);
        magnitude_image(&plane, workers)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ignores_non_finite() {
        let r = MagnitudeRange::EMPTY
            .include(f64::NEG_INFINITY)
            .include(1.0)
            .include(3.0);
        assert_eq!(r, MagnitudeRange { min: 1.0, max: 3.0 });
        assert_eq!(r.normalize(3.0), 255);
        assert_eq!(r.normalize(1.0), 0);
        assert_eq!(r.normalize(2.0), 127);
        assert_eq!(r.normalize(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn combine_is_order_independent() {
        let a = MagnitudeRange::EMPTY.include(-2.0).include(0.5);
        let b = MagnitudeRange::EMPTY.include(4.0);
        assert_eq!(a.combine(b), b.combine(a));
        assert_eq!(a.combine(MagnitudeRange::EMPTY), a);
    }

    #[test]
    fn degenerate_range_maps_to_zero() {
        let r = MagnitudeRange::EMPTY.include(2.0);
        assert_eq!(r.normalize(2.0), 0);
        assert_eq!(MagnitudeRange::EMPTY.normalize(0.0), 0);
    }

    #[test]
    fn twiddle_unit_circle() {
        let t = twiddles(4);
        assert!((t[1].re).abs() < 1e-12);
        assert!((t[1].im + 1.0).abs() < 1e-12);
        assert!((t[2].re + 1.0).abs() < 1e-12);
    }
}
