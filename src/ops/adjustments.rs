// ============================================================================
// POINTWISE ADJUSTMENTS: every output pixel depends only on its input pixel
// ============================================================================
//
// All operations read the source buffer, allocate a new one of the same size,
// and fill it row-parallel on the configured worker pool.
// Alpha is carried through untouched.
// ============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::{CHANNELS, PixelBuffer};
use crate::error::Result;
use crate::ops::workers::Workers;

/// Shift applied by brighten (positive) and darken (negative).
pub const BRIGHTNESS_STEP: i32 = 20;
/// Channels above this become 255 in the binary threshold.
pub const THRESHOLD: u8 = 127;
pub const POSTERIZE_LEVELS: u32 = 4;
pub const GAMMA: f64 = 0.5;
/// Out of 100: a draw of `NOISE_WHITE` paints white, `NOISE_BLACK` black.
pub const NOISE_WHITE: u32 = 99;
pub const NOISE_BLACK: u32 = 23;

// ============================================================================
// HELPERS
// ============================================================================

/// Apply `transform` to every pixel of `src` on the worker pool.
fn map_pixels<F>(src: &PixelBuffer, workers: &Workers, transform: F) -> Result<PixelBuffer>
where
    F: Fn([u8; 4]) -> [u8; 4] + Sync,
{
    let (w, h) = src.dimensions();
    let raw = workers.install(|| {
        workers.map_rows(w, h, |y, row_out| {
            let row_in = src.row(y);
            for (out, px) in row_out
                .chunks_exact_mut(CHANNELS)
                .zip(row_in.chunks_exact(CHANNELS))
            {
                out.copy_from_slice(&transform([px[0], px[1], px[2], px[3]]));
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

/// Run R, G and B through a 256-entry lookup table.
fn map_through_lut(src: &PixelBuffer, workers: &Workers, lut: &[u8; 256]) -> Result<PixelBuffer> {
    map_pixels(src, workers, |[r, g, b, a]| {
        [lut[r as usize], lut[g as usize], lut[b as usize], a]
    })
}

/// Table of `f(c)` clamped to [0, 255] and truncated.
fn build_lut<F: Fn(f64) -> f64>(f: F) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = f(i as f64).clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Shift by `delta`. Results strictly inside (0, 255) are kept; anything else,
/// including exactly 0 or 255, snaps to `limit`.
#[inline]
fn shift_or_limit(c: u8, delta: i32, limit: u8) -> u8 {
    let v = c as i32 + delta;
    if v > 0 && v < 255 { v as u8 } else { limit }
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub fn brighten(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    brighten_darken(src, workers, BRIGHTNESS_STEP, 255)
}

pub fn darken(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    brighten_darken(src, workers, -BRIGHTNESS_STEP, 0)
}

fn brighten_darken(src: &PixelBuffer, workers: &Workers, delta: i32, limit: u8) -> Result<PixelBuffer> {
    map_pixels(src, workers, |[r, g, b, a]| {
        [
            shift_or_limit(r, delta, limit),
            shift_or_limit(g, delta, limit),
            shift_or_limit(b, delta, limit),
            a,
        ]
    })
}

/// Invert R, G and B.
pub fn negate(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    map_pixels(src, workers, |[r, g, b, a]| [255 - r, 255 - g, 255 - b, a])
}

/// Per-channel threshold at [`THRESHOLD`].
///
/// Each channel is tested on its own, so on color input the result can be
/// any of the eight primaries. After [`grayscale`] the channels are equal and
/// this is a plain black/white threshold.
pub fn binary_threshold(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let t = |c: u8| if c > THRESHOLD { 255 } else { 0 };
    map_pixels(src, workers, |[r, g, b, a]| [t(r), t(g), t(b), a])
}

/// Unweighted average of R, G and B, floored.
pub fn grayscale(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    map_pixels(src, workers, |[r, g, b, a]| {
        let gray = ((r as u32 + g as u32 + b as u32) / 3) as u8;
        [gray, gray, gray, a]
    })
}

/// Quantize each channel to [`POSTERIZE_LEVELS`] levels.
pub fn posterize(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let interval = 256 / POSTERIZE_LEVELS;
    let step = 255 / (POSTERIZE_LEVELS - 1);
    let q = |c: u8| ((c as u32 / interval) * step) as u8;
    map_pixels(src, workers, |[r, g, b, a]| [q(r), q(g), q(b), a])
}

/// `255 * (c / 255) ^ GAMMA`, rounded.
pub fn gamma(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let lut = build_lut(|c| (c / 255.0).powf(GAMMA) * 255.0 + 0.5);
    map_through_lut(src, workers, &lut)
}

/// Stretch [64, 192] onto [0, 255].
pub fn enhance_contrast(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let lut = build_lut(|c| (c - 64.0) * (255.0 / 128.0));
    map_through_lut(src, workers, &lut)
}

/// Compress [0, 255] into [64, 192].
pub fn reduce_contrast(src: &PixelBuffer, workers: &Workers) -> Result<PixelBuffer> {
    let lut = build_lut(|c| c * (128.0 / 255.0) + 64.0);
    map_through_lut(src, workers, &lut)
}

/// Salt-and-pepper noise.
///
/// Each row draws from its own generator seeded by `(seed, row)`, so the
/// output does not depend on how rows are split across workers. The
/// randomness is cosmetic only.
pub fn noise(src: &PixelBuffer, workers: &Workers, seed: u64) -> Result<PixelBuffer> {
    let (w, h) = src.dimensions();
    let raw = workers.install(|| {
        workers.map_rows(w, h, |y, row_out| {
            let mut rng = StdRng::seed_from_u64(row_seed(seed, y));
            row_out.copy_from_slice(src.row(y));
            for px in row_out.chunks_exact_mut(CHANNELS) {
                match rng.gen_range(0..100u32) {
                    NOISE_WHITE => px[..3].fill(255),
                    NOISE_BLACK => px[..3].fill(0),
                    _ => {}
                }
            }
        })
    })?;
    Ok(PixelBuffer::from_parts(w, h, raw))
}

fn row_seed(seed: u64, row: u32) -> u64 {
    seed ^ (row as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_snaps_boundaries_to_limit() {
        assert_eq!(shift_or_limit(100, 20, 255), 120);
        assert_eq!(shift_or_limit(250, 20, 255), 255);
        // 235 + 20 lands exactly on 255, which is treated as out of range.
        assert_eq!(shift_or_limit(235, 20, 255), 255);
        // 20 - 20 lands exactly on 0.
        assert_eq!(shift_or_limit(20, -20, 0), 0);
        assert_eq!(shift_or_limit(10, -20, 0), 0);
        assert_eq!(shift_or_limit(21, -20, 0), 1);
    }

    #[test]
    fn contrast_tables() {
        let enhance = build_lut(|c| (c - 64.0) * (255.0 / 128.0));
        assert_eq!(enhance[0], 0);
        assert_eq!(enhance[64], 0);
        assert_eq!(enhance[128], 127);
        assert_eq!(enhance[255], 255);

        let reduce = build_lut(|c| c * (128.0 / 255.0) + 64.0);
        assert_eq!(reduce[0], 64);
        assert_eq!(reduce[255], 192);
    }

    #[test]
    fn gamma_table_endpoints() {
        let lut = build_lut(|c| (c / 255.0).powf(GAMMA) * 255.0 + 0.5);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        // sqrt(64/255) * 255 = 127.75
        assert_eq!(lut[64], 128);
    }

    #[test]
    fn row_seeds_differ() {
        assert_ne!(row_seed(7, 0), row_seed(7, 1));
        assert_ne!(row_seed(7, 0), row_seed(8, 0));
    }
}
