// ============================================================================
// PIXEL BUFFER: immutable RGBA8 image state shared by every transform
// ============================================================================
//
// A buffer is produced exactly once (by a load or by one transform call) and is
// never mutated afterwards. Workers read it concurrently through `&PixelBuffer`.
// ============================================================================

use std::fmt;

use image::{Rgba, RgbaImage};

use crate::error::{EngineError, Result};

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// One edited image state.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wrap a decoded image. Rejects zero-sized images.
    pub fn from_rgba(image: RgbaImage) -> Result<Self> {
        check_dims(image.width(), image.height())?;
        Ok(Self { image })
    }

    /// Build from interleaved RGBA bytes.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Self> {
        check_dims(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        if raw.len() != expected {
            return Err(EngineError::BufferSize {
                width,
                height,
                expected,
                actual: raw.len(),
            });
        }
        Ok(Self::from_parts(width, height, raw))
    }

    /// A buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        check_dims(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        })
    }

    /// A buffer whose pixels are produced by `f(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Result<Self>
    where
        F: Fn(u32, u32) -> [u8; 4],
    {
        check_dims(width, height)?;
        Ok(Self {
            image: RgbaImage::from_fn(width, height, |x, y| Rgba(f(x, y))),
        })
    }

    /// Engine-internal constructor for freshly computed output.
    /// A length mismatch here is an engine bug, not bad input.
    pub(crate) fn from_parts(width: u32, height: u32, raw: Vec<u8>) -> Self {
        assert!(width > 0 && height > 0, "transform produced an empty buffer");
        assert_eq!(
            raw.len(),
            width as usize * height as usize * CHANNELS,
            "output buffer does not match {width}x{height}"
        );
        let image = RgbaImage::from_raw(width, height, raw).expect("length checked above");
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Interleaved bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.image.as_raw()[start..start + stride]
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.image.width() as usize * CHANNELS
    }

    /// Memory held by the pixel data.
    pub fn byte_size(&self) -> usize {
        self.image.as_raw().len()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

fn check_dims(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::EmptyImage { width, height });
    }
    Ok(())
}

// ============================================================================
// COLOR HELPERS
// ============================================================================

/// Integer luminance, weighted 11:16:5 over 32.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 11 + g as u32 * 16 + b as u32 * 5) / 32) as u8
}

/// HSV value channel: the largest of R, G, B.
#[inline]
pub fn hsv_value(r: u8, g: u8, b: u8) -> u8 {
    r.max(g).max(b)
}

/// Replace the HSV value of `rgb` with `v`, keeping hue and saturation.
///
/// Scaling all three channels by `v / max` leaves both hue and
/// `(max - min) / max` unchanged. Black has no hue and comes back gray.
#[inline]
pub fn with_value(rgb: [u8; 3], v: u8) -> [u8; 3] {
    let max = hsv_value(rgb[0], rgb[1], rgb[2]) as u32;
    if max == 0 {
        return [v, v, v];
    }
    let v = v as u32;
    let scale = |c: u8| ((c as u32 * v + max / 2) / max).min(255) as u8;
    [scale(rgb[0]), scale(rgb[1]), scale(rgb[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            PixelBuffer::filled(0, 4, [0, 0, 0, 255]),
            Err(EngineError::EmptyImage { width: 0, height: 4 })
        ));
        assert!(PixelBuffer::from_raw(3, 0, Vec::new()).is_err());
    }

    #[test]
    fn rejects_short_raw_data() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, EngineError::BufferSize { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn row_slices_follow_stride() {
        let buf = PixelBuffer::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]).unwrap();
        assert_eq!(buf.stride(), 12);
        assert_eq!(&buf.row(1)[4..8], &[1, 1, 0, 255]);
        assert_eq!(buf.pixel(2, 1), [2, 1, 0, 255]);
    }

    #[test]
    fn luma_of_white_and_black() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(100, 100, 100), 100);
    }

    #[test]
    fn luma_weights_green_over_red_over_blue() {
        assert_eq!(luma(255, 0, 0), 87);
        assert_eq!(luma(0, 255, 0), 127);
        assert_eq!(luma(0, 0, 255), 39);
        assert_eq!(luma(30, 60, 90), ((30u32 * 11 + 60 * 16 + 90 * 5) / 32) as u8);
    }

    #[test]
    fn with_value_keeps_hue() {
        assert_eq!(with_value([200, 100, 0], 100), [100, 50, 0]);
        assert_eq!(with_value([0, 0, 0], 77), [77, 77, 77]);
        assert_eq!(with_value([90, 90, 90], 30), [30, 30, 30]);
    }
}
