//! Convolution kernels.
//!
//! A kernel is built once before the parallel region and only read by
//! workers afterwards.

/// Odd-sized square weight matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Panics unless `size` is odd and `weights` has `size * size` entries.
    pub fn new(size: usize, weights: Vec<f64>) -> Self {
        assert!(size % 2 == 1, "kernel size must be odd, got {size}");
        assert_eq!(
            weights.len(),
            size * size,
            "kernel of size {size} needs {} weights",
            size * size
        );
        Self { size, weights }
    }

    /// Integer weights divided by a common normalizer.
    pub fn from_integer(size: usize, weights: &[i32], divisor: f64) -> Self {
        Self::new(size, weights.iter().map(|&w| w as f64 / divisor).collect())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn radius(&self) -> isize {
        (self.size / 2) as isize
    }

    /// Weight at signed offset `(dy, dx)` from the center.
    #[inline]
    pub fn weight(&self, dy: isize, dx: isize) -> f64 {
        let r = self.radius();
        self.weights[((dy + r) as usize) * self.size + (dx + r) as usize]
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// 3×3 box average.
    pub fn box_blur3() -> Self {
        Self::new(3, vec![1.0 / 9.0; 9])
    }

    pub fn sharpen3() -> Self {
        Self::from_integer(3, &[0, -1, 0, -1, 5, -1, 0, -1, 0], 1.0)
    }

    /// Horizontal-edge Sobel, normalized by 4.
    pub fn sobel_x() -> Self {
        Self::from_integer(3, &[-1, -2, -1, 0, 0, 0, 1, 2, 1], 4.0)
    }

    /// Vertical-edge Sobel, normalized by 4.
    pub fn sobel_y() -> Self {
        Self::from_integer(3, &[-1, 0, 1, -2, 0, 2, -1, 0, 1], 4.0)
    }

    pub fn laplacian3() -> Self {
        Self::from_integer(3, &[0, 1, 0, 1, -4, 1, 0, 1, 0], 1.0)
    }

    /// 5×5 Gaussian approximation (weights sum to 273).
    pub fn gaussian5() -> Self {
        #[rustfmt::skip]
        let w = [
            1,  4,  7,  4, 1,
            4, 16, 26, 16, 4,
            7, 26, 41, 26, 7,
            4, 16, 26, 16, 4,
            1,  4,  7,  4, 1,
        ];
        Self::from_integer(5, &w, 273.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_kernels_sum_to_one() {
        assert!((Kernel::box_blur3().sum() - 1.0).abs() < 1e-5);
        assert!((Kernel::gaussian5().sum() - 1.0).abs() < 1e-5);
        assert!((Kernel::sharpen3().sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn edge_kernels_sum_to_zero() {
        assert_eq!(Kernel::laplacian3().sum(), 0.0);
        assert_eq!(Kernel::sobel_x().sum(), 0.0);
        assert_eq!(Kernel::sobel_y().sum(), 0.0);
    }

    #[test]
    fn signed_offsets() {
        let k = Kernel::sharpen3();
        assert_eq!(k.radius(), 1);
        assert_eq!(k.weight(0, 0), 5.0);
        assert_eq!(k.weight(-1, 0), -1.0);
        assert_eq!(k.weight(1, 1), 0.0);
        assert_eq!(Kernel::sobel_x().weight(1, 0), 0.5);
    }

    #[test]
    #[should_panic(expected = "odd")]
    fn even_kernel_panics() {
        Kernel::new(2, vec![0.25; 4]);
    }

    #[test]
    #[should_panic]
    fn wrong_weight_count_panics() {
        Kernel::new(3, vec![1.0; 8]);
    }
}
