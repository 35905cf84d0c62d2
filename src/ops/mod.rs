// ============================================================================
// OPS MODULE: the transform library
// ============================================================================
//
// Layout:
//   workers.rs      per-call fork-join pool, static row/column bands
//   kernel.rs       convolution weight matrices
//   adjustments.rs  pointwise color maps (brighten, negate, gamma, ...)
//   filters.rs      neighbourhood filters (smooth, sharpen, edges, emboss)
//   spectrum.rs     2-D DFT and centered log-magnitude view
//
// Every transform takes `&PixelBuffer` and returns a new `PixelBuffer` of the
// same size. The source is never modified.
// ============================================================================

pub mod adjustments;
pub mod filters;
pub mod kernel;
pub mod spectrum;
pub mod workers;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

pub use workers::{EngineConfig, Workers};

/// Every transform the engine offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Brighten,
    Darken,
    Negate,
    Grayscale,
    BinaryThreshold,
    Noise,
    Posterize,
    Gamma,
    EnhanceContrast,
    ReduceContrast,
    Smooth,
    Sharpen,
    Gradient,
    Laplacian,
    Gaussian,
    Emboss,
    Spectrum,
}

impl Transform {
    pub const ALL: [Transform; 17] = [
        Transform::Brighten,
        Transform::Darken,
        Transform::Negate,
        Transform::Grayscale,
        Transform::BinaryThreshold,
        Transform::Noise,
        Transform::Posterize,
        Transform::Gamma,
        Transform::EnhanceContrast,
        Transform::ReduceContrast,
        Transform::Smooth,
        Transform::Sharpen,
        Transform::Gradient,
        Transform::Laplacian,
        Transform::Gaussian,
        Transform::Emboss,
        Transform::Spectrum,
    ];

    /// Kebab-case identifier used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Brighten => "brighten",
            Transform::Darken => "darken",
            Transform::Negate => "negate",
            Transform::Grayscale => "grayscale",
            Transform::BinaryThreshold => "binary-threshold",
            Transform::Noise => "noise",
            Transform::Posterize => "posterize",
            Transform::Gamma => "gamma",
            Transform::EnhanceContrast => "enhance-contrast",
            Transform::ReduceContrast => "reduce-contrast",
            Transform::Smooth => "smooth",
            Transform::Sharpen => "sharpen",
            Transform::Gradient => "gradient",
            Transform::Laplacian => "laplacian",
            Transform::Gaussian => "gaussian",
            Transform::Emboss => "emboss",
            Transform::Spectrum => "spectrum",
        }
    }

    /// Human-readable label, used for history entries.
    pub fn label(&self) -> &'static str {
        match self {
            Transform::Brighten => "Brighten",
            Transform::Darken => "Darken",
            Transform::Negate => "Negate",
            Transform::Grayscale => "Grayscale",
            Transform::BinaryThreshold => "Binary Threshold",
            Transform::Noise => "Salt & Pepper Noise",
            Transform::Posterize => "Posterize",
            Transform::Gamma => "Gamma",
            Transform::EnhanceContrast => "Enhance Contrast",
            Transform::ReduceContrast => "Reduce Contrast",
            Transform::Smooth => "Smooth",
            Transform::Sharpen => "Sharpen",
            Transform::Gradient => "Gradient",
            Transform::Laplacian => "Laplacian",
            Transform::Gaussian => "Gaussian Blur",
            Transform::Emboss => "Emboss",
            Transform::Spectrum => "Frequency Spectrum",
        }
    }

    /// Run the transform on the configured worker pool.
    pub fn apply(&self, src: &PixelBuffer, config: &EngineConfig) -> Result<PixelBuffer> {
        let workers = &config.workers;
        match self {
            Transform::Brighten => adjustments::brighten(src, workers),
            Transform::Darken => adjustments::darken(src, workers),
            Transform::Negate => adjustments::negate(src, workers),
            Transform::Grayscale => adjustments::grayscale(src, workers),
            Transform::BinaryThreshold => adjustments::binary_threshold(src, workers),
            Transform::Noise => adjustments::noise(src, workers, config.noise_seed),
            Transform::Posterize => adjustments::posterize(src, workers),
            Transform::Gamma => adjustments::gamma(src, workers),
            Transform::EnhanceContrast => adjustments::enhance_contrast(src, workers),
            Transform::ReduceContrast => adjustments::reduce_contrast(src, workers),
            Transform::Smooth => filters::smooth(src, workers),
            Transform::Sharpen => filters::sharpen(src, workers),
            Transform::Gradient => filters::gradient(src, workers),
            Transform::Laplacian => filters::laplacian(src, workers),
            Transform::Gaussian => filters::gaussian(src, workers),
            Transform::Emboss => filters::emboss(src, workers),
            Transform::Spectrum => spectrum::spectrum(src, workers),
        }
    }

    /// Like [`Transform::apply`], also reporting wall-clock time.
    pub fn apply_timed(&self, src: &PixelBuffer, config: &EngineConfig) -> Result<(PixelBuffer, TransformRun)> {
        log::debug!(
            "{} on {}x{} with {} worker(s)",
            self.name(),
            src.width(),
            src.height(),
            config.workers.count()
        );
        let start = Instant::now();
        let out = self.apply(src, config)?;
        let run = TransformRun {
            transform: *self,
            workers: config.workers,
            elapsed: start.elapsed(),
        };
        log::info!("{run}");
        Ok((out, run))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transform {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace('_', "-");
        match key.as_str() {
            "threshold" => return Ok(Transform::BinaryThreshold),
            "invert" => return Ok(Transform::Negate),
            "blur" => return Ok(Transform::Gaussian),
            "fft" => return Ok(Transform::Spectrum),
            _ => {}
        }
        Transform::ALL
            .iter()
            .copied()
            .find(|t| t.name() == key)
            .ok_or_else(|| EngineError::UnknownTransform(s.to_string()))
    }
}

/// Timing of one transform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformRun {
    pub transform: Transform,
    pub workers: Workers,
    pub elapsed: Duration,
}

impl fmt::Display for TransformRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} took {:.1}ms on {} worker(s)",
            self.transform.label(),
            self.elapsed.as_secs_f64() * 1000.0,
            self.workers.count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for t in Transform::ALL {
            assert_eq!(t.name().parse::<Transform>().unwrap(), t);
        }
    }

    #[test]
    fn aliases_and_case() {
        assert_eq!("FFT".parse::<Transform>().unwrap(), Transform::Spectrum);
        assert_eq!("binary_threshold".parse::<Transform>().unwrap(), Transform::BinaryThreshold);
        assert!(matches!(
            "sepia".parse::<Transform>(),
            Err(EngineError::UnknownTransform(name)) if name == "sepia"
        ));
    }
}
