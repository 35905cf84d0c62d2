// ============================================================================
// WORKERS: per-call fork-join pool and static row partitioning
// ============================================================================
//
// Every transform call builds a pool of exactly `count` threads, splits the
// image into `count` contiguous bands of rows (or columns), and blocks until
// all bands are done. Bands write disjoint output slices, so no locking.
// ============================================================================

use std::ops::{Range, RangeInclusive};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::buffer::CHANNELS;
use crate::error::{EngineError, Result};

/// Seed used for the noise transform when none is given.
pub const DEFAULT_NOISE_SEED: u64 = 0x5eed_f00d;

/// Number of worker threads a transform call runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Workers(usize);

impl Workers {
    pub const MAX: usize = 16;
    pub const DEFAULT: usize = 8;
    /// Range offered to interactive users; 1 is reserved for benchmarking.
    pub const UI_RANGE: RangeInclusive<usize> = 2..=16;

    pub fn new(count: usize) -> Result<Self> {
        if !(1..=Self::MAX).contains(&count) {
            return Err(EngineError::WorkerCount {
                requested: count,
                max: Self::MAX,
            });
        }
        Ok(Self(count))
    }

    /// Single worker, for timing comparisons against the parallel run.
    pub fn sequential() -> Self {
        Self(1)
    }

    pub fn count(&self) -> usize {
        self.0
    }

    pub fn is_sequential(&self) -> bool {
        self.0 == 1
    }

    /// Run `f` on a fresh pool of `count` threads and wait for it.
    pub fn install<R, F>(&self, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.0)
            .thread_name(|i| format!("parafx-worker-{i}"))
            .build()?;
        Ok(pool.install(f))
    }

    /// Length of each static band when `len` items are split across workers.
    pub(crate) fn band_len(&self, len: usize) -> usize {
        len.div_ceil(self.0).max(1)
    }

    /// Allocate a `width`×`height` RGBA output and fill it row by row.
    ///
    /// `f` receives the row index and that row's bytes. Must be called from
    /// inside [`Workers::install`] for the pool size to apply.
    pub(crate) fn map_rows<F>(&self, width: u32, height: u32, f: F) -> Vec<u8>
    where
        F: Fn(u32, &mut [u8]) + Sync,
    {
        let stride = width as usize * CHANNELS;
        let mut out = vec![0u8; stride * height as usize];
        let band = self.band_len(height as usize);
        out.par_chunks_mut(stride * band)
            .enumerate()
            .for_each(|(b, chunk)| {
                for (i, row) in chunk.chunks_mut(stride).enumerate() {
                    f((b * band + i) as u32, row);
                }
            });
        out
    }

    /// Split `0..len` into static bands, run `f` on each in parallel, and
    /// return the per-band results in band order.
    pub(crate) fn map_bands<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync,
    {
        let band = self.band_len(len);
        let starts: Vec<usize> = (0..len).step_by(band).collect();
        starts
            .into_par_iter()
            .map(|start| f(start..(start + band).min(len)))
            .collect()
    }
}

impl Default for Workers {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Settings for one transform invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub workers: Workers,
    /// Seed for the noise transform. Fixed by default so output is reproducible.
    pub noise_seed: u64,
}

impl EngineConfig {
    pub fn new(workers: Workers) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: Workers::default(),
            noise_seed: DEFAULT_NOISE_SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_bounds() {
        assert!(Workers::new(0).is_err());
        assert!(Workers::new(17).is_err());
        assert_eq!(Workers::new(16).unwrap().count(), 16);
        assert_eq!(Workers::default().count(), 8);
        assert!(Workers::sequential().is_sequential());
    }

    #[test]
    fn bands_cover_every_index_once() {
        let workers = Workers::new(3).unwrap();
        let bands = workers
            .install(|| workers.map_bands(10, |r| r.collect::<Vec<_>>()))
            .unwrap();
        assert_eq!(bands.len(), 3);
        let flat: Vec<usize> = bands.into_iter().flatten().collect();
        assert_eq!(flat, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn more_workers_than_rows() {
        let workers = Workers::new(16).unwrap();
        let out = workers
            .install(|| workers.map_rows(2, 3, |y, row| row.fill(y as u8)))
            .unwrap();
        assert_eq!(out.len(), 2 * 3 * 4);
        assert!(out[16..].iter().all(|&b| b == 2));
    }
}
