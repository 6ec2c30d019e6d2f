// THEORY:
// The `pipeline` module is the top-level API of the denoising engine. It holds the
// explicit `FilterConfig`, the single-threaded `SequentialFilterEngine`, and the
// three blocking entry points the rest of the world calls:
// `filter_sequential`, `filter_parallel` and `benchmark`.
//
// Every entry point takes its configuration as a value. There are no module-level
// tunables; the constants below are only the defaults `FilterConfig::default()`
// starts from.

use crate::core_modules::error::{FilterError, FilterResult};
use crate::core_modules::intensity_buffer::intensity_buffer::{Intensity, IntensityBuffer};
use crate::core_modules::median::MedianSelector;
use crate::core_modules::neighborhood::NeighborhoodSampler;

// Re-export key data structures for the public API.
pub use crate::benchmark::{BenchmarkHarness, BenchmarkOutcome, BenchmarkTimings, PerformanceRecord};
pub use crate::parallel_pipeline::{ParallelFilterEngine, filter_parallel, filter_parallel_with};

/// Window radius used when none is configured (a 3x3 window).
pub const DEFAULT_RADIUS: usize = 1;
/// Chunk edge length, in pixels, used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 45;

/// Configuration for both filter engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Chebyshev radius of the median window. 0 copies the input.
    pub radius: usize,
    /// Edge length of the square chunks handed to parallel workers.
    pub chunk_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FilterConfig {
    pub fn new(radius: usize, chunk_size: usize) -> Self {
        Self { radius, chunk_size }
    }

    /// Builds a config from signed values, as they arrive from a command line.
    pub fn from_signed(radius: i64, chunk_size: i64) -> FilterResult<Self> {
        let radius = usize::try_from(radius).map_err(|_| FilterError::InvalidRadius(radius))?;
        let chunk_size = match usize::try_from(chunk_size) {
            Ok(size) if size > 0 => size,
            _ => return Err(FilterError::InvalidChunkSize(chunk_size)),
        };
        let config = Self { radius, chunk_size };
        config.validate()?;
        Ok(config)
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// A config whose chunk size spreads a `width x height` image over roughly one
    /// chunk per available core.
    pub fn for_available_cores(width: usize, height: usize) -> Self {
        Self::default().with_chunk_size(suggested_chunk_size(width, height, num_cpus::get()))
    }

    pub fn validate(&self) -> FilterResult<()> {
        self.validate_radius()?;
        if self.chunk_size == 0 {
            return Err(FilterError::InvalidChunkSize(0));
        }
        Ok(())
    }

    /// The radius alone; the sequential engine has no use for a chunk size.
    pub fn validate_radius(&self) -> FilterResult<()> {
        let window_side = self.radius.checked_mul(2).and_then(|d| d.checked_add(1));
        if window_side.is_none() {
            return Err(FilterError::InvalidRadius(
                i64::try_from(self.radius).unwrap_or(i64::MAX),
            ));
        }
        Ok(())
    }
}

/// Chunk edge that yields about `workers` square chunks over the image.
pub fn suggested_chunk_size(width: usize, height: usize, workers: usize) -> usize {
    let area = (width * height) as f64;
    let per_worker = area / workers.max(1) as f64;
    (per_worker.sqrt().ceil() as usize).max(1)
}

/// Median of the in-bounds window around `(x, y)`. `scratch` is reused between calls.
#[inline]
pub(crate) fn median_at(
    input: &IntensityBuffer,
    x: usize,
    y: usize,
    radius: usize,
    scratch: &mut Vec<Intensity>,
) -> Intensity {
    NeighborhoodSampler::sample_into(input, x, y, radius, scratch);
    MedianSelector::select(scratch)
}

/// Single-threaded full-image median sweep.
#[derive(Debug, Clone)]
pub struct SequentialFilterEngine {
    radius: usize,
}

impl SequentialFilterEngine {
    pub fn new(config: &FilterConfig) -> FilterResult<Self> {
        config.validate_radius()?;
        Ok(Self {
            radius: config.radius,
        })
    }

    /// Filters `input` into a freshly allocated buffer of the same shape.
    pub fn apply(&self, input: &IntensityBuffer) -> FilterResult<IntensityBuffer> {
        input.ensure_non_empty()?;

        let mut output = IntensityBuffer::new(input.width(), input.height());
        let mut scratch = Vec::new();
        for y in 0..input.height() {
            for x in 0..input.width() {
                output.set(x, y, median_at(input, x, y, self.radius, &mut scratch));
            }
        }
        Ok(output)
    }
}

/// Filters `input` on the calling thread with the default radius.
pub fn filter_sequential(input: &IntensityBuffer) -> FilterResult<IntensityBuffer> {
    filter_sequential_with(input, &FilterConfig::default())
}

pub fn filter_sequential_with(
    input: &IntensityBuffer,
    config: &FilterConfig,
) -> FilterResult<IntensityBuffer> {
    SequentialFilterEngine::new(config)?.apply(input)
}

/// Times a sequential run and then a parallel run of the default configuration.
pub fn benchmark(input: &IntensityBuffer) -> FilterResult<BenchmarkTimings> {
    benchmark_with(input, &FilterConfig::default())
}

pub fn benchmark_with(input: &IntensityBuffer, config: &FilterConfig) -> FilterResult<BenchmarkTimings> {
    BenchmarkHarness::new(*config)?
        .measure(input)
        .map(|outcome| outcome.timings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x3() -> IntensityBuffer {
        IntensityBuffer::from_raw(3, 3, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]).unwrap()
    }

    #[test]
    fn center_of_3x3_is_the_median_of_all_nine() {
        let output = filter_sequential(&grid_3x3()).unwrap();
        assert_eq!(output.get(1, 1), 50);
    }

    #[test]
    fn border_pixels_use_upper_middle_of_clipped_window() {
        let output = filter_sequential(&grid_3x3()).unwrap();
        // (0,0) sees {10,20,40,50}; index 2 of the sorted set.
        assert_eq!(output.get(0, 0), 40);
        // (1,0) sees {10,20,30,40,50,60}; index 3.
        assert_eq!(output.get(1, 0), 40);
        // (2,2) sees {50,60,80,90}; index 2.
        assert_eq!(output.get(2, 2), 80);
    }

    #[test]
    fn salt_noise_is_removed_from_flat_region() {
        let mut noisy = IntensityBuffer::from_fn(7, 7, |_, _| 100);
        noisy.set(3, 3, 255);
        noisy.set(1, 5, 0);
        let output = filter_sequential(&noisy).unwrap();
        assert!(output.as_raw().iter().all(|&v| v == 100));
    }

    #[test]
    fn output_shape_matches_input_and_input_is_untouched() {
        let input = IntensityBuffer::from_fn(13, 4, |x, y| ((x * 37 + y * 11) % 256) as u8);
        let before = input.clone();
        let output = filter_sequential(&input).unwrap();
        assert_eq!((output.width(), output.height()), (13, 4));
        assert_eq!(input, before);
    }

    #[test]
    fn radius_zero_is_identity() {
        let input = IntensityBuffer::from_fn(5, 5, |x, y| (x * 50 + y) as u8);
        let config = FilterConfig::default().with_radius(0);
        assert_eq!(filter_sequential_with(&input, &config).unwrap(), input);
    }

    #[test]
    fn zero_area_is_invalid_dimensions() {
        for (w, h) in [(0, 5), (5, 0), (0, 0)] {
            let input = IntensityBuffer::new(w, h);
            assert_eq!(
                filter_sequential(&input),
                Err(FilterError::InvalidDimensions { width: w, height: h })
            );
        }
    }

    #[test]
    fn signed_config_rejects_negative_values() {
        assert_eq!(FilterConfig::from_signed(-1, 8), Err(FilterError::InvalidRadius(-1)));
        assert_eq!(FilterConfig::from_signed(1, 0), Err(FilterError::InvalidChunkSize(0)));
        assert_eq!(FilterConfig::from_signed(1, -4), Err(FilterError::InvalidChunkSize(-4)));
        assert_eq!(FilterConfig::from_signed(2, 16), Ok(FilterConfig::new(2, 16)));
    }

    #[test]
    fn unaddressable_radius_is_rejected() {
        let config = FilterConfig::default().with_radius(usize::MAX);
        assert!(matches!(config.validate(), Err(FilterError::InvalidRadius(_))));
    }

    #[test]
    fn suggested_chunk_size_targets_worker_count() {
        assert_eq!(suggested_chunk_size(100, 100, 4), 50);
        assert_eq!(suggested_chunk_size(100, 100, 1), 100);
        assert_eq!(suggested_chunk_size(0, 100, 8), 1);
        assert_eq!(suggested_chunk_size(10, 10, 0), 10);
    }
}
