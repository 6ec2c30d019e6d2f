// THEORY:
// The `ParallelFilterEngine` computes exactly what the sequential engine computes,
// but hands each chunk of the image to its own worker through the `ChunkScheduler`.
//
// Key architectural principles:
// 1.  **Same math, different sweep**: Each worker calls the same per-pixel median
//     routine as the sequential engine, so the two outputs are identical for any
//     chunk size.
// 2.  **Shared input, partitioned output**: All workers read the one input buffer
//     through a shared borrow. Each writes only through its own `ChunkRegion`.
// 3.  **Synchronous contract**: `apply` blocks until every worker is joined. The
//     caller cannot tell the work was parallel, except by the clock.
// 4.  **All or nothing**: If any worker fails, the half-written output buffer is
//     dropped and only the error is returned.

use crate::core_modules::chunk_scheduler::ChunkScheduler;
use crate::core_modules::error::FilterResult;
use crate::core_modules::intensity_buffer::intensity_buffer::IntensityBuffer;
use crate::pipeline::{FilterConfig, median_at};

/// Chunk-parallel median sweep. One worker per chunk, one call at a time.
#[derive(Debug, Clone)]
pub struct ParallelFilterEngine {
    radius: usize,
    chunk_size: usize,
}

impl ParallelFilterEngine {
    pub fn new(config: &FilterConfig) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self {
            radius: config.radius,
            chunk_size: config.chunk_size,
        })
    }

    /// Number of workers a call on a `width x height` image will spawn.
    pub fn worker_count(&self, width: usize, height: usize) -> usize {
        width.div_ceil(self.chunk_size) * height.div_ceil(self.chunk_size)
    }

    /// Filters `input` into a freshly allocated buffer of the same shape.
    pub fn apply(&self, input: &IntensityBuffer) -> FilterResult<IntensityBuffer> {
        input.ensure_non_empty()?;

        let scheduler = ChunkScheduler::new(input.width(), input.height(), self.chunk_size)?;
        let mut output = IntensityBuffer::new(input.width(), input.height());
        let radius = self.radius;

        scheduler.run(&mut output, |region| {
            let mut scratch = Vec::new();
            for (x, y) in region.coordinates() {
                region.set(x, y, median_at(input, x, y, radius, &mut scratch));
            }
            Ok(())
        })?;

        Ok(output)
    }
}

/// Filters `input` with one worker per `chunk_size x chunk_size` chunk, default radius.
pub fn filter_parallel(input: &IntensityBuffer, chunk_size: usize) -> FilterResult<IntensityBuffer> {
    filter_parallel_with(input, &FilterConfig::default().with_chunk_size(chunk_size))
}

pub fn filter_parallel_with(
    input: &IntensityBuffer,
    config: &FilterConfig,
) -> FilterResult<IntensityBuffer> {
    ParallelFilterEngine::new(config)?.apply(input)
}
