// THEORY:
// The `ChunkScheduler` is the fan-out/join core of the parallel engine. It owns a
// `ChunkGrid`, carves the output buffer into one write region per chunk, spawns one
// task per region and blocks until every task has reached a terminal state.
//
// Key architectural principles:
// 1.  **Disjoint write regions**: The output is split row by row, and each row is
//     split at chunk-column boundaries with `split_at_mut`. Every `ChunkRegion`
//     ends up holding `&mut` row segments that no other region can reach, so the
//     borrow checker, not a lock, guarantees that writes never overlap.
// 2.  **Structured concurrency**: Workers are tasks in a `rayon::scope` running on
//     the global pool, so a chunk size of 1 means many small tasks, not many
//     threads. The scope cannot be left while any task is still running, so no
//     worker outlives the call and the shared read-only input needs no copying or
//     reference counting.
// 3.  **Join before judging**: Each task writes its outcome into its own slot,
//     indexed by chunk. Only after the scope has joined every task is the failure
//     with the lowest chunk index reported. A panicking worker is caught inside its
//     task and becomes a `WorkerFailure`.
// 4.  **No ordering**: Workers never wait on each other. Completion order has no
//     effect on the result.

use crate::core_modules::chunk::chunk::{Chunk, ChunkGrid};
use crate::core_modules::error::{FilterError, FilterResult};
use crate::core_modules::intensity_buffer::intensity_buffer::{Intensity, IntensityBuffer};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// The slice of the output buffer one worker is allowed to write.
pub struct ChunkRegion<'a> {
    chunk: Chunk,
    /// One segment per image row the chunk spans, each `chunk.width()` long.
    rows: Vec<&'a mut [Intensity]>,
}

impl<'a> ChunkRegion<'a> {
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Image coordinates covered by this region, row-major.
    pub fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let Chunk { x0, x1, y0, y1, .. } = self.chunk;
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }

    /// Reads back a value at image coordinate `(x, y)`, which must lie in the chunk.
    pub fn get(&self, x: usize, y: usize) -> Intensity {
        debug_assert!(self.chunk.contains(x, y));
        self.rows[y - self.chunk.y0][x - self.chunk.x0]
    }

    /// Writes at image coordinate `(x, y)`, which must lie in the chunk.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: Intensity) {
        debug_assert!(self.chunk.contains(x, y));
        self.rows[y - self.chunk.y0][x - self.chunk.x0] = value;
    }
}

/// Partitions an image into chunks and runs one worker per chunk.
#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    grid: ChunkGrid,
    image_width: usize,
    image_height: usize,
}

impl ChunkScheduler {
    pub fn new(image_width: usize, image_height: usize, chunk_size: usize) -> FilterResult<Self> {
        Ok(Self {
            grid: ChunkGrid::new(image_width, image_height, chunk_size)?,
            image_width,
            image_height,
        })
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Splits `output` into one disjoint `ChunkRegion` per chunk, in chunk-index order.
    pub fn partition<'a>(&self, output: &'a mut IntensityBuffer) -> FilterResult<Vec<ChunkRegion<'a>>> {
        if output.width() != self.image_width || output.height() != self.image_height {
            return Err(FilterError::BufferSizeMismatch {
                width: self.image_width,
                height: self.image_height,
                expected: self.image_width * self.image_height,
                actual: output.as_raw().len(),
            });
        }

        let mut regions: Vec<ChunkRegion<'a>> = self
            .grid
            .iter()
            .map(|chunk| ChunkRegion {
                chunk,
                rows: Vec::with_capacity(chunk.height()),
            })
            .collect();

        let columns = self.grid.columns();
        let chunk_size = self.grid.chunk_size();

        for (y, row) in output.rows_mut().enumerate() {
            let band_start = (y / chunk_size) * columns;
            let mut rest = row;
            for region in &mut regions[band_start..band_start + columns] {
                let (segment, tail) = std::mem::take(&mut rest).split_at_mut(region.chunk.width());
                region.rows.push(segment);
                rest = tail;
            }
        }

        Ok(regions)
    }

    /// Fans out one scoped task per chunk and joins them all.
    ///
    /// Returns the failure with the lowest chunk index, if any, but only after every
    /// worker has finished. On failure the contents of `output` are unspecified.
    pub fn run<F>(&self, output: &mut IntensityBuffer, worker: F) -> FilterResult<()>
    where
        F: Fn(&mut ChunkRegion<'_>) -> FilterResult<()> + Sync,
    {
        let regions = self.partition(output)?;
        log::debug!(
            "dispatching {} chunk workers ({}x{} grid, edge {} px) over {}x{} image",
            regions.len(),
            self.grid.columns(),
            self.grid.rows(),
            self.grid.chunk_size(),
            self.image_width,
            self.image_height,
        );

        let worker = &worker;
        let mut outcomes: Vec<Option<FilterResult<()>>> = Vec::with_capacity(regions.len());
        outcomes.resize_with(regions.len(), || None);

        // --- 1. Fan-out, 2. Join barrier ---
        rayon::scope(|scope| {
            for (mut region, slot) in regions.into_iter().zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    let index = region.chunk.index;
                    let outcome = match catch_unwind(AssertUnwindSafe(|| worker(&mut region))) {
                        Ok(result) => result.map_err(|err| as_worker_failure(index, err)),
                        Err(payload) => Err(FilterError::WorkerFailure {
                            chunk: index,
                            reason: panic_message(payload.as_ref()),
                        }),
                    };
                    *slot = Some(outcome);
                });
            }
        });

        // --- 3. Deterministic failure selection ---
        // Slots are in chunk-index order, so the first error seen is the lowest.
        let mut first_failure: Option<FilterError> = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let outcome = outcome.unwrap_or_else(|| {
                Err(FilterError::WorkerFailure {
                    chunk: index,
                    reason: "worker finished without reporting".to_string(),
                })
            });
            if let Err(err) = outcome {
                log::warn!("chunk worker {index} failed: {err}");
                first_failure.get_or_insert(err);
            }
        }

        first_failure.map_or(Ok(()), Err)
    }
}

fn as_worker_failure(chunk: usize, err: FilterError) -> FilterError {
    match err {
        FilterError::WorkerFailure { .. } => err,
        other => FilterError::WorkerFailure {
            chunk,
            reason: other.to_string(),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn regions_cover_the_output_exactly_once() {
        for chunk_size in 1..=12 {
            let mut output = IntensityBuffer::new(11, 7);
            let scheduler = ChunkScheduler::new(11, 7, chunk_size).unwrap();
            scheduler
                .run(&mut output, |region| {
                    for (x, y) in region.coordinates().collect::<Vec<_>>() {
                        let previous = region.get(x, y);
                        region.set(x, y, previous + 1);
                    }
                    Ok(())
                })
                .unwrap();
            assert!(output.as_raw().iter().all(|&hits| hits == 1), "chunk {chunk_size}");
        }
    }

    #[test]
    fn each_region_writes_where_its_chunk_is() {
        let mut output = IntensityBuffer::new(9, 6);
        let scheduler = ChunkScheduler::new(9, 6, 4).unwrap();
        scheduler
            .run(&mut output, |region| {
                let tag = region.chunk().index as u8;
                for (x, y) in region.coordinates().collect::<Vec<_>>() {
                    region.set(x, y, tag);
                }
                Ok(())
            })
            .unwrap();

        let grid = scheduler.grid();
        for y in 0..6 {
            for x in 0..9 {
                assert_eq!(output.get(x, y) as usize, grid.index_of(x, y));
            }
        }
    }

    #[test]
    fn partition_rejects_foreign_buffer() {
        let scheduler = ChunkScheduler::new(4, 4, 2).unwrap();
        let mut wrong = IntensityBuffer::new(5, 4);
        assert!(matches!(
            scheduler.partition(&mut wrong),
            Err(FilterError::BufferSizeMismatch { .. })
        ));
    }

    #[test]
    fn lowest_failing_chunk_wins_after_all_workers_finish() {
        let finished = AtomicUsize::new(0);
        let mut output = IntensityBuffer::new(8, 8);
        let scheduler = ChunkScheduler::new(8, 8, 2).unwrap();

        let result = scheduler.run(&mut output, |region| {
            let index = region.chunk().index;
            finished.fetch_add(1, Ordering::SeqCst);
            if index == 5 || index == 11 {
                return Err(FilterError::InvalidRadius(index as i64));
            }
            Ok(())
        });

        assert_eq!(finished.load(Ordering::SeqCst), 16);
        match result {
            Err(FilterError::WorkerFailure { chunk, reason }) => {
                assert_eq!(chunk, 5);
                assert!(reason.contains("radius"));
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
    }

    #[test]
    fn panicking_worker_is_reported_not_propagated() {
        let finished = AtomicUsize::new(0);
        let mut output = IntensityBuffer::new(6, 3);
        let scheduler = ChunkScheduler::new(6, 3, 3).unwrap();

        let result = scheduler.run(&mut output, |region| {
            if region.chunk().index == 1 {
                panic!("sensor glitch");
            }
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        match result {
            Err(FilterError::WorkerFailure { chunk, reason }) => {
                assert_eq!(chunk, 1);
                assert!(reason.contains("sensor glitch"));
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
    }

    #[test]
    fn single_pixel_chunks_run_as_pooled_tasks() {
        let finished = AtomicUsize::new(0);
        let mut output = IntensityBuffer::new(256, 256);
        let scheduler = ChunkScheduler::new(256, 256, 1).unwrap();

        scheduler
            .run(&mut output, |region| {
                finished.fetch_add(1, Ordering::Relaxed);
                let Chunk { x0, y0, .. } = *region.chunk();
                region.set(x0, y0, 1);
                Ok(())
            })
            .unwrap();

        assert_eq!(finished.load(Ordering::Relaxed), 256 * 256);
        assert!(output.as_raw().iter().all(|&v| v == 1));
    }
}
