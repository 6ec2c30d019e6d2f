// THEORY:
// The `BenchmarkHarness` times the two engines against each other, one image at a
// time, and keeps an ordered log of the results.
//
// Key architectural principles:
// 1.  **No overlap**: The sequential run finishes before the parallel run starts,
//     so the two measurements never compete for the same cores.
// 2.  **Timing only**: The harness does not compare outputs. Equivalence of the two
//     engines is a tested property, not a runtime check.
// 3.  **Append-only history**: Each `run` appends exactly one immutable
//     `PerformanceRecord`, in call order. Reporting consumes them afterwards.
// 4.  **Outputs are handed back**: Callers that want to persist the filtered
//     images get them from the same run that was timed.

use crate::core_modules::error::FilterResult;
use crate::core_modules::intensity_buffer::intensity_buffer::IntensityBuffer;
use crate::parallel_pipeline::ParallelFilterEngine;
use crate::pipeline::{FilterConfig, SequentialFilterEngine};
use std::time::{Duration, Instant};

/// Wall-clock durations of one sequential and one parallel run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkTimings {
    pub sequential: Duration,
    pub parallel: Duration,
}

impl BenchmarkTimings {
    /// Sequential time over parallel time, or `None` if the parallel run took no
    /// measurable time.
    pub fn speedup(&self) -> Option<f64> {
        let parallel = self.parallel.as_secs_f64();
        (parallel > 0.0).then(|| self.sequential.as_secs_f64() / parallel)
    }
}

/// One benchmarked image.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    image_id: String,
    timings: BenchmarkTimings,
}

impl PerformanceRecord {
    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn sequential(&self) -> Duration {
        self.timings.sequential
    }

    pub fn parallel(&self) -> Duration {
        self.timings.parallel
    }

    pub fn timings(&self) -> BenchmarkTimings {
        self.timings
    }

    pub fn speedup(&self) -> Option<f64> {
        self.timings.speedup()
    }
}

/// The result of one measured run, filtered images included.
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    pub timings: BenchmarkTimings,
    pub sequential_output: IntensityBuffer,
    pub parallel_output: IntensityBuffer,
}

pub struct BenchmarkHarness {
    sequential: SequentialFilterEngine,
    parallel: ParallelFilterEngine,
    records: Vec<PerformanceRecord>,
}

impl BenchmarkHarness {
    pub fn new(config: FilterConfig) -> FilterResult<Self> {
        Ok(Self {
            sequential: SequentialFilterEngine::new(&config)?,
            parallel: ParallelFilterEngine::new(&config)?,
            records: Vec::new(),
        })
    }

    /// Times both engines on `input` without recording anything.
    pub fn measure(&self, input: &IntensityBuffer) -> FilterResult<BenchmarkOutcome> {
        let (sequential_output, sequential) = timed(|| self.sequential.apply(input))?;
        let (parallel_output, parallel) = timed(|| self.parallel.apply(input))?;

        Ok(BenchmarkOutcome {
            timings: BenchmarkTimings { sequential, parallel },
            sequential_output,
            parallel_output,
        })
    }

    /// Times both engines on `input` and appends a record under `image_id`.
    ///
    /// Nothing is recorded if either engine fails.
    pub fn run(
        &mut self,
        image_id: impl Into<String>,
        input: &IntensityBuffer,
    ) -> FilterResult<BenchmarkOutcome> {
        let image_id = image_id.into();
        let outcome = self.measure(input)?;

        log::info!(
            "{image_id}: {}x{} sequential {:.6}s, parallel {:.6}s ({} workers)",
            input.width(),
            input.height(),
            outcome.timings.sequential.as_secs_f64(),
            outcome.timings.parallel.as_secs_f64(),
            self.parallel.worker_count(input.width(), input.height()),
        );

        self.records.push(PerformanceRecord {
            image_id,
            timings: outcome.timings,
        });
        Ok(outcome)
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PerformanceRecord> {
        self.records
    }
}

fn timed<T, F>(f: F) -> FilterResult<(T, Duration)>
where
    F: FnOnce() -> FilterResult<T>,
{
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::error::FilterError;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn gradient(width: usize, height: usize) -> IntensityBuffer {
        IntensityBuffer::from_fn(width, height, |x, y| ((x * 7 + y * 13) % 256) as u8)
    }

    #[test]
    fn records_are_appended_in_call_order() {
        init_logger();
        let mut harness = BenchmarkHarness::new(FilterConfig::new(1, 8)).unwrap();
        for id in ["kodim01", "kodim02", "kodim03"] {
            harness.run(id, &gradient(24, 16)).unwrap();
        }
        let ids: Vec<&str> = harness.records().iter().map(|r| r.image_id()).collect();
        assert_eq!(ids, ["kodim01", "kodim02", "kodim03"]);
    }

    #[test]
    fn outcome_carries_both_outputs() {
        init_logger();
        let input = gradient(30, 20);
        let harness = BenchmarkHarness::new(FilterConfig::new(1, 7)).unwrap();
        let outcome = harness.measure(&input).unwrap();
        assert_eq!(outcome.sequential_output, outcome.parallel_output);
        assert!(harness.records().is_empty());
    }

    #[test]
    fn failed_run_records_nothing() {
        init_logger();
        let mut harness = BenchmarkHarness::new(FilterConfig::default()).unwrap();
        let err = harness.run("empty", &IntensityBuffer::new(0, 0)).unwrap_err();
        assert_eq!(err, FilterError::InvalidDimensions { width: 0, height: 0 });
        assert!(harness.into_records().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        assert!(matches!(
            BenchmarkHarness::new(FilterConfig::new(1, 0)),
            Err(FilterError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn speedup_is_ratio_of_durations() {
        let timings = BenchmarkTimings {
            sequential: Duration::from_millis(300),
            parallel: Duration::from_millis(100),
        };
        let speedup = timings.speedup().unwrap();
        assert!((speedup - 3.0).abs() < 1e-9);

        let instant = BenchmarkTimings {
            sequential: Duration::from_millis(1),
            parallel: Duration::ZERO,
        };
        assert_eq!(instant.speedup(), None);
    }
}
