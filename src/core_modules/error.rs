// THEORY:
// Every failure the filter engines can produce is a value, never a process exit.
// Validation errors are raised before any work starts; `WorkerFailure` is only
// raised by the parallel path, and only after every worker has finished.

use thiserror::Error;

/// The error taxonomy shared by both filter engines and the benchmark harness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The input buffer has zero area.
    #[error("image has zero area ({width}x{height})")]
    InvalidDimensions { width: usize, height: usize },

    /// A raw byte vector does not match the declared dimensions.
    #[error("buffer of {width}x{height} needs {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// The chunk edge length is zero or negative.
    #[error("chunk size must be a positive number of pixels, got {0}")]
    InvalidChunkSize(i64),

    /// The radius is negative, or so large that the window side overflows.
    #[error("filter radius must be a non-negative, addressable window radius, got {0}")]
    InvalidRadius(i64),

    /// A parallel worker returned an error, panicked or could not be spawned.
    #[error("worker for chunk {chunk} failed: {reason}")]
    WorkerFailure { chunk: usize, reason: String },
}

pub type FilterResult<T> = Result<T, FilterError>;
