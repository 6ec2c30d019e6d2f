// THEORY:
// The `NeighborhoodSampler` collects the intensities inside the Chebyshev window of
// radius `r` around one pixel. It is the only module that knows about image
// borders, and its border policy is deliberately simple: offsets that fall outside
// the image are skipped. Nothing is padded, mirrored or clamped.
//
// Consequences of that policy:
// - An interior pixel yields exactly (2r+1)^2 samples.
// - Edge and corner pixels yield fewer (a corner with r=1 yields 4).
// - The center pixel is always in bounds, so the result is never empty.
// - Border sample counts can be even, which is why border "medians" are an
//   approximation (see `median`).

use crate::core_modules::intensity_buffer::intensity_buffer::{Intensity, IntensityBuffer};

/// Stateless sampler for in-bounds neighborhoods.
pub struct NeighborhoodSampler;

impl NeighborhoodSampler {
    /// Returns the in-bounds samples around `(x, y)`, row by row.
    pub fn sample(buffer: &IntensityBuffer, x: usize, y: usize, radius: usize) -> Vec<Intensity> {
        let side = radius.saturating_mul(2).saturating_add(1);
        let mut samples =
            Vec::with_capacity(side.min(buffer.width()) * side.min(buffer.height()));
        Self::sample_into(buffer, x, y, radius, &mut samples);
        samples
    }

    /// Same as [`NeighborhoodSampler::sample`], but refills a caller-owned scratch
    /// vector so a full sweep does not allocate once per pixel.
    pub fn sample_into(
        buffer: &IntensityBuffer,
        x: usize,
        y: usize,
        radius: usize,
        samples: &mut Vec<Intensity>,
    ) {
        samples.clear();

        // Clip the window to [0, W) x [0, H) instead of testing every offset.
        let x_start = x.saturating_sub(radius);
        let x_end = x.saturating_add(radius).min(buffer.width() - 1);
        let y_start = y.saturating_sub(radius);
        let y_end = y.saturating_add(radius).min(buffer.height() - 1);

        for ny in y_start..=y_end {
            for nx in x_start..=x_end {
                samples.push(buffer.get(nx, ny));
            }
        }
    }
}
