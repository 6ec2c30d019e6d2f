// THEORY:
// The `MedianSelector` sorts a sample set and returns the element at index
// floor(len / 2). For odd counts that is the true median. Even counts only happen
// at image borders, where it returns the upper-middle element instead of
// interpolating. This is accepted boundary policy, not a bug.

use crate::core_modules::intensity_buffer::intensity_buffer::Intensity;

pub struct MedianSelector;

impl MedianSelector {
    /// Sorts `samples` in place and returns the middle-ranked value.
    ///
    /// Panics on an empty slice. The sampler never produces one because the
    /// center pixel is always in bounds.
    #[inline]
    pub fn select(samples: &mut [Intensity]) -> Intensity {
        samples.sort_unstable();
        samples[samples.len() / 2]
    }
}
