// THEORY:
// The `IntensityBuffer` is the single data container every other module works on.
// It is a "dumb" row-major grid of single-channel brightness values (0-255), with
// nothing but accessors and a couple of conversions.
//
// Key architectural principles:
// 1.  **Read-only input, fresh output**: Filters borrow their input immutably and
//     allocate a new buffer of identical dimensions for the output. A filter never
//     reads from and writes to the same buffer.
// 2.  **Zero area is representable**: A 0xN buffer can be built so callers can hand
//     it to a filter and receive `InvalidDimensions` instead of a panic. Only raw
//     byte vectors that disagree with their declared dimensions are rejected at
//     construction.
// 3.  **Row access for partitioning**: The parallel scheduler slices the output by
//     rows and then by chunk columns, so the buffer exposes its rows mutably to the
//     crate.

pub mod intensity_buffer {
    use crate::core_modules::error::{FilterError, FilterResult};
    use image::GrayImage;

    pub type Intensity = u8;

    /// A row-major grid of 8-bit intensity values.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct IntensityBuffer {
        /// The width of the image in pixels.
        width: usize,
        /// The height of the image in pixels.
        height: usize,
        /// `width * height` intensities, row after row.
        data: Vec<Intensity>,
    }

    impl IntensityBuffer {
        /// Creates a black buffer of the given dimensions.
        pub fn new(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                data: vec![0; width * height],
            }
        }

        /// Wraps an existing row-major byte vector.
        pub fn from_raw(width: usize, height: usize, data: Vec<Intensity>) -> FilterResult<Self> {
            let expected = width * height;
            if data.len() != expected {
                return Err(FilterError::BufferSizeMismatch {
                    width,
                    height,
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self { width, height, data })
        }

        /// Builds a buffer by evaluating `f(x, y)` for every coordinate.
        pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
        where
            F: FnMut(usize, usize) -> Intensity,
        {
            let mut data = Vec::with_capacity(width * height);
            for y in 0..height {
                for x in 0..width {
                    data.push(f(x, y));
                }
            }
            Self { width, height, data }
        }

        pub fn width(&self) -> usize {
            self.width
        }

        pub fn height(&self) -> usize {
            self.height
        }

        /// Returns `true` when the buffer has no pixels at all.
        pub fn is_empty(&self) -> bool {
            self.data.is_empty()
        }

        /// Fails with `InvalidDimensions` for a zero-area buffer.
        pub fn ensure_non_empty(&self) -> FilterResult<()> {
            if self.width == 0 || self.height == 0 {
                return Err(FilterError::InvalidDimensions {
                    width: self.width,
                    height: self.height,
                });
            }
            Ok(())
        }

        /// Reads the intensity at `(x, y)`.
        ///
        /// Panics if the coordinate lies outside the buffer, like slice indexing.
        #[inline]
        pub fn get(&self, x: usize, y: usize) -> Intensity {
            debug_assert!(x < self.width && y < self.height);
            self.data[y * self.width + x]
        }

        #[inline]
        pub fn set(&mut self, x: usize, y: usize, value: Intensity) {
            debug_assert!(x < self.width && y < self.height);
            self.data[y * self.width + x] = value;
        }

        pub fn as_raw(&self) -> &[Intensity] {
            &self.data
        }

        pub fn into_raw(self) -> Vec<Intensity> {
            self.data
        }

        /// Mutable row slices, top to bottom. Yields nothing for a zero-width buffer.
        pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut [Intensity]> {
            // `chunks_mut(0)` panics, so a zero-width buffer gets a chunk length of 1
            // over its (necessarily empty) data.
            self.data.chunks_mut(self.width.max(1))
        }
    }

    impl From<GrayImage> for IntensityBuffer {
        fn from(image: GrayImage) -> Self {
            let width = image.width() as usize;
            let height = image.height() as usize;
            Self {
                width,
                height,
                data: image.into_raw(),
            }
        }
    }

    impl TryFrom<IntensityBuffer> for GrayImage {
        type Error = FilterError;

        /// Fails only when a dimension does not fit the `u32` an image file can hold.
        fn try_from(buffer: IntensityBuffer) -> FilterResult<Self> {
            let (width, height) = (buffer.width, buffer.height);
            let too_large = || FilterError::InvalidDimensions { width, height };
            let image_width = u32::try_from(width).map_err(|_| too_large())?;
            let image_height = u32::try_from(height).map_err(|_| too_large())?;
            GrayImage::from_raw(image_width, image_height, buffer.into_raw()).ok_or_else(too_large)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::intensity_buffer::*;
    use crate::core_modules::error::FilterError;

    #[test]
    fn from_raw_rejects_mismatched_length() {
        let err = IntensityBuffer::from_raw(3, 2, vec![0; 5]).unwrap_err();
        assert_eq!(
            err,
            FilterError::BufferSizeMismatch {
                width: 3,
                height: 2,
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn from_fn_is_row_major() {
        let buffer = IntensityBuffer::from_fn(3, 2, |x, y| (y * 10 + x) as u8);
        assert_eq!(buffer.as_raw(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(buffer.get(2, 1), 12);
    }

    #[test]
    fn zero_area_is_constructible_but_not_filterable() {
        let buffer = IntensityBuffer::new(0, 4);
        assert!(buffer.is_empty());
        assert_eq!(
            buffer.ensure_non_empty(),
            Err(FilterError::InvalidDimensions { width: 0, height: 4 })
        );
    }

    #[test]
    fn gray_image_conversion_keeps_layout() {
        let image = image::GrayImage::from_fn(4, 3, |x, y| image::Luma([(x + 4 * y) as u8]));
        let buffer = IntensityBuffer::from(image);
        assert_eq!(buffer.width(), 4);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.get(1, 2), 9);
    }

    #[test]
    fn gray_image_round_trip_is_lossless() {
        let buffer = IntensityBuffer::from_fn(7, 5, |x, y| (x * 31 + y * 7) as u8);
        let image = image::GrayImage::try_from(buffer.clone()).unwrap();
        assert_eq!((image.width(), image.height()), (7, 5));
        assert_eq!(image.get_pixel(6, 4).0, [buffer.get(6, 4)]);
        assert_eq!(IntensityBuffer::from(image), buffer);
    }

    #[test]
    fn rows_mut_yields_one_slice_per_row() {
        let mut buffer = IntensityBuffer::new(5, 3);
        for (y, row) in buffer.rows_mut().enumerate() {
            assert_eq!(row.len(), 5);
            row.fill(y as u8);
        }
        assert_eq!(buffer.get(4, 2), 2);
        assert_eq!(IntensityBuffer::new(0, 3).rows_mut().count(), 0);
    }
}
