// THEORY:
// The `image_helper` module is the decode/encode plumbing between image files and
// `IntensityBuffer`s. It is not part of the filter core; the batch runner is its
// only production caller.
//
// Loading decodes whatever format `image` recognises and averages R, G and B into
// one channel. Saving goes through the `GrayImage` conversion and always writes an
// 8-bit grayscale PNG.

pub mod image_helper {
    use crate::core_modules::intensity_buffer::intensity_buffer::IntensityBuffer;
    use crate::core_modules::error::FilterError;
    use image::{DynamicImage, GrayImage, ImageFormat};
    use std::path::Path;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ImageIoError {
        #[error("i/o error: {0}")]
        Io(#[from] std::io::Error),
        #[error("image codec error: {0}")]
        Image(#[from] image::ImageError),
        #[error(transparent)]
        Buffer(#[from] FilterError),
    }

    /// Converts any decoded image to intensities by averaging R, G and B.
    ///
    /// The average is taken at 16 bits per channel and truncated to 8, so 8-bit
    /// sources round-trip exactly. Alpha is ignored.
    pub fn to_grayscale(image: &DynamicImage) -> IntensityBuffer {
        let rgba = image.to_rgba16();
        let width = rgba.width() as usize;
        IntensityBuffer::from_fn(width, rgba.height() as usize, |x, y| {
            let [r, g, b, _] = rgba.get_pixel(x as u32, y as u32).0;
            (((r as u32 + g as u32 + b as u32) / 3) >> 8) as u8
        })
    }

    /// Decodes the file at `path` and converts it to grayscale.
    pub fn load_grayscale(path: &Path) -> Result<IntensityBuffer, ImageIoError> {
        let image = image::open(path)?;
        Ok(to_grayscale(&image))
    }

    /// Writes `buffer` as an 8-bit grayscale PNG, creating the parent directory if needed.
    pub fn save(path: &Path, buffer: IntensityBuffer) -> Result<(), ImageIoError> {
        let image = GrayImage::try_from(buffer)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
