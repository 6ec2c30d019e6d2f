// THEORY:
// The `Chunk` module describes how an image is carved into rectangular work units
// for the parallel engine. A `Chunk` is a "dumb" rectangle; the `ChunkGrid` knows
// how to tile an image with them.
//
// Key architectural principles:
// 1.  **Striding from the origin**: Chunks are generated by striding a fixed edge
//     length C over both axes, starting at (0, 0). The grid is ceil(W/C) columns by
//     ceil(H/C) rows.
// 2.  **Clipping, not dropping**: The last column and row are clipped to the image
//     boundary, so they may be narrower or shorter than C. Every pixel belongs to a
//     chunk, even when C exceeds one or both image dimensions.
// 3.  **Exact tiling**: Chunks are pairwise disjoint and their union is the whole
//     image. The scheduler relies on this to hand out write regions without locks.
// 4.  **Stable indexing**: Chunk `i` sits at column `i % columns`, row
//     `i / columns`. Failures are reported by this index.

pub mod chunk {
    use crate::core_modules::error::{FilterError, FilterResult};

    /// A half-open rectangle `[x0, x1) x [y0, y1)` inside the image.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Chunk {
        /// Row-major position of this chunk in its grid.
        pub index: usize,
        pub x0: usize,
        pub x1: usize,
        pub y0: usize,
        pub y1: usize,
    }

    impl Chunk {
        pub fn width(&self) -> usize {
            self.x1 - self.x0
        }

        pub fn height(&self) -> usize {
            self.y1 - self.y0
        }

        pub fn area(&self) -> usize {
            self.width() * self.height()
        }

        pub fn contains(&self, x: usize, y: usize) -> bool {
            (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
        }
    }

    /// The tiling of a `image_width x image_height` image by chunks of edge `chunk_size`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ChunkGrid {
        image_width: usize,
        image_height: usize,
        chunk_size: usize,
        /// Number of chunk columns, ceil(image_width / chunk_size).
        columns: usize,
        /// Number of chunk rows, ceil(image_height / chunk_size).
        rows: usize,
    }

    impl ChunkGrid {
        pub fn new(image_width: usize, image_height: usize, chunk_size: usize) -> FilterResult<Self> {
            if chunk_size == 0 {
                return Err(FilterError::InvalidChunkSize(0));
            }
            Ok(Self {
                image_width,
                image_height,
                chunk_size,
                columns: image_width.div_ceil(chunk_size),
                rows: image_height.div_ceil(chunk_size),
            })
        }

        pub fn columns(&self) -> usize {
            self.columns
        }

        pub fn rows(&self) -> usize {
            self.rows
        }

        pub fn chunk_size(&self) -> usize {
            self.chunk_size
        }

        /// Total number of chunks, ceil(W/C) * ceil(H/C).
        pub fn len(&self) -> usize {
            self.columns * self.rows
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// The chunk at row-major position `index`, or `None` past the end.
        pub fn chunk(&self, index: usize) -> Option<Chunk> {
            if index >= self.len() {
                return None;
            }
            let column = index % self.columns;
            let row = index / self.columns;
            let x0 = column * self.chunk_size;
            let y0 = row * self.chunk_size;
            Some(Chunk {
                index,
                x0,
                x1: (x0 + self.chunk_size).min(self.image_width),
                y0,
                y1: (y0 + self.chunk_size).min(self.image_height),
            })
        }

        /// Index of the chunk owning pixel `(x, y)`.
        pub fn index_of(&self, x: usize, y: usize) -> usize {
            (y / self.chunk_size) * self.columns + x / self.chunk_size
        }

        pub fn iter(&self) -> impl Iterator<Item = Chunk> + '_ {
            (0..self.len()).filter_map(move |index| self.chunk(index))
        }
    }
}
