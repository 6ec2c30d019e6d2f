pub mod chunk;
pub mod chunk_scheduler;
pub mod error;
pub mod intensity_buffer;
pub mod median;
pub mod neighborhood;
pub mod utils;
