//! # isovox Extract
//!
//! Algorithms over structured scalar fields: trilinear sampling, axis-aligned
//! slice rasterization and Marching Cubes isosurface extraction, with optional
//! rayon parallelism that never changes the output.

pub mod tables;
pub mod sampler;
pub mod marching_cubes;
pub mod slice;
pub mod parallel;

// Re-export commonly used items
pub use sampler::{sample, sample_xyz};
pub use marching_cubes::*;
pub use slice::*;
pub use parallel::{current_num_threads, init_thread_pool, ThreadPoolConfig};
pub use tables::{tri_table_texels, CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
