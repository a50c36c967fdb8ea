//! Core data structures for isovox
//!
//! This crate provides the fundamental types for structured scalar volumes:
//! the volume store with its named fields, borrowed field views, the triangle
//! soup produced by isosurface extraction, and the scalar-to-color transfer
//! functions shared by slicing and extraction.

pub mod point;
pub mod volume;
pub mod mesh;
pub mod colormap;
pub mod error;

pub use point::*;
pub use volume::*;
pub use mesh::*;
pub use colormap::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
