//! Core geometry types, solid shapes, affine transforms and mesh output.

pub mod affine;
pub mod mesh;
pub mod shape;
pub mod types;

pub use affine::*;
pub use mesh::*;
pub use shape::*;
pub use types::*;
