pub mod annotation;
pub mod engine;
pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod topology;

#[cfg(test)]
mod fixtures;

pub use error::{MeshmarkError, Result};
