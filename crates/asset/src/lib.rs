//! Asset loading/parsers (meshes, shaders).
//! Mesh text loader producing flat CPU-side arrays, plus shader source
//! resolution from literals or files.

pub mod mesh;
pub mod obj;
pub mod shader;

pub use mesh::Mesh;
pub use shader::{ShaderSource, ShaderSourceText};
