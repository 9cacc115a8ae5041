//! Renderer-side building blocks over OpenGL: renderable volumes, the driver
//! seam, and shader programs with reflection.
//! Windowing, the frame loop and draw submission live with the caller, which
//! also creates the GL context and wraps it in a [`GlowDriver`].

pub mod driver;
pub mod shader;
pub mod volume;

pub use driver::{ActiveVariable, GlDriver, GlowDriver, ShaderStage};
pub use shader::{ProgramState, ReflectionTable, ShaderError, ShaderProgram, ShaderVariable};
pub use volume::{MeshVolume, PackedGeometry, Volume};
