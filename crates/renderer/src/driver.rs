//! Graphics API seam. Shader programs and reflection talk to the driver only
//! through [`GlDriver`], so everything above it runs against any backend.

use std::fmt;

use glow::HasContext;

/// Programmable pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Active attribute or uniform exactly as the driver reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    /// Declared array size (1 for non-arrays).
    pub size: i32,
    /// Driver type enum, e.g. `GL_FLOAT_VEC3`.
    pub gl_type: u32,
}

/// Object lifecycle and introspection calls needed by [`crate::shader`].
///
/// Handles are plain copyable ids owned by whoever created them; nothing here
/// releases them implicitly.
pub trait GlDriver {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Upload `source` and compile. Returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Link and return the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    fn active_attribute_count(&self, program: Self::Program) -> u32;
    fn active_attribute(&self, program: Self::Program, index: u32) -> Option<ActiveVariable>;
    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn active_uniform_count(&self, program: Self::Program) -> u32;
    fn active_uniform(&self, program: Self::Program, index: u32) -> Option<ActiveVariable>;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn delete_buffer(&self, buffer: Self::Buffer);
}

/// Native OpenGL through `glow`. The context must be current on the calling
/// thread for every call.
///
/// The embedding render loop owns the window and GL context; it wraps the
/// `glow::Context` once and passes the driver to every program call:
///
/// ```no_run
/// use renderer::{GlowDriver, ShaderError, ShaderProgram};
///
/// fn build(gl: glow::Context) -> Result<(), ShaderError> {
///     let driver = GlowDriver::new(gl);
///     let program = ShaderProgram::from_text(
///         &driver,
///         "#version 330 core\nin vec3 aPos;\nuniform mat4 model;\nvoid main() { gl_Position = model * vec4(aPos, 1.0); }",
///         "#version 330 core\nout vec4 c;\nvoid main() { c = vec4(1.0); }",
///     )?;
///     let _model = program.uniform_location("model");
///     program.destroy(&driver);
///     Ok(())
/// }
/// ```
pub struct GlowDriver {
    gl: glow::Context,
}

impl GlowDriver {
    pub fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        log::info!(
            "OpenGL driver: {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_inner(self) -> glow::Context {
        self.gl
    }
}

impl GlDriver for GlowDriver {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn active_attribute_count(&self, program: Self::Program) -> u32 {
        unsafe { self.gl.get_active_attributes(program) }
    }

    fn active_attribute(&self, program: Self::Program, index: u32) -> Option<ActiveVariable> {
        unsafe { self.gl.get_active_attribute(program, index) }.map(|a| ActiveVariable {
            name: a.name,
            size: a.size,
            gl_type: a.atype,
        })
    }

    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn active_uniform_count(&self, program: Self::Program) -> u32 {
        unsafe { self.gl.get_active_uniforms(program) }
    }

    fn active_uniform(&self, program: Self::Program, index: u32) -> Option<ActiveVariable> {
        unsafe { self.gl.get_active_uniform(program, index) }.map(|u| ActiveVariable {
            name: u.name,
            size: u.size,
            gl_type: u.utype,
        })
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_location(program, name) }.map(|loc| loc.0)
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }
}

/// GLSL spelling of common driver type enums, for diagnostics.
pub fn gl_type_name(gl_type: u32) -> &'static str {
    match gl_type {
        glow::FLOAT => "float",
        glow::FLOAT_VEC2 => "vec2",
        glow::FLOAT_VEC3 => "vec3",
        glow::FLOAT_VEC4 => "vec4",
        glow::FLOAT_MAT2 => "mat2",
        glow::FLOAT_MAT3 => "mat3",
        glow::FLOAT_MAT4 => "mat4",
        glow::INT => "int",
        glow::INT_VEC2 => "ivec2",
        glow::INT_VEC3 => "ivec3",
        glow::INT_VEC4 => "ivec4",
        glow::UNSIGNED_INT => "uint",
        glow::BOOL => "bool",
        glow::SAMPLER_2D => "sampler2D",
        glow::SAMPLER_3D => "sampler3D",
        glow::SAMPLER_CUBE => "samplerCube",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_enums_match_gl() {
        assert_eq!(ShaderStage::Vertex.gl_enum(), 0x8B31);
        assert_eq!(ShaderStage::Fragment.gl_enum(), 0x8B30);
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }

    fn handles_of<D: GlDriver<Shader = glow::Shader, Program = glow::Program, Buffer = glow::Buffer>>() {}

    #[test]
    fn glow_driver_uses_glow_handles() {
        handles_of::<GlowDriver>();
    }

    #[test]
    fn type_names() {
        assert_eq!(gl_type_name(glow::FLOAT_VEC3), "vec3");
        assert_eq!(gl_type_name(glow::FLOAT_MAT4), "mat4");
        assert_eq!(gl_type_name(0), "unknown");
    }
}
