//! Shader program: compile, link, reflect active attributes/uniforms, and
//! release every driver object on teardown.

use std::{collections::HashMap, fmt};

use asset::ShaderSource;
use thiserror::Error;

use crate::driver::{ActiveVariable, GlDriver, ShaderStage, gl_type_name};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to create {what}: {message}")]
    Create { what: &'static str, message: String },
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("Shader program failed to link: {log}")]
    Link { log: String },
    #[error("Failed to load shader source: {0}")]
    Source(String),
}

/// Lifecycle of a [`ShaderProgram`]. Reflection tables are only populated
/// while `Linked`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramState {
    Unlinked,
    Linked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Attribute,
    Uniform,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute => f.write_str("attribute"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

/// One reflected program input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderVariable<B> {
    pub name: String,
    /// `None` for built-ins the driver lists but does not bind (e.g. `gl_VertexID`).
    pub location: Option<u32>,
    pub size: i32,
    pub gl_type: u32,
    /// Storage handle allocated for this name, owned by the program.
    pub buffer: B,
}

/// Name-indexed variables in driver enumeration order.
#[derive(Clone, Debug)]
pub struct ReflectionTable<B> {
    entries: Vec<ShaderVariable<B>>,
    by_name: HashMap<String, usize>,
}

impl<B> Default for ReflectionTable<B> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<B: Copy> ReflectionTable<B> {
    pub fn get(&self, name: &str) -> Option<&ShaderVariable<B>> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderVariable<B>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert, replacing any entry with the same name. The replaced entry is
    /// returned so its buffer can be released.
    fn insert(&mut self, var: ShaderVariable<B>) -> Option<ShaderVariable<B>> {
        match self.by_name.get(&var.name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], var)),
            None => {
                self.by_name.insert(var.name.clone(), self.entries.len());
                self.entries.push(var);
                None
            }
        }
    }

    fn release<D: GlDriver<Buffer = B>>(&mut self, driver: &D) {
        for var in self.entries.drain(..) {
            driver.delete_buffer(var.buffer);
        }
        self.by_name.clear();
    }
}

/// Linked vertex+fragment program and its reflection tables.
///
/// Call [`ShaderProgram::destroy`] before dropping; the program cannot reach
/// the driver from `Drop`.
pub struct ShaderProgram<D: GlDriver> {
    program: D::Program,
    vertex: D::Shader,
    fragment: D::Shader,
    state: ProgramState,
    attributes: ReflectionTable<D::Buffer>,
    uniforms: ReflectionTable<D::Buffer>,
    released: bool,
}

impl<D: GlDriver> ShaderProgram<D> {
    /// Resolve `source`, then compile, link and reflect.
    pub fn new(driver: &D, source: &ShaderSource) -> Result<Self, ShaderError> {
        let text = source
            .resolve()
            .map_err(|e| ShaderError::Source(format!("{e:#}")))?;
        Self::from_text(driver, &text.vertex, &text.fragment)
    }

    pub fn from_text(driver: &D, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let (vertex, fragment) = compile_pair(driver, vertex_src, fragment_src)?;

        let program = match driver.create_program() {
            Ok(p) => p,
            Err(message) => {
                driver.delete_shader(vertex);
                driver.delete_shader(fragment);
                return Err(ShaderError::Create {
                    what: "program",
                    message,
                });
            }
        };
        driver.attach_shader(program, vertex);
        driver.attach_shader(program, fragment);

        let mut this = Self {
            program,
            vertex,
            fragment,
            state: ProgramState::Unlinked,
            attributes: ReflectionTable::default(),
            uniforms: ReflectionTable::default(),
            released: false,
        };
        if let Err(err) = this.relink(driver) {
            this.destroy(driver);
            return Err(err);
        }
        Ok(this)
    }

    /// Link the attached stages and rebuild both reflection tables from
    /// scratch. Previous tables and their buffers are released first; on
    /// failure the program is left `Unlinked` with empty tables.
    pub fn relink(&mut self, driver: &D) -> Result<(), ShaderError> {
        self.attributes.release(driver);
        self.uniforms.release(driver);
        self.state = ProgramState::Unlinked;

        let linked = driver.link_program(self.program);
        let info = driver.program_info_log(self.program);
        if !linked {
            log::error!("Shader program link failed: {}", info.trim());
            return Err(ShaderError::Link { log: info });
        }
        if !info.trim().is_empty() {
            log::debug!("Shader program link log: {}", info.trim());
        }

        self.attributes = reflect(driver, self.program, VariableKind::Attribute)?;
        match reflect(driver, self.program, VariableKind::Uniform) {
            Ok(uniforms) => self.uniforms = uniforms,
            Err(err) => {
                self.attributes.release(driver);
                return Err(err);
            }
        }
        self.state = ProgramState::Linked;

        log::info!(
            "Shader program linked: {} attribute(s), {} uniform(s)",
            self.attributes.len(),
            self.uniforms.len()
        );
        Ok(())
    }

    /// Recompile both stages from new sources and relink. On a compile error
    /// the current stages and tables are untouched.
    pub fn reload(&mut self, driver: &D, source: &ShaderSource) -> Result<(), ShaderError> {
        let text = source
            .resolve()
            .map_err(|e| ShaderError::Source(format!("{e:#}")))?;
        let (vertex, fragment) = compile_pair(driver, &text.vertex, &text.fragment)?;

        for old in [self.vertex, self.fragment] {
            driver.detach_shader(self.program, old);
            driver.delete_shader(old);
        }
        self.vertex = vertex;
        self.fragment = fragment;
        driver.attach_shader(self.program, vertex);
        driver.attach_shader(self.program, fragment);

        self.relink(driver)
    }

    /// Release reflection buffers, both stages and the program.
    pub fn destroy(mut self, driver: &D) {
        self.attributes.release(driver);
        self.uniforms.release(driver);
        for shader in [self.vertex, self.fragment] {
            driver.detach_shader(self.program, shader);
            driver.delete_shader(shader);
        }
        driver.delete_program(self.program);
        self.state = ProgramState::Unlinked;
        self.released = true;
        log::debug!("Shader program {:?} destroyed", self.program);
    }

    pub fn program(&self) -> D::Program {
        self.program
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn attributes(&self) -> &ReflectionTable<D::Buffer> {
        &self.attributes
    }

    pub fn uniforms(&self) -> &ReflectionTable<D::Buffer> {
        &self.uniforms
    }

    pub fn attribute(&self, name: &str) -> Option<&ShaderVariable<D::Buffer>> {
        self.attributes.get(name)
    }

    pub fn uniform(&self, name: &str) -> Option<&ShaderVariable<D::Buffer>> {
        self.uniforms.get(name)
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).and_then(|v| v.location)
    }

    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).and_then(|v| v.location)
    }
}

impl<D: GlDriver> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Shader program {:?} dropped without destroy(); driver objects leaked",
                self.program
            );
        }
    }
}

fn compile_stage<D: GlDriver>(
    driver: &D,
    stage: ShaderStage,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let shader = driver
        .create_shader(stage)
        .map_err(|message| ShaderError::Create {
            what: "shader",
            message,
        })?;

    let compiled = driver.compile_shader(shader, source);
    let info = driver.shader_info_log(shader);
    if !compiled {
        log::error!("{} shader compile failed: {}", stage, info.trim());
        driver.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log: info });
    }
    if !info.trim().is_empty() {
        log::debug!("{} shader compile log: {}", stage, info.trim());
    }
    Ok(shader)
}

fn compile_pair<D: GlDriver>(
    driver: &D,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<(D::Shader, D::Shader), ShaderError> {
    let vertex = compile_stage(driver, ShaderStage::Vertex, vertex_src)?;
    match compile_stage(driver, ShaderStage::Fragment, fragment_src) {
        Ok(fragment) => Ok((vertex, fragment)),
        Err(err) => {
            driver.delete_shader(vertex);
            Err(err)
        }
    }
}

/// Enumerate every active variable of `kind` the driver reports and allocate
/// one storage buffer per name.
fn reflect<D: GlDriver>(
    driver: &D,
    program: D::Program,
    kind: VariableKind,
) -> Result<ReflectionTable<D::Buffer>, ShaderError> {
    let count = match kind {
        VariableKind::Attribute => driver.active_attribute_count(program),
        VariableKind::Uniform => driver.active_uniform_count(program),
    };

    let mut table = ReflectionTable::default();
    for index in 0..count {
        let active = match kind {
            VariableKind::Attribute => driver.active_attribute(program, index),
            VariableKind::Uniform => driver.active_uniform(program, index),
        };
        let Some(ActiveVariable { name, size, gl_type }) = active else {
            log::warn!("Driver reported no {} at index {}", kind, index);
            continue;
        };
        let location = match kind {
            VariableKind::Attribute => driver.attribute_location(program, &name),
            VariableKind::Uniform => driver.uniform_location(program, &name),
        };
        let buffer = match driver.create_buffer() {
            Ok(b) => b,
            Err(message) => {
                table.release(driver);
                return Err(ShaderError::Create {
                    what: "buffer",
                    message,
                });
            }
        };

        log::debug!(
            "{} {}: {}[{}] at {:?}",
            kind,
            name,
            gl_type_name(gl_type),
            size,
            location
        );
        let replaced = table.insert(ShaderVariable {
            name,
            location,
            size,
            gl_type,
            buffer,
        });
        if let Some(old) = replaced {
            log::warn!("Duplicate {} '{}' reported by driver", kind, old.name);
            driver.delete_buffer(old.buffer);
        }
    }
    Ok(table)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory driver that "links" by scanning GLSL declarations.

    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};

    use crate::driver::{ActiveVariable, GlDriver, ShaderStage};

    #[derive(Default)]
    struct FakeProgram {
        attached: Vec<u32>,
        attributes: Vec<ActiveVariable>,
        uniforms: Vec<ActiveVariable>,
    }

    #[derive(Default)]
    pub struct FakeGl {
        next_id: Cell<u32>,
        shaders: RefCell<HashMap<u32, (ShaderStage, String)>>,
        programs: RefCell<HashMap<u32, FakeProgram>>,
        buffers: RefCell<HashSet<u32>>,
        pub fail_buffers_after: Cell<Option<usize>>,
    }

    impl FakeGl {
        fn next(&self) -> u32 {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            id
        }

        pub fn live_buffers(&self) -> usize {
            self.buffers.borrow().len()
        }

        pub fn live_shaders(&self) -> usize {
            self.shaders.borrow().len()
        }

        pub fn live_programs(&self) -> usize {
            self.programs.borrow().len()
        }

        pub fn is_live_buffer(&self, buffer: u32) -> bool {
            self.buffers.borrow().contains(&buffer)
        }
    }

    fn gl_type(glsl: &str) -> u32 {
        match glsl {
            "float" => glow::FLOAT,
            "vec2" => glow::FLOAT_VEC2,
            "vec3" => glow::FLOAT_VEC3,
            "vec4" => glow::FLOAT_VEC4,
            "mat4" => glow::FLOAT_MAT4,
            "sampler2D" => glow::SAMPLER_2D,
            _ => glow::INT,
        }
    }

    /// `name[4]` -> (`name[0]`, 4), as GL reports arrays.
    fn declared(decl: &str) -> (String, i32) {
        let decl = decl.trim_end_matches(';');
        match decl.split_once('[') {
            Some((base, len)) => (
                format!("{base}[0]"),
                len.trim_end_matches(']').parse().unwrap_or(1),
            ),
            None => (decl.to_string(), 1),
        }
    }

    fn scan(source: &str, keyword: &str, out: &mut Vec<ActiveVariable>) {
        for line in source.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if let Some(pos) = tokens.iter().position(|t| *t == keyword) {
                if let (Some(ty), Some(decl)) = (tokens.get(pos + 1), tokens.get(pos + 2)) {
                    let (name, size) = declared(decl);
                    out.push(ActiveVariable {
                        name,
                        size,
                        gl_type: gl_type(ty),
                    });
                }
            }
        }
    }

    impl GlDriver for FakeGl {
        type Shader = u32;
        type Program = u32;
        type Buffer = u32;

        fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
            let id = self.next();
            self.shaders.borrow_mut().insert(id, (stage, String::new()));
            Ok(id)
        }

        fn compile_shader(&self, shader: u32, source: &str) -> bool {
            if let Some(entry) = self.shaders.borrow_mut().get_mut(&shader) {
                entry.1 = source.to_string();
            }
            !source.contains("#error")
        }

        fn shader_info_log(&self, shader: u32) -> String {
            match self.shaders.borrow().get(&shader) {
                Some((_, src)) if src.contains("#error") => "0:1: error: forced".into(),
                _ => String::new(),
            }
        }

        fn delete_shader(&self, shader: u32) {
            self.shaders.borrow_mut().remove(&shader);
        }

        fn create_program(&self) -> Result<u32, String> {
            let id = self.next();
            self.programs.borrow_mut().insert(id, FakeProgram::default());
            Ok(id)
        }

        fn attach_shader(&self, program: u32, shader: u32) {
            if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
                p.attached.push(shader);
            }
        }

        fn detach_shader(&self, program: u32, shader: u32) {
            if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
                p.attached.retain(|&s| s != shader);
            }
        }

        fn link_program(&self, program: u32) -> bool {
            let shaders = self.shaders.borrow();
            let mut programs = self.programs.borrow_mut();
            let Some(p) = programs.get_mut(&program) else {
                return false;
            };
            let mut attributes = Vec::new();
            let mut uniforms = Vec::new();
            for id in &p.attached {
                let Some((stage, src)) = shaders.get(id) else {
                    return false;
                };
                if src.contains("LINK_FAIL") {
                    return false;
                }
                if *stage == ShaderStage::Vertex {
                    scan(src, "in", &mut attributes);
                }
                scan(src, "uniform", &mut uniforms);
            }
            p.attributes = attributes;
            p.uniforms = uniforms;
            true
        }

        fn program_info_log(&self, program: u32) -> String {
            match self.programs.borrow().get(&program) {
                Some(_) => String::new(),
                None => "no such program".into(),
            }
        }

        fn delete_program(&self, program: u32) {
            self.programs.borrow_mut().remove(&program);
        }

        fn active_attribute_count(&self, program: u32) -> u32 {
            self.programs
                .borrow()
                .get(&program)
                .map_or(0, |p| p.attributes.len() as u32)
        }

        fn active_attribute(&self, program: u32, index: u32) -> Option<ActiveVariable> {
            self.programs
                .borrow()
                .get(&program)?
                .attributes
                .get(index as usize)
                .cloned()
        }

        fn attribute_location(&self, program: u32, name: &str) -> Option<u32> {
            if name.starts_with("gl_") {
                return None;
            }
            let programs = self.programs.borrow();
            let pos = programs.get(&program)?.attributes.iter().position(|a| a.name == name)?;
            Some(pos as u32)
        }

        fn active_uniform_count(&self, program: u32) -> u32 {
            self.programs
                .borrow()
                .get(&program)
                .map_or(0, |p| p.uniforms.len() as u32)
        }

        fn active_uniform(&self, program: u32, index: u32) -> Option<ActiveVariable> {
            self.programs
                .borrow()
                .get(&program)?
                .uniforms
                .get(index as usize)
                .cloned()
        }

        fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
            let programs = self.programs.borrow();
            let pos = programs.get(&program)?.uniforms.iter().position(|u| u.name == name)?;
            Some(100 + pos as u32)
        }

        fn create_buffer(&self) -> Result<u32, String> {
            if let Some(limit) = self.fail_buffers_after.get() {
                if self.buffers.borrow().len() >= limit {
                    return Err("out of memory".into());
                }
            }
            let id = self.next();
            self.buffers.borrow_mut().insert(id);
            Ok(id)
        }

        fn delete_buffer(&self, buffer: u32) {
            self.buffers.borrow_mut().remove(&buffer);
        }
    }
}
