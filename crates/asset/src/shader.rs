//! Shader source input: literal GLSL text or paths to read it from.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Where vertex and fragment GLSL comes from. Chosen by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderSource {
    Literal { vertex: String, fragment: String },
    Files { vertex: PathBuf, fragment: PathBuf },
}

/// Resolved GLSL text for both stages. No preprocessing is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSourceText {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn literal(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::Literal {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn files(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self::Files {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Produce the GLSL text, reading files when needed.
    pub fn resolve(&self) -> Result<ShaderSourceText> {
        match self {
            Self::Literal { vertex, fragment } => Ok(ShaderSourceText {
                vertex: vertex.clone(),
                fragment: fragment.clone(),
            }),
            Self::Files { vertex, fragment } => Ok(ShaderSourceText {
                vertex: read_stage(vertex, "vertex")?,
                fragment: read_stage(fragment, "fragment")?,
            }),
        }
    }
}

fn read_stage(path: &Path, stage: &str) -> Result<String> {
    log::info!("Loading {} shader from {:?}", stage, path);
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} shader: {}", stage, path.display()))
}
