//! Core types: math re-exports, Transform, Camera, errors.

pub use glam::{Mat4, Vec2, Vec3, Vec4, vec3};

pub mod camera;
pub mod transform;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Invalid camera parameter {name}: {value}")]
    InvalidCamera { name: &'static str, value: f32 },
    #[error("Camera clip planes out of order: near={near}, far={far}")]
    ClipPlanes { near: f32, far: f32 },
}

pub type CoreResult<T> = Result<T, CoreError>;
