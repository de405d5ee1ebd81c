//! Core types: math re-exports, Transform, Camera, errors and the procedural
//! animation engine.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod animation;
pub mod camera;
pub mod error;
pub mod transform;

pub use error::{CoreError, CoreResult};
