use crate::{Mat4, Vec3, transform::euler_xyz_to_quat};

/// Which overlay texture is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Expression {
    #[default]
    Primary,
    /// Blink / alternate face.
    Alternate,
}

impl Expression {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Expression::Primary => 0,
            Expression::Alternate => 1,
        }
    }
}

/// Full pose of the figure at one instant. Derived, never stored between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    /// Euler radians, X then Y then Z.
    pub rotation: Vec3,
    pub expression: Expression,
}

impl Pose {
    /// `T * R_base * Rz * Ry * Rx`. `base_rotation` stands the model upright
    /// before the dance rotation is applied.
    pub fn model_matrix(&self, base_rotation: Vec3) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(euler_xyz_to_quat(base_rotation))
            * Mat4::from_quat(euler_xyz_to_quat(self.rotation))
    }
}
