use crate::{EulerRot, Mat4, Quat, Vec3};

/// Rigid transform with uniform or non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians, applied X first, then Y, then Z.
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    #[inline]
    pub fn from_translation_rotation(translation: Vec3, rotation_euler: Vec3) -> Self {
        Self::from_trs(translation, rotation_euler, Vec3::ONE)
    }

    /// Rotation as a quaternion: `Rz * Ry * Rx`.
    #[inline]
    pub fn rotation(&self) -> Quat {
        euler_xyz_to_quat(self.rotation_euler)
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }

    /// World matrix of `self` treated as a child of `parent`.
    #[inline]
    pub fn matrix_in(&self, parent: Mat4) -> Mat4 {
        parent * self.matrix()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// X-then-Y-then-Z Euler angles (extrinsic) to a quaternion.
#[inline]
pub fn euler_xyz_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_applies_x_before_z() {
        let t = Transform::from_translation_rotation(
            Vec3::ZERO,
            Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, std::f32::consts::FRAC_PI_2),
        );
        // +Y -> (Rx 90) -> +Z -> (Rz 90) -> +Z
        let v = t.matrix().transform_vector3(Vec3::Y);
        assert!((v - Vec3::Z).length() < 1e-5, "got {v:?}");
        // +X -> (Rx 90) -> +X -> (Rz 90) -> +Y
        let v = t.matrix().transform_vector3(Vec3::X);
        assert!((v - Vec3::Y).length() < 1e-5, "got {v:?}");
    }

    #[test]
    fn child_matrix_follows_parent() {
        let parent = Transform::from_translation_rotation(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        let child = Transform::from_translation_rotation(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO);
        let p = child.matrix_in(parent.matrix()).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-6);
    }
}
