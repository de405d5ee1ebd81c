use crate::animation::wrap_unit;
use crate::{Mat4, Vec3};

/// Sideways camera travel along X over one clip loop. The view direction
/// does not change; eye and target move together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPan {
    pub from_x: f32,
    pub to_x: f32,
}

impl CameraPan {
    /// Centered pan covering `distance` units, left to right.
    pub fn centered(distance: f32) -> Self {
        Self {
            from_x: -distance * 0.5,
            to_x: distance * 0.5,
        }
    }

    /// X position at normalized clip time `t`.
    pub fn x_at(&self, t: f32) -> f32 {
        self.from_x + (self.to_x - self.from_x) * wrap_unit(t)
    }
}

/// Right-handed perspective camera with a Z-up world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    /// Fixed stage camera: looks at the origin from -Y and slightly above,
    /// far enough back to frame the whole dance path.
    pub fn stage(aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, -40.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y_rad: 45f32.to_radians(),
            z_near: 0.1,
            z_far: 100.0,
            aspect,
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Depth range is [0, 1], which is what wgpu expects.
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect.max(1e-6), self.z_near, self.z_far)
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj() * self.view()
    }

    #[inline]
    pub fn with_aspect(self, aspect: f32) -> Self {
        Self { aspect, ..self }
    }

    /// Moves eye and target to the pan's X position at `t`.
    pub fn panned(self, pan: &CameraPan, t: f32) -> Self {
        let x = pan.x_at(t);
        Self {
            eye: Vec3::new(x, self.eye.y, self.eye.z),
            target: Vec3::new(x, self.target.y, self.target.z),
            ..self
        }
    }
}
