//! Procedural animation: a pure function from normalized clip time to a
//! [`Pose`], plus baking into external keyframe tracks.

mod bake;
mod bezier;
mod clip;
mod pose;

pub use bake::{BakedTrack, KeyframeSink};
pub use bezier::{CubicBezierPath, cubic_bezier};
pub use clip::{AnimationClip, BlinkInterval, Bounce, Oscillator, wrap_unit};
pub use pose::{Expression, Pose};
