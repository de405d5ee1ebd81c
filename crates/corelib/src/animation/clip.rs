//! Animation clip parameters and the pose function.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::Duration;

use super::bezier::CubicBezierPath;
use super::pose::{Expression, Pose};
use crate::{CoreError, CoreResult, Vec3};

/// Wraps `t` into `[0, 1)`. Non-finite input maps to 0.
#[inline]
pub fn wrap_unit(t: f32) -> f32 {
    if !t.is_finite() {
        return 0.0;
    }
    let w = t.rem_euclid(1.0);
    // rem_euclid may round up to 1.0 for tiny negative inputs, or yield -0.0.
    if w >= 1.0 || w == 0.0 { 0.0 } else { w }
}

/// `amplitude * sin(2π * frequency * t + phase)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub amplitude: f32,
    /// Cycles per clip.
    pub frequency: f32,
    /// Radians.
    pub phase: f32,
}

impl Oscillator {
    pub const fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    #[inline]
    pub fn sample(&self, t: f32) -> f32 {
        self.amplitude * (TAU * self.frequency * t + self.phase).sin()
    }
}

/// `|amplitude| * |sin(2π * frequency * t)| + rest_height`; never below rest height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounce {
    pub amplitude: f32,
    pub frequency: f32,
    pub rest_height: f32,
}

impl Bounce {
    #[inline]
    pub fn sample(&self, t: f32) -> f32 {
        self.amplitude.abs() * (TAU * self.frequency * t).sin().abs() + self.rest_height
    }
}

/// Closed frame interval `[first, last]` during which the alternate face shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkInterval {
    pub first: f32,
    pub last: f32,
}

impl BlinkInterval {
    pub const fn new(first: f32, last: f32) -> Self {
        Self { first, last }
    }

    #[inline]
    pub fn contains(&self, frame: f32) -> bool {
        self.first <= frame && frame <= self.last
    }
}

/// Immutable parameters of the dance. Every field has a default taken from
/// the stage setup; see [`AnimationClip::default`].
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    /// Wall-clock length of one loop.
    pub duration: Duration,
    /// First frame of the authored timeline (inclusive).
    pub start_frame: u32,
    /// Last frame of the authored timeline (inclusive).
    pub end_frame: u32,
    pub path: CubicBezierPath,
    /// Side-to-side offset along X.
    pub lateral: Oscillator,
    /// Vertical offset along Z.
    pub bounce: Bounce,
    /// Full turns about Z per loop.
    pub spins: f32,
    pub sway_x: Oscillator,
    pub sway_y: Oscillator,
    /// Ordered, scanned linearly.
    pub blinks: Vec<BlinkInterval>,
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(4),
            start_frame: 1,
            end_frame: 120,
            path: CubicBezierPath::default(),
            lateral: Oscillator::new(2.0, 2.0, 0.0),
            bounce: Bounce {
                amplitude: 2.0,
                frequency: 3.0,
                rest_height: 1.0,
            },
            spins: 2.0,
            sway_x: Oscillator::new(0.3, 1.5, 0.0),
            sway_y: Oscillator::new(0.2, 1.2, FRAC_PI_2),
            blinks: vec![
                BlinkInterval::new(40.0, 45.0),
                BlinkInterval::new(60.0, 65.0),
                BlinkInterval::new(90.0, 95.0),
            ],
        }
    }
}

impl AnimationClip {
    pub fn validate(&self) -> CoreResult<()> {
        if self.duration.is_zero() {
            return Err(CoreError::InvalidConfig(
                "clip duration must be positive".to_string(),
            ));
        }
        if self.end_frame < self.start_frame {
            return Err(CoreError::InvalidConfig(format!(
                "frame range {}..={} is empty",
                self.start_frame, self.end_frame
            )));
        }
        for (i, b) in self.blinks.iter().enumerate() {
            if !b.first.is_finite() || !b.last.is_finite() || b.first > b.last {
                return Err(CoreError::InvalidConfig(format!(
                    "blink interval #{i} [{}, {}] is inverted or not finite",
                    b.first, b.last
                )));
            }
        }
        Ok(())
    }

    /// Number of frames in the timeline (`end - start + 1`). Wide enough for
    /// the full `0..=u32::MAX` range.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        u64::from(self.end_frame.saturating_sub(self.start_frame)) + 1
    }

    /// `(elapsed mod duration) / duration`.
    pub fn normalized_time(&self, elapsed: Duration) -> f32 {
        let d = self.duration.as_secs_f64();
        if d <= 0.0 {
            return 0.0;
        }
        wrap_unit((elapsed.as_secs_f64().rem_euclid(d) / d) as f32)
    }

    /// Continuous frame position of `t`. One loop spans `frame_count` frames,
    /// so `t = 0` is `start_frame` and `t -> 1` approaches `end_frame + 1`.
    pub fn t_to_frame(&self, t: f32) -> f32 {
        self.start_frame as f32 + wrap_unit(t) * self.frame_count() as f32
    }

    pub fn frame_to_t(&self, frame: f32) -> f32 {
        wrap_unit((frame - self.start_frame as f32) / self.frame_count() as f32)
    }

    /// Expression by linear scan of the blink intervals.
    pub fn expression_at_frame(&self, frame: f32) -> Expression {
        if self.blinks.iter().any(|b| b.contains(frame)) {
            Expression::Alternate
        } else {
            Expression::Primary
        }
    }

    /// The pose at normalized time `t`. Pure: depends only on `t` and `self`.
    ///
    /// Periodic in `t` with period 1. `t` and `t + 1` are only equal after
    /// wrapping when both are exact in `f32` (e.g. `1.3f32` wraps to
    /// `0.29999995`), so other values agree up to rounding.
    pub fn pose(&self, t: f32) -> Pose {
        let t = wrap_unit(t);
        self.sample(t, self.expression_at_frame(self.t_to_frame(t)))
    }

    /// Pose at a whole frame. The expression is tested on the integer frame.
    #[inline]
    pub fn pose_at_frame(&self, frame: u32) -> Pose {
        self.sample(
            self.frame_to_t(frame as f32),
            self.expression_at_frame(frame as f32),
        )
    }

    #[inline]
    pub fn pose_at_elapsed(&self, elapsed: Duration) -> Pose {
        self.pose(self.normalized_time(elapsed))
    }

    fn sample(&self, t: f32, expression: Expression) -> Pose {
        let anchor = self.path.point(t);
        let offset = Vec3::new(self.lateral.sample(t), 0.0, self.bounce.sample(t));
        let rotation = Vec3::new(
            self.sway_x.sample(t),
            self.sway_y.sample(t),
            t * TAU * self.spins,
        );

        Pose {
            translation: anchor + offset,
            rotation,
            expression,
        }
    }
}
