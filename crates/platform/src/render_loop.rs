//! Wall-clock driven loop state. Knows nothing about windows or GPUs.

use std::time::Instant;

use corelib::animation::{AnimationClip, Pose};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Terminal.
    Terminated,
}

/// Everything a frame needs from the loop.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    /// Normalized clip time in `[0, 1)`.
    pub t: f32,
    pub pose: Pose,
    pub frame_index: u64,
}

#[derive(Debug)]
pub struct RenderLoop {
    clip: AnimationClip,
    start: Instant,
    state: LoopState,
    frames: u64,
}

impl RenderLoop {
    pub fn new(clip: AnimationClip, start: Instant) -> Self {
        Self {
            clip,
            start,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Pose for the instant `now`; `None` once terminated. The pose depends
    /// only on `now - start`, never on how often `tick` was called.
    pub fn tick(&mut self, now: Instant) -> Option<FrameInput> {
        if self.state == LoopState::Terminated {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.start);
        let t = self.clip.normalized_time(elapsed);
        let frame_index = self.frames;
        self.frames += 1;
        Some(FrameInput {
            t,
            pose: self.clip.pose(t),
            frame_index,
        })
    }

    pub fn request_close(&mut self) {
        if self.state == LoopState::Running {
            log::info!("Render loop terminated after {} frame(s)", self.frames);
        }
        self.state = LoopState::Terminated;
    }
}
