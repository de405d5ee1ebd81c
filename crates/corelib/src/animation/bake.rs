//! Baking the procedural curve into an external keyframe track.

use super::clip::AnimationClip;
use super::pose::Pose;

/// Receiver for baked keyframes, e.g. an authoring tool's timeline.
pub trait KeyframeSink {
    fn insert_keyframe(&mut self, frame: u32, pose: &Pose);
}

/// In-memory track: `(frame, pose)` pairs in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedTrack {
    pub keys: Vec<(u32, Pose)>,
}

impl BakedTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, frame: u32) -> Option<&Pose> {
        self.keys.iter().find(|(f, _)| *f == frame).map(|(_, p)| p)
    }
}

impl KeyframeSink for BakedTrack {
    fn insert_keyframe(&mut self, frame: u32, pose: &Pose) {
        self.keys.push((frame, *pose));
    }
}

impl AnimationClip {
    /// Emits one keyframe per frame in `start_frame..=end_frame`, evaluated with
    /// the same pose function as real-time playback. Returns the key count.
    pub fn bake<S: KeyframeSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut count = 0;
        for frame in self.start_frame..=self.end_frame {
            sink.insert_keyframe(frame, &self.pose_at_frame(frame));
            count += 1;
        }
        count
    }
}
