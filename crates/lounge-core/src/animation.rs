use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Action;

/// Frame rates assume a 60 Hz tick: a frame advances every `60 / fps` ticks.
pub const TICKS_PER_SECOND: f32 = 60.0;

/// Frame count and pacing for one animation strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frames: u32,
    pub fps: f32,
    /// Looping strips wrap to frame 0; one-shot strips report completion.
    pub looping: bool,
}

impl AnimationSpec {
    pub const fn new(frames: u32, fps: f32, looping: bool) -> Self {
        Self {
            frames,
            fps,
            looping,
        }
    }

    pub fn ticks_per_frame(&self) -> f32 {
        if self.fps > 0.0 {
            TICKS_PER_SECOND / self.fps
        } else {
            f32::INFINITY
        }
    }

    pub fn last_frame(&self) -> u32 {
        self.frames.saturating_sub(1)
    }
}

/// Per-action animation specs for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationTable {
    specs: BTreeMap<Action, AnimationSpec>,
}

impl Default for AnimationTable {
    fn default() -> Self {
        Self::fighter()
    }
}

impl AnimationTable {
    /// Frame rates for side-scrolling fighters. Frame counts are placeholders
    /// until sheets are probed with [`AnimationTable::with_frame_counts`].
    pub fn fighter() -> Self {
        let specs = [
            (Action::Idle, AnimationSpec::new(3, 6.0, true)),
            (Action::Move, AnimationSpec::new(6, 6.0, true)),
            (Action::Jump, AnimationSpec::new(4, 6.0, true)),
            (Action::Bite, AnimationSpec::new(5, 12.0, false)),
            (Action::Kick, AnimationSpec::new(5, 12.0, false)),
            (Action::Dodge, AnimationSpec::new(4, 12.0, false)),
            (Action::Hurt, AnimationSpec::new(4, 8.0, false)),
            (Action::Dead, AnimationSpec::new(5, 6.0, false)),
        ];
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    /// Override frame counts, e.g. with values probed from loaded sheets.
    /// Zero counts are ignored.
    pub fn with_frame_counts(mut self, counts: impl IntoIterator<Item = (Action, u32)>) -> Self {
        for (action, frames) in counts {
            if frames == 0 {
                continue;
            }
            if let Some(spec) = self.specs.get_mut(&action) {
                spec.frames = frames;
            }
        }
        self
    }

    pub fn get(&self, action: Action) -> AnimationSpec {
        self.specs
            .get(&action)
            .copied()
            .unwrap_or(AnimationSpec::new(1, 6.0, true))
    }
}

/// Frame cursor for the current action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animator {
    pub action: Action,
    pub frame: u32,
    /// Ticks accumulated toward the next frame.
    pub elapsed: f32,
}

impl Animator {
    /// Switch to `action`, restarting at frame 0 only when it differs.
    pub fn set(&mut self, action: Action) {
        if self.action != action {
            self.restart(action);
        }
    }

    /// Unconditionally restart `action` from frame 0.
    pub fn restart(&mut self, action: Action) {
        self.action = action;
        self.frame = 0;
        self.elapsed = 0.0;
    }

    /// Advance by `ticks` (1.0 per 60 Hz frame). Returns `true` when a
    /// one-shot strip has played its last frame. `Dead` holds its last frame
    /// instead of wrapping.
    pub fn advance(&mut self, spec: &AnimationSpec, ticks: f32) -> bool {
        self.elapsed += ticks;
        let step = spec.ticks_per_frame();
        let mut completed = false;
        while self.elapsed >= step {
            self.elapsed -= step;
            if self.frame + 1 < spec.frames {
                self.frame += 1;
                continue;
            }
            if self.action == Action::Dead {
                self.frame = spec.last_frame();
                self.elapsed = 0.0;
                completed = true;
                break;
            }
            self.frame = 0;
            if !spec.looping {
                self.elapsed = 0.0;
                completed = true;
                break;
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_advances_after_sixty_over_fps_ticks() {
        let spec = AnimationSpec::new(4, 6.0, true);
        let mut anim = Animator::default();
        for _ in 0..9 {
            anim.advance(&spec, 1.0);
        }
        assert_eq!(anim.frame, 0);
        anim.advance(&spec, 1.0);
        assert_eq!(anim.frame, 1);
    }

    #[test]
    fn looping_strip_wraps() {
        let spec = AnimationSpec::new(2, 60.0, true);
        let mut anim = Animator::default();
        assert!(!anim.advance(&spec, 1.0));
        assert!(!anim.advance(&spec, 1.0));
        assert_eq!(anim.frame, 0);
    }

    #[test]
    fn one_shot_reports_completion() {
        let spec = AnimationSpec::new(3, 60.0, false);
        let mut anim = Animator::default();
        anim.restart(Action::Bite);
        assert!(!anim.advance(&spec, 1.0));
        assert!(!anim.advance(&spec, 1.0));
        assert!(anim.advance(&spec, 1.0));
        assert_eq!(anim.frame, 0);
    }

    #[test]
    fn dead_holds_last_frame() {
        let spec = AnimationSpec::new(3, 60.0, false);
        let mut anim = Animator::default();
        anim.restart(Action::Dead);
        for _ in 0..20 {
            anim.advance(&spec, 1.0);
        }
        assert_eq!(anim.frame, 2);
    }

    #[test]
    fn set_same_action_keeps_frame() {
        let spec = AnimationSpec::new(4, 60.0, true);
        let mut anim = Animator::default();
        anim.set(Action::Move);
        anim.advance(&spec, 1.0);
        anim.set(Action::Move);
        assert_eq!(anim.frame, 1);
        anim.set(Action::Idle);
        assert_eq!(anim.frame, 0);
    }

    #[test]
    fn probed_frame_counts_override_defaults() {
        let table = AnimationTable::fighter().with_frame_counts([(Action::Kick, 7), (Action::Bite, 0)]);
        assert_eq!(table.get(Action::Kick).frames, 7);
        assert_eq!(table.get(Action::Bite).frames, 5);
    }
}
