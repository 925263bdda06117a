// Hysteresis state machine turning a per-frame joint angle into a rep count

use crate::models::exercise::{Phase, Thresholds};

/// Rep counter for one tracked limb or joint group.
///
/// Each phase change adds half a repetition, so a full
/// extended -> contracted -> extended cycle counts as one rep.
#[derive(Debug, Clone)]
pub struct RepCounter {
    thresholds: Thresholds,
    phase: Phase,
    half_reps: u32,
}

impl RepCounter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            phase: Phase::Extended,
            half_reps: 0,
        }
    }

    /// Feed one angle sample.
    ///
    /// Returns the phase entered when the sample crossed the threshold of the
    /// opposite phase. Unavailable or non-finite samples leave the state untouched.
    pub fn update(&mut self, angle: Option<f32>) -> Option<Phase> {
        let angle = angle.filter(|a| a.is_finite())?;

        let next = match self.phase {
            Phase::Extended if angle <= self.thresholds.contract => Phase::Contracted,
            Phase::Contracted if angle >= self.thresholds.extend => Phase::Extended,
            _ => return None,
        };

        self.phase = next;
        self.half_reps += 1;
        Some(next)
    }

    /// True while `angle` is still past the threshold that put the counter in its current phase
    pub fn holds(&self, angle: f32) -> bool {
        match self.phase {
            Phase::Contracted => angle <= self.thresholds.contract,
            Phase::Extended => angle >= self.thresholds.extend,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> f32 {
        self.half_reps as f32 * 0.5
    }

    pub fn has_transitioned(&self) -> bool {
        self.half_reps > 0
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Extended;
        self.half_reps = 0;
    }
}
