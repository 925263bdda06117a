// Exercise strategies: which joints to measure and how to drive the rep counters

use super::angle::AngleProvider;
use super::config::Config;
use super::feedback::{curl_label, curl_summary, squat_label, squat_summary, Feedback};
use super::rep_counter::RepCounter;
use crate::models::exercise::{ExerciseKind, Phase, RepEvent, RepUpdate, Side, Thresholds};
use crate::models::pose::BodyLandmark;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-exercise policy fed with one set of joint angles per video frame.
///
/// Frames must be supplied in capture order.
pub trait Exercise: Send {
    fn kind(&self) -> ExerciseKind;

    /// Process one frame and return the running count plus feedback
    fn update(&mut self, angles: &dyn AngleProvider) -> RepUpdate;

    /// Total repetitions, in half-rep steps
    fn count(&self) -> f32;

    /// Repetitions per tracked side, empty when sides are not counted separately
    fn side_counts(&self) -> BTreeMap<Side, f32>;

    /// Current overlay text
    fn feedback(&self) -> &str;

    /// Start over with zero reps
    fn reset(&mut self);
}

/// Build the strategy for `kind` with thresholds from `config`
pub fn create_exercise(kind: ExerciseKind, config: &Config) -> Box<dyn Exercise> {
    match kind {
        ExerciseKind::Curl => Box::new(DumbbellCurl::new(config.curl_thresholds)),
        ExerciseKind::Squat => Box::new(Squat::new(config.squat_thresholds)),
    }
}

// ==============================================================================
// Dumbbell Curl
// ==============================================================================

// Right arm is evaluated first, so a left transition in the same frame wins the label
const ARMS: [(Side, [BodyLandmark; 3]); 2] = [
    (
        Side::Right,
        [BodyLandmark::RightShoulder, BodyLandmark::RightElbow, BodyLandmark::RightWrist],
    ),
    (
        Side::Left,
        [BodyLandmark::LeftShoulder, BodyLandmark::LeftElbow, BodyLandmark::LeftWrist],
    ),
];

/// Alternating or simultaneous curls, each arm counted on its own
pub struct DumbbellCurl {
    arms: BTreeMap<Side, RepCounter>,
    feedback: Feedback,
}

impl DumbbellCurl {
    pub fn new(thresholds: Thresholds) -> Self {
        let arms = ARMS
            .iter()
            .map(|(side, _)| (*side, RepCounter::new(thresholds)))
            .collect();

        Self {
            arms,
            feedback: Feedback::new(),
        }
    }

    pub fn phase(&self, side: Side) -> Option<Phase> {
        self.arms.get(&side).map(|arm| arm.phase())
    }

    pub fn side_count(&self, side: Side) -> f32 {
        self.arms.get(&side).map(|arm| arm.count()).unwrap_or(0.0)
    }
}

impl Default for DumbbellCurl {
    fn default() -> Self {
        Self::new(Thresholds::CURL)
    }
}

impl Exercise for DumbbellCurl {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Curl
    }

    fn update(&mut self, angles: &dyn AngleProvider) -> RepUpdate {
        self.feedback.begin_frame();

        let mut measured = BTreeMap::new();
        let mut event = None;

        for (side, [shoulder, elbow, wrist]) in ARMS {
            let angle = angles.angle(shoulder, elbow, wrist);
            measured.insert(side, angle);

            let Some(arm) = self.arms.get_mut(&side) else {
                continue;
            };
            if let Some(phase) = arm.update(angle) {
                let label = curl_label(side, phase);
                debug!(side = side.to_string(), ?phase, count = arm.count(), "curl transition");

                self.feedback.record_event(label.clone());
                event = Some(RepEvent {
                    side: Some(side),
                    phase,
                    label,
                });
            }
        }

        let (left, right) = (self.side_count(Side::Left), self.side_count(Side::Right));
        self.feedback.settle(|| curl_summary(left, right));

        RepUpdate {
            count: self.count(),
            feedback: self.feedback.display().to_string(),
            event,
            angles: measured,
        }
    }

    fn count(&self) -> f32 {
        self.arms.values().map(|arm| arm.count()).sum()
    }

    fn side_counts(&self) -> BTreeMap<Side, f32> {
        self.arms
            .iter()
            .map(|(side, arm)| (*side, arm.count()))
            .collect()
    }

    fn feedback(&self) -> &str {
        self.feedback.display()
    }

    fn reset(&mut self) {
        for arm in self.arms.values_mut() {
            arm.reset();
        }
        self.feedback.clear();
    }
}

// ==============================================================================
// Squat
// ==============================================================================

const LEGS: [(Side, [BodyLandmark; 3]); 2] = [
    (
        Side::Right,
        [BodyLandmark::RightHip, BodyLandmark::RightKnee, BodyLandmark::RightAnkle],
    ),
    (
        Side::Left,
        [BodyLandmark::LeftHip, BodyLandmark::LeftKnee, BodyLandmark::LeftAnkle],
    ),
];

/// Knee angle driving a squat: the more bent leg governs, a single visible leg
/// stands in for both
pub fn combine_legs(right: Option<f32>, left: Option<f32>) -> Option<f32> {
    let right = right.filter(|a| a.is_finite());
    let left = left.filter(|a| a.is_finite());

    match (right, left) {
        (Some(r), Some(l)) => Some(r.min(l)),
        (Some(angle), None) | (None, Some(angle)) => Some(angle),
        (None, None) => None,
    }
}

/// Bodyweight squat counted from the combined knee angle
pub struct Squat {
    legs: RepCounter,
    feedback: Feedback,
    // Set on a transition, cleared the first time the angle leaves that phase's range
    label_held: bool,
}

impl Squat {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            legs: RepCounter::new(thresholds),
            feedback: Feedback::new(),
            label_held: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.legs.phase()
    }
}

impl Default for Squat {
    fn default() -> Self {
        Self::new(Thresholds::SQUAT)
    }
}

impl Exercise for Squat {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn update(&mut self, angles: &dyn AngleProvider) -> RepUpdate {
        self.feedback.begin_frame();

        let measured: BTreeMap<Side, Option<f32>> = LEGS
            .iter()
            .map(|(side, [hip, knee, ankle])| (*side, angles.angle(*hip, *knee, *ankle)))
            .collect();

        let combined = combine_legs(
            measured.get(&Side::Right).copied().flatten(),
            measured.get(&Side::Left).copied().flatten(),
        );

        let mut event = None;

        // Neither leg visible: keep the previous status
        if let Some(angle) = combined {
            if let Some(phase) = self.legs.update(Some(angle)) {
                let label = squat_label(phase);
                debug!(?phase, angle, count = self.legs.count(), "squat transition");

                self.feedback.record_event(label);
                event = Some(RepEvent {
                    side: None,
                    phase,
                    label: label.to_string(),
                });
            }

            if event.is_some() {
                self.label_held = true;
            } else if self.label_held && !self.legs.holds(angle) {
                self.label_held = false;
            }

            let (held, legs) = (self.label_held, &self.legs);
            self.feedback.settle(|| {
                if held {
                    squat_label(legs.phase()).to_string()
                } else {
                    squat_summary(legs.count())
                }
            });
        }

        RepUpdate {
            count: self.count(),
            feedback: self.feedback.display().to_string(),
            event,
            angles: measured,
        }
    }

    fn count(&self) -> f32 {
        self.legs.count()
    }

    fn side_counts(&self) -> BTreeMap<Side, f32> {
        BTreeMap::new()
    }

    fn feedback(&self) -> &str {
        self.feedback.display()
    }

    fn reset(&mut self) {
        self.legs.reset();
        self.feedback.clear();
        self.label_held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::angle::PoseAngles;
    use crate::models::pose::{BodyPose, Keypoint3D};
    use std::collections::HashMap;

    /// Angles keyed by the vertex landmark; anything not listed is unavailable
    #[derive(Default)]
    struct FixedAngles(HashMap<BodyLandmark, f32>);

    impl FixedAngles {
        fn arms(right: Option<f32>, left: Option<f32>) -> Self {
            let mut angles = HashMap::new();
            if let Some(angle) = right {
                angles.insert(BodyLandmark::RightElbow, angle);
            }
            if let Some(angle) = left {
                angles.insert(BodyLandmark::LeftElbow, angle);
            }
            Self(angles)
        }

        fn legs(right: Option<f32>, left: Option<f32>) -> Self {
            let mut angles = HashMap::new();
            if let Some(angle) = right {
                angles.insert(BodyLandmark::RightKnee, angle);
            }
            if let Some(angle) = left {
                angles.insert(BodyLandmark::LeftKnee, angle);
            }
            Self(angles)
        }
    }

    impl AngleProvider for FixedAngles {
        fn angle(&self, _a: BodyLandmark, b: BodyLandmark, _c: BodyLandmark) -> Option<f32> {
            self.0.get(&b).copied()
        }
    }

    fn flags(curl: &DumbbellCurl) -> (u8, u8) {
        (
            curl.phase(Side::Right).unwrap().as_flag(),
            curl.phase(Side::Left).unwrap().as_flag(),
        )
    }

    #[test]
    fn test_curl_counting() {
        let mut curl = DumbbellCurl::default();

        let update = curl.update(&FixedAngles::arms(Some(180.0), Some(180.0)));
        assert_eq!(update.count, 0.0);

        let update = curl.update(&FixedAngles::arms(Some(10.0), Some(180.0)));
        assert_eq!(update.count, 0.5);
        assert!(update.feedback.contains("Up (Right)"));
        assert_eq!(flags(&curl), (1, 0));

        let update = curl.update(&FixedAngles::arms(Some(180.0), Some(180.0)));
        assert_eq!(update.count, 1.0);
        assert_eq!(flags(&curl), (0, 0));
        assert_eq!(update.feedback, "Down (Right)");
    }

    #[test]
    fn test_curl_fallback_summary() {
        let mut curl = DumbbellCurl::default();

        let update = curl.update(&FixedAngles::arms(Some(170.0), Some(170.0)));
        assert_eq!(update.feedback, "L: 0 R: 0");
        assert!(update.event.is_none());

        curl.update(&FixedAngles::arms(Some(30.0), Some(30.0)));
        curl.update(&FixedAngles::arms(Some(160.0), Some(160.0)));

        // Mid-range angles: no transition, so the label gives way to the summary
        let update = curl.update(&FixedAngles::arms(Some(110.0), Some(110.0)));
        assert_eq!(update.feedback, "L: 1 R: 1");
        assert_eq!(update.count, 2.0);
    }

    #[test]
    fn test_curl_arms_are_independent() {
        let mut curl = DumbbellCurl::default();

        curl.update(&FixedAngles::arms(Some(20.0), None));
        curl.update(&FixedAngles::arms(Some(160.0), Some(20.0)));
        let update = curl.update(&FixedAngles::arms(None, Some(160.0)));

        assert_eq!(update.count, 2.0);
        assert_eq!(curl.side_count(Side::Right), 1.0);
        assert_eq!(curl.side_count(Side::Left), 1.0);
        assert_eq!(update.feedback, "Down (Left)");
    }

    #[test]
    fn test_curl_simultaneous_transition_reports_left() {
        let mut curl = DumbbellCurl::default();
        let update = curl.update(&FixedAngles::arms(Some(20.0), Some(20.0)));

        assert_eq!(update.count, 1.0);
        assert_eq!(update.feedback, "Up (Left)");
        assert_eq!(update.event.unwrap().side, Some(Side::Left));
    }

    #[test]
    fn test_curl_unavailable_frames_change_nothing() {
        let mut curl = DumbbellCurl::default();

        curl.update(&FixedAngles::arms(Some(180.0), Some(180.0)));
        curl.update(&FixedAngles::default());
        curl.update(&FixedAngles::arms(Some(10.0), Some(180.0)));
        curl.update(&FixedAngles::default());
        curl.update(&FixedAngles::arms(None, Some(180.0)));
        assert_eq!(flags(&curl), (1, 0));
        assert_eq!(curl.count(), 0.5);

        let update = curl.update(&FixedAngles::arms(Some(180.0), Some(180.0)));
        assert_eq!(update.count, 1.0);
        assert_eq!(update.angles.get(&Side::Left), Some(&Some(180.0)));
    }

    #[test]
    fn test_squat_counting() {
        let mut squat = Squat::default();

        let update = squat.update(&FixedAngles::legs(Some(180.0), Some(180.0)));
        assert_eq!(squat.phase().as_flag(), 0);
        assert_eq!(update.feedback, "Squats: 0");

        let update = squat.update(&FixedAngles::legs(Some(90.0), Some(120.0)));
        assert_eq!(squat.phase().as_flag(), 1);
        assert_eq!(update.feedback, "Good Depth!");
        assert_eq!(update.count, 0.5);

        let update = squat.update(&FixedAngles::legs(Some(180.0), Some(180.0)));
        assert_eq!(update.count, 1.0);
        assert_eq!(update.feedback, "Stand straight");
    }

    #[test]
    fn test_squat_label_held_until_neutral() {
        let mut squat = Squat::default();

        squat.update(&FixedAngles::legs(Some(90.0), None));
        let update = squat.update(&FixedAngles::legs(Some(85.0), None));
        assert_eq!(update.feedback, "Good Depth!");
        assert!(update.event.is_none());

        let update = squat.update(&FixedAngles::legs(Some(120.0), None));
        assert_eq!(update.feedback, "Squats: 0");

        squat.update(&FixedAngles::legs(Some(170.0), None));
        let update = squat.update(&FixedAngles::legs(Some(165.0), None));
        assert_eq!(update.feedback, "Stand straight");

        let update = squat.update(&FixedAngles::legs(Some(140.0), None));
        assert_eq!(update.feedback, "Squats: 1");
    }

    #[test]
    fn test_squat_label_not_restored_after_neutral() {
        let mut squat = Squat::default();

        squat.update(&FixedAngles::legs(Some(90.0), None));
        squat.update(&FixedAngles::legs(Some(170.0), None));

        // Jitter around the extend threshold after the label was cleared
        for angle in [148.0, 152.0, 148.0, 152.0] {
            let update = squat.update(&FixedAngles::legs(Some(angle), None));
            assert_eq!(update.feedback, "Squats: 1", "angle {}", angle);
            assert!(update.event.is_none());
        }

        let update = squat.update(&FixedAngles::legs(Some(95.0), None));
        assert_eq!(update.feedback, "Good Depth!");
        let update = squat.update(&FixedAngles::legs(Some(120.0), None));
        assert_eq!(update.feedback, "Squats: 1");
        let update = squat.update(&FixedAngles::legs(Some(99.0), None));
        assert_eq!(update.feedback, "Squats: 1");
    }

    #[test]
    fn test_squat_uses_available_leg() {
        let mut squat = Squat::default();

        squat.update(&FixedAngles::legs(None, Some(95.0)));
        assert_eq!(squat.phase(), Phase::Contracted);

        squat.update(&FixedAngles::legs(Some(160.0), None));
        assert_eq!(squat.count(), 1.0);
    }

    #[test]
    fn test_squat_unavailable_keeps_status() {
        let mut squat = Squat::default();

        squat.update(&FixedAngles::legs(Some(90.0), Some(90.0)));
        let update = squat.update(&FixedAngles::default());

        assert_eq!(update.count, 0.5);
        assert_eq!(update.feedback, "Good Depth!");
        assert!(update.event.is_none());
        assert_eq!(squat.phase(), Phase::Contracted);
    }

    #[test]
    fn test_combine_legs() {
        assert_eq!(combine_legs(Some(120.0), Some(95.0)), Some(95.0));
        assert_eq!(combine_legs(Some(120.0), None), Some(120.0));
        assert_eq!(combine_legs(None, Some(95.0)), Some(95.0));
        assert_eq!(combine_legs(Some(f32::NAN), Some(95.0)), Some(95.0));
        assert_eq!(combine_legs(None, None), None);
    }

    #[test]
    fn test_reset_clears_counts_and_feedback() {
        let mut curl = DumbbellCurl::default();
        curl.update(&FixedAngles::arms(Some(10.0), Some(10.0)));
        curl.reset();

        assert_eq!(curl.count(), 0.0);
        assert_eq!(curl.feedback(), "");
        assert_eq!(flags(&curl), (0, 0));
    }

    #[test]
    fn test_create_exercise_uses_config_thresholds() {
        let mut config = Config::default();
        config.squat_thresholds = Thresholds::new(60.0, 150.0);

        let mut squat = create_exercise(ExerciseKind::Squat, &config);
        assert_eq!(squat.kind(), ExerciseKind::Squat);

        // Deep enough for the default threshold, not for the configured one
        squat.update(&FixedAngles::legs(Some(90.0), Some(90.0)));
        assert_eq!(squat.count(), 0.0);

        let curl = create_exercise(ExerciseKind::Curl, &config);
        assert_eq!(curl.kind(), ExerciseKind::Curl);
        assert_eq!(curl.side_counts().len(), 2);
    }

    // Pixel coordinates on a 1280x720 frame, as a pose model would report them
    fn pose(points: &[(BodyLandmark, f32, f32)]) -> BodyPose {
        let mut keypoints = vec![Keypoint3D::new(0.0, 0.0, 0.0, 1.0); BodyLandmark::COUNT];
        for (landmark, x, y) in points {
            keypoints[landmark.index()] = Keypoint3D::new(x / 1280.0, y / 720.0, 0.0, 1.0);
        }
        BodyPose::new(keypoints)
    }

    #[test]
    fn test_squat_from_landmarks() {
        use BodyLandmark::*;

        let standing = pose(&[
            (RightHip, 300.0, 100.0), (RightKnee, 300.0, 200.0), (RightAnkle, 300.0, 300.0),
            (LeftHip, 100.0, 100.0), (LeftKnee, 100.0, 200.0), (LeftAnkle, 100.0, 300.0),
        ]);
        // The mirrored left leg reads 270 degrees, the right leg governs at 90
        let squatting = pose(&[
            (RightHip, 400.0, 200.0), (RightKnee, 300.0, 200.0), (RightAnkle, 300.0, 300.0),
            (LeftHip, 0.0, 200.0), (LeftKnee, 100.0, 200.0), (LeftAnkle, 100.0, 300.0),
        ]);

        let mut squat = Squat::default();

        squat.update(&PoseAngles::new(&standing, 1280, 720));
        assert_eq!(squat.phase().as_flag(), 0);

        let update = squat.update(&PoseAngles::new(&squatting, 1280, 720));
        assert_eq!(squat.phase().as_flag(), 1);
        assert!(update.feedback.contains("Good Depth"));

        let update = squat.update(&PoseAngles::new(&standing, 1280, 720));
        assert_eq!(update.count, 1.0);
    }

    #[test]
    fn test_curl_from_landmarks() {
        use BodyLandmark::*;

        let straight = pose(&[
            (RightShoulder, 300.0, 100.0), (RightElbow, 300.0, 200.0), (RightWrist, 300.0, 300.0),
            (LeftShoulder, 100.0, 100.0), (LeftElbow, 100.0, 200.0), (LeftWrist, 100.0, 300.0),
        ]);
        let right_curled = pose(&[
            (RightShoulder, 300.0, 100.0), (RightElbow, 300.0, 200.0), (RightWrist, 300.0, 120.0),
            (LeftShoulder, 100.0, 100.0), (LeftElbow, 100.0, 200.0), (LeftWrist, 100.0, 300.0),
        ]);

        let mut curl = DumbbellCurl::default();

        let update = curl.update(&PoseAngles::new(&straight, 1280, 720));
        assert_eq!(update.count, 0.0);

        let update = curl.update(&PoseAngles::new(&right_curled, 1280, 720));
        assert_eq!(update.count, 0.5);
        assert_eq!(flags(&curl), (1, 0));
        assert!(update.feedback.contains("Up (Right)"));

        let update = curl.update(&PoseAngles::new(&straight, 1280, 720));
        assert_eq!(update.count, 1.0);
        assert_eq!(curl.phase(Side::Right), Some(Phase::Extended));
    }
}
