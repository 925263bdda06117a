// Joint angle measurement from body landmarks

use crate::models::pose::{BodyLandmark, BodyPose};

/// Source of joint angles for the exercise strategies.
///
/// Returns the angle at `b` formed by the rays towards `a` and `c`, in
/// degrees within [0, 360), or `None` when any landmark is unavailable.
pub trait AngleProvider {
    fn angle(&self, a: BodyLandmark, b: BodyLandmark, c: BodyLandmark) -> Option<f32>;
}

/// Signed angle at `b` in pixel space, normalised to [0, 360)
pub fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let to_c = (c.1 - b.1).atan2(c.0 - b.0);
    let to_a = (a.1 - b.1).atan2(a.0 - b.0);

    let mut angle = (to_c - to_a).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    // Rounding can land exactly on the upper bound
    if angle >= 360.0 {
        angle -= 360.0;
    }
    angle
}

/// Angle provider over the landmarks of one detected pose
pub struct PoseAngles<'a> {
    pose: &'a BodyPose,
    frame_width: f32,
    frame_height: f32,
    min_visibility: f32,
}

impl<'a> PoseAngles<'a> {
    /// Wrap a pose whose normalised coordinates map onto a frame of the given size
    pub fn new(pose: &'a BodyPose, frame_width: u32, frame_height: u32) -> Self {
        Self {
            pose,
            frame_width: frame_width as f32,
            frame_height: frame_height as f32,
            min_visibility: 0.0,
        }
    }

    /// Treat landmarks below this visibility as missing
    pub fn with_min_visibility(mut self, min_visibility: f32) -> Self {
        self.min_visibility = min_visibility;
        self
    }

    fn pixel(&self, landmark: BodyLandmark) -> Option<(f32, f32)> {
        let keypoint = self.pose.landmark(landmark)?;
        if !keypoint.is_visible(self.min_visibility) {
            return None;
        }
        if !keypoint.x.is_finite() || !keypoint.y.is_finite() {
            return None;
        }

        Some((keypoint.x * self.frame_width, keypoint.y * self.frame_height))
    }
}

impl AngleProvider for PoseAngles<'_> {
    fn angle(&self, a: BodyLandmark, b: BodyLandmark, c: BodyLandmark) -> Option<f32> {
        let a = self.pixel(a)?;
        let b = self.pixel(b)?;
        let c = self.pixel(c)?;
        Some(joint_angle(a, b, c))
    }
}
