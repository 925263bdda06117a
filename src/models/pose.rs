// Data models for body pose landmarks consumed by the rep counter

use serde::{Deserialize, Serialize};

// ==============================================================================
// Pose Frame
// ==============================================================================

/// Landmarks detected in a single video frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp: i64, // Milliseconds since start of the stream
    pub body_pose: Option<BodyPose>,
}

impl PoseFrame {
    pub fn new(timestamp: i64, body_pose: Option<BodyPose>) -> Self {
        Self {
            timestamp,
            body_pose,
        }
    }

    /// True when the pose model found a body with at least one landmark
    pub fn has_body(&self) -> bool {
        self.body_pose
            .as_ref()
            .map(|pose| !pose.keypoints.is_empty())
            .unwrap_or(false)
    }
}

// ==============================================================================
// Body Pose (33 keypoints)
// ==============================================================================

/// Body pose tracking result in the MediaPipe Pose layout (33 keypoints)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyPose {
    pub keypoints: Vec<Keypoint3D>,
}

impl BodyPose {
    pub fn new(keypoints: Vec<Keypoint3D>) -> Self {
        Self { keypoints }
    }

    /// Look up a landmark, `None` if the model did not report it
    pub fn landmark(&self, landmark: BodyLandmark) -> Option<&Keypoint3D> {
        self.keypoints.get(landmark.index())
    }
}

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }
}

// ==============================================================================
// Shared: 3D Keypoint
// ==============================================================================

/// A 3D keypoint with visibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    #[serde(default)]
    pub z: f32, // Depth relative to the hip midpoint
    #[serde(default = "default_visibility")]
    pub visibility: f32, // Visibility confidence [0, 1]
}

fn default_visibility() -> f32 {
    1.0
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Invalid landmark frame at line {line}: {reason}")]
    InvalidFrame { line: usize, reason: String },

    #[error("Failed to read landmark source: {0}")]
    Io(#[from] std::io::Error),
}

pub type PoseResult<T> = Result<T, PoseError>;
