// Data models for exercises, rep counting and training sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==============================================================================
// Exercise Kinds
// ==============================================================================

/// Exercises the trainer knows how to count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Curl,
    Squat,
}

impl ExerciseKind {
    pub fn all() -> Vec<ExerciseKind> {
        vec![ExerciseKind::Curl, ExerciseKind::Squat]
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            ExerciseKind::Curl => "curl",
            ExerciseKind::Squat => "squat",
        }
    }

    /// Human readable name for log lines
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Curl => "Dumbbell Curl",
            ExerciseKind::Squat => "Squat",
        }
    }

    /// Parse exercise from a command line or config value
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "curl" | "dumbbell_curl" => Ok(ExerciseKind::Curl),
            "squat" => Ok(ExerciseKind::Squat),
            _ => Err(format!("Unknown exercise: {}. Must be one of: curl, squat", s)),
        }
    }
}

/// Body side of a tracked limb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn to_string(&self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

// ==============================================================================
// Rep Counting
// ==============================================================================

/// Which hysteresis threshold a limb crossed last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Extended,
    Contracted,
}

impl Phase {
    /// Direction flag, 0 for extended and 1 for contracted
    pub fn as_flag(&self) -> u8 {
        match self {
            Phase::Extended => 0,
            Phase::Contracted => 1,
        }
    }
}

/// Hysteresis thresholds in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Entering `Contracted` requires angle <= contract
    pub contract: f32,
    /// Entering `Extended` requires angle >= extend
    pub extend: f32,
}

impl Thresholds {
    pub const CURL: Thresholds = Thresholds {
        contract: 80.0,
        extend: 140.0,
    };

    pub const SQUAT: Thresholds = Thresholds {
        contract: 100.0,
        extend: 150.0,
    };

    pub fn new(contract: f32, extend: f32) -> Self {
        Self { contract, extend }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("contract", self.contract), ("extend", self.extend)] {
            if !(0.0..360.0).contains(&value) {
                return Err(format!(
                    "Invalid {} threshold: {}. Must be between 0 and 360 degrees",
                    name, value
                ));
            }
        }

        if self.contract >= self.extend {
            return Err(format!(
                "Contract threshold ({}) must be below extend threshold ({})",
                self.contract, self.extend
            ));
        }

        Ok(())
    }
}

/// A phase change reported by an exercise on the frame it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub side: Option<Side>,
    pub phase: Phase,
    pub label: String,
}

/// Result of feeding one frame to an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepUpdate {
    pub count: f32,
    pub feedback: String,
    pub event: Option<RepEvent>,
    /// Raw joint angle per side this frame, `None` when unavailable
    pub angles: BTreeMap<Side, Option<f32>>,
}

impl RepUpdate {
    /// Whole repetitions completed, as shown on the overlay
    pub fn whole_reps(&self) -> u32 {
        self.count.floor() as u32
    }
}

// ==============================================================================
// Training Session
// ==============================================================================

/// Report emitted by a running session for every frame with a detected body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub timestamp: i64,
    pub update: RepUpdate,
}

/// Totals collected over one training session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub exercise: ExerciseKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_frames: u64,
    pub frames_with_pose: u64,
    pub frames_dropped: u64, // Rejected for arriving out of order
    pub reports_dropped: u64, // Not delivered because the report receiver was full
    pub count: f32,
    pub side_counts: BTreeMap<Side, f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Training session already running")]
    AlreadyRunning,

    #[error("No training session running")]
    NotRunning,

    #[error("Session worker stopped unexpectedly: {0}")]
    WorkerFailed(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
