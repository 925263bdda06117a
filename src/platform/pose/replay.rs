// Replay of recorded pose landmarks stored as JSON lines
//
// One frame per line:
//   {"timestamp": 33, "keypoints": [{"x": 0.41, "y": 0.22, "z": -0.1, "visibility": 0.98}, ...]}
// `keypoints` may be null or empty when no body was detected.

use super::LandmarkSource;
use crate::models::pose::{BodyPose, Keypoint3D, PoseError, PoseFrame, PoseResult};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Spacing used for frames recorded without a timestamp (~30 FPS)
pub const DEFAULT_FRAME_INTERVAL_MS: i64 = 33;

#[derive(Debug, Deserialize)]
struct FrameLine {
    timestamp: Option<i64>,
    #[serde(default)]
    keypoints: Option<Vec<Keypoint3D>>,
}

pub struct ReplaySource<R> {
    reader: R,
    name: String,
    line_number: usize,
    last_timestamp: Option<i64>,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> PoseResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            line_number: 0,
            last_timestamp: None,
        }
    }

    fn parse_line(&mut self, line: &str) -> PoseResult<PoseFrame> {
        let parsed: FrameLine = serde_json::from_str(line).map_err(|e| PoseError::InvalidFrame {
            line: self.line_number,
            reason: e.to_string(),
        })?;

        let timestamp = match parsed.timestamp {
            Some(timestamp) => timestamp,
            None => self
                .last_timestamp
                .map(|last| last + DEFAULT_FRAME_INTERVAL_MS)
                .unwrap_or(0),
        };
        self.last_timestamp = Some(timestamp);

        let body_pose = parsed
            .keypoints
            .filter(|keypoints| !keypoints.is_empty())
            .map(BodyPose::new);

        Ok(PoseFrame::new(timestamp, body_pose))
    }
}

impl<R: BufRead + Send> LandmarkSource for ReplaySource<R> {
    fn next_frame(&mut self) -> PoseResult<Option<PoseFrame>> {
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return self.parse_line(trimmed).map(Some);
        }
    }

    fn get_source_info(&self) -> String {
        format!("Landmark replay from {} ({} lines read)", self.name, self.line_number)
    }
}
