// Feedback strings shown next to the rep count

use crate::models::exercise::{Phase, Side};

/// Label for an arm entering `phase` during a curl
pub fn curl_label(side: Side, phase: Phase) -> String {
    match phase {
        Phase::Contracted => format!("Up ({})", side.to_string()),
        Phase::Extended => format!("Down ({})", side.to_string()),
    }
}

/// Per-arm status shown when no arm changed phase this frame
pub fn curl_summary(left: f32, right: f32) -> String {
    format!("L: {} R: {}", whole(left), whole(right))
}

pub fn squat_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Contracted => "Good Depth!",
        Phase::Extended => "Stand straight",
    }
}

pub fn squat_summary(count: f32) -> String {
    format!("Squats: {}", whole(count))
}

fn whole(count: f32) -> u32 {
    count.floor() as u32
}

/// Feedback for one exercise.
///
/// The transition event only lives for the frame it happened in. The display
/// string is what the overlay shows and is rebuilt every frame.
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    event: Option<String>,
    display: String,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the previous frame's event
    pub fn begin_frame(&mut self) {
        self.event = None;
    }

    /// Record a transition label; a later label in the same frame wins
    pub fn record_event(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.display = label.clone();
        self.event = Some(label);
    }

    /// Show `status` unless an event fired this frame
    pub fn settle(&mut self, status: impl FnOnce() -> String) {
        if self.event.is_none() {
            self.display = status();
        }
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn clear(&mut self) {
        self.event = None;
        self.display.clear();
    }
}
