// Landmark sources feeding the trainer
// The pose model itself runs outside this crate; sources only hand over its output

pub mod replay;

pub use replay::ReplaySource;

use crate::models::pose::{PoseFrame, PoseResult};

/// Producer of pose frames in capture order
pub trait LandmarkSource: Send {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> PoseResult<Option<PoseFrame>>;

    /// Describe the source for logs
    fn get_source_info(&self) -> String;
}
