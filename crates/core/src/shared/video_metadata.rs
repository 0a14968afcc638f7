use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    /// Width of the frames as yielded, after any display rotation.
    pub width: u32,
    pub height: u32,
    /// Clockwise quarter turn (0, 90, 180 or 270) the reader applies so
    /// frames come out upright.
    pub rotation: u32,
    /// Average frame rate reported by the container; 0 when unknown.
    pub fps: f64,
    /// Frame count reported by the container; 0 when unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Playback time of `frame_index`, or `None` when the frame rate is unusable.
    pub fn timestamp_of(&self, frame_index: usize) -> Option<f64> {
        if self.fps.is_finite() && self.fps > 0.0 {
            Some(frame_index as f64 / self.fps)
        } else {
            None
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.timestamp_of(self.total_frames)
    }
}
