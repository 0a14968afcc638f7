use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrideError {
    #[error("video frame rate {0} is not usable for sampling")]
    InvalidFrameRate(f64),
    #[error("sampling interval must be greater than 0 ms")]
    ZeroInterval,
    #[error("sampling interval of {stride_ms} ms is shorter than one frame at {fps} fps")]
    BelowOneFrame { stride_ms: u32, fps: f64 },
}

/// Number of source frames between two analyzed frames.
///
/// Derived as `round(stride_ms / 1000 * fps)`. A result below one frame is
/// rejected rather than clamped, so a misconfigured interval never silently
/// turns into "analyze every frame".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingStride(usize);

impl SamplingStride {
    pub fn from_interval(stride_ms: u32, fps: f64) -> Result<Self, StrideError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(StrideError::InvalidFrameRate(fps));
        }
        if stride_ms == 0 {
            return Err(StrideError::ZeroInterval);
        }

        let frames = (stride_ms as f64 / 1000.0 * fps).round();
        if frames < 1.0 {
            return Err(StrideError::BelowOneFrame { stride_ms, fps });
        }
        Ok(Self(frames as usize))
    }

    pub fn frames(&self) -> usize {
        self.0
    }

    /// True when `frame_index` falls on the sampling grid `0, s, 2s, ...`.
    pub fn selects(&self, frame_index: usize) -> bool {
        frame_index % self.0 == 0
    }
}
