use crate::sampling::domain::sampling_stride::SamplingStride;
use crate::shared::frame::Frame;

type FrameResult = Result<Frame, Box<dyn std::error::Error>>;
pub type SampleResult = Result<SampledFrame, Box<dyn std::error::Error>>;

/// A frame picked by the sampler, stamped with its playback time.
#[derive(Debug)]
pub struct SampledFrame {
    pub index: usize,
    pub timestamp_seconds: f64,
    pub frame: Frame,
}

/// Walks a decoded frame stream and yields only the frames on the stride grid.
///
/// The sampler is a single forward pass over its source: frames are never
/// revisited and the sequence cannot be restarted. When `total_frames` is
/// known (non-zero) frames at or past it are ignored even if the decoder
/// produces them. A decode error ends the sequence after being yielded.
pub struct FrameSampler<I> {
    source: I,
    stride: SamplingStride,
    fps: f64,
    total_frames: Option<usize>,
    done: bool,
}

impl<I> FrameSampler<I>
where
    I: Iterator<Item = FrameResult>,
{
    /// `fps` must be the same positive rate `stride` was derived from.
    pub fn new(source: I, stride: SamplingStride, fps: f64, total_frames: usize) -> Self {
        debug_assert!(fps > 0.0, "fps must be positive");
        Self {
            source,
            stride,
            fps,
            total_frames: (total_frames > 0).then_some(total_frames),
            done: false,
        }
    }

    /// Number of frames this sampler will yield, if the frame count is known.
    pub fn expected_samples(&self) -> Option<usize> {
        self.total_frames.map(|n| n.div_ceil(self.stride.frames()))
    }
}

impl<I> Iterator for FrameSampler<I>
where
    I: Iterator<Item = FrameResult>,
{
    type Item = SampleResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let frame = match self.source.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(frame)) => frame,
            };

            let index = frame.index();
            if self.total_frames.is_some_and(|n| index >= n) {
                self.done = true;
                return None;
            }
            if !self.stride.selects(index) {
                continue;
            }

            return Some(Ok(SampledFrame {
                index,
                timestamp_seconds: index as f64 / self.fps,
                frame,
            }));
        }
    }
}
