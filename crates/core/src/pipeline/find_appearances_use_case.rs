use std::path::Path;
use std::time::Instant;

use crate::pipeline::find_config::FindConfig;
use crate::pipeline::find_error::FindError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::presence::domain::appearance_interval::AppearanceInterval;
use crate::presence::domain::presence_tracker::{MatchSignal, PresenceTracker};
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::reference_embedding::ReferenceEmbedding;
use crate::sampling::domain::frame_sampler::FrameSampler;
use crate::sampling::domain::sampling_stride::SamplingStride;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::video_reader::VideoReader;

/// Progress callback: `(processed_samples, expected_samples)`.
/// Returning `false` cancels the run.
pub type ScanProgressFn = Box<dyn Fn(usize, Option<usize>) -> bool + Send>;

/// Finds the time intervals during which a reference face is on screen.
///
/// One instance drives one run end to end: encode the reference image,
/// sample the video at a fixed stride, reduce each sampled frame to a
/// match decision and fold those decisions into appearance intervals.
/// Everything happens on the calling thread, in frame order.
pub struct FindAppearancesUseCase {
    reader: Box<dyn VideoReader>,
    image_reader: Box<dyn ImageReader>,
    encoder: Box<dyn FaceEncoder>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ScanProgressFn>,
}

impl FindAppearancesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_reader: Box<dyn ImageReader>,
        encoder: Box<dyn FaceEncoder>,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<ScanProgressFn>,
    ) -> Self {
        Self {
            reader,
            image_reader,
            encoder,
            logger,
            on_progress,
        }
    }

    /// Runs the scan and returns the appearance intervals in time order.
    ///
    /// Configuration and the reference image are checked before the video
    /// is opened. Any failure discards intervals found so far.
    pub fn execute(
        &mut self,
        video: &Path,
        reference_image: &Path,
        config: &FindConfig,
    ) -> Result<Vec<AppearanceInterval>, FindError> {
        let tolerance = config.validate()?;
        let reference = self.encode_reference(reference_image)?;
        let matcher = FaceMatcher::new(reference, tolerance);

        self.logger.info(&format!("Opening video {}", video.display()));
        let metadata = self
            .reader
            .open(video)
            .map_err(|e| FindError::Source(e.to_string()))?;

        let result = self.scan(&metadata, config.stride_ms, &matcher);
        self.reader.close();
        self.logger.summary();
        result
    }

    fn encode_reference(&mut self, path: &Path) -> Result<ReferenceEmbedding, FindError> {
        self.logger
            .info(&format!("Encoding reference face from {}", path.display()));
        let image = self
            .image_reader
            .read(path)
            .map_err(|e| FindError::ReferenceImage(e.to_string()))?;
        let faces = self
            .encoder
            .detect_and_encode(&image)
            .map_err(|e| FindError::Encoder(e.to_string()))?;
        let reference = ReferenceEmbedding::from_faces(faces).ok_or(FindError::NoReferenceFace)?;
        log::debug!("Reference face box: {:?}", reference.face_box());
        self.logger.info("Reference face encoded");
        Ok(reference)
    }

    fn scan(
        &mut self,
        metadata: &VideoMetadata,
        stride_ms: u32,
        matcher: &FaceMatcher,
    ) -> Result<Vec<AppearanceInterval>, FindError> {
        let stride = SamplingStride::from_interval(stride_ms, metadata.fps)?;
        let duration = metadata
            .duration_seconds()
            .filter(|_| metadata.total_frames > 0)
            .map_or_else(|| "unknown".to_string(), |d| format!("{d:.2}s"));
        self.logger.info(&format!(
            "Video details - FPS: {:.2}, total frames: {}, duration: {}, stride: {} frames, tolerance: {}",
            metadata.fps,
            metadata.total_frames,
            duration,
            stride.frames(),
            matcher.tolerance().value()
        ));

        let Self {
            reader,
            encoder,
            logger,
            on_progress,
            ..
        } = self;

        let mut sampler =
            FrameSampler::new(reader.frames(), stride, metadata.fps, metadata.total_frames);
        let expected = sampler.expected_samples();
        let mut tracker = PresenceTracker::new();
        let mut intervals = Vec::new();
        let mut processed = 0;

        loop {
            let decode_start = Instant::now();
            let Some(sample) = sampler.next() else {
                break;
            };
            let sample = sample.map_err(|e| FindError::Decode(e.to_string()))?;
            logger.timing("decode", elapsed_ms(decode_start));

            let match_start = Instant::now();
            let faces = encoder
                .detect_and_encode(&sample.frame)
                .map_err(|e| FindError::Encoder(e.to_string()))?;
            let is_match = matcher.frame_matches(&faces);
            logger.timing("match", elapsed_ms(match_start));
            logger.metric("faces_per_frame", faces.len() as f64);
            log::debug!(
                "Frame {}: {} faces, closest distance {:?}, match={is_match}",
                sample.index,
                faces.len(),
                matcher.closest_distance(&faces)
            );

            let was_present = tracker.is_present();
            let signal = MatchSignal::new(sample.index, sample.timestamp_seconds, is_match);
            if let Some(closed) = tracker.observe(signal) {
                logger.info(&format!(
                    "Face disappeared at {:.2}s (duration: {:.2}s)",
                    closed.end_seconds,
                    closed.duration_seconds()
                ));
                intervals.push(closed);
            } else if is_match && !was_present {
                logger.info(&format!(
                    "Face appeared at {:.2}s",
                    sample.timestamp_seconds
                ));
            }

            processed += 1;
            logger.progress(processed, expected);
            if let Some(callback) = on_progress.as_ref() {
                if !callback(processed, expected) {
                    return Err(FindError::Cancelled);
                }
            }
        }

        let open_since = tracker.open_since().unwrap_or_default();
        if let Some(last) = tracker.finish() {
            logger.info(&format!(
                "Face still visible at end of video (since {open_since:.2}s, last seen at {:.2}s)",
                last.end_seconds
            ));
            intervals.push(last);
        }

        logger.info(&format!(
            "Processing complete. Found {} continuous appearances",
            intervals.len()
        ));
        Ok(intervals)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
