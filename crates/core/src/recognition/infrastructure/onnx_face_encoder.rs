use std::path::Path;

use crate::recognition::domain::face_encoder::{EncodedFace, FaceEncoder};
use crate::shared::frame::Frame;

use super::onnx_face_detector::OnnxFaceDetector;
use super::onnx_face_embedder::OnnxFaceEmbedder;

/// Faces smaller than this (in either dimension) are too blurry to embed.
const MIN_FACE_PIXELS: u32 = 12;

/// [`FaceEncoder`] backed by a YOLO detector and an ArcFace embedder.
pub struct OnnxFaceEncoder {
    detector: OnnxFaceDetector,
    embedder: OnnxFaceEmbedder,
}

impl OnnxFaceEncoder {
    pub fn new(detector: OnnxFaceDetector, embedder: OnnxFaceEmbedder) -> Self {
        Self { detector, embedder }
    }

    pub fn from_models(
        detection_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(
            OnnxFaceDetector::new(detection_model, confidence)?,
            OnnxFaceEmbedder::new(embedding_model)?,
        ))
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn detect_and_encode(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<EncodedFace>, Box<dyn std::error::Error>> {
        let boxes = self.detector.detect(frame)?;
        let mut faces = Vec::with_capacity(boxes.len());
        for face_box in boxes {
            let Some(crop) = frame.crop(&face_box) else {
                continue;
            };
            if crop.width() < MIN_FACE_PIXELS || crop.height() < MIN_FACE_PIXELS {
                log::debug!(
                    "Frame {}: skipping {}x{} face",
                    frame.index(),
                    crop.width(),
                    crop.height()
                );
                continue;
            }
            let embedding = self.embedder.embed(&crop)?;
            faces.push(EncodedFace {
                face_box,
                embedding,
            });
        }
        Ok(faces)
    }
}
