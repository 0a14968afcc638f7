use crate::shared::model_resolver::ModelSpec;

pub const DETECTION_MODEL: ModelSpec = ModelSpec {
    name: "yolo11n-pose_widerface.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx",
};

pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "w600k_r50.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx",
};

/// Time between two analyzed frames.
pub const DEFAULT_STRIDE_MS: u32 = 300;

/// Maximum cosine distance still counted as the reference identity
/// (cosine similarity 0.4 or more).
pub const DEFAULT_TOLERANCE: f64 = 0.6;

/// Minimum detector score for a face box to be encoded.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Progress is reported once per this many analyzed frames.
pub const PROGRESS_EVERY_SAMPLES: usize = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
