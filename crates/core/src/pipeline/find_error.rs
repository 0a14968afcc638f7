use thiserror::Error;

use crate::recognition::domain::face_matcher::ToleranceError;
use crate::sampling::domain::sampling_stride::StrideError;

/// Why a run ended without a result.
///
/// Every variant is terminal for its run: nothing is retried and no partial
/// interval list survives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FindError {
    #[error("no face detected in the reference image")]
    NoReferenceFace,
    #[error("failed to read reference image: {0}")]
    ReferenceImage(String),
    #[error("failed to open video: {0}")]
    Source(String),
    #[error("video frame rate {0} is not usable")]
    InvalidFrameRate(f64),
    #[error("failed to decode video: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("face encoder failed: {0}")]
    Encoder(String),
    #[error("cancelled")]
    Cancelled,
}

impl FindError {
    /// Broad category, matching the three failure classes a caller may act on.
    pub fn kind(&self) -> FindErrorKind {
        match self {
            FindError::NoReferenceFace | FindError::ReferenceImage(_) => {
                FindErrorKind::Precondition
            }
            FindError::Source(_)
            | FindError::InvalidFrameRate(_)
            | FindError::Decode(_)
            | FindError::Encoder(_) => FindErrorKind::Source,
            FindError::Configuration(_) => FindErrorKind::Configuration,
            FindError::Cancelled => FindErrorKind::Cancelled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindErrorKind {
    Precondition,
    Source,
    Configuration,
    Cancelled,
}

impl From<StrideError> for FindError {
    fn from(e: StrideError) -> Self {
        match e {
            StrideError::InvalidFrameRate(fps) => FindError::InvalidFrameRate(fps),
            other => FindError::Configuration(other.to_string()),
        }
    }
}

impl From<ToleranceError> for FindError {
    fn from(e: ToleranceError) -> Self {
        FindError::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_frame_rate_is_a_source_error() {
        let e: FindError = StrideError::InvalidFrameRate(0.0).into();
        assert_eq!(e, FindError::InvalidFrameRate(0.0));
        assert_eq!(e.kind(), FindErrorKind::Source);
    }

    #[test]
    fn test_sub_frame_stride_is_a_configuration_error() {
        let e: FindError = StrideError::BelowOneFrame {
            stride_ms: 10,
            fps: 30.0,
        }
        .into();
        assert_eq!(e.kind(), FindErrorKind::Configuration);
        assert!(e.to_string().contains("shorter than one frame"));
    }

    #[test]
    fn test_tolerance_error_is_a_configuration_error() {
        let e: FindError = ToleranceError(1.5).into();
        assert_eq!(e.kind(), FindErrorKind::Configuration);
    }

    #[test]
    fn test_missing_reference_face_is_a_precondition_error() {
        assert_eq!(
            FindError::NoReferenceFace.kind(),
            FindErrorKind::Precondition
        );
        assert_eq!(
            FindError::NoReferenceFace.to_string(),
            "no face detected in the reference image"
        );
    }
}
