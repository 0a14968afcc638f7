use serde::{Deserialize, Serialize};

use crate::pipeline::find_error::FindError;
use crate::recognition::domain::face_matcher::Tolerance;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_STRIDE_MS, DEFAULT_TOLERANCE};

/// Tunables for one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FindConfig {
    /// Time between analyzed frames, in milliseconds.
    #[serde(default = "default_stride_ms")]
    pub stride_ms: u32,
    /// Maximum cosine distance counted as a match, in `(0, 1]`.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Minimum detector score for a face to be encoded at all.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_stride_ms() -> u32 {
    DEFAULT_STRIDE_MS
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            stride_ms: DEFAULT_STRIDE_MS,
            tolerance: DEFAULT_TOLERANCE,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl FindConfig {
    /// Checks everything that can be checked before touching any input.
    ///
    /// The stride in frames additionally depends on the video frame rate
    /// and is validated once the video is open.
    pub fn validate(&self) -> Result<Tolerance, FindError> {
        if self.stride_ms == 0 {
            return Err(FindError::Configuration(
                "stride_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(FindError::Configuration(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        Ok(Tolerance::new(self.tolerance)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FindConfig::default();
        assert_eq!(config.stride_ms, 300);
        assert_eq!(config.validate().unwrap().value(), 0.6);
    }

    #[test]
    fn test_zero_stride_rejected() {
        let config = FindConfig {
            stride_ms: 0,
            ..FindConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FindError::Configuration(_))
        ));
    }

    #[test]
    fn test_out_of_range_tolerance_rejected() {
        let config = FindConfig {
            tolerance: 1.5,
            ..FindConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FindError::Configuration(_))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let config = FindConfig {
            confidence: -0.1,
            ..FindConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FindError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: FindConfig = serde_json::from_str(r#"{"tolerance": 0.5}"#).unwrap();
        assert_eq!(config.stride_ms, 300);
        assert_eq!(config.tolerance, 0.5);
        assert_eq!(config.confidence, 0.5);
    }
}
