use serde::{Deserialize, Serialize};

/// A closed time range, in seconds, during which the reference face was
/// continuously judged present at sampling granularity.
///
/// Serializes as a two-element array `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct AppearanceInterval {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl AppearanceInterval {
    /// Builds an interval from raw timestamps, rounding both ends to
    /// hundredths of a second.
    pub fn rounded(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds: round_centis(start_seconds),
            end_seconds: round_centis(end_seconds),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

impl From<[f64; 2]> for AppearanceInterval {
    fn from([start_seconds, end_seconds]: [f64; 2]) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }
}

impl From<AppearanceInterval> for [f64; 2] {
    fn from(interval: AppearanceInterval) -> Self {
        [interval.start_seconds, interval.end_seconds]
    }
}

fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Drops intervals shorter than `min_seconds`.
///
/// The tracker reports every sighting, including single-frame `(t, t)`
/// intervals; callers that want to ignore brief flickers filter here.
pub fn filter_min_duration(
    intervals: Vec<AppearanceInterval>,
    min_seconds: f64,
) -> Vec<AppearanceInterval> {
    if min_seconds <= 0.0 {
        return intervals;
    }
    intervals
        .into_iter()
        .filter(|i| i.duration_seconds() >= min_seconds)
        .collect()
}
