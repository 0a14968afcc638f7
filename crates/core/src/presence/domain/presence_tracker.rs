use crate::presence::domain::appearance_interval::AppearanceInterval;

/// The match decision for one sampled frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchSignal {
    pub frame_index: usize,
    pub timestamp_seconds: f64,
    pub is_match: bool,
}

impl MatchSignal {
    pub fn new(frame_index: usize, timestamp_seconds: f64, is_match: bool) -> Self {
        Self {
            frame_index,
            timestamp_seconds,
            is_match,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Presence {
    Absent,
    Present {
        start_seconds: f64,
        last_match_seconds: f64,
    },
}

/// Folds a time-ordered stream of match signals into appearance intervals.
///
/// An interval opens on the first match after an absence and closes on the
/// next non-match; it ends at the last *confirmed* sighting, never at the
/// non-matching frame or anywhere in the unsampled gap before it. Raw
/// timestamps are kept internally and rounded only when an interval is
/// emitted, so intervals separated by less than 0.01 s may touch or even
/// coincide once rounded.
///
/// Signals must arrive in strictly increasing `frame_index` order.
#[derive(Debug)]
pub struct PresenceTracker {
    state: Presence,
    last_frame_index: Option<usize>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            state: Presence::Absent,
            last_frame_index: None,
        }
    }

    /// Reduces a complete signal sequence, including the end-of-stream flush.
    pub fn track<I>(signals: I) -> Vec<AppearanceInterval>
    where
        I: IntoIterator<Item = MatchSignal>,
    {
        let mut tracker = Self::new();
        let mut intervals: Vec<AppearanceInterval> =
            signals.into_iter().filter_map(|s| tracker.observe(s)).collect();
        intervals.extend(tracker.finish());
        intervals
    }

    /// Feeds one signal; returns the interval it closes, if any.
    pub fn observe(&mut self, signal: MatchSignal) -> Option<AppearanceInterval> {
        debug_assert!(
            self.last_frame_index
                .map_or(true, |last| signal.frame_index > last),
            "match signals must arrive in increasing frame order"
        );
        self.last_frame_index = Some(signal.frame_index);

        match (self.state, signal.is_match) {
            (Presence::Absent, true) => {
                self.state = Presence::Present {
                    start_seconds: signal.timestamp_seconds,
                    last_match_seconds: signal.timestamp_seconds,
                };
                None
            }
            (Presence::Present { start_seconds, .. }, true) => {
                self.state = Presence::Present {
                    start_seconds,
                    last_match_seconds: signal.timestamp_seconds,
                };
                None
            }
            (
                Presence::Present {
                    start_seconds,
                    last_match_seconds,
                },
                false,
            ) => {
                self.state = Presence::Absent;
                Some(AppearanceInterval::rounded(start_seconds, last_match_seconds))
            }
            (Presence::Absent, false) => None,
        }
    }

    /// True while an interval is open.
    pub fn is_present(&self) -> bool {
        matches!(self.state, Presence::Present { .. })
    }

    /// Start time of the open interval, unrounded.
    pub fn open_since(&self) -> Option<f64> {
        match self.state {
            Presence::Present { start_seconds, .. } => Some(start_seconds),
            Presence::Absent => None,
        }
    }

    /// Ends the stream, closing a still-open interval at its last sighting.
    pub fn finish(self) -> Option<AppearanceInterval> {
        match self.state {
            Presence::Present {
                start_seconds,
                last_match_seconds,
            } => Some(AppearanceInterval::rounded(start_seconds, last_match_seconds)),
            Presence::Absent => None,
        }
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
