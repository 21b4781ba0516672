use crate::time::DurationExt;
use std::time::Duration;

/// A single lyric line with its activation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// When this line becomes current, measured from song start.
    pub time: Duration,
    /// The lyric text.
    pub text: String,
}

impl Cue {
    /// Create a cue from fractional seconds as received on the wire.
    ///
    /// Times are sanitized on entry: NaN, infinite, and negative values
    /// clamp to zero rather than rejecting the whole track.
    pub fn new(time_secs: f64, text: impl Into<String>) -> Self {
        Self {
            time: Duration::from_secs_sanitized(time_secs),
            text: text.into(),
        }
    }
}

/// Immutable, time-sorted cue sequence for one song.
///
/// Built once per song start and replaced wholesale on the next one.
/// The sort is stable, so cues sharing a timestamp keep their original
/// relative order.
#[derive(Debug, Clone, Default)]
pub struct TimecodeTrack {
    cues: Vec<Cue>,
}

impl TimecodeTrack {
    /// Build a track from an unordered cue list.
    #[must_use]
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by_key(|cue| cue.time);
        Self { cues }
    }

    /// Get the cue at `index`, if any.
    #[must_use]
    pub fn cue_at(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Number of cues in the track.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the track has no cues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Iterate over all cues in time order.
    pub fn cues(&self) -> impl Iterator<Item = &Cue> {
        self.cues.iter()
    }

    /// Estimated total song duration.
    ///
    /// The final line has no explicit end, so its duration is estimated as
    /// the gap between the last two cues: `last + (last - second_last)`.
    /// A single-cue track degenerates to doubling the lone timestamp, and
    /// an empty track has zero duration.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        match self.cues.len() {
            0 => Duration::ZERO,
            1 => self.cues[0].time * 2,
            n => {
                let last = self.cues[n - 1].time;
                let second_last = self.cues[n - 2].time;
                last + last.saturating_sub(second_last)
            }
        }
    }
}
