use std::time::{Duration, Instant};

/// Maps wall-clock samples to elapsed song time.
///
/// The clock holds a `base` elapsed value plus, while playing, an `anchor`
/// instant from which further time accrues. Pausing folds the accrued time
/// into `base` and clears the anchor so subsequent queries return the frozen
/// value; resuming re-anchors at the resume instant so elapsed continues
/// without a jump. Seeking replaces `base` outright and is the only
/// discontinuity.
///
/// Every operation takes an explicit `now` sample, which keeps the clock
/// deterministic under test.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    /// Elapsed song time at the moment the anchor was last set.
    base: Duration,
    /// Wall-clock instant elapsed accrues from. `None` while paused.
    anchor: Option<Instant>,
}

impl PlaybackClock {
    /// Start from zero and begin advancing.
    pub fn start(&mut self, now: Instant) {
        self.base = Duration::ZERO;
        self.anchor = Some(now);
    }

    /// Freeze elapsed at its current value.
    ///
    /// Idempotent: pausing an already-paused clock changes nothing.
    pub fn pause(&mut self, now: Instant) {
        self.base = self.elapsed(now);
        self.anchor = None;
    }

    /// Continue advancing from the frozen value.
    ///
    /// Idempotent: resuming a running clock keeps its current elapsed.
    pub fn resume(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    /// Jump elapsed to `target` exactly, keeping the playing/paused state.
    ///
    /// A running clock keeps running from `target`; a paused clock holds the
    /// new value until resumed.
    pub fn seek(&mut self, now: Instant, target: Duration) {
        self.base = target;
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
    }

    /// Elapsed song time at `now`.
    ///
    /// A `now` earlier than the anchor saturates to the anchor, so elapsed
    /// never moves backward between consecutive samples.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => self.base + now.saturating_duration_since(anchor),
            None => self.base,
        }
    }

    /// Whether the clock is currently advancing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }
}
