use crate::track::TimecodeTrack;
use std::time::Duration;

/// Number of upcoming lines shown below the current one.
pub const UPCOMING_LINES: usize = 3;

/// The visible slice of lyrics: the current line plus the next few.
///
/// Slots past the end of the track are empty strings, so the display never
/// has to special-case track exhaustion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricWindow {
    /// The most recently activated line, empty before the first cue.
    pub current: String,
    /// The next lines in order, empty-padded.
    pub upcoming: [String; UPCOMING_LINES],
}

impl LyricWindow {
    /// Snapshot the window around a cursor position.
    #[must_use]
    pub fn at(track: &TimecodeTrack, index: Option<usize>) -> Self {
        let current = index
            .and_then(|i| track.cue_at(i))
            .map(|cue| cue.text.clone())
            .unwrap_or_default();

        let next_base = index.map_or(0, |i| i + 1);
        let mut upcoming: [String; UPCOMING_LINES] = Default::default();
        for (offset, slot) in upcoming.iter_mut().enumerate() {
            if let Some(cue) = track.cue_at(next_base + offset) {
                slot.clone_from(&cue.text);
            }
        }

        Self { current, upcoming }
    }

    /// Build a window from a server-pushed override.
    ///
    /// Missing upcoming slots pad with empty strings; extras are dropped.
    #[must_use]
    pub fn from_push(current: Option<String>, upcoming_lines: Vec<String>) -> Self {
        let mut upcoming: [String; UPCOMING_LINES] = Default::default();
        for (slot, text) in upcoming.iter_mut().zip(upcoming_lines) {
            *slot = text;
        }
        Self {
            current: current.unwrap_or_default(),
            upcoming,
        }
    }
}

/// Monotonic position index into a [`TimecodeTrack`].
///
/// `None` means no cue has activated yet. While playing forward the index
/// only increases; the single legitimate backward correction is
/// [`rescan`](Self::rescan) after a seek.
#[derive(Debug, Clone, Default)]
pub struct LyricCursor {
    index: Option<usize>,
}

impl LyricCursor {
    /// The index of the most recently activated cue, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Drop back to the pre-song position.
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Advance past every cue whose time has arrived.
    ///
    /// Scans forward from the cue after the current index; the sort order
    /// guarantees the scan can stop at the first cue still in the future,
    /// so consumed cues are never revisited. Returns the new window only
    /// when the index actually moved. Cues sharing a timestamp are all
    /// consumed in the same call and only the last becomes current.
    pub fn advance(&mut self, track: &TimecodeTrack, elapsed: Duration) -> Option<LyricWindow> {
        let mut next = self.index.map_or(0, |i| i + 1);
        let mut moved = false;

        while let Some(cue) = track.cue_at(next) {
            if cue.time > elapsed {
                break;
            }
            self.index = Some(next);
            next += 1;
            moved = true;
        }

        moved.then(|| LyricWindow::at(track, self.index))
    }

    /// Recompute the position from scratch for the given elapsed time.
    ///
    /// This is the seek path: elapsed may have moved backward, so the
    /// incremental scan does not apply. Always returns the resulting window
    /// so the display can update immediately.
    pub fn rescan(&mut self, track: &TimecodeTrack, elapsed: Duration) -> LyricWindow {
        self.index = None;
        self.advance(track, elapsed);
        LyricWindow::at(track, self.index)
    }
}
