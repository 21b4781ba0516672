use crate::clock::PlaybackClock;
use crate::cursor::{LyricCursor, LyricWindow};
use crate::display::Progress;
use crate::track::TimecodeTrack;
use std::time::{Duration, Instant};

/// Refresh-loop lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No track loaded.
    #[default]
    Idle,
    /// Ticking; the clock is advancing.
    Running,
    /// The clock is frozen; display keeps the last window.
    Paused,
    /// Elapsed reached the total duration; exited only by a new song start.
    Ended,
}

/// What the driver should do with the tick loop after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Schedule the next tick.
    Continue,
    /// Do not reschedule.
    Stop,
}

/// Result of one tick: display updates plus loop control.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// New lyric window, present only when the cursor moved this tick.
    pub window: Option<LyricWindow>,
    /// Progress readout, updated every tick.
    pub progress: Progress,
    pub control: TickControl,
}

/// Result of a seek: immediate display update plus whether ticking resumes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekOutcome {
    pub window: LyricWindow,
    pub progress: Progress,
    /// True only when the session was running before the seek.
    pub resume_ticking: bool,
}

/// Result of a play/pause toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Now running; the driver should restart ticking.
    Resumed,
    /// Now paused; the driver should cancel the pending tick.
    Paused,
    /// Toggle has no meaning in the current state (idle or ended).
    Ignored,
}

/// All mutable playback state for one song, owned as a single object.
///
/// Track, clock, and cursor live here rather than as free-floating state;
/// every transition is a total function over (current state, event) and
/// takes an explicit `now` sample, which keeps the machine deterministic
/// under test. The async driver around it owns scheduling.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    track: TimecodeTrack,
    clock: PlaybackClock,
    cursor: LyricCursor,
    state: SessionState,
}

impl PlaybackSession {
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Progress readout for the current instant.
    #[must_use]
    pub fn progress(&self, now: Instant) -> Progress {
        Progress::clamped(self.clock.elapsed(now), self.track.total_duration())
    }

    /// Load a new track, resetting cursor and clock.
    ///
    /// Returns whether ticking should start: an empty track goes straight
    /// to [`SessionState::Ended`] and never schedules a tick.
    pub fn load(&mut self, track: TimecodeTrack, now: Instant) -> bool {
        self.cursor.reset();
        self.clock.start(now);
        let runnable = !track.is_empty();
        self.track = track;

        if runnable {
            self.state = SessionState::Running;
        } else {
            self.clock.pause(now);
            self.state = SessionState::Ended;
        }
        runnable
    }

    /// One refresh: sample the clock, advance the cursor, detect end-of-song.
    ///
    /// Outside [`SessionState::Running`] this mutates nothing and asks the
    /// driver to stop. At end-of-song the session auto-pauses, progress is
    /// clamped to the total, and the tick is not rescheduled.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome {
                window: None,
                progress: self.progress(now),
                control: TickControl::Stop,
            };
        }

        let elapsed = self.clock.elapsed(now);
        let total = self.track.total_duration();
        let window = self.cursor.advance(&self.track, elapsed);

        if elapsed >= total {
            self.state = SessionState::Ended;
            self.clock.pause(now);
            return TickOutcome {
                window,
                progress: Progress::clamped(total, total),
                control: TickControl::Stop,
            };
        }

        TickOutcome {
            window,
            progress: Progress::clamped(elapsed, total),
            control: TickControl::Continue,
        }
    }

    /// Flip between running and paused without losing elapsed time.
    pub fn toggle_play_pause(&mut self, now: Instant) -> ToggleOutcome {
        match self.state {
            SessionState::Running => {
                self.clock.pause(now);
                self.state = SessionState::Paused;
                ToggleOutcome::Paused
            }
            SessionState::Paused => {
                self.clock.resume(now);
                self.state = SessionState::Running;
                ToggleOutcome::Resumed
            }
            SessionState::Idle | SessionState::Ended => ToggleOutcome::Ignored,
        }
    }

    /// Jump to `target` elapsed seconds, clamped to the track duration.
    ///
    /// The cursor is recomputed by a full rescan since the jump may move
    /// time backward. Works from any state with a track loaded: paused and
    /// ended sessions get their display updated but stay put; only a
    /// running session asks the driver to resume ticking. Returns `None`
    /// when idle (nothing to seek in).
    pub fn seek(&mut self, now: Instant, target: Duration) -> Option<SeekOutcome> {
        if self.state == SessionState::Idle {
            return None;
        }

        let total = self.track.total_duration();
        let target = target.min(total);
        self.clock.seek(now, target);
        let window = self.cursor.rescan(&self.track, target);

        Some(SeekOutcome {
            window,
            progress: Progress::clamped(target, total),
            resume_ticking: self.state == SessionState::Running,
        })
    }

    /// Stop ticking after a per-tick failure, keeping elapsed time intact.
    pub fn halt(&mut self, now: Instant) {
        if self.state == SessionState::Running {
            self.clock.pause(now);
            self.state = SessionState::Paused;
        }
    }

    /// Drop the track and return to idle (connection loss path).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Cue;

    fn abc_track() -> TimecodeTrack {
        TimecodeTrack::new(vec![
            Cue::new(0.0, "a"),
            Cue::new(2.0, "b"),
            Cue::new(4.0, "c"),
        ])
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_load_enters_running() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();

        assert!(session.load(abc_track(), t0));
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_load_empty_track_ends_immediately() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();

        assert!(!session.load(TimecodeTrack::default(), t0));
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(session.progress(t0).total, Duration::ZERO);
    }

    #[test]
    fn test_first_tick_shows_opening_line() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);

        let outcome = session.tick(t0);
        let window = outcome.window.unwrap();
        assert_eq!(window.current, "a");
        assert_eq!(window.upcoming, ["b".to_string(), "c".into(), String::new()]);
        assert_eq!(outcome.control, TickControl::Continue);
    }

    #[test]
    fn test_tick_without_boundary_keeps_window() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0);

        let outcome = session.tick(t0 + secs(1));
        assert!(outcome.window.is_none());
        assert_eq!(outcome.progress.elapsed, secs(1));
        assert_eq!(outcome.control, TickControl::Continue);
    }

    #[test]
    fn test_tick_past_last_cue_still_running() {
        // total = 4 + (4 - 2) = 6, so elapsed 5 keeps ticking
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0);

        let outcome = session.tick(t0 + secs(5));
        let window = outcome.window.unwrap();
        assert_eq!(window.current, "c");
        assert_eq!(window.upcoming, [String::new(), String::new(), String::new()]);
        assert_eq!(outcome.control, TickControl::Continue);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_tick_at_total_duration_ends() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0);

        let outcome = session.tick(t0 + secs(6));
        assert_eq!(outcome.control, TickControl::Stop);
        assert_eq!(outcome.progress.elapsed, secs(6));
        assert_eq!(outcome.progress.total, secs(6));
        assert_eq!(session.state(), SessionState::Ended);

        // Frozen at the end: later progress queries stay clamped
        assert_eq!(session.progress(t0 + secs(60)).elapsed, secs(6));
    }

    #[test]
    fn test_pause_then_resume_keeps_elapsed() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);

        assert_eq!(session.toggle_play_pause(t0 + secs(3)), ToggleOutcome::Paused);
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.progress(t0 + secs(9)).elapsed, secs(3));

        assert_eq!(
            session.toggle_play_pause(t0 + secs(9)),
            ToggleOutcome::Resumed
        );
        assert_eq!(session.progress(t0 + secs(9)).elapsed, secs(3));
        assert_eq!(session.progress(t0 + secs(10)).elapsed, secs(4));
    }

    #[test]
    fn test_toggle_is_ignored_without_track() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        assert_eq!(session.toggle_play_pause(t0), ToggleOutcome::Ignored);
    }

    #[test]
    fn test_seek_backward_rescans() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0 + secs(5));

        let outcome = session.seek(t0 + secs(5), secs(1)).unwrap();
        assert_eq!(outcome.window.current, "a");
        assert_eq!(outcome.progress.elapsed, secs(1));
        assert!(outcome.resume_ticking);

        // Subsequent ticks pick up from the rescanned position
        let tick = session.tick(t0 + secs(6));
        assert_eq!(tick.window.unwrap().current, "b");
    }

    #[test]
    fn test_seek_while_paused_updates_display_only() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.toggle_play_pause(t0 + secs(1));

        let outcome = session.seek(t0 + secs(2), secs(4)).unwrap();
        assert_eq!(outcome.window.current, "c");
        assert!(!outcome.resume_ticking);
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.progress(t0 + secs(30)).elapsed, secs(4));
    }

    #[test]
    fn test_seek_clamps_to_total_duration() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);

        let outcome = session.seek(t0, secs(100)).unwrap();
        assert_eq!(outcome.progress.elapsed, secs(6));
    }

    #[test]
    fn test_seek_when_idle_is_none() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        assert!(session.seek(t0, secs(1)).is_none());
    }

    #[test]
    fn test_seek_in_ended_does_not_restart() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0 + secs(6));
        assert_eq!(session.state(), SessionState::Ended);

        let outcome = session.seek(t0 + secs(7), secs(1)).unwrap();
        assert!(!outcome.resume_ticking);
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(outcome.window.current, "a");
    }

    #[test]
    fn test_new_load_replaces_ended_session() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);
        session.tick(t0 + secs(6));
        assert_eq!(session.state(), SessionState::Ended);

        assert!(session.load(abc_track(), t0 + secs(10)));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.progress(t0 + secs(10)).elapsed, Duration::ZERO);
    }

    #[test]
    fn test_halt_pauses_running_session() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);

        session.halt(t0 + secs(2));
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.progress(t0 + secs(9)).elapsed, secs(2));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();
        session.load(abc_track(), t0);

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.progress(t0).total, Duration::ZERO);
    }

    #[test]
    fn test_tick_outside_running_is_inert() {
        let t0 = Instant::now();
        let mut session = PlaybackSession::default();

        let outcome = session.tick(t0);
        assert!(outcome.window.is_none());
        assert_eq!(outcome.control, TickControl::Stop);
    }
}
