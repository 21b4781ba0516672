use crate::cursor::LyricWindow;
use crate::display::{DisplayPort, Progress};
use crate::error::Result;
use crate::protocol::ServerMessage;
use crate::session::{PlaybackSession, SessionState, TickControl, ToggleOutcome};
use crate::track::TimecodeTrack;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The one scheduled tick task. Holding the token and handle together makes
/// "cancel, then wait for it to finish" a single operation.
struct TickTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Continuous refresh-loop driver around a [`PlaybackSession`].
///
/// Owns the session, the display port, and at most one pending tick task.
/// Every transition (new song, toggle, seek, disconnect, shutdown) cancels
/// the pending task before scheduling a new one, so duplicate loops cannot
/// drive a stale track. Push messages and user actions each run to
/// completion between ticks; the session mutex serializes them.
pub struct LyricEngine {
    session: Mutex<PlaybackSession>,
    display: Arc<dyn DisplayPort>,
    tick_task: Mutex<Option<TickTask>>,
    frame_interval: Duration,
}

impl LyricEngine {
    /// Create an engine rendering to `display` at the given frame cadence.
    #[must_use]
    pub fn new(display: Arc<dyn DisplayPort>, frame_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(PlaybackSession::default()),
            display,
            tick_task: Mutex::new(None),
            frame_interval,
        })
    }

    /// Current lifecycle state of the underlying session.
    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Progress readout at this instant, without waiting for a tick.
    pub async fn progress(&self) -> Progress {
        self.session.lock().await.progress(Instant::now())
    }

    /// Single entry point for server push messages.
    pub async fn handle_message(self: &Arc<Self>, message: ServerMessage) {
        match message {
            ServerMessage::LyricUpdate {
                current_lyric,
                next_lyrics,
            } => {
                // Manual trigger path: overrides the display, clock untouched
                let window = LyricWindow::from_push(current_lyric, next_lyrics);
                if let Err(e) = self.display.render_window(&window).await {
                    warn!("Display rejected pushed lyric window: {e}");
                }
            }
            ServerMessage::SongStart {
                song_id,
                title,
                timecodes,
            } => {
                info!("Starting song: {title} ({song_id})");
                let track = TimecodeTrack::new(timecodes.into_iter().map(Into::into).collect());
                self.start_song(track).await;
            }
        }
    }

    /// Load a track and start the refresh loop from zero.
    pub async fn start_song(self: &Arc<Self>, track: TimecodeTrack) {
        self.cancel_pending_tick().await;

        let now = Instant::now();
        let (runnable, progress) = {
            let mut session = self.session.lock().await;
            let runnable = session.load(track, now);
            (runnable, session.progress(now))
        };

        // Initial readout before the first tick fires
        if let Err(e) = self.display.render_progress(progress).await {
            warn!("Display rejected initial progress: {e}");
        }
        if let Err(e) = self.display.set_playing(runnable).await {
            warn!("Display rejected play state: {e}");
        }

        if runnable {
            self.start_ticking().await;
        } else {
            debug!("Track has no cues, session ended without ticking");
        }
    }

    /// Flip play/pause, starting or cancelling the tick loop to match.
    pub async fn toggle_play_pause(self: &Arc<Self>) {
        let outcome = self
            .session
            .lock()
            .await
            .toggle_play_pause(Instant::now());

        match outcome {
            ToggleOutcome::Paused => {
                self.cancel_pending_tick().await;
                if let Err(e) = self.display.set_playing(false).await {
                    warn!("Display rejected play state: {e}");
                }
            }
            ToggleOutcome::Resumed => {
                if let Err(e) = self.display.set_playing(true).await {
                    warn!("Display rejected play state: {e}");
                }
                self.start_ticking().await;
            }
            ToggleOutcome::Ignored => {}
        }
    }

    /// Jump playback to `target`, updating the display immediately.
    ///
    /// The pending tick is cancelled first; ticking resumes only when the
    /// session was running before the seek.
    pub async fn seek(self: &Arc<Self>, target: Duration) {
        self.cancel_pending_tick().await;

        let outcome = self.session.lock().await.seek(Instant::now(), target);
        let Some(outcome) = outcome else {
            debug!("Seek ignored: no track loaded");
            return;
        };

        if let Err(e) = self.display.render_window(&outcome.window).await {
            warn!("Display rejected seek window: {e}");
        }
        if let Err(e) = self.display.render_progress(outcome.progress).await {
            warn!("Display rejected seek progress: {e}");
        }

        if outcome.resume_ticking {
            self.start_ticking().await;
        }
    }

    /// Connection loss: stop ticking and drop the track.
    pub async fn handle_disconnect(&self) {
        warn!("Server connection lost, stopping refresh loop");
        self.cancel_pending_tick().await;
        self.session.lock().await.reset();
    }

    /// Cancel any pending tick without touching session state.
    pub async fn shutdown(&self) {
        self.cancel_pending_tick().await;
    }

    /// Replace the pending tick task, enforcing the at-most-one invariant.
    async fn start_ticking(self: &Arc<Self>) {
        self.cancel_pending_tick().await;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            engine.run_tick_loop(token).await;
        });

        *self.tick_task.lock().await = Some(TickTask { cancel, handle });
    }

    async fn cancel_pending_tick(&self) {
        let task = self.tick_task.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            // Wait for the loop to wind down so two loops never overlap
            if let Err(e) = task.handle.await {
                if !e.is_cancelled() {
                    warn!("Tick task ended abnormally: {e}");
                }
            }
        }
    }

    async fn run_tick_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.frame_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Tick loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let (outcome, state) = {
                        let mut session = self.session.lock().await;
                        let outcome = session.tick(Instant::now());
                        (outcome, session.state())
                    };

                    if let Err(e) = self.render_tick(outcome.window.as_ref(), outcome.progress, state).await {
                        error!("Tick render failed, halting refresh loop: {e}");
                        self.session.lock().await.halt(Instant::now());
                        break;
                    }

                    if outcome.control == TickControl::Stop {
                        if state == SessionState::Ended {
                            info!("End of song reached");
                        }
                        break;
                    }
                }
            }
        }
    }

    async fn render_tick(
        &self,
        window: Option<&LyricWindow>,
        progress: Progress,
        state: SessionState,
    ) -> Result<()> {
        if let Some(window) = window {
            self.display.render_window(window).await?;
        }
        self.display.render_progress(progress).await?;
        if state == SessionState::Ended {
            self.display.set_playing(false).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::protocol::WireCue;
    use crate::track::Cue;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum DisplayEvent {
        Window(LyricWindow),
        Progress(Progress),
        Playing(bool),
    }

    #[derive(Default)]
    struct RecordingDisplay {
        events: StdMutex<Vec<DisplayEvent>>,
    }

    impl RecordingDisplay {
        fn events(&self) -> Vec<DisplayEvent> {
            self.events.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.events.lock().unwrap().clear();
        }

        fn last_window(&self) -> Option<LyricWindow> {
            self.events()
                .into_iter()
                .rev()
                .find_map(|event| match event {
                    DisplayEvent::Window(window) => Some(window),
                    _ => None,
                })
        }
    }

    #[async_trait]
    impl DisplayPort for RecordingDisplay {
        async fn render_window(&self, window: &LyricWindow) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(DisplayEvent::Window(window.clone()));
            Ok(())
        }

        async fn render_progress(&self, progress: Progress) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(DisplayEvent::Progress(progress));
            Ok(())
        }

        async fn set_playing(&self, playing: bool) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(DisplayEvent::Playing(playing));
            Ok(())
        }
    }

    struct FailingDisplay;

    #[async_trait]
    impl DisplayPort for FailingDisplay {
        async fn render_window(&self, _window: &LyricWindow) -> Result<()> {
            Ok(())
        }

        async fn render_progress(&self, _progress: Progress) -> Result<()> {
            Err(CoreError::RenderError {
                reason: "broken display".into(),
            })
        }

        async fn set_playing(&self, _playing: bool) -> Result<()> {
            Ok(())
        }
    }

    const FRAME: Duration = Duration::from_millis(5);

    fn short_track() -> TimecodeTrack {
        // total = 0.05 + 0.05 = 0.1s
        TimecodeTrack::new(vec![Cue::new(0.0, "a"), Cue::new(0.05, "b")])
    }

    fn long_track() -> TimecodeTrack {
        TimecodeTrack::new(vec![
            Cue::new(0.0, "a"),
            Cue::new(600.0, "b"),
            Cue::new(1200.0, "c"),
        ])
    }

    #[tokio::test]
    async fn test_song_plays_through_to_ended() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(short_track()).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(engine.state().await, SessionState::Ended);
        assert_eq!(display.last_window().map(|w| w.current), Some("b".into()));

        // Auto-paused at the end
        assert_eq!(
            display.events().last(),
            Some(&DisplayEvent::Playing(false))
        );
    }

    #[tokio::test]
    async fn test_lyric_update_overrides_display() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine
            .handle_message(ServerMessage::LyricUpdate {
                current_lyric: Some("live line".into()),
                next_lyrics: vec!["next".into()],
            })
            .await;

        assert_eq!(engine.state().await, SessionState::Idle);
        assert_eq!(
            display.last_window().map(|w| w.current),
            Some("live line".into())
        );
    }

    #[tokio::test]
    async fn test_song_start_message_builds_track() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine
            .handle_message(ServerMessage::SongStart {
                song_id: "s1".into(),
                title: "Test".into(),
                timecodes: vec![WireCue {
                    time: 600.0,
                    text: "later".into(),
                }],
            })
            .await;

        assert_eq!(engine.state().await, SessionState::Running);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_track_ends_without_ticking() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(TimecodeTrack::default()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.state().await, SessionState::Ended);
        let events = display.events();
        // Only the initial readout, never a tick or a window
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DisplayEvent::Progress(_)));
        assert_eq!(events[1], DisplayEvent::Playing(false));
    }

    #[tokio::test]
    async fn test_restart_replaces_pending_tick() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(long_track()).await;
        engine.start_song(long_track()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Pausing cancels the (single) pending tick; if the first loop had
        // leaked, it would keep rendering afterward.
        engine.toggle_play_pause().await;
        display.clear();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(display.events().is_empty());
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_toggle_pauses_and_resumes() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(long_track()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        engine.toggle_play_pause().await;
        assert_eq!(engine.state().await, SessionState::Paused);

        engine.toggle_play_pause().await;
        assert_eq!(engine.state().await, SessionState::Running);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_seek_while_paused_updates_display_only() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(long_track()).await;
        engine.toggle_play_pause().await;
        display.clear();

        engine.seek(Duration::from_secs(700)).await;

        assert_eq!(engine.state().await, SessionState::Paused);
        assert_eq!(display.last_window().map(|w| w.current), Some("b".into()));

        // Still paused: no tick loop is running
        display.clear();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(display.events().is_empty());
    }

    #[tokio::test]
    async fn test_display_failure_halts_loop() {
        let engine = LyricEngine::new(Arc::new(FailingDisplay), FRAME);

        engine.start_song(long_track()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.state().await, SessionState::Paused);
    }

    #[tokio::test]
    async fn test_disconnect_resets_to_idle() {
        let display = Arc::new(RecordingDisplay::default());
        let engine = LyricEngine::new(display.clone(), FRAME);

        engine.start_song(long_track()).await;
        engine.handle_disconnect().await;

        assert_eq!(engine.state().await, SessionState::Idle);
    }
}
