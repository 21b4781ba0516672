use crate::cursor::LyricWindow;
use crate::error::Result;
use crate::time::format_timestamp;
use async_trait::async_trait;
use std::time::Duration;

/// Playback progress readout, updated every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Elapsed song time, already clamped to `total`.
    pub elapsed: Duration,
    /// Estimated total song duration.
    pub total: Duration,
}

impl Progress {
    /// Build a progress sample, clamping elapsed into `[0, total]`.
    #[must_use]
    pub fn clamped(elapsed: Duration, total: Duration) -> Self {
        Self {
            elapsed: elapsed.min(total),
            total,
        }
    }

    /// Fraction of the song played, in `[0.0, 1.0]`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Render as `MM:SS / MM:SS`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} / {}",
            format_timestamp(self.elapsed),
            format_timestamp(self.total)
        )
    }
}

/// Narrow rendering seam consumed by the engine.
///
/// Implementations draw the lyric window and progress readout however they
/// like (terminal, GUI, ...). The engine treats a render failure as fatal to
/// the current refresh loop: it cancels the pending tick and halts rather
/// than looping on a broken display.
#[async_trait]
pub trait DisplayPort: Send + Sync {
    /// Show a new lyric window. Called only when the window changed.
    async fn render_window(&self, window: &LyricWindow) -> Result<()>;

    /// Update the progress readout. Called every tick.
    async fn render_progress(&self, progress: Progress) -> Result<()>;

    /// Reflect the play/pause state in the controls.
    async fn set_playing(&self, playing: bool) -> Result<()>;
}
