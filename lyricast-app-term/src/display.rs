//! Terminal implementation of the engine's display port.

use async_trait::async_trait;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use lyricast_core::error::Result;
use lyricast_core::{format_timestamp, DisplayPort, LyricWindow, Progress};
use std::io::{stdout, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

const CURRENT_ROW: u16 = 1;
const UPCOMING_ROW: u16 = 3;
const PROGRESS_ROW: u16 = 7;
const STATUS_ROW: u16 = 8;
const HELP_ROW: u16 = 10;
const BAR_WIDTH: usize = 30;

/// Renders the lyric window and progress readout into an alternate-screen
/// terminal. The rendering itself is deliberately dumb: the engine decides
/// what changes and when.
pub struct TermDisplay {
    out: Mutex<Stdout>,
    restored: AtomicBool,
}

impl TermDisplay {
    /// Enter the alternate screen and draw the static chrome.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched to raw mode.
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        queue!(
            out,
            MoveTo(0, CURRENT_ROW),
            SetAttribute(Attribute::Dim),
            Print("waiting for a song to start..."),
            SetAttribute(Attribute::Reset),
            MoveTo(0, HELP_ROW),
            SetAttribute(Attribute::Dim),
            Print("space: play/pause   \u{2190}/\u{2192}: seek   q: quit"),
            SetAttribute(Attribute::Reset),
        )?;
        out.flush()?;

        Ok(Self {
            out: Mutex::new(out),
            restored: AtomicBool::new(false),
        })
    }

    /// Leave the alternate screen and give the terminal back.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal state cannot be restored.
    pub fn restore(&self) -> Result<()> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut out = self.lock_out();
        execute!(out, Show, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        Ok(())
    }

    fn lock_out(&self) -> std::sync::MutexGuard<'_, Stdout> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn progress_bar(progress: Progress) -> String {
    let total_ms = progress.total.as_millis().max(1);
    let filled = usize::try_from(progress.elapsed.as_millis() * (BAR_WIDTH as u128) / total_ms)
        .unwrap_or(BAR_WIDTH)
        .min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar.push(']');
    bar
}

#[async_trait]
impl DisplayPort for TermDisplay {
    async fn render_window(&self, window: &LyricWindow) -> Result<()> {
        let mut out = self.lock_out();

        queue!(
            out,
            MoveTo(0, CURRENT_ROW),
            Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Bold),
            Print(&window.current),
            SetAttribute(Attribute::Reset),
        )?;

        for (offset, line) in window.upcoming.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let row = UPCOMING_ROW + offset as u16;
            queue!(
                out,
                MoveTo(0, row),
                Clear(ClearType::CurrentLine),
                SetAttribute(Attribute::Dim),
                Print(line),
                SetAttribute(Attribute::Reset),
            )?;
        }

        out.flush()?;
        Ok(())
    }

    async fn render_progress(&self, progress: Progress) -> Result<()> {
        let mut out = self.lock_out();
        queue!(
            out,
            MoveTo(0, PROGRESS_ROW),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "{} {} / {}",
                progress_bar(progress),
                format_timestamp(progress.elapsed),
                format_timestamp(progress.total),
            )),
        )?;
        out.flush()?;
        Ok(())
    }

    async fn set_playing(&self, playing: bool) -> Result<()> {
        let mut out = self.lock_out();
        queue!(
            out,
            MoveTo(0, STATUS_ROW),
            Clear(ClearType::CurrentLine),
            Print(if playing { "\u{25b6} playing" } else { "\u{23f8} paused" }),
        )?;
        out.flush()?;
        Ok(())
    }
}
