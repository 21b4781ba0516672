pub mod clock;
pub mod config;
pub mod cursor;
pub mod display;
pub mod engine;
pub mod error;
pub mod paths;
pub mod protocol;
pub mod session;
pub mod time;
pub mod track;

pub use clock::PlaybackClock;
pub use config::{Config, PlaybackConfig, ServerConfig};
pub use cursor::{LyricCursor, LyricWindow, UPCOMING_LINES};
pub use display::{DisplayPort, Progress};
pub use engine::LyricEngine;
pub use error::CoreError;
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use protocol::{ServerMessage, WireCue};
pub use session::{PlaybackSession, SeekOutcome, SessionState, TickControl, TickOutcome, ToggleOutcome};
pub use time::{format_timestamp, DurationExt};
pub use track::{Cue, TimecodeTrack};
