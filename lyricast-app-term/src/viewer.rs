//! Interactive viewer: wires the engine, push listener, and key handling.

use crate::display::TermDisplay;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use lyricast_client::{CatalogClient, PushListener};
use lyricast_core::{Config, LyricEngine};
use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the viewer until the user quits or the input stream closes.
///
/// When `song_id` is given, playback of that song is requested after the
/// push connection is up; otherwise the viewer just waits for `song_start`
/// pushes triggered elsewhere.
///
/// # Errors
///
/// Returns an error if the terminal, catalog client, or push connection
/// cannot be set up.
pub async fn run(config: &Config, song_id: Option<&str>) -> Result<(), Box<dyn Error>> {
    let display = Arc::new(TermDisplay::new()?);
    let engine = LyricEngine::new(display.clone(), config.playback.frame_interval());

    let cancel = CancellationToken::new();
    let listener_handle = Arc::new(PushListener::new(
        Arc::clone(&engine),
        config.server.ws_url(),
        Some(cancel.clone()),
    ))
    .start();

    if let Some(id) = song_id {
        let catalog = CatalogClient::new(&config.server)?;
        catalog.request_playback(id).await?;
        info!("Requested playback of {id}");
    }

    let seek_step = config.playback.seek_step();
    let mut events = EventStream::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => break,
                            KeyCode::Char('c')
                                if key.modifiers.contains(KeyModifiers::CONTROL) =>
                            {
                                break;
                            }
                            KeyCode::Char(' ') => engine.toggle_play_pause().await,
                            KeyCode::Left => {
                                let progress = engine.progress().await;
                                engine.seek(progress.elapsed.saturating_sub(seek_step)).await;
                            }
                            KeyCode::Right => {
                                let progress = engine.progress().await;
                                // The engine clamps to the track duration
                                engine.seek(progress.elapsed + seek_step).await;
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => warn!("Input error: {e}"),
                    None => break,
                }
            }
        }
    }

    cancel.cancel();
    engine.shutdown().await;
    let _ = listener_handle.await;
    display.restore()?;
    Ok(())
}
