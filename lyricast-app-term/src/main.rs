mod display;
mod viewer;

use clap::{Parser, Subcommand};
use lyricast_client::{CatalogClient, SongSummary, UploadRequest};
use lyricast_core::{format_timestamp, Config, CoreError};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "lyricast", version, about = "Synchronized lyric display client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List songs available on the server
    List,
    /// Show one song's stored timecodes
    Show { song_id: String },
    /// Upload a song file for processing
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        bpm: Option<f64>,
        #[arg(long)]
        measures_per_section: Option<u32>,
        #[arg(long)]
        beats_per_measure: Option<u32>,
    },
    /// Delete a song from the server
    Delete { song_id: String },
    /// Submit a video URL for asynchronous ingestion
    Ingest {
        url: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Request playback of a song and run the viewer
    Play { song_id: String },
    /// Attach to the server and wait for playback pushes
    Watch,
}

fn init_tracing() {
    // Log to stderr so the viewer's alternate screen stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            eprintln!(
                "A config template was created at {}.\nEdit it with your server address and run again.",
                path.display()
            );
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::List => {
            let catalog = CatalogClient::new(&config.server)?;
            print_song_list(&catalog.list_songs().await?);
        }
        Command::Show { song_id } => {
            let catalog = CatalogClient::new(&config.server)?;
            let details = catalog.song_details(&song_id).await?;
            println!("{} ({})", details.title, details.id);
            if !details.processed {
                println!("  still processing, no timecodes yet");
            }
            for wire in details.timecodes {
                let cue = lyricast_core::Cue::from(wire);
                println!("  {}  {}", format_timestamp(cue.time), cue.text);
            }
        }
        Command::Upload {
            file,
            title,
            bpm,
            measures_per_section,
            beats_per_measure,
        } => {
            let catalog = CatalogClient::new(&config.server)?;
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map_or_else(|| "upload.bin".to_string(), |name| name.to_string_lossy().into_owned());

            let receipt = catalog
                .upload_song(UploadRequest {
                    file_name,
                    bytes,
                    title,
                    bpm,
                    measures_per_section,
                    beats_per_measure,
                })
                .await?;
            println!("Upload successful: {} (ID: {})", receipt.title, receipt.song_id);
        }
        Command::Delete { song_id } => {
            let catalog = CatalogClient::new(&config.server)?;
            catalog.delete_song(&song_id).await?;
            println!("Deleted {song_id}");
            print_song_list(&catalog.list_songs().await?);
        }
        Command::Ingest { url, title } => {
            let catalog = CatalogClient::new(&config.server)?;
            let receipt = catalog
                .submit_external_source(&url, title.as_deref())
                .await?;
            println!(
                "Processing initiated for {} (ID: {}). This may take a few minutes.",
                receipt.source_url, receipt.song_id
            );

            // Completion is not pushed; re-poll the list once after a delay
            tokio::time::sleep(config.server.ingest_poll_delay()).await;
            print_song_list(&catalog.list_songs().await?);
        }
        Command::Play { song_id } => viewer::run(config, Some(&song_id)).await?,
        Command::Watch => viewer::run(config, None).await?,
    }

    Ok(())
}

fn print_song_list(songs: &[SongSummary]) {
    if songs.is_empty() {
        println!("No songs uploaded yet.");
        return;
    }
    for song in songs {
        let status = if song.processed { "ready" } else { "processing" };
        match song.bpm {
            Some(bpm) => println!("{}  {} ({status}, {bpm} bpm)", song.id, song.title),
            None => println!("{}  {} ({status})", song.id, song.title),
        }
    }
}
