/// Cadence Player - terminal demo for the playback engine
mod catalog;
mod config;
mod device;
mod error;

use cadence_playback::{
    device_channel, Lyrics, LyricsUpdate, LyricsView, PlaybackEngine, PlaybackError,
    PlaybackEvent, PlaybackService, PlaybackSnapshot, PlaybackStatus, TrackId,
};
use clap::{Parser, Subcommand};
use crate::config::PlayerConfig;
use crate::device::SimulatedDevice;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence-player")]
#[command(about = "Cadence playback engine demo player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a catalog from start to end on the simulated device
    Play {
        /// JSON file with an array of tracks
        catalog: PathBuf,
        /// Queue index to start at
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// LRC lyrics for the starting track
        #[arg(short, long)]
        lyrics: Option<PathBuf>,
    },
    /// Show the lyric line active at a position
    Lyrics {
        /// LRC file
        file: PathBuf,
        /// Position in seconds
        #[arg(long)]
        at: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_player=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            catalog,
            start,
            config,
            lyrics,
        } => {
            play(&catalog, start, config.as_deref(), lyrics.as_deref()).await?;
        }
        Commands::Lyrics { file, at } => {
            show_lyrics(&file, at)?;
        }
    }

    Ok(())
}

async fn play(
    catalog_path: &Path,
    start: usize,
    config_path: Option<&Path>,
    lyrics_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = PlayerConfig::load(config_path)?;
    config.validate()?;

    let tracks = catalog::load(catalog_path)?;
    let Some(first) = tracks.get(start).or_else(|| tracks.first()) else {
        anyhow::bail!("Catalog {} has no tracks", catalog_path.display());
    };
    tracing::info!("Loaded {} tracks from {}", tracks.len(), catalog_path.display());

    let mut lyrics_view = match lyrics_path {
        Some(path) => Some(LyricsView::new(first.id.clone(), read_lyrics(path)?)),
        None => None,
    };

    let (device_tx, device_rx) = device_channel();
    let device = SimulatedDevice::new(config.device.clone(), device_tx, &tracks);
    let engine = PlaybackEngine::new(config.engine.clone(), Box::new(device));
    let (handle, task) = PlaybackService::spawn(engine, device_rx);
    let mut events = handle.subscribe();

    handle.play_queue(tracks, start)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_shown: Option<(PlaybackStatus, Option<TrackId>)> = None;

    loop {
        let event = tokio::select! {
            received = events.recv() => received,
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        };

        let event = match event {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {} playback notifications", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if let Some(view) = lyrics_view.as_mut() {
            match view.on_event(&event) {
                Some(LyricsUpdate::Line(Some(_))) => {
                    if let Some(line) = view.active_line() {
                        tracing::info!("♪ {}", line.text);
                    }
                }
                Some(LyricsUpdate::TrackChanged) => {
                    tracing::debug!("Lyrics no longer match the current track");
                }
                Some(LyricsUpdate::Line(None)) | None => {}
            }
        }

        match event {
            PlaybackEvent::StateChanged(snapshot) => {
                let shown = (
                    snapshot.state.status,
                    snapshot.state.current_track_id().cloned(),
                );
                if last_shown.as_ref() != Some(&shown) {
                    report(&snapshot);
                    last_shown = Some(shown);
                }
                if snapshot.state.status == PlaybackStatus::Ended {
                    tracing::info!("Reached the end of the queue");
                    break;
                }
            }
            PlaybackEvent::Error { track_id, message } => {
                tracing::warn!(?track_id, "Playback error: {}", message);
                // Skip what cannot be played
                handle.next()?;
            }
        }
    }

    match handle.shutdown() {
        Ok(()) | Err(PlaybackError::ServiceClosed) => {}
        Err(err) => return Err(err.into()),
    }
    task.await?;

    Ok(())
}

fn report(snapshot: &PlaybackSnapshot) {
    let state = &snapshot.state;
    match &state.current_track {
        Some(track) => tracing::info!(
            status = ?state.status,
            index = ?snapshot.queue.current_index,
            "{} - {} ({:.1}s)",
            track.artist,
            track.title,
            state.position
        ),
        None => tracing::info!(status = ?state.status, "No track"),
    }
}

fn read_lyrics(path: &Path) -> anyhow::Result<Lyrics> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(Lyrics::parse_lrc(&text))
}

fn show_lyrics(path: &Path, at: f64) -> anyhow::Result<()> {
    let lyrics = read_lyrics(path)?;
    println!("{} timed lines", lyrics.lines().len());

    match lyrics.line_index_at(at).and_then(|index| lyrics.line(index)) {
        Some(line) => println!("[{:.2}s] {}", line.time, line.text),
        None => println!("No line active at {:.2}s", at),
    }

    Ok(())
}
