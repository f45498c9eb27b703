/// Encore CLI - terminal music player on the Encore playback engine
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use encore_audio_desktop::DesktopEngine;
use encore_playback::PlaybackController;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod library;
mod terminal;

use crate::commands::Input;
use crate::config::CliConfig;
use crate::terminal::{LogCatalog, TerminalSurface};

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore terminal music player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./encore.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shuffle seed, overrides the configured one
    #[arg(long)]
    seed: Option<u64>,

    /// Start with shuffle enabled
    #[arg(long)]
    shuffle: bool,

    /// Tracks to queue: stream URLs, file paths or JSON playlists
    tracks: Vec<String>,
}

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=info,encore_playback=info,encore_audio_desktop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let (engine, events) =
        DesktopEngine::new(&config.playback).context("Failed to open audio output")?;
    info!("Audio output running at {} Hz", engine.sample_rate());
    if engine.effects_passthrough() {
        warn!("Effects are unavailable at this sample rate; playing unprocessed");
    }

    let mut player = PlaybackController::new(
        Box::new(engine),
        events,
        Box::new(LogCatalog),
        config.playback.clone(),
    );
    if let Some(seed) = cli.seed.or(config.session.shuffle_seed) {
        player = player.with_seed(seed);
    }
    if config.session.announce {
        player.attach_media_session(Box::new(TerminalSurface::default()));
    }

    let tracks = library::resolve(&cli.tracks)?;
    if !tracks.is_empty() {
        player.play_from(tracks, 0)?;
    }
    if cli.shuffle {
        player.toggle_shuffle();
    }

    let input = spawn_stdin_reader()?;
    let poll = Duration::from_millis(config.session.poll_interval_ms);
    println!("Type 'help' for commands");

    loop {
        loop {
            match input.try_recv() {
                Ok(line) => {
                    if let Flow::Quit = handle_line(&mut player, &line) {
                        player.stop();
                        return Ok(());
                    }
                }
                Err(TryRecvError::Empty) => break,
                // stdin closed
                Err(TryRecvError::Disconnected) => {
                    player.stop();
                    return Ok(());
                }
            }
        }

        player.wait_for_event(poll)?;
    }
}

/// Lines from stdin, read on their own thread so the event loop never blocks on input
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    std::thread::Builder::new()
        .name("encore-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(rx)
}

fn handle_line(player: &mut PlaybackController, line: &str) -> Flow {
    match commands::parse(line) {
        Ok(Some(input)) => execute(player, input),
        Ok(None) => Flow::Continue,
        Err(e) => {
            println!("{}", e);
            Flow::Continue
        }
    }
}

fn execute(player: &mut PlaybackController, input: Input) -> Flow {
    match input {
        Input::Play(locations) => match library::resolve(&locations) {
            Ok(tracks) => {
                if let Err(e) = player.play_from(tracks, 0) {
                    println!("{}", e);
                }
            }
            Err(e) => println!("{:#}", e),
        },
        Input::Open(location) => player.select_track(library::track_from_location(&location)),
        Input::Toggle => player.toggle_play(),
        Input::Resume => player.play(),
        Input::Pause => player.pause(),
        Input::Stop => player.stop(),
        Input::Next => player.skip_next(),
        Input::Previous => player.skip_previous(),
        Input::Seek(seconds) => player.seek(seconds),
        Input::Volume(level) => player.set_volume(level),
        Input::Mute => player.toggle_mute(),
        Input::Shuffle => player.toggle_shuffle(),
        Input::Repeat => player.cycle_repeat(),
        Input::Eq {
            bass_db,
            mid_db,
            treble_db,
        } => player.set_eq(bass_db, mid_db, treble_db),
        Input::Reverb(wet) => player.set_reverb(wet),
        Input::Gain(db) => player.set_master_gain(db),
        Input::Retry => player.retry(),
        Input::Status => println!("{}", terminal::status_report(&player.snapshot())),
        Input::Queue => println!("{}", terminal::queue_report(&player.snapshot())),
        Input::Help => println!("{}", commands::HELP),
        Input::Quit => return Flow::Quit,
    }
    Flow::Continue
}
