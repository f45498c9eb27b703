//! Terminal output: the now-playing surface, status lines and the play log

use encore_core::{TrackCatalog, TrackId};
use encore_playback::{
    MediaMetadata, MediaPlayback, MediaSurface, PlaybackState, PlaybackStatus, RepeatMode,
};
use std::fmt::Write as _;
use tracing::info;

/// Media surface that announces track and transport changes on stdout
#[derive(Debug, Default)]
pub struct TerminalSurface {
    now_playing: Option<String>,
}

impl MediaSurface for TerminalSurface {
    fn set_metadata(&mut self, metadata: Option<&MediaMetadata>) {
        self.now_playing = metadata.map(|m| match &m.album {
            Some(album) => format!("{} - {} ({})", m.artist, m.title, album),
            None => format!("{} - {}", m.artist, m.title),
        });
        if let Some(line) = &self.now_playing {
            println!("♪ {}", line);
        }
    }

    fn set_playback(&mut self, playback: MediaPlayback) {
        let label = match playback {
            MediaPlayback::Playing => "playing",
            MediaPlayback::Paused => "paused",
            MediaPlayback::Stopped => "stopped",
        };
        println!("[{}]", label);
    }
}

/// Play counts go to the log; there is no catalog service behind the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCatalog;

impl TrackCatalog for LogCatalog {
    fn increment_play_count(&self, track_id: &TrackId) {
        info!("Play recorded for {}", track_id);
    }
}

/// `m:ss`, or `h:mm:ss` past an hour
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// One-shot status report for the `status` command
pub fn status_report(state: &PlaybackState) -> String {
    let mut out = String::new();

    let status = match state.status {
        PlaybackStatus::Idle => "idle",
        PlaybackStatus::Loading => "loading",
        PlaybackStatus::Playing => "playing",
        PlaybackStatus::Paused => "paused",
        PlaybackStatus::Ended => "ended",
        PlaybackStatus::Errored => "error",
    };
    match &state.current_track {
        Some(track) => {
            let _ = writeln!(
                out,
                "{} - {} [{}] {} / {}",
                track.artist,
                track.title,
                status,
                format_clock(state.position_seconds),
                format_clock(state.duration_seconds)
            );
        }
        None => {
            let _ = writeln!(out, "Nothing loaded [{}]", status);
        }
    }

    let repeat = match state.repeat_mode {
        RepeatMode::None => "off",
        RepeatMode::One => "one",
        RepeatMode::All => "all",
    };
    let _ = writeln!(
        out,
        "volume {:.0}%{}  shuffle {}  repeat {}",
        state.volume * 100.0,
        if state.muted { " (muted)" } else { "" },
        if state.shuffle_enabled { "on" } else { "off" },
        repeat
    );

    if state.effects_available {
        let fx = &state.effects;
        let _ = writeln!(
            out,
            "eq {:+.1}/{:+.1}/{:+.1} dB  reverb {:.0}%  gain {:+.1} dB",
            fx.bass_gain_db,
            fx.mid_gain_db,
            fx.treble_gain_db,
            fx.reverb_wet * 100.0,
            fx.master_gain_db
        );
    } else {
        let _ = writeln!(out, "effects unavailable on this device");
    }

    if state.playback_unavailable {
        let _ = writeln!(out, "playback stopped after repeated failures");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {}", error);
    }

    out.trim_end().to_string()
}

/// Queue listing with the current track marked
pub fn queue_report(state: &PlaybackState) -> String {
    if state.queue.is_empty() {
        return "Queue is empty".to_string();
    }
    let current = state.current_id();
    state
        .queue
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if Some(&track.id) == current { '>' } else { ' ' };
            format!("{} {:>3}. {} - {}", marker, i + 1, track.artist, track.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::Track;
    use encore_playback::PlaybackConfig;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(3725.0), "1:02:05");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(-3.0), "0:00");
    }

    #[test]
    fn status_of_fresh_state() {
        let state = PlaybackState::new(&PlaybackConfig::default());
        let report = status_report(&state);
        assert!(report.starts_with("Nothing loaded [idle]"));
        assert!(report.contains("volume 80%"));
        assert!(report.contains("repeat off"));
    }

    #[test]
    fn queue_marks_current_track() {
        let mut state = PlaybackState::new(&PlaybackConfig::default());
        let a = Track::new("a", "First", "X", "/a.mp3");
        let b = Track::new("b", "Second", "Y", "/b.mp3");
        state.queue = vec![a, b.clone()];
        state.current_track = Some(b);

        let report = queue_report(&state);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "    1. X - First");
        assert_eq!(lines[1], ">   2. Y - Second");
    }
}
