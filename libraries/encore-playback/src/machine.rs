//! Playback state machine
//!
//! [`reduce`] is a pure function from the current state and one input to the
//! next state plus a list of [`Effect`]s for the controller to execute. All
//! transport rules live here; the controller only runs effects.
//!
//! ```text
//! Idle ─select─▶ Loading ─ready─▶ Playing ⇄ Paused
//!                  │  ▲              │
//!                error retry       ended ─▶ Loading (next) | Ended
//!                  ▼  │              │
//!                 Errored ◀──error───┘
//! ```

use crate::engine::{EngineEvent, LoadRequest, LoadToken};
use crate::queue;
use crate::shuffle::{build_queue, reshuffle_around};
use crate::types::{PlaybackConfig, PlaybackState, PlaybackStatus, RepeatMode};
use crate::volume;
use encore_audio::effects::EffectSettings;
use encore_core::{Track, TrackId};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// User (or OS media control) intent
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play this track now
    SelectTrack(Track),
    /// Replace the queue with `tracks` and play `tracks[index]`
    PlayFrom { tracks: Vec<Track>, index: usize },
    TogglePlay,
    Play,
    Pause,
    /// Release the output and return to `Idle`
    Stop,
    /// Seek to an absolute position in seconds
    Seek(f64),
    SkipNext,
    SkipPrevious,
    ToggleShuffle,
    CycleRepeat,
    /// Slider value in [0, 1]
    SetVolume(f32),
    ToggleMute,
    SetEq { bass_db: f32, mid_db: f32, treble_db: f32 },
    /// Reverb wet mix in [0, 1]
    SetReverb(f32),
    /// Master trim in dB
    SetMasterGain(f32),
    /// Reload the current track after an error
    Retry,
}

/// Any input to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Engine(EngineEvent),
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<EngineEvent> for Event {
    fn from(event: EngineEvent) -> Self {
        Self::Engine(event)
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Load(LoadRequest),
    Play,
    Pause,
    Seek { seconds: f64, epoch: u64 },
    /// Linear output gain
    SetVolume(f32),
    SetEffects(EffectSettings),
    Release,
    IncrementPlayCount(TrackId),
}

/// Result of one reduction
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: PlaybackState,
    pub effects: Vec<Effect>,
}

/// Apply one event to `state`
pub fn reduce<R: Rng + ?Sized>(
    state: &PlaybackState,
    event: Event,
    config: &PlaybackConfig,
    rng: &mut R,
) -> Transition {
    let mut machine = Machine {
        state: state.clone(),
        config,
        effects: Vec::new(),
    };

    match event {
        Event::Command(command) => machine.command(command, rng),
        Event::Engine(event) => machine.engine(event),
    }

    Transition {
        state: machine.state,
        effects: machine.effects,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    User,
    AutoAdvance,
}

struct Machine<'c> {
    state: PlaybackState,
    config: &'c PlaybackConfig,
    effects: Vec<Effect>,
}

impl Machine<'_> {
    fn command<R: Rng + ?Sized>(&mut self, command: Command, rng: &mut R) {
        match command {
            Command::SelectTrack(track) => self.select(track),
            Command::PlayFrom { tracks, index } => self.play_from(tracks, index, rng),
            Command::TogglePlay => match self.state.status {
                PlaybackStatus::Playing => self.pause(),
                PlaybackStatus::Paused => self.resume(),
                PlaybackStatus::Ended => self.restart(),
                status => debug!("Toggle ignored while {:?}", status),
            },
            Command::Play => match self.state.status {
                PlaybackStatus::Paused => self.resume(),
                PlaybackStatus::Ended => self.restart(),
                _ => {}
            },
            Command::Pause => {
                if self.state.status == PlaybackStatus::Playing {
                    self.pause();
                }
            }
            Command::Stop => self.stop(),
            Command::Seek(seconds) => self.seek(seconds),
            Command::SkipNext => self.skip_next(),
            Command::SkipPrevious => self.skip_previous(),
            Command::ToggleShuffle => self.toggle_shuffle(rng),
            Command::CycleRepeat => {
                self.state.repeat_mode = self.state.repeat_mode.cycle();
                debug!("Repeat mode: {:?}", self.state.repeat_mode);
            }
            Command::SetVolume(level) => {
                if level.is_nan() {
                    return;
                }
                self.state.volume = volume::clamp_level(level);
                self.forward_volume();
            }
            Command::ToggleMute => {
                self.state.muted = !self.state.muted;
                self.forward_volume();
            }
            Command::SetEq {
                bass_db,
                mid_db,
                treble_db,
            } => {
                self.state.effects = self.state.effects.with_eq(bass_db, mid_db, treble_db);
                self.forward_effects();
            }
            Command::SetReverb(wet) => {
                self.state.effects = EffectSettings {
                    reverb_wet: wet,
                    ..self.state.effects
                }
                .clamped();
                self.forward_effects();
            }
            Command::SetMasterGain(db) => {
                self.state.effects = EffectSettings {
                    master_gain_db: db,
                    ..self.state.effects
                }
                .clamped();
                self.forward_effects();
            }
            Command::Retry => {
                if self.state.status == PlaybackStatus::Errored {
                    self.restart();
                }
            }
        }
    }

    fn engine(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready {
                token,
                duration_seconds,
            } => {
                if self.state.in_flight.as_ref() != Some(&token) {
                    debug!("Discarding stale ready for load {}", token);
                    return;
                }
                self.ready(token, duration_seconds);
            }
            EngineEvent::PositionTick {
                token,
                epoch,
                seconds,
            } => {
                if self.state.loaded.as_ref() != Some(&token) {
                    debug!("Discarding stale tick for load {}", token);
                    return;
                }
                self.tick(epoch, seconds);
            }
            EngineEvent::Ended { token } => {
                if self.state.loaded.as_ref() != Some(&token) {
                    debug!("Discarding stale end for load {}", token);
                    return;
                }
                self.track_finished();
            }
            EngineEvent::Error { token, error } => {
                let current = self.state.in_flight.as_ref() == Some(&token)
                    || self.state.loaded.as_ref() == Some(&token);
                if !current {
                    debug!("Discarding stale error for load {}: {}", token, error);
                    return;
                }
                warn!("Load {} failed: {}", token, error);
                self.fail(error.to_string());
            }
            EngineEvent::EffectsUnavailable { reason } => {
                warn!("Effects unavailable, using pass-through: {}", reason);
                self.state.effects_available = false;
            }
        }
    }

    // ===== Track selection =====

    fn select(&mut self, track: Track) {
        if let Some(outgoing) = self.state.current_track.take() {
            if outgoing.id != track.id {
                self.state.history.push(outgoing);
            }
        }

        if !self.state.queue.iter().any(|t| t.id == track.id) {
            self.state.queue.push(track.clone());
            self.state.source_order.push(track.clone());
        }

        self.begin_load(track, Origin::User);
    }

    fn play_from<R: Rng + ?Sized>(&mut self, mut tracks: Vec<Track>, index: usize, rng: &mut R) {
        let Some(selected) = tracks.get(index).cloned() else {
            warn!("Play-from index {} out of range ({} tracks)", index, tracks.len());
            return;
        };

        // Queue positions are resolved by id, so each id appears once
        let total = tracks.len();
        let mut seen = HashSet::with_capacity(total);
        tracks.retain(|t| seen.insert(t.id.clone()));
        if tracks.len() < total {
            debug!("Dropped {} duplicate entries from play-from", total - tracks.len());
        }

        self.state.queue = if self.state.shuffle_enabled {
            reshuffle_around(&selected, &tracks, rng)
        } else {
            tracks.clone()
        };
        self.state.source_order = tracks;
        self.select(selected);
    }

    fn restart(&mut self) {
        if let Some(track) = self.state.current_track.clone() {
            self.begin_load(track, Origin::User);
        }
    }

    fn begin_load(&mut self, track: Track, origin: Origin) {
        if origin == Origin::User {
            self.reset_breaker();
        }

        self.state.history.drop_tail_matching(&track.id);
        self.state.current_track = Some(track.clone());
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = track
            .duration_seconds
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);
        self.state.error = None;
        self.state.advancing = origin == Origin::AutoAdvance;

        if let Err(err) = track.validate() {
            warn!("Refusing to load {}: {}", track.id, err);
            self.fail(err.to_string());
            return;
        }

        self.state.load_generation += 1;
        let token = LoadToken::new(self.state.load_generation, track.id.clone());
        info!("Loading {} ({:?})", token, origin);

        // The engine releases the previous handle as part of `load`
        self.state.loaded = None;
        self.state.in_flight = Some(token.clone());
        self.state.status = PlaybackStatus::Loading;

        self.effects.push(Effect::Load(LoadRequest {
            token,
            track,
            volume: self.state.volume,
            muted: self.state.muted,
            effects: self.state.effects,
        }));
    }

    // ===== Engine lifecycle =====

    fn ready(&mut self, token: LoadToken, duration_seconds: f64) {
        if duration_seconds.is_finite() && duration_seconds > 0.0 {
            self.state.duration_seconds = duration_seconds;
        }
        self.state.in_flight = None;
        self.state.loaded = Some(token.clone());
        self.state.status = PlaybackStatus::Playing;
        self.state.position_seconds = 0.0;
        self.state.advancing = false;
        self.state.error = None;
        self.reset_breaker();

        self.effects.push(Effect::Play);
        self.effects.push(Effect::IncrementPlayCount(token.track_id));
    }

    fn tick(&mut self, epoch: u64, seconds: f64) {
        if !self.state.status.is_active() || !seconds.is_finite() {
            return;
        }
        if epoch < self.state.seek_epoch {
            debug!("Discarding tick from epoch {} (now {})", epoch, self.state.seek_epoch);
            return;
        }
        let seconds = self.clamp_position(seconds);
        self.state.position_seconds = self.state.position_seconds.max(seconds);
    }

    fn track_finished(&mut self) {
        let Some(current) = self.state.current_track.clone() else {
            return;
        };

        let upcoming = queue::next(
            &current,
            &self.state.queue,
            self.state.repeat_mode,
            &mut self.state.history,
        );
        match upcoming {
            Some(track) => self.begin_load(track, Origin::AutoAdvance),
            None => self.finish_queue(),
        }
    }

    fn finish_queue(&mut self) {
        info!("Queue finished");
        self.release_handle();
        self.state.status = PlaybackStatus::Ended;
        self.state.position_seconds = self.state.duration_seconds;
        self.state.advancing = false;
    }

    fn fail(&mut self, reason: String) {
        let advancing = self.state.advancing;
        self.release_handle();
        self.state.status = PlaybackStatus::Errored;
        self.state.error = Some(reason);
        self.state.advancing = false;

        let Some(failed) = self.state.current_track.clone() else {
            return;
        };

        let seen_before = self.state.consecutive_failures.contains(&failed.id);
        if !seen_before {
            self.state.consecutive_failures.push(failed.id.clone());
        }

        if !advancing {
            return;
        }

        // Coming back around to a track that already failed means every
        // reachable track is broken.
        if seen_before || self.state.consecutive_failures.len() >= self.config.max_consecutive_failures {
            warn!(
                "{} consecutive load failures, stopping auto-advance",
                self.state.consecutive_failures.len()
            );
            self.state.playback_unavailable = true;
            return;
        }

        let wrap = self.state.repeat_mode != RepeatMode::None;
        match queue::following(&failed, &self.state.queue, wrap) {
            Some(track) if track.id != failed.id => {
                info!("Skipping failed track {}", failed.id);
                self.begin_load(track, Origin::AutoAdvance);
            }
            _ => {}
        }
    }

    // ===== Transport =====

    fn pause(&mut self) {
        self.state.status = PlaybackStatus::Paused;
        self.effects.push(Effect::Pause);
    }

    fn resume(&mut self) {
        self.state.status = PlaybackStatus::Playing;
        self.effects.push(Effect::Play);
    }

    fn stop(&mut self) {
        if self.state.current_track.is_none() && !self.state.has_handle() {
            return;
        }
        self.release_handle();
        self.state.current_track = None;
        self.state.status = PlaybackStatus::Idle;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = 0.0;
        self.state.error = None;
        self.state.advancing = false;
    }

    fn seek(&mut self, seconds: f64) {
        if !self.state.status.is_active() || !seconds.is_finite() {
            return;
        }
        let seconds = self.clamp_position(seconds);
        self.state.seek_epoch += 1;
        self.state.position_seconds = seconds;
        self.effects.push(Effect::Seek {
            seconds,
            epoch: self.state.seek_epoch,
        });
    }

    fn skip_next(&mut self) {
        let Some(current) = self.state.current_track.clone() else {
            return;
        };

        let upcoming = queue::skip_next(
            &current,
            &self.state.queue,
            self.state.repeat_mode,
            &mut self.state.history,
        );
        match upcoming {
            Some(track) => self.begin_load(track, Origin::User),
            None => self.finish_queue(),
        }
    }

    fn skip_previous(&mut self) {
        if let Some(track) = queue::previous(&mut self.state.history) {
            self.begin_load(track, Origin::User);
        }
    }

    fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state.shuffle_enabled = !self.state.shuffle_enabled;

        self.state.queue = if self.state.shuffle_enabled {
            match &self.state.current_track {
                Some(current) => reshuffle_around(current, &self.state.source_order, rng),
                None => build_queue(&self.state.source_order, true, rng),
            }
        } else {
            self.state.source_order.clone()
        };
    }

    // ===== Helpers =====

    fn forward_volume(&mut self) {
        if self.state.has_handle() {
            self.effects.push(Effect::SetVolume(self.state.output_gain()));
        }
    }

    fn forward_effects(&mut self) {
        if self.state.has_handle() {
            self.effects.push(Effect::SetEffects(self.state.effects));
        }
    }

    fn release_handle(&mut self) {
        if self.state.has_handle() {
            self.effects.push(Effect::Release);
        }
        self.state.in_flight = None;
        self.state.loaded = None;
    }

    fn reset_breaker(&mut self) {
        self.state.consecutive_failures.clear();
        self.state.playback_unavailable = false;
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        let seconds = seconds.max(0.0);
        if self.state.duration_seconds > 0.0 {
            seconds.min(self.state.duration_seconds)
        } else {
            seconds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaLoadError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), "Artist", format!("https://cdn.test/{}.mp3", id))
            .with_duration(180.0)
    }

    struct Harness {
        state: PlaybackState,
        config: PlaybackConfig,
        rng: StdRng,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: PlaybackState::default(),
                config: PlaybackConfig::default(),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn send(&mut self, event: impl Into<Event>) -> Vec<Effect> {
            let transition = reduce(&self.state, event.into(), &self.config, &mut self.rng);
            self.state = transition.state;
            transition.effects
        }

        fn in_flight(&self) -> LoadToken {
            self.state.in_flight.clone().unwrap()
        }

        fn loaded(&self) -> LoadToken {
            self.state.loaded.clone().unwrap()
        }

        fn ready(&mut self) -> Vec<Effect> {
            let token = self.in_flight();
            self.send(EngineEvent::Ready {
                token,
                duration_seconds: 200.0,
            })
        }
    }

    #[test]
    fn select_emits_load_and_ready_autoplays() {
        let mut h = Harness::new();
        let effects = h.send(Command::SelectTrack(track("a")));

        assert_eq!(h.state.status, PlaybackStatus::Loading);
        assert!(matches!(&effects[..], [Effect::Load(req)] if req.track.id.as_str() == "a"));

        let effects = h.ready();
        assert_eq!(h.state.status, PlaybackStatus::Playing);
        assert_eq!(h.state.duration_seconds, 200.0);
        assert_eq!(
            effects,
            vec![Effect::Play, Effect::IncrementPlayCount(TrackId::from("a"))]
        );
    }

    #[test]
    fn toggle_play_is_noop_while_loading() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        let effects = h.send(Command::TogglePlay);
        assert!(effects.is_empty());
        assert_eq!(h.state.status, PlaybackStatus::Loading);
    }

    #[test]
    fn toggle_play_pauses_and_resumes() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        h.ready();

        assert_eq!(h.send(Command::TogglePlay), vec![Effect::Pause]);
        assert_eq!(h.state.status, PlaybackStatus::Paused);
        assert_eq!(h.send(Command::TogglePlay), vec![Effect::Play]);
        assert_eq!(h.state.status, PlaybackStatus::Playing);
    }

    #[test]
    fn stale_ready_is_discarded() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        let stale = h.in_flight();
        h.send(Command::SelectTrack(track("b")));

        let effects = h.send(EngineEvent::Ready {
            token: stale,
            duration_seconds: 10.0,
        });
        assert!(effects.is_empty());
        assert_eq!(h.state.status, PlaybackStatus::Loading);
        assert_eq!(h.state.current_id().unwrap().as_str(), "b");
    }

    #[test]
    fn seek_clamps_and_bumps_epoch() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        h.ready();

        let effects = h.send(Command::Seek(999.0));
        assert_eq!(h.state.position_seconds, 200.0);
        assert_eq!(
            effects,
            vec![Effect::Seek {
                seconds: 200.0,
                epoch: 1
            }]
        );

        h.send(Command::Seek(-5.0));
        assert_eq!(h.state.position_seconds, 0.0);
        assert_eq!(h.state.seek_epoch, 2);
    }

    #[test]
    fn seek_ignored_when_not_active() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        assert!(h.send(Command::Seek(10.0)).is_empty());
        assert_eq!(h.state.seek_epoch, 0);
    }

    #[test]
    fn ticks_from_before_seek_are_dropped() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        h.ready();
        let token = h.loaded();

        h.send(Command::Seek(30.0));
        h.send(EngineEvent::PositionTick {
            token: token.clone(),
            epoch: 0,
            seconds: 95.0,
        });
        assert_eq!(h.state.position_seconds, 30.0);

        h.send(EngineEvent::PositionTick {
            token: token.clone(),
            epoch: 1,
            seconds: 30.5,
        });
        assert_eq!(h.state.position_seconds, 30.5);

        // Monotonic within an epoch
        h.send(EngineEvent::PositionTick {
            token,
            epoch: 1,
            seconds: 30.2,
        });
        assert_eq!(h.state.position_seconds, 30.5);
    }

    #[test]
    fn volume_is_stored_then_carried_by_next_load() {
        let mut h = Harness::new();
        assert!(h.send(Command::SetVolume(0.5)).is_empty());
        assert!(h.send(Command::ToggleMute).is_empty());

        let effects = h.send(Command::SelectTrack(track("a")));
        let Effect::Load(request) = &effects[0] else {
            panic!("expected load");
        };
        assert_eq!(request.volume, 0.5);
        assert!(request.muted);
        assert_eq!(request.output_gain(), 0.0);
    }

    #[test]
    fn effects_forwarded_when_loaded() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        h.ready();

        let effects = h.send(Command::SetEq {
            bass_db: 30.0,
            mid_db: 0.0,
            treble_db: -3.0,
        });
        assert_eq!(h.state.effects.bass_gain_db, 15.0);
        assert_eq!(effects, vec![Effect::SetEffects(h.state.effects)]);

        let effects = h.send(Command::SetVolume(1.0));
        assert_eq!(effects, vec![Effect::SetVolume(1.0)]);
    }

    #[test]
    fn user_load_failure_stays_errored_and_retries() {
        let mut h = Harness::new();
        h.send(Command::PlayFrom {
            tracks: vec![track("a"), track("b")],
            index: 0,
        });
        let token = h.in_flight();

        let effects = h.send(EngineEvent::Error {
            token,
            error: MediaLoadError::Unreachable("dns".into()),
        });
        assert_eq!(effects, vec![Effect::Release]);
        assert_eq!(h.state.status, PlaybackStatus::Errored);
        assert_eq!(h.state.current_id().unwrap().as_str(), "a");
        assert!(h.state.error.as_deref().unwrap_or_default().contains("dns"));

        let effects = h.send(Command::Retry);
        assert!(matches!(&effects[..], [Effect::Load(req)] if req.track.id.as_str() == "a"));
        assert_eq!(h.state.status, PlaybackStatus::Loading);
    }

    #[test]
    fn invalid_track_errors_without_loading() {
        let mut h = Harness::new();
        let broken = Track::new("x", "Broken", "Artist", "");
        let effects = h.send(Command::SelectTrack(broken));
        assert!(effects.is_empty());
        assert_eq!(h.state.status, PlaybackStatus::Errored);
        assert!(h.state.in_flight.is_none());
    }

    #[test]
    fn stop_releases_and_idles() {
        let mut h = Harness::new();
        h.send(Command::SelectTrack(track("a")));
        h.ready();

        assert_eq!(h.send(Command::Stop), vec![Effect::Release]);
        assert_eq!(h.state.status, PlaybackStatus::Idle);
        assert!(h.state.current_track.is_none());
        assert_eq!(h.state.queue.len(), 1);
    }

    #[test]
    fn effects_unavailable_is_recorded() {
        let mut h = Harness::new();
        h.send(EngineEvent::EffectsUnavailable {
            reason: "unsupported rate".into(),
        });
        assert!(!h.state.effects_available);
    }
}
