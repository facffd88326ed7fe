// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time drivers for clips.
//!
//! A [`Playback`] owns a time cursor for one clip and moves it by wall-clock
//! deltas; [`PlaybackSet`] advances many of them and pushes the result into
//! a [`ClipLibrary`].

use crate::keyframe::Millis;
use crate::library::ClipLibrary;
use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
    /// Playing in reverse
    Reverse,
}

/// What happens when the cursor runs off either end of the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// Stop at the end
    Once,
    /// Jump back to the other end
    #[default]
    Repeat,
    /// Bounce between both ends
    PingPong,
}

/// Playback cursor for a single clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playback {
    /// Name of the driven clip
    pub clip: String,
    /// Current time in milliseconds
    pub time: Millis,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f32,
    /// End-of-clip behavior
    pub mode: LoopMode,
}

impl Playback {
    /// Create a stopped cursor at time zero
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            time: 0,
            state: PlaybackState::Stopped,
            speed: 1.0,
            mode: LoopMode::default(),
        }
    }

    /// Set the loop mode
    pub fn with_mode(mut self, mode: LoopMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the speed multiplier
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Move the cursor by `delta_ms` scaled by speed, wrapping against a
    /// clip of `duration` milliseconds. Returns the new time.
    pub fn advance(&mut self, delta_ms: Millis, duration: Millis) -> Millis {
        let step = (delta_ms as f32 * self.speed.max(0.0)).round() as Millis;
        match self.state {
            PlaybackState::Playing | PlaybackState::Reverse if duration <= 0 => {
                self.time = 0;
                if self.mode == LoopMode::Once {
                    self.state = PlaybackState::Stopped;
                }
            }
            PlaybackState::Playing | PlaybackState::Reverse if self.mode == LoopMode::PingPong => {
                self.bounce(step, duration);
            }
            PlaybackState::Playing => {
                self.time = self.time.saturating_add(step);
                self.check_bounds(duration);
            }
            PlaybackState::Reverse => {
                self.time = self.time.saturating_sub(step);
                self.check_bounds_reverse(duration);
            }
            PlaybackState::Paused | PlaybackState::Stopped => {}
        }
        self.time
    }

    fn check_bounds(&mut self, duration: Millis) {
        if self.time >= duration {
            match self.mode {
                LoopMode::Once => {
                    self.time = duration;
                    self.state = PlaybackState::Stopped;
                }
                _ => self.time = self.time.rem_euclid(duration),
            }
        }
    }

    fn check_bounds_reverse(&mut self, duration: Millis) {
        if self.time <= 0 {
            match self.mode {
                LoopMode::Once => {
                    self.time = 0;
                    self.state = PlaybackState::Stopped;
                }
                _ => self.time = self.time.rem_euclid(duration),
            }
        }
    }

    // Unfold the cursor onto a forward phase over [0, 2 * duration)
    fn bounce(&mut self, step: Millis, duration: Millis) {
        let period = i64::from(duration) * 2;
        let time = i64::from(self.time).clamp(0, i64::from(duration));
        let phase = match self.state {
            PlaybackState::Reverse => period - time,
            _ => time,
        } + i64::from(step);

        let folded = phase.rem_euclid(period);
        if folded < i64::from(duration) {
            self.time = folded as Millis;
            self.state = PlaybackState::Playing;
        } else {
            self.time = (period - folded) as Millis;
            self.state = PlaybackState::Reverse;
        }
    }

    /// Play forward from the current position
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Play in reverse
    pub fn play_reverse(&mut self) {
        self.state = PlaybackState::Reverse;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0;
    }

    /// Toggle play/pause
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Reverse => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Seek to a specific time
    pub fn seek(&mut self, time: Millis) {
        self.time = time.max(0);
    }

    /// Is currently playing (forward or reverse)
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Reverse)
    }
}

/// A group of playbacks updated together
#[derive(Debug, Clone, Default)]
pub struct PlaybackSet {
    playbacks: Vec<Playback>,
}

impl PlaybackSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playback
    pub fn add(&mut self, playback: Playback) {
        self.playbacks.push(playback);
    }

    /// Remove every playback driving `clip`; returns how many were removed
    pub fn remove(&mut self, clip: &str) -> usize {
        let before = self.playbacks.len();
        self.playbacks.retain(|p| p.clip != clip);
        before - self.playbacks.len()
    }

    /// First playback driving `clip`
    pub fn get_mut(&mut self, clip: &str) -> Option<&mut Playback> {
        self.playbacks.iter_mut().find(|p| p.clip == clip)
    }

    /// All playbacks
    pub fn iter(&self) -> impl Iterator<Item = &Playback> {
        self.playbacks.iter()
    }

    /// Number of playbacks
    pub fn len(&self) -> usize {
        self.playbacks.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.playbacks.is_empty()
    }

    /// Advance every playback and evaluate its clip at the new time
    pub fn update(&mut self, delta_ms: Millis, clips: &mut ClipLibrary) {
        for playback in &mut self.playbacks {
            let Some(clip) = clips.find_mut(&playback.clip) else {
                tracing::debug!("Skipping playback of unknown clip '{}'", playback.clip);
                continue;
            };
            let time = playback.advance(delta_ms, clip.duration_ms);
            clip.set_time(time);
        }
    }
}
