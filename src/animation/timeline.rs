use crate::animation::keyframes::{TimelineDescriptor, descriptor_max_time};

/// Name of the timeline every document is guaranteed to carry.
pub const DEFAULT_TIMELINE: &str = "Default";

/// Shared logical clock. Read once per render and threaded through the call chain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Clock {
    now_ms: f64,
}

impl Clock {
    /// Clock starting at `now_ms`.
    pub fn new(now_ms: f64) -> Self {
        Self { now_ms }
    }

    /// Current clock time in milliseconds.
    pub fn now_ms(self) -> f64 {
        self.now_ms
    }

    /// Advance by `dt_ms` (negative deltas are ignored).
    pub fn advance(&mut self, dt_ms: f64) {
        self.now_ms += dt_ms.max(0.0);
    }

    /// Jump to an absolute time.
    pub fn set(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }
}

/// Playback status of a [`Timeline`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackStatus {
    /// Cursor advances with the clock.
    Playing,
    /// Cursor frozen.
    Paused,
    /// Cursor frozen; not yet started or halted.
    #[default]
    Stopped,
}

/// Playback command carried by the `playback` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Resume or start.
    Play,
    /// Freeze, remembering that the author asked for it.
    Pause,
    /// Halt.
    Stop,
    /// Play and wrap at the end.
    Loop,
    /// Play once and stop wrapping.
    Once,
}

impl PlaybackCommand {
    /// Parse a command keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "stop" => Some(Self::Stop),
            "loop" => Some(Self::Loop),
            "once" => Some(Self::Once),
            _ => None,
        }
    }
}

/// Playable cursor over one timeline descriptor.
#[derive(Clone, Debug)]
pub struct Timeline {
    name: String,
    status: PlaybackStatus,
    explicitly_paused: bool,
    looping: bool,
    local_ms: f64,
    max_ms: f64,
    last_clock_ms: Option<f64>,
    just_finished: bool,
}

impl Timeline {
    /// Create a stopped timeline whose end is the descriptor's last keyframe.
    pub fn new(name: impl Into<String>, descriptor: &TimelineDescriptor) -> Self {
        Self {
            name: name.into(),
            status: PlaybackStatus::Stopped,
            explicitly_paused: false,
            looping: false,
            local_ms: 0.0,
            max_ms: descriptor_max_time(descriptor) as f64,
            last_clock_ms: None,
            just_finished: false,
        }
    }

    /// Timeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current playback status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Return `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Return `true` when the author explicitly paused this timeline.
    pub fn is_explicitly_paused(&self) -> bool {
        self.explicitly_paused
    }

    /// Return `true` when the timeline wraps at its end.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Unbounded local cursor.
    pub fn time_ms(&self) -> f64 {
        self.local_ms
    }

    /// Cursor clamped to `[0, max_time]`.
    pub fn bounded_time_ms(&self) -> f64 {
        self.local_ms.clamp(0.0, self.max_ms)
    }

    /// Last keyframe offset across the descriptor.
    pub fn max_time_ms(&self) -> f64 {
        self.max_ms
    }

    /// Return `true` once a non-looping cursor reached its end.
    pub fn is_finished(&self) -> bool {
        !self.looping && self.local_ms >= self.max_ms
    }

    /// Clock reading of the most recent [`Self::advance`], if any.
    pub fn last_clock_ms(&self) -> Option<f64> {
        self.last_clock_ms
    }

    /// Return `true` if the most recent [`Self::advance`] crossed the end.
    pub fn just_finished(&self) -> bool {
        self.just_finished
    }

    /// Feed the shared clock. Only a playing timeline moves its cursor.
    pub fn advance(&mut self, clock_ms: f64) {
        let was_finished = self.is_finished();
        if self.is_playing() {
            if let Some(last) = self.last_clock_ms {
                self.local_ms += (clock_ms - last).max(0.0);
            }
            if self.looping && self.max_ms > 0.0 && self.local_ms > self.max_ms {
                self.local_ms %= self.max_ms;
            }
        }
        self.last_clock_ms = Some(clock_ms);
        self.just_finished = !was_finished && self.is_finished();
    }

    /// Apply a playback command; returns `true` if status or looping changed.
    ///
    /// The cursor is left where it is.
    pub fn command(&mut self, cmd: PlaybackCommand) -> bool {
        let before = (self.status, self.looping);
        match cmd {
            PlaybackCommand::Play => {
                self.status = PlaybackStatus::Playing;
                self.explicitly_paused = false;
            }
            PlaybackCommand::Pause => {
                self.status = PlaybackStatus::Paused;
                self.explicitly_paused = true;
            }
            PlaybackCommand::Stop => {
                self.status = PlaybackStatus::Stopped;
                self.explicitly_paused = false;
            }
            PlaybackCommand::Loop => {
                self.status = PlaybackStatus::Playing;
                self.explicitly_paused = false;
                self.looping = true;
            }
            PlaybackCommand::Once => {
                self.looping = false;
            }
        }
        before != (self.status, self.looping)
    }

    /// Start playing (clears the explicit-pause flag).
    pub fn play(&mut self) {
        self.command(PlaybackCommand::Play);
    }

    /// Pause at the current cursor.
    pub fn pause(&mut self) {
        self.command(PlaybackCommand::Pause);
    }

    /// Stop at the current cursor.
    pub fn stop(&mut self) {
        self.command(PlaybackCommand::Stop);
    }

    /// Set whether the timeline wraps.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Move the cursor directly.
    pub fn seek(&mut self, ms: f64) {
        self.local_ms = ms.max(0.0);
        self.just_finished = false;
    }

    pub(crate) fn refresh_bounds(&mut self, descriptor: &TimelineDescriptor) {
        self.max_ms = descriptor_max_time(descriptor) as f64;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
