//! Playback modes and the end-of-track decision.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlags {
    pub continuous_play: bool,
    pub loop_current: bool,
    pub auto_pause: bool,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            continuous_play: true,
            loop_current: false,
            auto_pause: false,
        }
    }
}

/// Replay a finished track `count` times, waiting `interval_seconds` before
/// each replay. A count of zero disables it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoReplay {
    pub count: u32,
    pub interval_seconds: f64,
}

impl Default for AutoReplay {
    fn default() -> Self {
        Self {
            count: 0,
            interval_seconds: 0.5,
        }
    }
}

impl AutoReplay {
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_seconds).unwrap_or(Duration::ZERO)
    }
}

/// A-B loop bounds. Both set means the loop is active.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopRegion {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl LoopRegion {
    pub fn is_active(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Advance the off -> A -> A+B -> off cycle at `time`. Setting B before A
    /// swaps the two.
    pub fn toggle(&mut self, time: f64) {
        *self = match (self.start, self.end) {
            (None, _) => LoopRegion {
                start: Some(time),
                end: None,
            },
            (Some(start), None) if time <= start => LoopRegion {
                start: Some(time),
                end: Some(start),
            },
            (Some(start), None) => LoopRegion {
                start: Some(start),
                end: Some(time),
            },
            (Some(_), Some(_)) => LoopRegion::default(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackEndAction {
    /// Play the same track again after `delay`.
    Replay { delay: Duration },
    RestartCurrent,
    /// Select the next track without starting it.
    AdvancePaused,
    AdvancePlaying,
    Stop,
}

/// What to do when the current track finishes. The first matching rule wins:
/// pending auto-replays, then loop-current, then auto-pause, then continuous
/// play.
pub fn decide_track_end(
    modes: ModeFlags,
    auto_replay: &AutoReplay,
    replays_done: u32,
) -> TrackEndAction {
    if auto_replay.count > 0 && replays_done < auto_replay.count {
        TrackEndAction::Replay {
            delay: auto_replay.interval(),
        }
    } else if modes.loop_current {
        TrackEndAction::RestartCurrent
    } else if modes.auto_pause {
        TrackEndAction::AdvancePaused
    } else if modes.continuous_play {
        TrackEndAction::AdvancePlaying
    } else {
        TrackEndAction::Stop
    }
}
