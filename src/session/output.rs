//! The seam between the playback session and whatever actually makes sound.

use crate::catalog::Track;
use crate::media::PlayableRef;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaError {
    /// The output refused to start playback on its own.
    #[error("playback was not allowed to start")]
    AutoplayRejected,
    #[error("unsupported media: {0}")]
    Unsupported(String),
    #[error("failed to decode media: {0}")]
    Decode(String),
    #[error("media I/O failed: {0}")]
    Io(String),
    /// Raised while no source is attached, e.g. during teardown.
    #[error("no media attached")]
    Detached,
}

/// Notifications an output reports back, drained through
/// [`MediaOutput::poll_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Loaded { duration: f64 },
    TimeUpdate(f64),
    Ended,
    Error(MediaError),
}

/// A single audio output.
///
/// Implementations are expected to report progress with
/// [`MediaEvent::TimeUpdate`] while playing and exactly one
/// [`MediaEvent::Ended`] when the attached source runs out.
pub trait MediaOutput {
    /// Attach `source`, replacing whatever was attached. Playback does not
    /// start until [`play`](Self::play).
    fn load(&mut self, track: &Track, source: &PlayableRef) -> Result<(), MediaError>;

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64) -> Result<(), MediaError>;

    fn set_rate(&mut self, rate: f32);

    /// Detach the current source.
    fn clear(&mut self);

    fn poll_event(&mut self) -> Option<MediaEvent>;

    /// Sample the device and queue whatever happened since the last call.
    /// Outputs that queue events as they occur have nothing to do here.
    fn refresh(&mut self) {}
}
