//! rodio-backed media output.
//!
//! The output keeps one `Sink` for the attached track. A drained sink cannot
//! be rewound, so replaying or seeking after the end re-decodes the source.
//! Events are produced by `refresh`, which the player calls once per frame.

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use shadow_studio::catalog::Track;
use shadow_studio::media::PlayableRef;
use shadow_studio::session::{MediaError, MediaEvent, MediaOutput};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::time::Duration;

pub struct RodioOutput {
    stream: OutputStream,
    sink: Option<Sink>,
    source: Option<PlayableRef>,
    rate: f32,
    ended_reported: bool,
    events: VecDeque<MediaEvent>,
}

impl RodioOutput {
    pub fn open() -> Result<Self, MediaError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| MediaError::Io(format!("no audio output device: {e}")))?;
        // rodio logs to stderr on drop, which would land on the restored terminal
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            source: None,
            rate: 1.0,
            ended_reported: false,
            events: VecDeque::new(),
        })
    }

    fn attach(&mut self) -> Result<(), MediaError> {
        let source = self.source.clone().ok_or(MediaError::Detached)?;
        match source {
            PlayableRef::File(path) => {
                let file = File::open(&path).map_err(|e| MediaError::Io(e.to_string()))?;
                self.attach_decoder(BufReader::new(file))
            }
            PlayableRef::Memory(bytes) => self.attach_decoder(Cursor::new(bytes)),
        }
    }

    fn attach_decoder<R>(&mut self, reader: R) -> Result<(), MediaError>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        let decoder = Decoder::new(reader).map_err(|e| MediaError::Decode(e.to_string()))?;
        let duration = decoder
            .total_duration()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_speed(self.rate);
        sink.append(decoder);

        // Dropping the previous sink stops it
        self.sink = Some(sink);
        self.ended_reported = false;
        self.events.push_back(MediaEvent::Loaded { duration });
        Ok(())
    }

    // A drained sink has nothing left to seek in
    fn ensure_playable(&mut self) -> Result<&Sink, MediaError> {
        let drained = self.sink.as_ref().map(Sink::empty).unwrap_or(true);
        if drained {
            self.attach()?;
        }
        self.sink.as_ref().ok_or(MediaError::Detached)
    }
}

impl MediaOutput for RodioOutput {
    fn load(&mut self, track: &Track, source: &PlayableRef) -> Result<(), MediaError> {
        log::debug!("Loading {} from {}", track.path, source.describe());
        self.events.clear();
        self.source = Some(source.clone());
        self.sink = None;
        self.attach()
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let sink = self.ensure_playable()?;
        sink.play();
        self.ended_reported = false;
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        let target = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
        let sink = self.ensure_playable()?;
        sink.try_seek(target)
            .map_err(|e| MediaError::Unsupported(format!("seek failed: {e}")))?;
        self.ended_reported = false;
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        if let Some(sink) = &self.sink {
            sink.set_speed(rate);
        }
    }

    fn clear(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.source = None;
        self.events.clear();
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }

    fn refresh(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if sink.empty() {
            if !self.ended_reported {
                self.ended_reported = true;
                self.events.push_back(MediaEvent::Ended);
            }
        } else if !sink.is_paused() {
            self.events
                .push_back(MediaEvent::TimeUpdate(sink.get_pos().as_secs_f64()));
        }
    }
}
