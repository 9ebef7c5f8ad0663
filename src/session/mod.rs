//! The playback session: which track is playing, how, and what happens when
//! it ends.
//!
//! A [`PlaybackSession`] owns exactly one [`MediaOutput`]. All state changes
//! go through the session so the output and the reported state cannot drift
//! apart. Events coming back from the output are routed by
//! [`PlaybackSession::pump`]; auto-replay delays are deadlines that the caller
//! completes by calling [`PlaybackSession::tick`] with the current time.

mod modes;
mod output;

pub use modes::{AutoReplay, LoopRegion, ModeFlags, TrackEndAction, decide_track_end};
pub use output::{MediaError, MediaEvent, MediaOutput};

use crate::annotations::{AnnotationStore, Marker};
use crate::catalog::TrackId;
use crate::constants::{MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE, PLAYBACK_RATES};
use crate::library::Library;
use crate::store::{LibraryStore, StoreError};
use std::time::Instant;
use uuid::Uuid;

pub struct PlaybackSession<O> {
    output: O,
    current: Option<(usize, TrackId)>,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    playback_rate: f32,
    modes: ModeFlags,
    auto_replay: AutoReplay,
    replays_done: u32,
    loop_region: LoopRegion,
    pending_replay: Option<Instant>,
}

impl<O: MediaOutput> PlaybackSession<O> {
    pub fn new(output: O, auto_replay: AutoReplay) -> Self {
        Self {
            output,
            current: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            playback_rate: 1.0,
            modes: ModeFlags::default(),
            auto_replay,
            replays_done: 0,
            loop_region: LoopRegion::default(),
            pending_replay: None,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|(index, _)| *index)
    }

    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.current.as_ref().map(|(_, id)| id)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn modes(&self) -> ModeFlags {
        self.modes
    }

    pub fn loop_region(&self) -> LoopRegion {
        self.loop_region
    }

    pub fn replays_done(&self) -> u32 {
        self.replays_done
    }

    pub fn auto_replay(&self) -> AutoReplay {
        self.auto_replay
    }

    pub fn set_auto_replay(&mut self, auto_replay: AutoReplay) {
        self.auto_replay = auto_replay;
    }

    pub fn replay_pending(&self) -> bool {
        self.pending_replay.is_some()
    }

    pub fn set_continuous_play(&mut self, on: bool) {
        self.modes.continuous_play = on;
    }

    pub fn set_loop_current(&mut self, on: bool) {
        self.modes.loop_current = on;
    }

    pub fn set_auto_pause(&mut self, on: bool) {
        self.modes.auto_pause = on;
    }

    pub fn toggle_continuous_play(&mut self) -> bool {
        self.modes.continuous_play = !self.modes.continuous_play;
        self.modes.continuous_play
    }

    pub fn toggle_loop_current(&mut self) -> bool {
        self.modes.loop_current = !self.modes.loop_current;
        self.modes.loop_current
    }

    pub fn toggle_auto_pause(&mut self) -> bool {
        self.modes.auto_pause = !self.modes.auto_pause;
        self.modes.auto_pause
    }

    /// Select the track with `id` and start it.
    pub fn play_file_by_id<S: LibraryStore>(&mut self, library: &Library<S>, id: &TrackId) -> bool {
        match library.catalog().index_of(id) {
            Some(index) => self.select(library, index, true),
            None => {
                log::warn!("Track {id} is not in the library");
                false
            }
        }
    }

    /// Select the following track. With nothing selected, starts the first.
    pub fn next_track<S: LibraryStore>(&mut self, library: &Library<S>) -> bool {
        self.advance(library, true)
    }

    pub fn prev_track<S: LibraryStore>(&mut self, library: &Library<S>) -> bool {
        match self.current_index() {
            Some(index) if index > 0 => self.select(library, index - 1, true),
            _ => false,
        }
    }

    fn advance<S: LibraryStore>(&mut self, library: &Library<S>, autoplay: bool) -> bool {
        let next = self.current_index().map_or(0, |index| index + 1);
        if next >= library.catalog().len() {
            return false;
        }
        self.select(library, next, autoplay)
    }

    fn select<S: LibraryStore>(
        &mut self,
        library: &Library<S>,
        index: usize,
        autoplay: bool,
    ) -> bool {
        let Some(track) = library.catalog().get(index) else {
            return false;
        };

        self.current = Some((index, track.id.clone()));
        self.loop_region = LoopRegion::default();
        self.replays_done = 0;
        self.pending_replay = None;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.is_playing = false;
        log::debug!("Selected track {index}: {}", track.path);

        let Some(source) = library.playable(&track.id) else {
            log::error!("No playable reference for {}", track.path);
            self.output.clear();
            return true;
        };

        if let Err(e) = self.output.load(track, source) {
            self.on_error(e);
            return true;
        }
        self.output.set_rate(self.playback_rate);
        if autoplay {
            self.start_playback();
        }
        true
    }

    fn start_playback(&mut self) {
        match self.output.play() {
            Ok(()) => self.is_playing = true,
            Err(MediaError::AutoplayRejected) => {
                log::debug!("Playback start rejected, staying paused");
                self.is_playing = false;
            }
            Err(e) => self.on_error(e),
        }
    }

    fn pause_playback(&mut self) {
        self.output.pause();
        self.is_playing = false;
        self.pending_replay = None;
    }

    /// Returns false when there is no current track.
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        if self.is_playing {
            self.pause_playback();
        } else {
            self.pending_replay = None;
            if self.duration > 0.0 && self.current_time >= self.duration {
                self.restart();
                return true;
            }
            self.start_playback();
        }
        true
    }

    fn restart(&mut self) {
        self.current_time = 0.0;
        if let Err(e) = self.output.seek(0.0) {
            self.on_error(e);
            return;
        }
        self.start_playback();
    }

    /// Jump to the start of the current track and play.
    pub fn replay_from_start(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.pending_replay = None;
        self.restart();
        true
    }

    pub fn seek_to(&mut self, seconds: f64) -> bool {
        if self.current.is_none() || !seconds.is_finite() {
            return false;
        }
        let mut target = seconds.max(0.0);
        if self.duration > 0.0 {
            target = target.min(self.duration);
        }
        if let Err(e) = self.output.seek(target) {
            self.on_error(e);
            return false;
        }
        self.current_time = target;
        true
    }

    pub fn seek_by(&mut self, offset: f64) -> bool {
        self.seek_to(self.current_time + offset)
    }

    pub fn seek_to_next_marker(&mut self, annotations: &AnnotationStore) -> bool {
        match annotations.marker_after(self.current_time) {
            Some(marker) => self.seek_to(marker.time),
            None => false,
        }
    }

    pub fn seek_to_prev_marker(&mut self, annotations: &AnnotationStore) -> bool {
        match annotations.marker_before(self.current_time) {
            Some(marker) => self.seek_to(marker.time),
            None => false,
        }
    }

    /// Record a playback position reported by the output, enforcing the A-B
    /// loop.
    pub fn on_time_update(&mut self, position: f64) {
        self.current_time = position;
        if let LoopRegion {
            start: Some(start),
            end: Some(end),
        } = self.loop_region
        {
            if position >= end {
                match self.output.seek(start) {
                    Ok(()) => self.current_time = start,
                    Err(e) => self.on_error(e),
                }
            }
        }
    }

    pub fn on_loaded(&mut self, duration: f64) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    }

    /// Cycle the A-B loop at the current position. No-op without a track.
    pub fn toggle_ab_repeat(&mut self) -> LoopRegion {
        if self.current.is_some() {
            self.loop_region.toggle(self.current_time);
            log::debug!("A-B loop now {:?}", self.loop_region);
        }
        self.loop_region
    }

    /// React to the current track finishing.
    pub fn on_ended<S: LibraryStore>(
        &mut self,
        library: &Library<S>,
        now: Instant,
    ) -> TrackEndAction {
        self.is_playing = false;
        if self.duration > 0.0 {
            self.current_time = self.duration;
        }

        let action = decide_track_end(self.modes, &self.auto_replay, self.replays_done);
        log::debug!("Track ended, next action: {action:?}");

        match action {
            TrackEndAction::Replay { delay } => {
                self.replays_done += 1;
                self.pending_replay = Some(now + delay);
            }
            TrackEndAction::RestartCurrent => self.restart(),
            TrackEndAction::AdvancePaused => {
                self.advance(library, false);
            }
            TrackEndAction::AdvancePlaying => {
                if !self.advance(library, true) {
                    log::debug!("End of library reached");
                }
            }
            TrackEndAction::Stop => {}
        }
        action
    }

    /// Complete a scheduled auto-replay once its deadline has passed.
    /// Returns true if the replay fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_replay {
            Some(deadline) if deadline <= now => {
                self.pending_replay = None;
                self.restart();
                true
            }
            _ => false,
        }
    }

    pub fn set_playback_rate(&mut self, rate: f32) -> f32 {
        if rate.is_finite() {
            self.playback_rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
            self.output.set_rate(self.playback_rate);
        }
        self.playback_rate
    }

    /// Step to the next preset rate, wrapping to the slowest.
    pub fn cycle_playback_rate(&mut self) -> f32 {
        let next = PLAYBACK_RATES
            .iter()
            .copied()
            .find(|r| *r > self.playback_rate + f32::EPSILON)
            .unwrap_or(PLAYBACK_RATES[0]);
        self.set_playback_rate(next)
    }

    pub async fn add_marker_at_current_time<S: LibraryStore>(
        &self,
        annotations: &mut AnnotationStore,
        store: &S,
    ) -> Result<bool, StoreError> {
        if self.current.is_none() {
            return Ok(false);
        }
        annotations
            .add_marker(store, Marker::at(self.current_time))
            .await
    }

    pub async fn remove_marker<S: LibraryStore>(
        &self,
        annotations: &mut AnnotationStore,
        store: &S,
        marker_id: Uuid,
    ) -> Result<bool, StoreError> {
        annotations.delete_marker(store, marker_id).await
    }

    /// Handle an error reported by the output. Errors raised with nothing
    /// attached are teardown noise and are dropped.
    pub fn on_error(&mut self, error: MediaError) {
        if self.current.is_none() || error == MediaError::Detached {
            log::debug!("Ignoring media error without a source: {error}");
            return;
        }
        log::error!("Playback error: {error}");
        self.pause_playback();
    }

    /// Re-locate the current track after the catalog was rebuilt. Returns
    /// true if the current track was dropped.
    pub fn reconcile<S: LibraryStore>(&mut self, library: &Library<S>) -> bool {
        let Some((_, id)) = &self.current else {
            return false;
        };
        match library.catalog().index_of(id) {
            Some(index) => {
                let id = id.clone();
                self.current = Some((index, id));
                false
            }
            None => {
                log::debug!("Current track {id} left the library");
                self.current = None;
                self.output.clear();
                self.is_playing = false;
                self.current_time = 0.0;
                self.duration = 0.0;
                self.loop_region = LoopRegion::default();
                self.replays_done = 0;
                self.pending_replay = None;
                true
            }
        }
    }

    /// Drain and route pending output events, then complete any due replay.
    /// Returns true if the current track changed.
    pub fn pump<S: LibraryStore>(&mut self, library: &Library<S>, now: Instant) -> bool {
        let before = self.current_track_id().cloned();

        while let Some(event) = self.output.poll_event() {
            match event {
                MediaEvent::Loaded { duration } => self.on_loaded(duration),
                MediaEvent::TimeUpdate(position) => self.on_time_update(position),
                MediaEvent::Ended => {
                    self.on_ended(library, now);
                }
                MediaEvent::Error(e) => self.on_error(e),
            }
        }
        self.tick(now);

        before.as_ref() != self.current_track_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Track;
    use crate::library::FileDescriptor;
    use crate::media::PlayableRef;
    use crate::store::{MemoryStore, Payload};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct FakeOutput {
        loaded: Option<String>,
        playing: bool,
        position: f64,
        rate: f32,
        reject_play: bool,
        fail_load: bool,
        events: VecDeque<MediaEvent>,
        seeks: Vec<f64>,
        clears: usize,
    }

    impl MediaOutput for FakeOutput {
        fn load(&mut self, track: &Track, _source: &PlayableRef) -> Result<(), MediaError> {
            if self.fail_load {
                return Err(MediaError::Decode("bad header".to_string()));
            }
            self.loaded = Some(track.path.clone());
            self.position = 0.0;
            self.playing = false;
            Ok(())
        }

        fn play(&mut self) -> Result<(), MediaError> {
            if self.reject_play {
                return Err(MediaError::AutoplayRejected);
            }
            self.playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
            self.position = seconds;
            self.seeks.push(seconds);
            Ok(())
        }

        fn set_rate(&mut self, rate: f32) {
            self.rate = rate;
        }

        fn clear(&mut self) {
            self.loaded = None;
            self.playing = false;
            self.clears += 1;
        }

        fn poll_event(&mut self) -> Option<MediaEvent> {
            self.events.pop_front()
        }
    }

    async fn library(paths: &[&str]) -> Library<MemoryStore> {
        let mut library = Library::new(MemoryStore::new());
        let descriptors = paths
            .iter()
            .map(|p| FileDescriptor {
                relative_path: Some(p.to_string()),
                name: p.to_string(),
                size: 1,
                last_modified: 1,
                mime: None,
                payload: Payload::Bytes(Arc::from(vec![0u8])),
            })
            .collect();
        library.ingest(descriptors, false, |_| {}).await.unwrap();
        library
    }

    fn session() -> PlaybackSession<FakeOutput> {
        PlaybackSession::new(FakeOutput::default(), AutoReplay::default())
    }

    #[tokio::test]
    async fn test_navigation_boundaries() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();

        assert!(!session.prev_track(&library));
        assert!(session.next_track(&library));
        assert_eq!(session.current_index(), Some(0));
        assert!(session.is_playing());
        assert!(!session.prev_track(&library));

        assert!(session.next_track(&library));
        assert_eq!(session.output().loaded.as_deref(), Some("2.mp3"));
        assert!(!session.next_track(&library));
        assert_eq!(session.current_index(), Some(1));
    }

    #[tokio::test]
    async fn test_toggle_without_track_is_noop() {
        let mut session = session();
        assert!(!session.toggle_play_pause());
        assert!(!session.is_playing());
        assert_eq!(session.toggle_ab_repeat(), LoopRegion::default());
    }

    #[tokio::test]
    async fn test_autoplay_rejection_settles_paused() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        session.output_mut().reject_play = true;

        let id = library.catalog().get(0).unwrap().id.clone();
        assert!(session.play_file_by_id(&library, &id));
        assert!(!session.is_playing());
        assert_eq!(session.current_track_id(), Some(&id));
    }

    #[tokio::test]
    async fn test_track_change_resets_loop_and_replays() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.set_auto_replay(AutoReplay {
            count: 3,
            interval_seconds: 1.0,
        });
        session.next_track(&library);
        session.on_time_update(2.0);
        session.toggle_ab_repeat();
        session.on_ended(&library, Instant::now());
        assert_eq!(session.replays_done(), 1);
        assert!(session.replay_pending());

        session.next_track(&library);
        assert_eq!(session.loop_region(), LoopRegion::default());
        assert_eq!(session.replays_done(), 0);
        assert!(!session.replay_pending());
    }

    #[tokio::test]
    async fn test_ab_loop_enforced_on_time_update() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        session.next_track(&library);

        session.on_time_update(2.0);
        session.toggle_ab_repeat();
        session.on_time_update(5.0);
        session.toggle_ab_repeat();
        assert!(session.loop_region().is_active());

        session.on_time_update(4.9);
        assert_eq!(session.current_time(), 4.9);
        session.on_time_update(5.0);
        assert_eq!(session.current_time(), 2.0);
        assert_eq!(session.output().seeks.last(), Some(&2.0));
    }

    #[tokio::test]
    async fn test_auto_replay_then_continuous() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.set_auto_replay(AutoReplay {
            count: 1,
            interval_seconds: 0.5,
        });
        session.next_track(&library);
        session.on_loaded(10.0);

        let t0 = Instant::now();
        let action = session.on_ended(&library, t0);
        assert_eq!(
            action,
            TrackEndAction::Replay {
                delay: Duration::from_millis(500)
            }
        );
        assert!(!session.is_playing());
        assert!(!session.tick(t0 + Duration::from_millis(100)));
        assert!(session.tick(t0 + Duration::from_millis(500)));
        assert!(session.is_playing());
        assert_eq!(session.current_time(), 0.0);

        let action = session.on_ended(&library, t0);
        assert_eq!(action, TrackEndAction::AdvancePlaying);
        assert_eq!(session.current_index(), Some(1));
        assert!(session.is_playing());
    }

    #[tokio::test]
    async fn test_pause_cancels_pending_replay() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        session.set_auto_replay(AutoReplay {
            count: 1,
            interval_seconds: 1.0,
        });
        session.next_track(&library);
        let t0 = Instant::now();
        session.on_ended(&library, t0);
        assert!(session.replay_pending());

        session.toggle_play_pause();
        session.toggle_play_pause();
        assert!(!session.replay_pending());
        assert!(!session.tick(t0 + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_loop_current_and_auto_pause() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.next_track(&library);

        session.set_loop_current(true);
        assert_eq!(
            session.on_ended(&library, Instant::now()),
            TrackEndAction::RestartCurrent
        );
        assert_eq!(session.current_index(), Some(0));
        assert!(session.is_playing());

        session.set_loop_current(false);
        session.set_auto_pause(true);
        session.on_ended(&library, Instant::now());
        assert_eq!(session.current_index(), Some(1));
        assert!(!session.is_playing());
        assert_eq!(session.output().loaded.as_deref(), Some("2.mp3"));

        // Last track: auto-pause stays put
        session.on_ended(&library, Instant::now());
        assert_eq!(session.current_index(), Some(1));
        assert!(!session.is_playing());
    }

    #[tokio::test]
    async fn test_auto_replay_then_loop_current() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.set_auto_replay(AutoReplay {
            count: 2,
            interval_seconds: 0.5,
        });
        session.set_loop_current(true);
        assert!(session.modes().continuous_play);
        session.next_track(&library);
        session.on_loaded(10.0);

        let t0 = Instant::now();
        let replay = TrackEndAction::Replay {
            delay: Duration::from_millis(500),
        };
        for _ in 0..2 {
            assert_eq!(session.on_ended(&library, t0), replay);
            assert!(session.tick(t0 + Duration::from_millis(500)));
            assert_eq!(session.current_index(), Some(0));
        }
        assert_eq!(session.replays_done(), 2);

        // Replays used up, the loop keeps the same track going
        for _ in 0..2 {
            assert_eq!(
                session.on_ended(&library, t0),
                TrackEndAction::RestartCurrent
            );
            assert_eq!(session.current_index(), Some(0));
            assert!(session.is_playing());
            assert!(!session.replay_pending());
        }
        assert_eq!(session.output().loaded.as_deref(), Some("1.mp3"));
    }

    #[tokio::test]
    async fn test_stop_when_continuous_off() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.next_track(&library);
        session.set_continuous_play(false);

        assert_eq!(session.on_ended(&library, Instant::now()), TrackEndAction::Stop);
        assert_eq!(session.current_index(), Some(0));
        assert!(!session.is_playing());
    }

    #[tokio::test]
    async fn test_playback_rate_clamped_and_kept() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();

        assert_eq!(session.set_playback_rate(5.0), 2.0);
        assert_eq!(session.set_playback_rate(0.1), 0.25);
        assert_eq!(session.set_playback_rate(f32::NAN), 0.25);

        session.next_track(&library);
        assert_eq!(session.output().rate, 0.25);

        assert_eq!(session.cycle_playback_rate(), 0.5);
        assert_eq!(session.cycle_playback_rate(), 1.0);
        session.set_playback_rate(2.0);
        assert_eq!(session.cycle_playback_rate(), 0.25);
    }

    #[tokio::test]
    async fn test_media_error_pauses_unless_detached() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();

        session.on_error(MediaError::Io("gone".to_string()));
        assert!(!session.is_playing());

        session.next_track(&library);
        session.on_error(MediaError::Detached);
        assert!(session.is_playing());

        session.on_error(MediaError::Decode("bad".to_string()));
        assert!(!session.is_playing());
        assert!(!session.output().playing);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_track_selected_and_paused() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        session.output_mut().fail_load = true;

        assert!(session.next_track(&library));
        assert_eq!(session.current_index(), Some(0));
        assert!(!session.is_playing());
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        assert!(!session.seek_by(3.0));

        session.next_track(&library);
        session.on_loaded(10.0);
        session.seek_by(-3.0);
        assert_eq!(session.current_time(), 0.0);
        session.seek_to(8.5);
        session.seek_by(3.0);
        assert_eq!(session.current_time(), 10.0);
    }

    #[tokio::test]
    async fn test_markers_follow_playhead() {
        let library = library(&["1.mp3"]).await;
        let store = library.store().clone();
        let mut annotations = AnnotationStore::new();
        let mut session = session();

        assert!(!session
            .add_marker_at_current_time(&mut annotations, &store)
            .await
            .unwrap());

        session.next_track(&library);
        annotations
            .load(&store, session.current_track_id().cloned())
            .await;
        session.on_loaded(30.0);
        session.on_time_update(12.0);
        assert!(session
            .add_marker_at_current_time(&mut annotations, &store)
            .await
            .unwrap());
        session.on_time_update(20.0);
        session
            .add_marker_at_current_time(&mut annotations, &store)
            .await
            .unwrap();

        session.seek_to(0.0);
        assert!(session.seek_to_next_marker(&annotations));
        assert_eq!(session.current_time(), 12.0);
        assert!(session.seek_to_next_marker(&annotations));
        assert_eq!(session.current_time(), 20.0);
        assert!(!session.seek_to_next_marker(&annotations));
        assert!(session.seek_to_prev_marker(&annotations));
        assert_eq!(session.current_time(), 12.0);

        let id = annotations.markers()[0].id;
        assert!(session.remove_marker(&mut annotations, &store, id).await.unwrap());
        assert_eq!(annotations.markers().len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_follows_identity() {
        let mut library = library(&["b.mp3", "c.mp3"]).await;
        let mut session = session();
        session.next_track(&library);
        session.next_track(&library);
        let id = session.current_track_id().cloned().unwrap();

        let extra = FileDescriptor {
            relative_path: Some("a.mp3".to_string()),
            name: "a.mp3".to_string(),
            size: 1,
            last_modified: 1,
            mime: None,
            payload: Payload::Bytes(Arc::from(vec![0u8])),
        };
        library.ingest(vec![extra], false, |_| {}).await.unwrap();

        assert!(!session.reconcile(&library));
        assert_eq!(session.current_index(), Some(2));
        assert_eq!(session.current_track_id(), Some(&id));

        library.delete_track(&id).await.unwrap();
        assert!(session.reconcile(&library));
        assert_eq!(session.current_index(), None);
        assert_eq!(session.output().clears, 1);
    }

    #[tokio::test]
    async fn test_pump_routes_events() {
        let library = library(&["1.mp3", "2.mp3"]).await;
        let mut session = session();
        session.next_track(&library);

        session.output_mut().events.extend([
            MediaEvent::Loaded { duration: 42.0 },
            MediaEvent::TimeUpdate(41.0),
        ]);
        assert!(!session.pump(&library, Instant::now()));
        assert_eq!(session.duration(), 42.0);
        assert_eq!(session.current_time(), 41.0);

        session.output_mut().events.push_back(MediaEvent::Ended);
        assert!(session.pump(&library, Instant::now()));
        assert_eq!(session.current_index(), Some(1));
    }

    #[tokio::test]
    async fn test_ended_at_end_restarts_on_play() {
        let library = library(&["1.mp3"]).await;
        let mut session = session();
        session.set_continuous_play(false);
        session.next_track(&library);
        session.on_loaded(10.0);
        session.on_ended(&library, Instant::now());
        assert_eq!(session.current_time(), 10.0);

        session.toggle_play_pause();
        assert!(session.is_playing());
        assert_eq!(session.current_time(), 0.0);
        assert_eq!(session.output().seeks.last(), Some(&0.0));
    }
}
