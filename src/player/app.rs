//! Main application state and control flow for the terminal player.
//!
//! The player runs on a single-threaded tokio runtime. Each frame it samples
//! the audio output, lets the playback session react to what happened,
//! applies annotation loads that finished in the background, redraws, and
//! handles pending key presses. Annotation loads are spawned as tasks so that
//! switching tracks never waits on storage.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use shadow_studio::annotations::{AnnotationStore, LoadedAnnotations, Note, SubtitleEdit};
use shadow_studio::catalog::TrackId;
use shadow_studio::config::Settings;
use shadow_studio::constants::SEEK_OFFSET_SECONDS;
use shadow_studio::hotkeys::{HotkeyAction, HotkeyDispatcher};
use shadow_studio::library::Library;
use shadow_studio::session::{MediaOutput, PlaybackSession};
use shadow_studio::store::{FsStore, LibraryStore, StoreError};
use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::keys::code_name;
use super::output::RodioOutput;
use super::playlist::Playlist;
use super::ui;

const FRAME: Duration = Duration::from_millis(50);
const STATUS_TTL: Duration = Duration::from_secs(3);

/// What the text typed in the input line is written to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditTarget {
    NewNote,
    Note(Uuid),
    Subtitle(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Player,
    Playlist,
    Input(EditTarget),
    /// Waiting for `y` before removing `pending_delete`.
    ConfirmDelete,
}

pub struct App<S: LibraryStore, O: MediaOutput> {
    pub should_quit: bool,
    pub library: Library<S>,
    pub session: PlaybackSession<O>,
    pub annotations: AnnotationStore,
    pub dispatcher: HotkeyDispatcher,
    pub playlist: Playlist,
    pub focus: Focus,
    pub input: String,
    pub pending_delete: Option<String>,
    pub status: Option<(String, Instant)>,
    loads_tx: mpsc::UnboundedSender<LoadedAnnotations>,
    loads_rx: mpsc::UnboundedReceiver<LoadedAnnotations>,
}

impl<S: LibraryStore, O: MediaOutput> App<S, O> {
    pub fn new(library: Library<S>, output: O, settings: &Settings) -> Self {
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let mut playlist = Playlist::new();
        playlist.refresh(library.catalog());

        Self {
            should_quit: false,
            library,
            session: PlaybackSession::new(output, settings.auto_replay),
            annotations: AnnotationStore::new(),
            dispatcher: HotkeyDispatcher::new(settings.keys.clone()),
            playlist,
            focus: Focus::Player,
            input: String::new(),
            pending_delete: None,
            status: None,
            loads_tx,
            loads_rx,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    /// Point annotations at the session's current track and load them in the
    /// background.
    fn track_changed(&mut self) {
        let current = self.session.current_track_id().cloned();
        self.annotations.set_active(current.clone());
        if let Some(index) = self.session.current_index() {
            self.playlist.follow(index);
        }

        if let Some(id) = current {
            let store = self.library.store().clone();
            let tx = self.loads_tx.clone();
            tokio::spawn(async move {
                let loaded = AnnotationStore::fetch(&store, id).await;
                // The receiver only goes away when the player exits
                let _ = tx.send(loaded);
            });
        }
    }

    pub fn play_track(&mut self, id: &TrackId) {
        if self.session.play_file_by_id(&self.library, id) {
            self.track_changed();
        }
    }

    /// One frame worth of bookkeeping, without drawing or input.
    fn update(&mut self) {
        self.session.output_mut().refresh();
        if self.session.pump(&self.library, Instant::now()) {
            self.track_changed();
        }

        while let Ok(loaded) = self.loads_rx.try_recv() {
            self.annotations.apply(loaded);
        }

        if let Some((_, since)) = &self.status
            && since.elapsed() > STATUS_TTL
        {
            self.status = None;
        }
    }

    /// Turn the outcome of an annotation write into a status message.
    fn report(&mut self, result: Result<bool, StoreError>, done: &str) {
        match result {
            Ok(true) => self.set_status(done),
            Ok(false) => {}
            Err(e) => {
                log::error!("Failed to save annotations: {e}");
                self.set_status(format!("{done}, but saving failed"));
            }
        }
    }

    async fn run_action(&mut self, action: HotkeyAction) {
        match action {
            HotkeyAction::PlayPause => {
                self.session.toggle_play_pause();
            }
            HotkeyAction::Replay => {
                self.session.replay_from_start();
            }
            HotkeyAction::SeekBack => {
                self.session.seek_by(-SEEK_OFFSET_SECONDS);
            }
            HotkeyAction::SeekForward => {
                self.session.seek_by(SEEK_OFFSET_SECONDS);
            }
            HotkeyAction::ToggleRecord => {
                info!("Recording requested, not available in this build");
                self.set_status("Recording is not available");
            }
            HotkeyAction::AddMarker => {
                let result = self
                    .session
                    .add_marker_at_current_time(&mut self.annotations, self.library.store())
                    .await;
                self.report(result, "Marker added");
            }
            HotkeyAction::ToggleAbRepeat => {
                let region = self.session.toggle_ab_repeat();
                let message = match (region.start, region.end) {
                    (Some(_), None) => "Loop start set",
                    (Some(_), Some(_)) => "A-B loop on",
                    _ => "A-B loop off",
                };
                self.set_status(message);
            }
            HotkeyAction::NextTrack => {
                if self.session.next_track(&self.library) {
                    self.track_changed();
                }
            }
            HotkeyAction::PrevTrack => {
                if self.session.prev_track(&self.library) {
                    self.track_changed();
                }
            }
        }
    }

    async fn remove_nearest_marker(&mut self) {
        let now = self.session.current_time();
        let nearest = self
            .annotations
            .markers()
            .iter()
            .min_by(|a, b| (a.time - now).abs().total_cmp(&(b.time - now).abs()))
            .map(|m| m.id);
        let Some(marker_id) = nearest else {
            return;
        };

        let result = self
            .session
            .remove_marker(&mut self.annotations, self.library.store(), marker_id)
            .await;
        self.report(result, "Marker removed");
    }

    /// Open the input line for `target`, starting from `text`.
    fn begin_input(&mut self, target: EditTarget, text: impl Into<String>) {
        if !self.annotations.is_ready() {
            self.set_status("Annotations are still loading");
            return;
        }
        self.input = text.into();
        self.focus = Focus::Input(target);
    }

    async fn commit_input(&mut self, target: EditTarget) {
        let text = std::mem::take(&mut self.input).trim().to_string();
        self.focus = Focus::Player;
        let store = self.library.store();

        match target {
            EditTarget::NewNote => {
                if text.is_empty() {
                    return;
                }
                let note = Note::new(self.session.current_time(), text);
                let result = self.annotations.add_note(store, note).await;
                self.report(result, "Note saved");
            }
            EditTarget::Note(note_id) => {
                if text.is_empty() {
                    return;
                }
                let result = self.annotations.edit_note(store, note_id, text).await;
                self.report(result, "Note updated");
            }
            EditTarget::Subtitle(segment_id) => {
                let edit = SubtitleEdit {
                    text: Some(text),
                    ..SubtitleEdit::default()
                };
                let result = self.annotations.edit_subtitle(store, segment_id, edit).await;
                self.report(result, "Subtitle updated");
            }
        }
    }

    fn edit_current_note(&mut self) {
        let now = self.session.current_time();
        let Some((id, content)) = self
            .annotations
            .note_at_or_before(now)
            .map(|n| (n.id, n.content.clone()))
        else {
            self.set_status("No note at the playhead");
            return;
        };
        self.begin_input(EditTarget::Note(id), content);
    }

    async fn delete_current_note(&mut self) {
        let now = self.session.current_time();
        let Some(note_id) = self.annotations.note_at_or_before(now).map(|n| n.id) else {
            self.set_status("No note at the playhead");
            return;
        };
        let result = self
            .annotations
            .delete_note(self.library.store(), note_id)
            .await;
        self.report(result, "Note deleted");
    }

    async fn add_subtitle(&mut self) {
        let now = self.session.current_time();
        match self.annotations.add_subtitle_at(self.library.store(), now).await {
            Ok(Some(id)) => self.begin_input(EditTarget::Subtitle(id), ""),
            Ok(None) => {}
            Err(e) => {
                log::error!("Failed to save subtitles: {e}");
                self.set_status("Subtitle added, but saving failed");
            }
        }
    }

    fn edit_current_subtitle(&mut self) {
        let now = self.session.current_time();
        let Some((id, text)) = self
            .annotations
            .subtitle_at_or_before(now)
            .map(|s| (s.id, s.text.clone()))
        else {
            self.set_status("No subtitle at the playhead");
            return;
        };
        self.begin_input(EditTarget::Subtitle(id), text);
    }

    async fn delete_current_subtitle(&mut self) {
        let now = self.session.current_time();
        let Some(segment_id) = self.annotations.subtitle_at_or_before(now).map(|s| s.id) else {
            self.set_status("No subtitle at the playhead");
            return;
        };
        let result = self
            .annotations
            .delete_subtitle(self.library.store(), segment_id)
            .await;
        self.report(result, "Subtitle deleted");
    }

    /// Move the start or the end of the subtitle at the playhead onto it.
    async fn retime_current_subtitle(&mut self, start: bool) {
        let now = self.session.current_time();
        let Some(segment_id) = self.annotations.subtitle_at_or_before(now).map(|s| s.id) else {
            self.set_status("No subtitle at the playhead");
            return;
        };
        let edit = if start {
            SubtitleEdit {
                start: Some(now),
                ..SubtitleEdit::default()
            }
        } else {
            SubtitleEdit {
                end: Some(now),
                ..SubtitleEdit::default()
            }
        };
        let result = self
            .annotations
            .edit_subtitle(self.library.store(), segment_id, edit)
            .await;
        self.report(result, if start { "Subtitle start set" } else { "Subtitle end set" });
    }

    /// Ask for confirmation before removing the selected track, or its whole
    /// folder.
    fn request_delete(&mut self, folder: bool) {
        let Some(track) = self
            .playlist
            .selected_index()
            .and_then(|i| self.library.catalog().get(i))
        else {
            return;
        };
        let path = if folder {
            match track.path.rsplit_once('/') {
                Some((parent, _)) => parent.to_string(),
                None => {
                    self.set_status("Track is not inside a folder");
                    return;
                }
            }
        } else {
            track.path.clone()
        };
        self.pending_delete = Some(path);
        self.focus = Focus::ConfirmDelete;
    }

    async fn confirm_delete(&mut self) {
        self.focus = Focus::Playlist;
        let Some(path) = self.pending_delete.take() else {
            return;
        };
        let Some(removal) = self.library.delete_node(&path).await else {
            return;
        };

        // Indices shift after a removal, and the current track may be gone
        let dropped = self.session.reconcile(&self.library);
        self.playlist.refresh(self.library.catalog());
        if dropped {
            self.track_changed();
        } else if let Some(index) = self.session.current_index() {
            self.playlist.follow(index);
        }

        match removal.store_error {
            Some(e) => self.set_status(format!("Removed {path}, but storage failed: {e}")),
            None => self.set_status(format!(
                "Removed {path} ({} tracks)",
                removal.removed.len()
            )),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.focus {
            Focus::Input(target) => self.handle_input_keys(key, target).await,
            Focus::ConfirmDelete => {
                if key.code == KeyCode::Char('y') {
                    self.confirm_delete().await;
                } else {
                    self.pending_delete = None;
                    self.focus = Focus::Playlist;
                }
            }
            Focus::Playlist if self.playlist.searching => self.handle_search_keys(key),
            Focus::Playlist => self.handle_playlist_keys(key),
            Focus::Player => self.handle_player_keys(key).await,
        }
    }

    async fn handle_input_keys(&mut self, key: KeyEvent, target: EditTarget) {
        match key.code {
            KeyCode::Enter => self.commit_input(target).await,
            KeyCode::Esc => {
                self.input.clear();
                self.focus = Focus::Player;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_search_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.playlist.clear_search(self.library.catalog()),
            KeyCode::Enter | KeyCode::Down => self.playlist.searching = false,
            KeyCode::Backspace => self.playlist.pop_char(self.library.catalog()),
            KeyCode::Char(c) => self.playlist.push_char(c, self.library.catalog()),
            _ => {}
        }
    }

    fn handle_playlist_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Player,
            KeyCode::Up | KeyCode::Char('k') => self.playlist.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.playlist.select_next(),
            KeyCode::Char('/') => self.playlist.searching = true,
            KeyCode::Char('d') => self.request_delete(false),
            KeyCode::Char('D') => self.request_delete(true),
            KeyCode::Enter => {
                let id = self
                    .playlist
                    .selected_index()
                    .and_then(|i| self.library.catalog().get(i))
                    .map(|t| t.id.clone());
                if let Some(id) = id {
                    self.play_track(&id);
                    self.focus = Focus::Player;
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    async fn handle_player_keys(&mut self, key: KeyEvent) {
        if let Some(action) = code_name(&key).and_then(|code| self.dispatcher.resolve(&code)) {
            self.run_action(action).await;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus = Focus::Playlist,
            KeyCode::Char('n') => {
                if self.session.current_track_id().is_some() {
                    self.begin_input(EditTarget::NewNote, "");
                }
            }
            KeyCode::Char('e') => self.edit_current_note(),
            KeyCode::Char('d') => self.delete_current_note().await,
            KeyCode::Char('t') => self.add_subtitle().await,
            KeyCode::Char('T') => self.edit_current_subtitle(),
            KeyCode::Char('D') => self.delete_current_subtitle().await,
            KeyCode::Char('i') => self.retime_current_subtitle(true).await,
            KeyCode::Char('o') => self.retime_current_subtitle(false).await,
            KeyCode::Char('a') => self.run_action(HotkeyAction::ToggleAbRepeat).await,
            KeyCode::Char('.') => self.run_action(HotkeyAction::NextTrack).await,
            KeyCode::Char(',') => self.run_action(HotkeyAction::PrevTrack).await,
            KeyCode::Char(']') => {
                self.session.seek_to_next_marker(&self.annotations);
            }
            KeyCode::Char('[') => {
                self.session.seek_to_prev_marker(&self.annotations);
            }
            KeyCode::Char('x') => self.remove_nearest_marker().await,
            KeyCode::Char('s') => {
                let rate = self.session.cycle_playback_rate();
                self.set_status(format!("Speed {rate}x"));
            }
            KeyCode::Char('c') => {
                let on = self.session.toggle_continuous_play();
                self.set_status(format!("Continuous play {}", on_off(on)));
            }
            KeyCode::Char('l') => {
                let on = self.session.toggle_loop_current();
                self.set_status(format!("Loop track {}", on_off(on)));
            }
            KeyCode::Char('u') => {
                let on = self.session.toggle_auto_pause();
                self.set_status(format!("Pause between tracks {}", on_off(on)));
            }
            _ => {}
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

pub fn run(track_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let log_file = crate::logging::init_player_logging()?;
    info!("Starting shadow player, logging to {}", log_file.display());

    let settings = Settings::load_or_default();
    crate::cli::runtime()?.block_on(run_player(&settings, track_path))
}

async fn run_player(settings: &Settings, track_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let store = FsStore::open(settings.library_path()).await?;
    let mut library = Library::new(store);
    let report = library.restore(|_| {}).await;
    info!(
        "Restored {} tracks ({} unplayable)",
        report.restored, report.unplayable
    );

    let output = RodioOutput::open()?;
    let mut app = App::new(library, output, settings);
    if let Some(e) = report.error {
        log::error!("Library restore failed: {e}");
        app.set_status(format!("Library could not be read: {e}"));
    }

    if let Some(path) = track_path {
        let id = app
            .library
            .catalog()
            .track_by_path(path.trim_matches('/'))
            .map(|t| t.id.clone())
            .ok_or_else(|| format!("No track at '{path}' in the library"))?;
        app.play_track(&id);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B, S, O>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, O>,
) -> Result<(), Box<dyn Error>>
where
    B: ratatui::backend::Backend,
    S: LibraryStore,
    O: MediaOutput,
{
    loop {
        app.update();

        terminal.draw(|f| ui::draw(f, app))?;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                app.handle_key(key).await;
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Yielding here is what lets spawned annotation loads make progress
        tokio::time::sleep(FRAME).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_studio::catalog::Track;
    use shadow_studio::library::FileDescriptor;
    use shadow_studio::media::PlayableRef;
    use shadow_studio::session::{MediaError, MediaEvent};
    use shadow_studio::store::{MemoryStore, Payload};
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Loads instantly and plays nothing; tests push positions by hand.
    #[derive(Debug, Default)]
    struct SilentOutput {
        events: VecDeque<MediaEvent>,
    }

    impl MediaOutput for SilentOutput {
        fn load(&mut self, _track: &Track, _source: &PlayableRef) -> Result<(), MediaError> {
            self.events.push_back(MediaEvent::Loaded { duration: 30.0 });
            Ok(())
        }

        fn play(&mut self) -> Result<(), MediaError> {
            Ok(())
        }

        fn pause(&mut self) {}

        fn seek(&mut self, _seconds: f64) -> Result<(), MediaError> {
            Ok(())
        }

        fn set_rate(&mut self, _rate: f32) {}

        fn clear(&mut self) {
            self.events.clear();
        }

        fn poll_event(&mut self) -> Option<MediaEvent> {
            self.events.pop_front()
        }
    }

    async fn app(paths: &[&str]) -> App<MemoryStore, SilentOutput> {
        let mut library = Library::new(MemoryStore::new());
        let descriptors = paths
            .iter()
            .map(|p| FileDescriptor {
                relative_path: Some(p.to_string()),
                name: p.rsplit('/').next().unwrap_or(p).to_string(),
                size: 1,
                last_modified: 1,
                mime: None,
                payload: Payload::Bytes(Arc::from(vec![0u8])),
            })
            .collect();
        library.ingest(descriptors, false, |_| {}).await.unwrap();
        App::new(library, SilentOutput::default(), &Settings::new())
    }

    async fn press(app: &mut App<MemoryStore, SilentOutput>, code: KeyCode) {
        let modifiers = match code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => KeyModifiers::SHIFT,
            _ => KeyModifiers::NONE,
        };
        app.handle_key(KeyEvent::new(code, modifiers)).await;
    }

    async fn type_text(app: &mut App<MemoryStore, SilentOutput>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c)).await;
        }
    }

    /// Let spawned annotation loads finish and apply them.
    async fn settle(app: &mut App<MemoryStore, SilentOutput>) {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        app.update();
    }

    async fn move_playhead(app: &mut App<MemoryStore, SilentOutput>, position: f64) {
        app.session
            .output_mut()
            .events
            .push_back(MediaEvent::TimeUpdate(position));
        settle(app).await;
        assert_eq!(app.session.current_time(), position);
    }

    /// Start the first track and wait for its annotations.
    async fn start(app: &mut App<MemoryStore, SilentOutput>) -> TrackId {
        press(app, KeyCode::Char('.')).await;
        settle(app).await;
        assert!(app.annotations.is_ready());
        app.session.current_track_id().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_note_add_edit_delete_keys() {
        let mut app = app(&["a/1.mp3", "a/2.mp3"]).await;
        let id = start(&mut app).await;
        move_playhead(&mut app, 4.0).await;

        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.focus, Focus::Input(EditTarget::NewNote));
        type_text(&mut app, "  hello ").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.focus, Focus::Player);
        assert_eq!(app.annotations.notes().len(), 1);
        assert_eq!(app.annotations.notes()[0].content, "hello");
        assert_eq!(app.annotations.notes()[0].timestamp, 4.0);

        // Editing starts from the existing text
        press(&mut app, KeyCode::Char('e')).await;
        assert_eq!(app.input, "hello");
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace).await;
        }
        type_text(&mut app, "bye").await;
        press(&mut app, KeyCode::Enter).await;
        let stored = app.library.store().get_notes(&id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "bye");

        // An empty edit leaves the note alone
        press(&mut app, KeyCode::Char('e')).await;
        app.input.clear();
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.annotations.notes()[0].content, "bye");

        press(&mut app, KeyCode::Char('d')).await;
        assert!(app.annotations.notes().is_empty());
        assert!(app.library.store().get_notes(&id).await.unwrap().is_empty());

        press(&mut app, KeyCode::Char('d')).await;
        assert_eq!(
            app.status.as_ref().map(|(s, _)| s.as_str()),
            Some("No note at the playhead")
        );
    }

    #[tokio::test]
    async fn test_note_key_needs_a_track() {
        let mut app = app(&["a/1.mp3"]).await;
        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.focus, Focus::Player);
    }

    #[tokio::test]
    async fn test_subtitle_keys() {
        let mut app = app(&["a/1.mp3"]).await;
        let id = start(&mut app).await;
        move_playhead(&mut app, 2.0).await;

        press(&mut app, KeyCode::Char('t')).await;
        let Focus::Input(EditTarget::Subtitle(segment_id)) = app.focus else {
            panic!("expected subtitle input, got {:?}", app.focus);
        };
        type_text(&mut app, "hi").await;
        press(&mut app, KeyCode::Enter).await;

        move_playhead(&mut app, 3.0).await;
        press(&mut app, KeyCode::Char('o')).await;
        move_playhead(&mut app, 2.5).await;
        press(&mut app, KeyCode::Char('i')).await;

        let stored = app.library.store().get_subtitles(&id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, segment_id);
        assert_eq!(stored[0].text, "hi");
        assert_eq!((stored[0].start, stored[0].end), (2.5, 3.0));

        // Escape abandons an edit
        press(&mut app, KeyCode::Char('T')).await;
        assert_eq!(app.input, "hi");
        type_text(&mut app, " there").await;
        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.focus, Focus::Player);
        assert_eq!(app.annotations.subtitles()[0].text, "hi");

        press(&mut app, KeyCode::Char('D')).await;
        assert!(app.annotations.subtitles().is_empty());
        assert!(app.library.store().get_subtitles(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_folder_of_current_track() {
        let mut app = app(&["a/1.mp3", "a/2.mp3", "b/3.mp3"]).await;
        start(&mut app).await;

        press(&mut app, KeyCode::Tab).await;
        assert_eq!(app.focus, Focus::Playlist);
        press(&mut app, KeyCode::Char('D')).await;
        assert_eq!(app.focus, Focus::ConfirmDelete);
        assert_eq!(app.pending_delete.as_deref(), Some("a"));
        press(&mut app, KeyCode::Char('y')).await;

        assert_eq!(app.focus, Focus::Playlist);
        assert_eq!(app.library.catalog().len(), 1);
        assert_eq!(app.playlist.visible, vec![0]);
        assert_eq!(app.session.current_index(), None);
        assert_eq!(app.annotations.active_track(), None);
        assert!(!app.annotations.is_ready());
    }

    #[tokio::test]
    async fn test_delete_other_track_keeps_current() {
        let mut app = app(&["a/1.mp3", "a/2.mp3", "b/3.mp3"]).await;
        press(&mut app, KeyCode::Char('.')).await;
        press(&mut app, KeyCode::Char('.')).await;
        settle(&mut app).await;
        let current = app.session.current_track_id().cloned().unwrap();
        assert_eq!(app.session.current_index(), Some(1));

        app.focus = Focus::Playlist;
        app.playlist.selected = 0;
        press(&mut app, KeyCode::Char('d')).await;
        assert_eq!(app.pending_delete.as_deref(), Some("a/1.mp3"));
        press(&mut app, KeyCode::Char('y')).await;

        assert_eq!(app.session.current_track_id(), Some(&current));
        assert_eq!(app.session.current_index(), Some(0));
        assert_eq!(app.playlist.selected_index(), Some(0));
        assert_eq!(app.annotations.active_track(), Some(&current));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let mut app = app(&["a/1.mp3", "a/2.mp3"]).await;
        app.focus = Focus::Playlist;
        press(&mut app, KeyCode::Char('d')).await;
        press(&mut app, KeyCode::Char('n')).await;

        assert_eq!(app.focus, Focus::Playlist);
        assert_eq!(app.pending_delete, None);
        assert_eq!(app.library.catalog().len(), 2);
    }
}
