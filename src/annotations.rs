//! Per-track study annotations: timestamped notes, subtitle captions and
//! navigation markers.
//!
//! The [`AnnotationStore`] holds the three collections for the active track
//! only. Every mutation updates the in-memory collection first and then writes
//! the whole collection through to the [`LibraryStore`].

use crate::catalog::TrackId;
use crate::constants::{DEFAULT_MARKER_COLOR, DEFAULT_MARKER_LABEL, DEFAULT_SUBTITLE_SECONDS};
use crate::store::{LibraryStore, StoreError};
use crate::subtitles::{self, SubtitleError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Distance (seconds) inside which a marker counts as "here" when stepping.
const MARKER_STEP_EPSILON: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub timestamp: f64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(timestamp: f64, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub id: Uuid,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            text: text.into(),
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: Uuid,
    pub time: f64,
    pub label: String,
    pub color: String,
}

impl Marker {
    pub fn new(time: f64, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            label: label.into(),
            color: color.into(),
        }
    }

    /// A marker with the default label and color.
    pub fn at(time: f64) -> Self {
        Self::new(time, DEFAULT_MARKER_LABEL, DEFAULT_MARKER_COLOR)
    }
}

/// Partial update for a subtitle segment. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleEdit {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: Option<String>,
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("subtitle import failed: {0}")]
    Subtitle(#[from] SubtitleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Collections read for one track, ready to be handed to
/// [`AnnotationStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAnnotations {
    pub track_id: TrackId,
    pub notes: Vec<Note>,
    pub subtitles: Vec<SubtitleSegment>,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Default)]
pub struct AnnotationStore {
    active: Option<TrackId>,
    ready: bool,
    notes: Vec<Note>,
    subtitles: Vec<SubtitleSegment>,
    markers: Vec<Marker>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_track(&self) -> Option<&TrackId> {
        self.active.as_ref()
    }

    /// True once the collections for the active track have been applied.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn subtitles(&self) -> &[SubtitleSegment] {
        &self.subtitles
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Switch the active track and empty all collections.
    ///
    /// Nothing is read here; pair with [`fetch`](Self::fetch) and
    /// [`apply`](Self::apply), or use [`load`](Self::load).
    pub fn set_active(&mut self, track_id: Option<TrackId>) {
        log::debug!(
            "Active annotation track: {}",
            track_id.as_ref().map(|id| id.as_str()).unwrap_or("<none>")
        );
        self.ready = track_id.is_none();
        self.active = track_id;
        self.notes.clear();
        self.subtitles.clear();
        self.markers.clear();
    }

    /// Read all three collections for `track_id` concurrently.
    ///
    /// A failed read is logged and yields an empty collection; the other two
    /// are unaffected.
    pub async fn fetch<S: LibraryStore>(store: &S, track_id: TrackId) -> LoadedAnnotations {
        let (notes, subtitles, markers) = tokio::join!(
            store.get_notes(&track_id),
            store.get_subtitles(&track_id),
            store.get_markers(&track_id),
        );

        let mut notes = or_empty(notes, "notes", &track_id);
        let subtitles = or_empty(subtitles, "subtitles", &track_id);
        let mut markers = or_empty(markers, "markers", &track_id);
        notes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        markers.sort_by(|a, b| a.time.total_cmp(&b.time));

        LoadedAnnotations {
            track_id,
            notes,
            subtitles,
            markers,
        }
    }

    /// Install fetched collections. Returns false, leaving the store
    /// untouched, when they belong to a track that is no longer active.
    pub fn apply(&mut self, loaded: LoadedAnnotations) -> bool {
        if self.active.as_ref() != Some(&loaded.track_id) {
            log::debug!("Discarding stale annotations for {}", loaded.track_id);
            return false;
        }
        self.notes = loaded.notes;
        self.subtitles = loaded.subtitles;
        self.markers = loaded.markers;
        self.ready = true;
        true
    }

    /// `set_active` followed by an in-place fetch and apply.
    pub async fn load<S: LibraryStore>(&mut self, store: &S, track_id: Option<TrackId>) -> bool {
        self.set_active(track_id.clone());
        match track_id {
            Some(id) => {
                let loaded = Self::fetch(store, id).await;
                self.apply(loaded)
            }
            None => true,
        }
    }

    // Mutations are only accepted once the active track's collections are in
    // place; writing earlier would overwrite the persisted collection.
    fn writable_track(&self) -> Option<TrackId> {
        match (&self.active, self.ready) {
            (Some(id), true) => Some(id.clone()),
            (Some(id), false) => {
                log::debug!("Annotations for {id} still loading, ignoring edit");
                None
            }
            (None, _) => None,
        }
    }

    pub async fn add_note<S: LibraryStore>(
        &mut self,
        store: &S,
        note: Note,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        self.notes.push(note);
        self.notes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        store.save_notes(&id, &self.notes).await?;
        Ok(true)
    }

    pub async fn edit_note<S: LibraryStore>(
        &mut self,
        store: &S,
        note_id: Uuid,
        content: impl Into<String>,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) else {
            return Ok(false);
        };
        note.content = content.into();
        store.save_notes(&id, &self.notes).await?;
        Ok(true)
    }

    pub async fn delete_note<S: LibraryStore>(
        &mut self,
        store: &S,
        note_id: Uuid,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        let before = self.notes.len();
        self.notes.retain(|n| n.id != note_id);
        if self.notes.len() == before {
            return Ok(false);
        }
        store.save_notes(&id, &self.notes).await?;
        Ok(true)
    }

    /// Replace every subtitle segment, ordered by start time.
    pub async fn replace_subtitles<S: LibraryStore>(
        &mut self,
        store: &S,
        mut segments: Vec<SubtitleSegment>,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.subtitles = segments;
        store.save_subtitles(&id, &self.subtitles).await?;
        Ok(true)
    }

    /// Insert an empty caption starting at `time`. Returns its id.
    pub async fn add_subtitle_at<S: LibraryStore>(
        &mut self,
        store: &S,
        time: f64,
    ) -> Result<Option<Uuid>, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(None);
        };
        let segment = SubtitleSegment::new(time, time + DEFAULT_SUBTITLE_SECONDS, "");
        let segment_id = segment.id;
        self.subtitles.push(segment);
        self.subtitles.sort_by(|a, b| a.start.total_cmp(&b.start));
        store.save_subtitles(&id, &self.subtitles).await?;
        Ok(Some(segment_id))
    }

    /// Edit a segment in place. The collection is not re-sorted; an end
    /// before the start is clamped to the start.
    pub async fn edit_subtitle<S: LibraryStore>(
        &mut self,
        store: &S,
        segment_id: Uuid,
        edit: SubtitleEdit,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        let Some(segment) = self.subtitles.iter_mut().find(|s| s.id == segment_id) else {
            return Ok(false);
        };
        if let Some(start) = edit.start {
            segment.start = start.max(0.0);
        }
        if let Some(end) = edit.end {
            segment.end = end;
        }
        if let Some(text) = edit.text {
            segment.text = text;
        }
        if segment.end < segment.start {
            segment.end = segment.start;
        }
        store.save_subtitles(&id, &self.subtitles).await?;
        Ok(true)
    }

    pub async fn delete_subtitle<S: LibraryStore>(
        &mut self,
        store: &S,
        segment_id: Uuid,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        let before = self.subtitles.len();
        self.subtitles.retain(|s| s.id != segment_id);
        if self.subtitles.len() == before {
            return Ok(false);
        }
        store.save_subtitles(&id, &self.subtitles).await?;
        Ok(true)
    }

    /// Parse an SRT document and replace the active track's subtitles with it.
    ///
    /// A document that fails to parse leaves the current subtitles in place.
    /// Returns the number of imported segments, or `None` without an active
    /// track.
    pub async fn import_srt<S: LibraryStore>(
        &mut self,
        store: &S,
        content: &str,
    ) -> Result<Option<usize>, AnnotationError> {
        let segments = subtitles::parse_srt(content)?;
        let count = segments.len();
        if self.replace_subtitles(store, segments).await? {
            Ok(Some(count))
        } else {
            Ok(None)
        }
    }

    pub fn export_srt(&self) -> String {
        subtitles::to_srt(&self.subtitles)
    }

    pub async fn add_marker<S: LibraryStore>(
        &mut self,
        store: &S,
        marker: Marker,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        self.markers.push(marker);
        self.markers.sort_by(|a, b| a.time.total_cmp(&b.time));
        store.save_markers(&id, &self.markers).await?;
        Ok(true)
    }

    pub async fn delete_marker<S: LibraryStore>(
        &mut self,
        store: &S,
        marker_id: Uuid,
    ) -> Result<bool, StoreError> {
        let Some(id) = self.writable_track() else {
            return Ok(false);
        };
        let before = self.markers.len();
        self.markers.retain(|m| m.id != marker_id);
        if self.markers.len() == before {
            return Ok(false);
        }
        store.save_markers(&id, &self.markers).await?;
        Ok(true)
    }

    /// The first caption covering `time`.
    pub fn active_subtitle(&self, time: f64) -> Option<&SubtitleSegment> {
        self.subtitles.iter().find(|s| s.contains(time))
    }

    /// The caption covering `time`, or else the one that started most
    /// recently before it.
    pub fn subtitle_at_or_before(&self, time: f64) -> Option<&SubtitleSegment> {
        self.active_subtitle(time).or_else(|| {
            self.subtitles
                .iter()
                .filter(|s| s.start <= time)
                .max_by(|a, b| a.start.total_cmp(&b.start))
        })
    }

    pub fn marker_after(&self, time: f64) -> Option<&Marker> {
        self.markers
            .iter()
            .find(|m| m.time > time + MARKER_STEP_EPSILON)
    }

    pub fn marker_before(&self, time: f64) -> Option<&Marker> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.time < time - MARKER_STEP_EPSILON)
    }

    /// The latest note at or before `time`.
    pub fn note_at_or_before(&self, time: f64) -> Option<&Note> {
        self.notes.iter().rev().find(|n| n.timestamp <= time)
    }
}

fn or_empty<T>(result: Result<Vec<T>, StoreError>, what: &str, track_id: &TrackId) -> Vec<T> {
    result.unwrap_or_else(|e| {
        log::warn!("Failed to load {what} for {track_id}: {e}");
        Vec::new()
    })
}
