//! In-process library store.
//!
//! Nothing survives the process, which makes it suitable for ephemeral
//! sessions and for exercising failure paths: reads of a given record kind and
//! all writes can be switched to fail on demand.

use super::{LibraryStore, RecordKind, StoreError, TrackEntry};
use crate::annotations::{Marker, Note, SubtitleSegment};
use crate::catalog::{Track, TrackId};
use crate::media::PlayableRef;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    tracks: HashMap<TrackId, (Track, Arc<[u8]>)>,
    notes: HashMap<TrackId, Vec<Note>>,
    subtitles: HashMap<TrackId, Vec<SubtitleSegment>>,
    markers: HashMap<TrackId, Vec<Marker>>,
    failing_reads: HashSet<RecordKind>,
    fail_writes: bool,
    deleted: Vec<TrackId>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn readable(&self, kind: RecordKind) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let state = self.state()?;
        if state.failing_reads.contains(&kind) {
            return Err(StoreError::Unavailable(format!("{kind:?} reads disabled")));
        }
        Ok(state)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.writable().map(|_| ())
    }

    fn writable(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let state = self.state()?;
        if state.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(state)
    }

    /// Make reads of `kind` fail until switched back.
    pub fn fail_reads(&self, kind: RecordKind, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            if fail {
                state.failing_reads.insert(kind);
            } else {
                state.failing_reads.remove(&kind);
            }
        }
    }

    /// Make every write fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.fail_writes = fail;
        }
    }

    pub fn track_count(&self) -> usize {
        self.inner.lock().map(|s| s.tracks.len()).unwrap_or(0)
    }

    /// Whether any annotation collection is stored for `id`.
    pub fn has_annotations(&self, id: &TrackId) -> bool {
        self.inner
            .lock()
            .map(|s| {
                s.notes.contains_key(id)
                    || s.subtitles.contains_key(id)
                    || s.markers.contains_key(id)
            })
            .unwrap_or(false)
    }

    /// Every id passed to `delete_tracks`, in call order.
    pub fn deleted_ids(&self) -> Vec<TrackId> {
        self.inner
            .lock()
            .map(|s| s.deleted.clone())
            .unwrap_or_default()
    }
}

impl LibraryStore for MemoryStore {
    async fn save_tracks(&self, entries: &[TrackEntry]) -> Result<(), StoreError> {
        // Fail before touching any payload so a disabled store stays untouched
        self.check_writable()?;

        let mut loaded = Vec::with_capacity(entries.len());
        for entry in entries {
            loaded.push((entry.track.clone(), entry.payload.read().await?));
        }

        let mut state = self.writable()?;
        for (track, bytes) in loaded {
            state.tracks.insert(track.id.clone(), (track, bytes));
        }
        Ok(())
    }

    async fn get_all_tracks(&self) -> Result<Vec<Track>, StoreError> {
        let state = self.readable(RecordKind::Tracks)?;
        Ok(state.tracks.values().map(|(t, _)| t.clone()).collect())
    }

    async fn delete_tracks(&self, ids: &[TrackId]) -> Result<(), StoreError> {
        let mut state = self.writable()?;
        for id in ids {
            state.notes.remove(id);
            state.subtitles.remove(id);
            state.markers.remove(id);
            state.tracks.remove(id);
            state.deleted.push(id.clone());
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut state = self.writable()?;
        state.notes.clear();
        state.subtitles.clear();
        state.markers.clear();
        state.tracks.clear();
        Ok(())
    }

    async fn get_notes(&self, id: &TrackId) -> Result<Vec<Note>, StoreError> {
        let state = self.readable(RecordKind::Notes)?;
        Ok(state.notes.get(id).cloned().unwrap_or_default())
    }

    async fn save_notes(&self, id: &TrackId, notes: &[Note]) -> Result<(), StoreError> {
        self.writable()?.notes.insert(id.clone(), notes.to_vec());
        Ok(())
    }

    async fn get_subtitles(&self, id: &TrackId) -> Result<Vec<SubtitleSegment>, StoreError> {
        let state = self.readable(RecordKind::Subtitles)?;
        Ok(state.subtitles.get(id).cloned().unwrap_or_default())
    }

    async fn save_subtitles(
        &self,
        id: &TrackId,
        subtitles: &[SubtitleSegment],
    ) -> Result<(), StoreError> {
        self.writable()?
            .subtitles
            .insert(id.clone(), subtitles.to_vec());
        Ok(())
    }

    async fn get_markers(&self, id: &TrackId) -> Result<Vec<Marker>, StoreError> {
        let state = self.readable(RecordKind::Markers)?;
        Ok(state.markers.get(id).cloned().unwrap_or_default())
    }

    async fn save_markers(&self, id: &TrackId, markers: &[Marker]) -> Result<(), StoreError> {
        self.writable()?.markers.insert(id.clone(), markers.to_vec());
        Ok(())
    }

    fn playable_ref(&self, track: &Track) -> Option<PlayableRef> {
        let state = self.inner.lock().ok()?;
        state
            .tracks
            .get(&track.id)
            .map(|(_, bytes)| PlayableRef::Memory(bytes.clone()))
    }
}
