//! Durable, key-addressed storage for tracks and their annotations.
//!
//! The [`LibraryStore`] trait is the persistence gateway used by the library
//! and the annotation store. Every operation is asynchronous and covers one
//! logical unit of work: `delete_tracks` and `clear_all` remove a track's
//! payload, its metadata and all three annotation collections in the same
//! call, so callers never issue partial deletions.
//!
//! Two backends are provided:
//!
//! - [`FsStore`]: a directory of JSON records and payload blobs.
//! - [`MemoryStore`]: process-local maps, with switches to simulate failures.

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::annotations::{Marker, Note, SubtitleSegment};
use crate::catalog::{Track, TrackId};
use crate::media::PlayableRef;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The readable bytes behind an imported file.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

impl Payload {
    pub async fn read(&self) -> std::io::Result<Arc<[u8]>> {
        match self {
            Payload::File(path) => Ok(Arc::from(tokio::fs::read(path).await?)),
            Payload::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// A playable reference pointing straight at the original payload.
    pub fn to_playable(&self) -> PlayableRef {
        match self {
            Payload::File(path) => PlayableRef::File(path.clone()),
            Payload::Bytes(bytes) => PlayableRef::Memory(bytes.clone()),
        }
    }
}

/// A track and its payload, as handed to [`LibraryStore::save_tracks`].
#[derive(Debug, Clone)]
pub struct TrackEntry {
    pub track: Track,
    pub payload: Payload,
}

/// The record families a store keeps per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Tracks,
    Notes,
    Subtitles,
    Markers,
}

pub trait LibraryStore: Clone + Send + Sync + 'static {
    /// Insert or overwrite tracks together with their payloads.
    fn save_tracks(
        &self,
        entries: &[TrackEntry],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_all_tracks(&self) -> impl Future<Output = Result<Vec<Track>, StoreError>> + Send;

    /// Remove payload, metadata, notes, subtitles and markers for every id.
    fn delete_tracks(&self, ids: &[TrackId])
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn clear_all(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_notes(&self, id: &TrackId)
    -> impl Future<Output = Result<Vec<Note>, StoreError>> + Send;

    fn save_notes(
        &self,
        id: &TrackId,
        notes: &[Note],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_subtitles(
        &self,
        id: &TrackId,
    ) -> impl Future<Output = Result<Vec<SubtitleSegment>, StoreError>> + Send;

    fn save_subtitles(
        &self,
        id: &TrackId,
        subtitles: &[SubtitleSegment],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_markers(
        &self,
        id: &TrackId,
    ) -> impl Future<Output = Result<Vec<Marker>, StoreError>> + Send;

    fn save_markers(
        &self,
        id: &TrackId,
        markers: &[Marker],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Re-acquire a playable reference for a persisted track.
    fn playable_ref(&self, track: &Track) -> Option<PlayableRef>;
}
