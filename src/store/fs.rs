//! Directory-backed library store.
//!
//! Layout under the store root:
//!
//! ```text
//! tracks/<key>.json     track metadata
//! blobs/<key>           audio payload
//! notes/<key>.json      Vec<Note>
//! subtitles/<key>.json  Vec<SubtitleSegment>
//! markers/<key>.json    Vec<Marker>
//! ```
//!
//! `<key>` is the hex md5 of the track id, which keeps arbitrary paths out of
//! file names. Every write lands in a temporary file first and is renamed into
//! place, so a crash mid-write leaves the previous record intact.

use super::{LibraryStore, Payload, RecordKind, StoreError, TrackEntry};
use crate::annotations::{Marker, Note, SubtitleSegment};
use crate::catalog::{Track, TrackId};
use crate::media::PlayableRef;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TRACKS_DIR: &str = "tracks";
const BLOBS_DIR: &str = "blobs";
const NOTES_DIR: &str = "notes";
const SUBTITLES_DIR: &str = "subtitles";
const MARKERS_DIR: &str = "markers";

// Annotation directories come first so an interrupted delete never leaves
// annotations behind a removed track.
const DELETE_ORDER: &[&str] = &[NOTES_DIR, SUBTITLES_DIR, MARKERS_DIR, BLOBS_DIR, TRACKS_DIR];

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for dir in DELETE_ORDER {
            tokio::fs::create_dir_all(root.join(dir)).await?;
        }
        log::debug!("Opened library store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(id: &TrackId) -> String {
        format!("{:x}", md5::compute(id.as_str().as_bytes()))
    }

    fn record_path(&self, kind: RecordKind, id: &TrackId) -> PathBuf {
        let dir = match kind {
            RecordKind::Tracks => TRACKS_DIR,
            RecordKind::Notes => NOTES_DIR,
            RecordKind::Subtitles => SUBTITLES_DIR,
            RecordKind::Markers => MARKERS_DIR,
        };
        self.root.join(dir).join(format!("{}.json", Self::key(id)))
    }

    fn blob_path(&self, id: &TrackId) -> PathBuf {
        self.root.join(BLOBS_DIR).join(Self::key(id))
    }

    async fn read_collection<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        id: &TrackId,
    ) -> Result<Vec<T>, StoreError> {
        Ok(read_json(&self.record_path(kind, id)).await?.unwrap_or_default())
    }

    async fn write_collection<T: Serialize + Sync>(
        &self,
        kind: RecordKind,
        id: &TrackId,
        items: &[T],
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(items)?;
        write_atomic(&self.record_path(kind, id), &bytes).await?;
        Ok(())
    }

    async fn write_blob(&self, id: &TrackId, payload: &Payload) -> Result<(), StoreError> {
        let target = self.blob_path(id);
        let tmp = tmp_path(&target);
        match payload {
            Payload::File(source) => {
                tokio::fs::copy(source, &tmp).await?;
            }
            Payload::Bytes(bytes) => {
                tokio::fs::write(&tmp, bytes).await?;
            }
        }
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

impl LibraryStore for FsStore {
    async fn save_tracks(&self, entries: &[TrackEntry]) -> Result<(), StoreError> {
        for entry in entries {
            // Blob before metadata: a listed track always has its payload
            self.write_blob(&entry.track.id, &entry.payload).await?;
            let bytes = serde_json::to_vec_pretty(&entry.track)?;
            write_atomic(&self.record_path(RecordKind::Tracks, &entry.track.id), &bytes).await?;
        }
        log::debug!("Saved {} tracks to {}", entries.len(), self.root.display());
        Ok(())
    }

    async fn get_all_tracks(&self) -> Result<Vec<Track>, StoreError> {
        let mut tracks = Vec::new();
        let mut entries = tokio::fs::read_dir(self.root.join(TRACKS_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let track: Track = match read_json(&path).await {
                Ok(Some(track)) => track,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping unreadable track record {}: {e}", path.display());
                    continue;
                }
            };

            if !tokio::fs::try_exists(self.blob_path(&track.id)).await? {
                log::warn!("Skipping track {} with missing payload", track.id);
                continue;
            }
            tracks.push(track);
        }

        Ok(tracks)
    }

    async fn delete_tracks(&self, ids: &[TrackId]) -> Result<(), StoreError> {
        for id in ids {
            for kind in [RecordKind::Notes, RecordKind::Subtitles, RecordKind::Markers] {
                remove_if_exists(&self.record_path(kind, id)).await?;
            }
            remove_if_exists(&self.blob_path(id)).await?;
            remove_if_exists(&self.record_path(RecordKind::Tracks, id)).await?;
        }
        log::debug!("Deleted {} tracks from {}", ids.len(), self.root.display());
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        for dir in DELETE_ORDER {
            let path = self.root.join(dir);
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            tokio::fs::create_dir_all(&path).await?;
        }
        log::info!("Cleared library store at {}", self.root.display());
        Ok(())
    }

    async fn get_notes(&self, id: &TrackId) -> Result<Vec<Note>, StoreError> {
        self.read_collection(RecordKind::Notes, id).await
    }

    async fn save_notes(&self, id: &TrackId, notes: &[Note]) -> Result<(), StoreError> {
        self.write_collection(RecordKind::Notes, id, notes).await
    }

    async fn get_subtitles(&self, id: &TrackId) -> Result<Vec<SubtitleSegment>, StoreError> {
        self.read_collection(RecordKind::Subtitles, id).await
    }

    async fn save_subtitles(
        &self,
        id: &TrackId,
        subtitles: &[SubtitleSegment],
    ) -> Result<(), StoreError> {
        self.write_collection(RecordKind::Subtitles, id, subtitles)
            .await
    }

    async fn get_markers(&self, id: &TrackId) -> Result<Vec<Marker>, StoreError> {
        self.read_collection(RecordKind::Markers, id).await
    }

    async fn save_markers(&self, id: &TrackId, markers: &[Marker]) -> Result<(), StoreError> {
        self.write_collection(RecordKind::Markers, id, markers).await
    }

    fn playable_ref(&self, track: &Track) -> Option<PlayableRef> {
        Some(PlayableRef::File(self.blob_path(&track.id)))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Note;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(path: &str, bytes: &[u8]) -> TrackEntry {
        TrackEntry {
            track: Track::new(path, bytes.len() as u64, 1, None),
            payload: Payload::Bytes(Arc::from(bytes.to_vec())),
        }
    }

    #[tokio::test]
    async fn test_save_and_list_tracks() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        store
            .save_tracks(&[entry("a/1.mp3", b"one"), entry("a/2.mp3", b"two")])
            .await
            .unwrap();

        let mut tracks = store.get_all_tracks().await.unwrap();
        tracks.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].path, "a/1.mp3");

        let Some(PlayableRef::File(blob)) = store.playable_ref(&tracks[1]) else {
            panic!("expected a file reference");
        };
        assert_eq!(std::fs::read(blob).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_file_payload_is_copied() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.mp3");
        std::fs::write(&source, b"audio bytes").unwrap();

        let store = FsStore::open(dir.path().join("store")).await.unwrap();
        let track = Track::new("source.mp3", 11, 5, None);
        store
            .save_tracks(&[TrackEntry {
                track: track.clone(),
                payload: Payload::File(source.clone()),
            }])
            .await
            .unwrap();

        std::fs::remove_file(&source).unwrap();
        let Some(PlayableRef::File(blob)) = store.playable_ref(&track) else {
            panic!("expected a file reference");
        };
        assert_eq!(std::fs::read(blob).unwrap(), b"audio bytes");
    }

    #[tokio::test]
    async fn test_missing_annotations_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();
        let id = TrackId::from("nothing");

        assert!(store.get_notes(&id).await.unwrap().is_empty());
        assert!(store.get_subtitles(&id).await.unwrap().is_empty());
        assert!(store.get_markers(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_everything_for_track() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();
        let keep = entry("keep.mp3", b"k");
        let drop = entry("drop.mp3", b"d");
        store
            .save_tracks(&[keep.clone(), drop.clone()])
            .await
            .unwrap();
        store
            .save_notes(&drop.track.id, &[Note::new(1.0, "gone")])
            .await
            .unwrap();
        store
            .save_notes(&keep.track.id, &[Note::new(2.0, "kept")])
            .await
            .unwrap();

        store
            .delete_tracks(&[drop.track.id.clone()])
            .await
            .unwrap();

        let tracks = store.get_all_tracks().await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, keep.track.id);
        assert!(store.get_notes(&drop.track.id).await.unwrap().is_empty());
        assert_eq!(store.get_notes(&keep.track.id).await.unwrap().len(), 1);
        assert!(!store.blob_path(&drop.track.id).exists());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();
        let e = entry("x.mp3", b"x");
        store.save_tracks(&[e.clone()]).await.unwrap();
        store
            .save_notes(&e.track.id, &[Note::new(0.0, "n")])
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert!(store.get_all_tracks().await.unwrap().is_empty());
        assert!(store.get_notes(&e.track.id).await.unwrap().is_empty());
        // Still usable after clearing
        store.save_tracks(&[e]).await.unwrap();
        assert_eq!(store.get_all_tracks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_orphan_metadata_and_garbage_skipped() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();
        let e = entry("x.mp3", b"x");
        store.save_tracks(&[e.clone()]).await.unwrap();

        std::fs::remove_file(store.blob_path(&e.track.id)).unwrap();
        std::fs::write(dir.path().join("tracks").join("junk.json"), b"{not json").unwrap();

        assert!(store.get_all_tracks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_annotation_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();
        let id = TrackId::from("t");
        std::fs::write(store.record_path(RecordKind::Markers, &id), b"[{").unwrap();

        assert!(matches!(
            store.get_markers(&id).await,
            Err(StoreError::Serde(_))
        ));
    }
}
