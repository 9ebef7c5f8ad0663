//! The library: catalog, playable references and the store behind them.
//!
//! [`Library::ingest`] turns file descriptors into persisted, cataloged
//! tracks. Work is done in fixed-size chunks with a cooperative yield between
//! them so a UI driven from the same runtime keeps responding during large
//! imports. [`Library::restore`] rebuilds the catalog from the store at
//! startup the same way.

use crate::catalog::{Catalog, Track, TrackId, build_catalog};
use crate::constants::{INGEST_CHUNK_SIZE, RESTORE_CHUNK_SIZE};
use crate::media::{MediaRegistry, PlayableRef};
use crate::store::{LibraryStore, Payload, StoreError, TrackEntry};
use thiserror::Error;

/// One file offered for import.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Path relative to the imported folder. Falls back to `name` when absent.
    pub relative_path: Option<String>,
    pub name: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub mime: Option<String>,
    pub payload: Payload,
}

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("malformed file descriptor '{name}': {reason}")]
    Malformed { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestProgress {
    pub processed: usize,
    pub total: usize,
    pub current_name: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Audio tracks accepted from this batch, duplicates included.
    pub accepted: usize,
    /// Descriptors dropped for not being audio.
    pub skipped: usize,
    /// Tracks in the catalog after the merge.
    pub total_tracks: usize,
    /// Chunks whose write to the store failed.
    pub persist_failures: usize,
    pub first_persist_error: Option<String>,
    /// Set when a reset could not clear the store.
    pub reset_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: usize,
    /// Stored tracks whose payload could no longer be opened.
    pub unplayable: usize,
    pub error: Option<String>,
}

/// Tracks removed from the catalog, and the store error if the durable
/// removal failed.
#[derive(Debug, Default)]
pub struct Removal {
    pub removed: Vec<TrackId>,
    pub store_error: Option<StoreError>,
}

/// Turn a descriptor into a track with a normalized slash-delimited path.
pub fn normalize(descriptor: &FileDescriptor) -> Result<Track, IngestError> {
    let malformed = |reason: &str| IngestError::Malformed {
        name: descriptor.name.clone(),
        reason: reason.to_string(),
    };

    let raw = descriptor
        .relative_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(&descriptor.name);

    let mut path = raw.replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        return Err(malformed("empty path"));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(malformed("invalid path segment"));
    }

    Ok(Track::new(
        path,
        descriptor.size,
        descriptor.last_modified,
        descriptor.mime.clone(),
    ))
}

pub struct Library<S> {
    store: S,
    catalog: Catalog,
    media: MediaRegistry,
}

impl<S: LibraryStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            catalog: Catalog::default(),
            media: MediaRegistry::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn media(&self) -> &MediaRegistry {
        &self.media
    }

    pub fn playable(&self, id: &TrackId) -> Option<&PlayableRef> {
        self.media.get(id)
    }

    /// Import descriptors into the library.
    ///
    /// With `reset`, every stored track and playable reference is dropped
    /// first; otherwise the current catalog is the merge base and re-imported
    /// tracks replace their earlier copies. A malformed descriptor aborts the
    /// import with the catalog unchanged; chunks persisted before it stay in
    /// the store.
    pub async fn ingest<F>(
        &mut self,
        descriptors: Vec<FileDescriptor>,
        reset: bool,
        mut on_progress: F,
    ) -> Result<IngestReport, IngestError>
    where
        F: FnMut(IngestProgress),
    {
        let mut report = IngestReport::default();
        let total = descriptors.len();

        if reset {
            self.media.release_all();
            self.catalog = Catalog::default();
            if let Err(e) = self.store.clear_all().await {
                log::error!("Failed to clear library before import: {e}");
                report.reset_error = Some(e.to_string());
            }
        }

        let mut added: Vec<Track> = Vec::new();
        let mut acquired: Vec<TrackId> = Vec::new();
        let mut processed = 0;

        for chunk in descriptors.chunks(INGEST_CHUNK_SIZE) {
            let mut entries = Vec::with_capacity(chunk.len());
            for descriptor in chunk {
                let track = match normalize(descriptor) {
                    Ok(track) => track,
                    Err(e) => {
                        log::error!("Import aborted: {e}");
                        for id in &acquired {
                            if !self.catalog.contains(id) {
                                self.media.release(id);
                            }
                        }
                        return Err(e);
                    }
                };
                if !track.is_audio() {
                    log::debug!("Skipping non-audio file {}", track.path);
                    report.skipped += 1;
                    continue;
                }
                entries.push(TrackEntry {
                    track,
                    payload: descriptor.payload.clone(),
                });
            }

            if !entries.is_empty() {
                if let Err(e) = self.store.save_tracks(&entries).await {
                    log::warn!("Failed to persist {} tracks: {e}", entries.len());
                    report.persist_failures += 1;
                    report.first_persist_error.get_or_insert_with(|| e.to_string());
                }
            }

            for entry in entries {
                self.media
                    .acquire(entry.track.id.clone(), entry.payload.to_playable());
                acquired.push(entry.track.id.clone());
                added.push(entry.track);
            }

            processed += chunk.len();
            on_progress(IngestProgress {
                processed,
                total,
                current_name: chunk.last().map(|d| d.name.clone()).unwrap_or_default(),
            });
            tokio::task::yield_now().await;
        }

        report.accepted = added.len();
        let previous = std::mem::take(&mut self.catalog).into_tracks();
        self.catalog = build_catalog(previous.into_iter().chain(added));
        report.total_tracks = self.catalog.len();

        log::info!(
            "Imported {} of {} files ({} tracks in library)",
            report.accepted,
            total,
            report.total_tracks
        );
        Ok(report)
    }

    /// Rebuild the catalog from the store.
    ///
    /// A failed read leaves an empty library; the failure is reported rather
    /// than returned.
    pub async fn restore<F>(&mut self, mut on_progress: F) -> RestoreReport
    where
        F: FnMut(IngestProgress),
    {
        let mut report = RestoreReport::default();
        self.media.release_all();
        self.catalog = Catalog::default();

        let stored = match self.store.get_all_tracks().await {
            Ok(stored) => stored,
            Err(e) => {
                log::error!("Failed to load library: {e}");
                report.error = Some(e.to_string());
                return report;
            }
        };

        let total = stored.len();
        let mut kept = Vec::with_capacity(total);
        let mut processed = 0;

        for chunk in stored.chunks(RESTORE_CHUNK_SIZE) {
            for track in chunk {
                match self.store.playable_ref(track) {
                    Some(playable) => {
                        self.media.acquire(track.id.clone(), playable);
                        kept.push(track.clone());
                    }
                    None => {
                        log::warn!("No playable payload for {}, skipping", track.path);
                        report.unplayable += 1;
                    }
                }
            }

            processed += chunk.len();
            on_progress(IngestProgress {
                processed,
                total,
                current_name: chunk.last().map(|t| t.name.clone()).unwrap_or_default(),
            });
            tokio::task::yield_now().await;
        }

        self.catalog = build_catalog(kept);
        report.restored = self.catalog.len();
        log::info!("Restored {} tracks", report.restored);
        report
    }

    /// Remove a file or a whole folder. Returns `None` if no node has `path`.
    pub async fn delete_node(&mut self, path: &str) -> Option<Removal> {
        let ids = self.catalog.find_node(path)?.track_ids();
        Some(self.remove_ids(ids).await)
    }

    pub async fn delete_track(&mut self, id: &TrackId) -> Option<Removal> {
        if !self.catalog.contains(id) {
            return None;
        }
        Some(self.remove_ids(vec![id.clone()]).await)
    }

    /// Drop every track, reference and annotation.
    pub async fn clear(&mut self) -> Removal {
        let removed = self.catalog.tracks().iter().map(|t| t.id.clone()).collect();
        self.media.release_all();
        self.catalog = Catalog::default();

        let store_error = self.store.clear_all().await.err();
        if let Some(e) = &store_error {
            log::error!("Failed to clear library: {e}");
        }
        Removal {
            removed,
            store_error,
        }
    }

    async fn remove_ids(&mut self, ids: Vec<TrackId>) -> Removal {
        let store_error = self.store.delete_tracks(&ids).await.err();
        if let Some(e) = &store_error {
            log::error!("Failed to delete {} tracks from store: {e}", ids.len());
        }

        for id in &ids {
            self.media.release(id);
        }
        let remaining = std::mem::take(&mut self.catalog)
            .into_tracks()
            .into_iter()
            .filter(|t| !ids.contains(&t.id));
        self.catalog = build_catalog(remaining);

        log::debug!("Removed {} tracks", ids.len());
        Removal {
            removed: ids,
            store_error,
        }
    }
}
