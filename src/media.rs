//! Transient playable references for cataloged tracks.
//!
//! A playable reference is what the media output opens to play a track. It is
//! granted per track for the duration of a session: ingestion and restore
//! acquire one for every track they add, and removal or a full clear releases
//! them again. Nothing outside the registry holds a reference past release.

use crate::catalog::TrackId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayableRef {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

impl PlayableRef {
    pub fn describe(&self) -> String {
        match self {
            PlayableRef::File(path) => path.display().to_string(),
            PlayableRef::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MediaRegistry {
    refs: HashMap<TrackId, PlayableRef>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a reference for `id`, releasing any reference it replaces.
    pub fn acquire(&mut self, id: TrackId, playable: PlayableRef) {
        if let Some(previous) = self.refs.insert(id.clone(), playable) {
            log::debug!("Replaced playable reference for {id}: {}", previous.describe());
        }
    }

    pub fn release(&mut self, id: &TrackId) -> bool {
        match self.refs.remove(id) {
            Some(released) => {
                log::debug!("Released playable reference for {id}: {}", released.describe());
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        log::debug!("Releasing {} playable references", self.refs.len());
        self.refs.clear();
    }

    pub fn get(&self, id: &TrackId) -> Option<&PlayableRef> {
        self.refs.get(id)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
