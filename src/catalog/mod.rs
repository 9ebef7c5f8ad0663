//! The library catalog: a deduplicated flat track list and the folder tree it
//! is derived from.
//!
//! A [`Catalog`] is only ever produced by [`build_catalog`]. The tree and the
//! flat list are built together in one pass, so `tracks()` is always the
//! depth-first, folders-first, naturally sorted traversal of `tree()`. Because
//! the build sorts everything it touches, the same set of tracks produces the
//! same catalog regardless of the order the tracks arrived in.

mod natural;

pub use natural::natural_cmp;

use crate::constants::{AUDIO_EXTENSIONS, ROOT_FOLDER_NAME};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Stable track identity derived from `(path, size, last_modified)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn from_parts(path: &str, size: u64, last_modified: i64) -> Self {
        Self(format!("{path}-{size}-{last_modified}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Slash-delimited path relative to the imported folder, or a bare name.
    pub path: String,
    pub parent_folder: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl Track {
    pub fn new(path: &str, size: u64, last_modified: i64, mime: Option<String>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            id: TrackId::from_parts(path, size, last_modified),
            name,
            path: path.to_string(),
            parent_folder: parent_folder_of(path),
            size,
            last_modified,
            mime,
        }
    }

    pub fn is_audio(&self) -> bool {
        is_audio(&self.name, self.mime.as_deref())
    }
}

/// Accept a file when its MIME type says audio or its extension is known.
pub fn is_audio(name: &str, mime: Option<&str>) -> bool {
    if mime.is_some_and(|m| m.starts_with("audio/")) {
        return true;
    }
    name.rsplit_once('.')
        .map(|(_, ext)| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parent_folder_of(path: &str) -> String {
    let mut parts = path.rsplit('/');
    parts.next();
    parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| ROOT_FOLDER_NAME.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Folder {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        track: Track,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Folder { name, .. } | TreeNode::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeNode::Folder { path, .. } | TreeNode::File { path, .. } => path,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, TreeNode::Folder { .. })
    }

    /// Every track id at or below this node, in tree order.
    pub fn track_ids(&self) -> Vec<TrackId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<TrackId>) {
        match self {
            TreeNode::File { track, .. } => ids.push(track.id.clone()),
            TreeNode::Folder { children, .. } => {
                for child in children {
                    child.collect_ids(ids);
                }
            }
        }
    }
}

/// The flat track list and tree, always produced together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: Vec<Track>,
    tree: Vec<TreeNode>,
}

impl Catalog {
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.index_of(id).is_some()
    }

    /// First track whose relative path matches exactly.
    pub fn track_by_path(&self, path: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.path == path)
    }

    /// Find a folder or file node by its full path.
    pub fn find_node(&self, path: &str) -> Option<&TreeNode> {
        let path = path.trim_matches('/');
        let mut level = &self.tree;
        let mut prefix = String::new();
        let segments: Vec<&str> = path.split('/').collect();

        for (i, segment) in segments.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let last = i + 1 == segments.len();
            let node = level.iter().find(|n| n.path() == prefix)?;
            if last {
                return Some(node);
            }
            match node {
                TreeNode::Folder { children, .. } => level = children,
                TreeNode::File { .. } => return None,
            }
        }
        None
    }

    /// Paths of every folder, in tree order.
    pub fn folder_paths(&self) -> Vec<String> {
        fn walk(nodes: &[TreeNode], out: &mut Vec<String>) {
            for node in nodes {
                if let TreeNode::Folder { path, children, .. } = node {
                    out.push(path.clone());
                    walk(children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.tree, &mut out);
        out
    }

    /// Tracks in this catalog, consuming it. Used as a merge base.
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}

/// Build a catalog from an arbitrary track sequence.
///
/// Non-audio entries are dropped and duplicate ids resolve to the last
/// occurrence.
pub fn build_catalog<I>(tracks: I) -> Catalog
where
    I: IntoIterator<Item = Track>,
{
    let mut unique: Vec<Track> = Vec::new();
    let mut positions: HashMap<TrackId, usize> = HashMap::new();

    for track in tracks.into_iter().filter(Track::is_audio) {
        match positions.get(&track.id) {
            Some(&pos) => unique[pos] = track,
            None => {
                positions.insert(track.id.clone(), unique.len());
                unique.push(track);
            }
        }
    }

    let mut tree: Vec<TreeNode> = Vec::new();
    for track in unique {
        insert_track(&mut tree, track);
    }

    let mut flat = Vec::new();
    sort_and_flatten(&mut tree, &mut flat);

    log::debug!(
        "Built catalog: {} tracks, {} root nodes",
        flat.len(),
        tree.len()
    );

    Catalog { tracks: flat, tree }
}

fn insert_track(root: &mut Vec<TreeNode>, track: Track) {
    let segments: Vec<&str> = track.path.split('/').collect();
    let (folders, _file) = segments.split_at(segments.len() - 1);

    let mut level = root;
    for (depth, segment) in folders.iter().enumerate() {
        let folder_path = segments[..=depth].join("/");
        let pos = match level
            .iter()
            .position(|n| n.is_folder() && n.path() == folder_path)
        {
            Some(pos) => pos,
            None => {
                level.push(TreeNode::Folder {
                    name: (*segment).to_string(),
                    path: folder_path,
                    children: Vec::new(),
                });
                level.len() - 1
            }
        };
        level = match &mut level[pos] {
            TreeNode::Folder { children, .. } => children,
            TreeNode::File { .. } => unreachable!("position matched a folder"),
        };
    }

    level.push(TreeNode::File {
        name: track.name.clone(),
        path: track.path.clone(),
        track,
    });
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a, b) {
        (TreeNode::Folder { .. }, TreeNode::File { .. }) => Ordering::Less,
        (TreeNode::File { .. }, TreeNode::Folder { .. }) => Ordering::Greater,
        (TreeNode::File { track: ta, .. }, TreeNode::File { track: tb, .. }) => {
            natural_cmp(a.name(), b.name()).then_with(|| ta.id.cmp(&tb.id))
        }
        _ => natural_cmp(a.name(), b.name()),
    }
}

fn sort_and_flatten(nodes: &mut [TreeNode], flat: &mut Vec<Track>) {
    nodes.sort_by(compare_nodes);
    for node in nodes.iter_mut() {
        match node {
            TreeNode::Folder { children, .. } => sort_and_flatten(children, flat),
            TreeNode::File { track, .. } => flat.push(track.clone()),
        }
    }
}
