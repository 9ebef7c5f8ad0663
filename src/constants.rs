//! Tunables shared by the library, the session and the command line.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Directories to skip during file system traversal
pub const SKIP_DIRECTORIES: &[&str] = &["node_modules", ".git", "temp"];

/// Audio file extensions accepted into the catalog
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac"];

/// Folder name reported for tracks that sit at the library root
pub const ROOT_FOLDER_NAME: &str = "Root";

/// Descriptors processed per ingestion chunk before yielding
pub const INGEST_CHUNK_SIZE: usize = 20;

/// Stored tracks revived per chunk when restoring the library at startup
pub const RESTORE_CHUNK_SIZE: usize = 50;

/// Label given to markers dropped at the playhead
pub const DEFAULT_MARKER_LABEL: &str = "Marker";

/// Amber
pub const DEFAULT_MARKER_COLOR: &str = "#fbbf24";

/// Length of a subtitle segment inserted at the playhead
pub const DEFAULT_SUBTITLE_SECONDS: f64 = 2.0;

/// Offset applied by the seek hotkeys
pub const SEEK_OFFSET_SECONDS: f64 = 3.0;

/// Playback rates offered by the rate selector, slowest first
pub const PLAYBACK_RATES: &[f32] = &[0.25, 0.5, 1.0, 1.5, 2.0];

pub const MIN_PLAYBACK_RATE: f32 = 0.25;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;
