pub mod annotations;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod hotkeys;
pub mod library;
pub mod media;
pub mod session;
pub mod store;
pub mod subtitles;
pub mod utils;
