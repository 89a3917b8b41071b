//! Bumplayer - a terminal player for a bum media server
//!
//! This library fetches the song manifest and album list from the server's
//! REST API, decodes thumbnail bundles, keeps the transport state and drives
//! an external audio player.

/// The player widget tying library, transport and cover together
pub mod app;
/// Client modules for the media server and the audio output
pub mod clients;
/// Configuration from the environment and command line
pub mod config;
/// Now-playing cover file
pub mod cover;
/// Transport state and the audio sink seam
pub mod player;
/// Text rendering of the widget
pub mod render;
