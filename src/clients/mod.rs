/// External player process used as audio output
pub mod audio;
/// Songs, albums and their ordering
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Media server API client
pub mod media_library;
/// Thumbnail bundle decoding
pub mod thumbnail;

pub use audio::ProcessSink;
pub use media_library::MediaLibrary;
