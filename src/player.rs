use log::{debug, error, info};

use crate::clients::{entities::Song, errors::Result};

/// Audio output driven by the [`Player`].
///
/// A sink plays one stream at a time. It reports the end of a stream, or a
/// failure while playing it, as a [`SinkEvent`] tagged with the generation that
/// was passed to [`AudioSink::load`].
pub trait AudioSink {
    /// Replace whatever is playing with `url` and start it.
    fn load(&mut self, url: &str, generation: u64) -> Result<()>;
    fn pause(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn resume(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn stop(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEventKind {
    Ended,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkEvent {
    pub generation: u64,
    pub kind: SinkEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing(Song),
    Paused(Song),
}

pub struct Player<S> {
    sink: S,
    stream_root: String,
    // reversed, the next song is at the end
    playlist: Vec<Song>,
    state: PlaybackState,
    generation: u64,
}

impl<S: AudioSink> Player<S> {
    pub fn new(sink: S, stream_root: impl Into<String>) -> Self {
        Player {
            sink,
            stream_root: stream_root.into().trim_end_matches('/').to_string(),
            playlist: Vec::new(),
            state: PlaybackState::Stopped,
            generation: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// The song that is playing or paused.
    pub fn now_playing(&self) -> Option<&Song> {
        match &self.state {
            PlaybackState::Playing(song) | PlaybackState::Paused(song) => Some(song),
            PlaybackState::Stopped => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing(_))
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, PlaybackState::Paused(_))
    }

    pub fn queued(&self) -> usize {
        self.playlist.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Replace the playlist and start its first song.
    pub fn play(&mut self, songs: Vec<Song>) {
        debug!("Playing a list of {} songs", songs.len());
        self.playlist = songs;
        self.playlist.reverse();
        self.advance();
    }

    pub async fn toggle_pause(&mut self) -> Result<()> {
        match std::mem::take(&mut self.state) {
            PlaybackState::Paused(song) => {
                if let Err(e) = self.sink.resume().await {
                    self.state = PlaybackState::Paused(song);
                    return Err(e);
                }
                self.state = PlaybackState::Playing(song);
            }
            PlaybackState::Playing(song) => {
                if let Err(e) = self.sink.pause().await {
                    self.state = PlaybackState::Playing(song);
                    return Err(e);
                }
                self.state = PlaybackState::Paused(song);
            }
            PlaybackState::Stopped => {}
        }
        Ok(())
    }

    pub fn skip(&mut self) {
        self.advance();
    }

    /// Drop the playlist and silence the sink.
    pub fn stop(&mut self) -> Result<()> {
        self.playlist.clear();
        self.state = PlaybackState::Stopped;
        self.generation += 1;
        self.sink.stop()
    }

    /// Apply a sink event. Returns whether the state changed.
    pub fn handle_event(&mut self, event: SinkEvent) -> bool {
        if event.generation != self.generation {
            debug!(
                "Ignoring event for stale stream {} (current {})",
                event.generation, self.generation
            );
            return false;
        }

        if let SinkEventKind::Failed(reason) = &event.kind {
            let id = self.now_playing().map_or("unknown", |s| s.id.as_str());
            error!("Error playing {id}: {reason}");
        }
        self.advance();
        true
    }

    fn advance(&mut self) {
        self.state = PlaybackState::Stopped;

        while let Some(song) = self.playlist.pop() {
            self.generation += 1;
            let url = format!("{}{}", self.stream_root, song.stream_path());
            match self.sink.load(&url, self.generation) {
                Ok(()) => {
                    info!("Now playing {} - {}", song.artist, song.title);
                    self.state = PlaybackState::Playing(song);
                    return;
                }
                Err(e) => error!("Error playing {}: {e}", song.id),
            }
        }

        if let Err(e) = self.sink.stop() {
            error!("Failed to stop audio output: {e}");
        }
    }
}
