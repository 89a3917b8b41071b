use std::io::Write;
use std::ops::ControlFlow;
use std::str::FromStr;

use bytes::Bytes;
use log::{debug, error, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::clients::{
    MediaLibrary,
    entities::{Album, AlbumId},
    errors::{Error, Result},
};
use crate::cover::CoverSwitcher;
use crate::player::{AudioSink, Player, SinkEvent};
use crate::render;

pub const HELP: &str = "\
commands:
  p, play      play/pause, or shuffle everything when stopped
  n, skip      next song
  a, albums    show/hide the album grid
  b, back      back to the player
  s, shuffle   shuffle all songs
  <number>     play a grid entry (0 shuffles)
  r, refresh   reload the song manifest
  h, help      this text
  q, quit      exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Player,
    Albums,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Skip,
    Albums,
    Back,
    Shuffle,
    Select(usize),
    Refresh,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim().to_lowercase();
        if let Ok(index) = input.parse::<usize>() {
            return Ok(Command::Select(index));
        }

        match input.as_str() {
            "p" | "play" | "pause" => Ok(Command::Play),
            "n" | "skip" | "next" => Ok(Command::Skip),
            "a" | "albums" => Ok(Command::Albums),
            "b" | "back" => Ok(Command::Back),
            "s" | "shuffle" => Ok(Command::Shuffle),
            "r" | "refresh" => Ok(Command::Refresh),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(Error::InvalidCommand(other.to_string())),
        }
    }
}

/// All albums in display order, each with its thumbnail. A failed thumbnail
/// request leaves every album without one.
pub async fn load_grid(library: &mut MediaLibrary) -> Result<Vec<(Album, Option<Bytes>)>> {
    let mut albums = library.get_albums().await?;
    albums.sort_by(Album::compare);

    let ids: Vec<AlbumId> = albums.iter().map(|a| a.id.clone()).collect();
    let thumbnails = match library.get_thumbnails(&ids).await {
        Ok(thumbnails) => thumbnails,
        Err(e) => {
            warn!("Album thumbnails unavailable: {e}");
            vec![None; ids.len()]
        }
    };

    Ok(albums.into_iter().zip(thumbnails).collect())
}

/// The player widget: library, transport, cover and album grid.
pub struct App<S> {
    library: MediaLibrary,
    player: Player<S>,
    covers: CoverSwitcher,
    view: View,
    grid: Vec<(Album, Option<Bytes>)>,
    columns: usize,
    message: Option<String>,
}

impl<S: AudioSink> App<S> {
    pub fn new(
        library: MediaLibrary,
        player: Player<S>,
        covers: CoverSwitcher,
        columns: usize,
    ) -> Self {
        App {
            library,
            player,
            covers,
            view: View::Player,
            grid: Vec::new(),
            columns,
            message: None,
        }
    }

    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    pub fn player(&self) -> &Player<S> {
        &self.player
    }

    pub fn covers(&self) -> &CoverSwitcher {
        &self.covers
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn grid(&self) -> &[(Album, Option<Bytes>)] {
        &self.grid
    }

    /// Play button: pause/resume what is loaded, otherwise shuffle everything.
    pub async fn press_play(&mut self) -> Result<()> {
        if self.player.is_playing() || self.player.is_paused() {
            self.player.toggle_pause().await?;
            self.on_play().await
        } else {
            self.shuffle().await
        }
    }

    pub async fn press_skip(&mut self) -> Result<()> {
        self.player.skip();
        self.on_play().await
    }

    pub async fn shuffle(&mut self) -> Result<()> {
        let songs = self.library.shuffle().await?;
        self.player.play(songs);
        self.on_play().await
    }

    /// Albums button: show the grid, or hide it when it is showing.
    pub async fn toggle_albums(&mut self) -> Result<()> {
        match self.view {
            View::Albums => {
                self.back();
                Ok(())
            }
            View::Player => self.show_albums().await,
        }
    }

    pub async fn show_albums(&mut self) -> Result<()> {
        if self.library.album_ids().is_empty() {
            self.library.refresh().await?;
        }

        self.grid = load_grid(&mut self.library).await?;
        self.view = View::Albums;
        Ok(())
    }

    pub fn back(&mut self) {
        self.view = View::Player;
    }

    /// Play grid entry `index`; entry 0 is the shuffle entry.
    pub async fn select(&mut self, index: usize) -> Result<()> {
        if index == 0 {
            return self.shuffle().await;
        }

        let tracks = match self.grid.get(index - 1) {
            Some((album, _)) => album.tracks.clone(),
            None => {
                return Err(Error::InvalidCommand(format!(
                    "there is no album number {index}"
                )));
            }
        };
        if tracks.iter().any(|id| self.library.get_song(id).is_none()) {
            self.library.refresh().await?;
        }

        let songs = self.library.songs_for(&tracks);
        self.player.play(songs);
        self.on_play().await
    }

    pub async fn handle_sink_event(&mut self, event: SinkEvent) -> Result<()> {
        if self.player.handle_event(event) {
            self.on_play().await?;
        }
        Ok(())
    }

    // Keep the cover in step with the transport
    async fn on_play(&mut self) -> Result<()> {
        let cover = match self.player.now_playing() {
            Some(song) => {
                let song_id = song.id.clone();
                match self.library.get_album_by_song(&song_id).await {
                    Ok(album) => self.library.get_cover(&album).await?,
                    Err(e) => {
                        warn!("No cover for song {song_id}: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        self.covers.switch(cover).await?;
        Ok(())
    }

    /// Run one text command. Errors are logged and shown, never fatal.
    pub async fn dispatch(&mut self, line: &str) -> ControlFlow<()> {
        if line.trim().is_empty() {
            return ControlFlow::Continue(());
        }
        self.message = None;

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                self.message = Some(format!("{e} (h for help)"));
                return ControlFlow::Continue(());
            }
        };
        debug!("Dispatching {command:?}");

        let result = match command {
            Command::Play => self.press_play().await,
            Command::Skip => self.press_skip().await,
            Command::Albums => self.toggle_albums().await,
            Command::Back => {
                self.back();
                Ok(())
            }
            Command::Shuffle => self.shuffle().await,
            Command::Select(index) => self.select(index).await,
            Command::Refresh => self.library.refresh().await.map(|count| {
                self.message = Some(format!("{count} songs"));
            }),
            Command::Help => {
                self.message = Some(HELP.to_string());
                Ok(())
            }
            Command::Quit => return ControlFlow::Break(()),
        };

        if let Err(e) = result {
            error!("{command:?} failed: {e}");
            self.message = Some(e.to_string());
        }
        ControlFlow::Continue(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.view == View::Albums {
            out.push_str(&render::album_grid(
                &self.grid,
                self.columns,
                render::CELL_WIDTH,
            ));
        }

        let caption = render::caption(self.player.now_playing());
        if caption.is_empty() {
            out.push_str("(nothing playing)\n");
        } else {
            out.push_str(&caption);
            out.push('\n');
        }
        out.push_str(&render::transport_line(
            self.player.state(),
            self.player.queued(),
        ));
        out.push('\n');

        if let Some(message) = &self.message {
            out.push_str(message);
            out.push('\n');
        }
        out
    }

    /// Read commands from `input` and react to sink events until `quit` or
    /// end of input. The widget is redrawn to `out` after every change.
    pub async fn run<R, W>(
        &mut self,
        input: R,
        events: &mut mpsc::UnboundedReceiver<SinkEvent>,
        out: &mut W,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        write!(out, "{}", self.render())?;
        out.flush()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.dispatch(&line).await.is_break() {
                        break;
                    }
                }
                Some(event) = events.recv() => {
                    if let Err(e) = self.handle_sink_event(event).await {
                        error!("Failed to update after playback event: {e}");
                    }
                }
            }

            write!(out, "\n{}", self.render())?;
            out.flush()?;
        }

        self.player.stop()?;
        self.covers.switch(None).await?;
        Ok(())
    }
}
