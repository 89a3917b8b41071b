//! Text rendering of the player widget.

use bytes::Bytes;

use crate::clients::entities::{Album, Song};
use crate::player::PlaybackState;

/// Default width of one album grid cell, in characters.
pub const CELL_WIDTH: usize = 28;

pub fn caption(song: Option<&Song>) -> String {
    song.map(|s| format!("{} - {}", s.artist, s.title))
        .unwrap_or_default()
}

pub fn transport_line(state: &PlaybackState, queued: usize) -> String {
    let play = match state {
        PlaybackState::Playing(_) => "[p] pause",
        PlaybackState::Paused(_) | PlaybackState::Stopped => "[p] play",
    };
    let status = match state {
        PlaybackState::Playing(_) => "playing",
        PlaybackState::Paused(_) => "paused",
        PlaybackState::Stopped => "stopped",
    };

    format!("{play}  [n] skip  [a] albums  ({status}, {queued} queued)")
}

/// The album grid. Entry 0 shuffles everything, entry `n` is `albums[n - 1]`.
/// Cells are `width` chars wide.
pub fn album_grid(albums: &[(Album, Option<Bytes>)], columns: usize, width: usize) -> String {
    let columns = columns.max(1);
    let width = width.max(2);
    let mut cells = vec![["[0] Shuffle".to_string(), String::new(), String::new()]];
    for (i, (album, thumbnail)) in albums.iter().enumerate() {
        cells.push(album_cell(i + 1, album, thumbnail.as_ref()));
    }

    let mut out = String::new();
    for row in cells.chunks(columns) {
        for line in 0..3 {
            let text: Vec<String> = row.iter().map(|cell| fit(&cell[line], width)).collect();
            out.push_str(text.join(" ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn album_cell(index: usize, album: &Album, thumbnail: Option<&Bytes>) -> [String; 3] {
    let year = album.year.map(|y| format!(" ({y})")).unwrap_or_default();
    let art = match thumbnail {
        Some(data) => format!("[art {} KiB]", data.len().div_ceil(1024)),
        None => "[no art]".to_string(),
    };

    [
        format!("[{index}] {}", album.title),
        format!("{}{year}", album.album_artist),
        art,
    ]
}

// Pad or cut to exactly `width` chars, marking cuts with '~'.
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{text:<width$}");
    }

    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('~');
    cut
}
