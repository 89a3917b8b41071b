use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};

pub type SongId = String;
pub type AlbumId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
}

impl Song {
    /// Path of the audio stream, relative to the API root.
    pub fn stream_path(&self) -> String {
        format!("/music/song/{}/stream", self.id)
    }
}

/// One row of the song manifest. Newer servers call the album field `album_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct SongEntry {
    #[serde(default)]
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default, alias = "album_id")]
    pub album: Option<AlbumId>,
}

impl From<SongEntry> for Song {
    fn from(entry: SongEntry) -> Song {
        Song {
            id: entry.id,
            title: entry.title,
            artist: entry.artist,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: AlbumId,
    #[serde(default)]
    pub title: String,
    // older clients called this the compiler
    #[serde(default, alias = "compiler")]
    pub album_artist: String,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<u32>,
    #[serde(default)]
    pub tracks: Vec<SongId>,
    #[serde(
        rename = "cover",
        default = "cover_assumed",
        deserialize_with = "deserialize_cover"
    )]
    pub has_cover: bool,
}

impl Album {
    /// Order albums by artist (ignoring a leading quote and "the") and then by year.
    pub fn compare(&self, other: &Album) -> Ordering {
        artist_sort_key(&self.album_artist)
            .cmp(&artist_sort_key(&other.album_artist))
            .then_with(|| self.year.cmp(&other.year))
    }
}

/// Lowercases `artist`, drops a leading `"` and removes every `the` that is
/// followed by a non-word character, together with that character.
pub fn artist_sort_key(artist: &str) -> String {
    let lowered = artist.to_lowercase();
    let mut rest = lowered.strip_prefix('"').unwrap_or(&lowered);
    let mut key = String::with_capacity(rest.len());

    while let Some(pos) = rest.find("the") {
        let after = &rest[pos + 3..];
        match after.chars().next() {
            Some(c) if !is_word_char(c) => {
                key.push_str(&rest[..pos]);
                rest = &after[c.len_utf8()..];
            }
            _ => {
                key.push_str(&rest[..pos + 3]);
                rest = after;
            }
        }
    }
    key.push_str(rest);

    key
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Number(i64),
    Text(String),
}

// Servers send the year as a number, a string, or 0/null when unknown.
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Option::<RawYear>::deserialize(deserializer)? {
        Some(RawYear::Number(n)) => u32::try_from(n).ok(),
        Some(RawYear::Text(text)) => text.trim().parse().ok(),
        None => None,
    };

    Ok(year.filter(|y| *y != 0))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCover {
    Flag(bool),
    Path(String),
}

fn cover_assumed() -> bool {
    true
}

fn deserialize_cover<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawCover>::deserialize(deserializer)? {
        Some(RawCover::Flag(flag)) => flag,
        Some(RawCover::Path(path)) => !path.is_empty(),
        None => false,
    })
}
