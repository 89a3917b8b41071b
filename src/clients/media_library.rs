use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use futures::future::join_all;
use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use serde_json::Value;

use crate::clients::{
    entities::{Album, AlbumId, Song, SongEntry, SongId},
    errors::{Error, Result},
    thumbnail::decode_bundle,
};

// Client side view of the media server. Everything fetched is memoized until
// the next refresh (songs) or for the lifetime of the library (albums, covers).
pub struct MediaLibrary {
    root: String,
    http: reqwest::Client,

    songs: Vec<SongId>,
    albums: Vec<AlbumId>,

    song_cache: HashMap<SongId, Song>,
    album_cache: HashMap<AlbumId, Album>,
    album_index: HashMap<SongId, AlbumId>,

    covers: HashMap<AlbumId, Option<Bytes>>,
    thumbnails: HashMap<AlbumId, Option<Bytes>>,
}

impl MediaLibrary {
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_client(root, reqwest::Client::new())
    }

    pub fn with_client(root: impl Into<String>, http: reqwest::Client) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        MediaLibrary {
            root,
            http,
            songs: Vec::new(),
            albums: Vec::new(),
            song_cache: HashMap::new(),
            album_cache: HashMap::new(),
            album_index: HashMap::new(),
            covers: HashMap::new(),
            thumbnails: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Reload the song manifest. Returns the number of songs now known.
    pub async fn refresh(&mut self) -> Result<usize> {
        let url = format!("{}/music/songs", self.root);
        debug!("Fetching song manifest from {url}");
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut songs = Vec::new();
        let mut albums = Vec::new();
        let mut seen_albums = HashSet::new();
        let mut song_cache = HashMap::new();

        for raw in raw_entries(body)? {
            let entry: SongEntry = match serde_json::from_value(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unparsable song entry: {e}");
                    continue;
                }
            };
            if entry.id.is_empty() || song_cache.contains_key(&entry.id) {
                warn!("Skipping song entry with missing or duplicate id {:?}", entry.id);
                continue;
            }

            if let Some(album_id) = &entry.album {
                if seen_albums.insert(album_id.clone()) {
                    albums.push(album_id.clone());
                }
                self.album_index.insert(entry.id.clone(), album_id.clone());
            }

            songs.push(entry.id.clone());
            song_cache.insert(entry.id.clone(), Song::from(entry));
        }

        info!("Loaded {} songs across {} albums", songs.len(), albums.len());
        self.songs = songs;
        self.albums = albums;
        self.song_cache = song_cache;

        Ok(self.songs.len())
    }

    /// Refresh, then return every song in a fresh random order.
    pub async fn shuffle(&mut self) -> Result<Vec<Song>> {
        self.refresh().await?;
        Ok(self.shuffle_loaded(&mut rand::rng()))
    }

    // Fisher-Yates over the already loaded manifest
    pub fn shuffle_loaded<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Song> {
        self.songs.shuffle(rng);
        self.songs_for(&self.songs)
    }

    pub fn song_url(&self, song: &Song) -> String {
        format!("{}{}", self.root, song.stream_path())
    }

    pub fn get_song(&self, id: &str) -> Option<&Song> {
        self.song_cache.get(id)
    }

    /// Resolve song ids, skipping ids the manifest doesn't know.
    pub fn songs_for(&self, ids: &[SongId]) -> Vec<Song> {
        ids.iter()
            .filter_map(|id| {
                let song = self.get_song(id).cloned();
                if song.is_none() {
                    warn!("Song {id} is not in the manifest");
                }
                song
            })
            .collect()
    }

    pub fn album_ids(&self) -> &[AlbumId] {
        &self.albums
    }

    pub async fn get_albums(&mut self) -> Result<Vec<Album>> {
        let url = format!("{}/music/albums", self.root);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{url} is not served, fetching album metadata one by one");
            return Ok(self.fetch_known_albums().await);
        }

        let body: Value = response.error_for_status()?.json().await?;
        let mut albums = Vec::new();
        for raw in raw_entries(body)? {
            match serde_json::from_value::<Album>(raw) {
                Ok(album) if !album.id.is_empty() => {
                    self.album_cache.insert(album.id.clone(), album.clone());
                    albums.push(album);
                }
                Ok(_) => warn!("Skipping album entry without an id"),
                Err(e) => warn!("Skipping unparsable album entry: {e}"),
            }
        }

        debug!("Fetched {} albums", albums.len());
        Ok(albums)
    }

    // Older servers only expose per-album metadata
    async fn fetch_known_albums(&mut self) -> Vec<Album> {
        let missing: Vec<AlbumId> = self
            .albums
            .iter()
            .filter(|id| !self.album_cache.contains_key(*id))
            .cloned()
            .collect();

        let fetched = join_all(missing.iter().map(|id| self.fetch_album(id))).await;
        for (id, result) in missing.into_iter().zip(fetched) {
            match result {
                Ok(album) => {
                    self.album_cache.insert(id, album);
                }
                Err(e) => warn!("Failed to fetch album {id}: {e}"),
            }
        }

        self.albums
            .iter()
            .filter_map(|id| self.album_cache.get(id).cloned())
            .collect()
    }

    pub async fn get_album(&mut self, id: &str) -> Result<Album> {
        if let Some(album) = self.album_cache.get(id) {
            return Ok(album.clone());
        }

        let album = self.fetch_album(id).await?;
        self.album_cache.insert(id.to_string(), album.clone());
        Ok(album)
    }

    pub async fn get_album_by_song(&mut self, song_id: &str) -> Result<Album> {
        let album_id = self
            .album_index
            .get(song_id)
            .cloned()
            .ok_or_else(|| Error::UnknownSong(song_id.to_string()))?;
        self.get_album(&album_id).await
    }

    async fn fetch_album(&self, id: &str) -> Result<Album> {
        let url = format!("{}/music/album/{id}/metadata", self.root);
        let mut album: Album = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if album.id.is_empty() {
            album.id = id.to_string();
        }
        Ok(album)
    }

    /// Full size cover art. `None` when the album has none.
    pub async fn get_cover(&mut self, album: &Album) -> Result<Option<Bytes>> {
        if !album.has_cover {
            return Ok(None);
        }
        if let Some(cover) = self.covers.get(&album.id) {
            return Ok(cover.clone());
        }

        let url = format!("{}/music/album/{}/cover", self.root, album.id);
        let response = self.http.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                self.covers.insert(album.id.clone(), None);
                Ok(None)
            }
            status if status.is_success() => {
                let data = response.bytes().await?;
                let cover = (!data.is_empty()).then_some(data);
                self.covers.insert(album.id.clone(), cover.clone());
                Ok(cover)
            }
            status => {
                warn!("Cover for album {} unavailable: {status}", album.id);
                Ok(None)
            }
        }
    }

    /// Thumbnails for `ids`, positionally. Only ids not seen before are requested,
    /// all of them in a single bundle.
    pub async fn get_thumbnails(&mut self, ids: &[AlbumId]) -> Result<Vec<Option<Bytes>>> {
        let mut missing: Vec<&AlbumId> = Vec::new();
        for id in ids {
            if !self.thumbnails.contains_key(id) && !missing.contains(&id) {
                missing.push(id);
            }
        }

        if !missing.is_empty() {
            let url = format!("{}/music/thumbnail", self.root);
            let joined = missing
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            debug!("Requesting {} thumbnails", missing.len());

            let bundle = self
                .http
                .get(&url)
                .query(&[("ids", joined)])
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            let records = decode_bundle(&bundle)?;

            if records.len() != missing.len() {
                warn!(
                    "Requested {} thumbnails but the bundle holds {}",
                    missing.len(),
                    records.len()
                );
            }
            for (id, record) in missing.into_iter().zip(records) {
                self.thumbnails.insert(id.clone(), record);
            }
        }

        Ok(ids
            .iter()
            .map(|id| self.thumbnails.get(id).cloned().flatten())
            .collect())
    }
}

// List bodies are either `[entry, ...]` or `{"id": entry, ...}`.
fn raw_entries(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(entries) => Ok(entries),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.entry("id").or_insert(Value::String(key));
                }
                entry
            })
            .collect()),
        other => Err(Error::UnexpectedResponse(format!(
            "expected a list or an object, got {other}"
        ))),
    }
}
