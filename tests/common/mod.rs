#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bumplayer::clients::errors::Result;
use bumplayer::clients::thumbnail::encode_bundle;
use bumplayer::player::AudioSink;
use serde_json::{Value, json};

pub const BEATLES_COVER: &[u8] = b"beatles-cover-jpeg";
pub const BEATLES_THUMB: &[u8] = b"beatles-thumb";
pub const ZAPPA_COVER: &[u8] = b"zappa-cover-jpeg";
pub const ZAPPA_THUMB: &[u8] = b"zappa-thumb";

/// How the stub answers a thumbnail request.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BundleShape {
    /// One record per requested id.
    Exact,
    /// Cut off in the middle of the last record.
    Truncated,
    /// The last requested id gets no record at all.
    MissingLast,
    /// One unrequested record is appended.
    ExtraRecord,
}

#[derive(Clone)]
pub struct Fixture {
    pub songs: Value,
    pub albums: Option<Value>,
    pub covers: HashMap<String, Vec<u8>>,
    pub thumbnails: HashMap<String, Vec<u8>>,
    pub bundle: BundleShape,
}

impl Fixture {
    pub fn library() -> Self {
        Fixture {
            songs: json!([
                {"id": "s1", "title": "Come Together", "artist": "The Beatles", "album": "a-beatles"},
                {"id": "s2", "title": "Something", "artist": "The Beatles", "album": "a-beatles"},
                {"id": "s3", "title": "Dancing Queen", "artist": "ABBA", "album": "a-abba"},
                {"id": "broken"},
                {"id": "s4", "title": "Peaches en Regalia", "artist": "Frank Zappa", "album_id": "a-zappa"}
            ]),
            albums: Some(json!([
                {"id": "a-beatles", "title": "Abbey Road", "album_artist": "The Beatles", "year": 1969, "tracks": ["s1", "s2"]},
                {"id": "a-abba", "title": "Arrival", "album_artist": "ABBA", "year": 1976, "tracks": ["s3"], "cover": false},
                {"id": "a-zappa", "title": "Hot Rats", "compiler": "Frank Zappa", "year": "1969", "tracks": ["s4"]}
            ])),
            covers: HashMap::from([
                ("a-beatles".to_string(), BEATLES_COVER.to_vec()),
                ("a-zappa".to_string(), ZAPPA_COVER.to_vec()),
            ]),
            thumbnails: HashMap::from([
                ("a-beatles".to_string(), BEATLES_THUMB.to_vec()),
                ("a-zappa".to_string(), ZAPPA_THUMB.to_vec()),
            ]),
            bundle: BundleShape::Exact,
        }
    }

    fn album(&self, id: &str) -> Option<Value> {
        self.albums
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|albums| albums.iter().find(|a| a["id"] == id).cloned())
    }
}

#[derive(Default)]
pub struct Hits {
    pub songs: AtomicUsize,
    pub albums: AtomicUsize,
    pub metadata: AtomicUsize,
    pub covers: AtomicUsize,
    pub thumbnail_ids: Mutex<Vec<String>>,
}

pub struct StubServer {
    pub root: String,
    pub hits: Arc<Hits>,
}

struct ServerState {
    fixture: Fixture,
    // /albums 404s but per album metadata is still served
    metadata: HashMap<String, Value>,
    hits: Arc<Hits>,
}

/// Serve `fixture` as a media server API on a free local port.
pub async fn serve(fixture: Fixture) -> StubServer {
    serve_with_metadata(fixture.clone(), fixture).await
}

/// Like [`serve`], but per album metadata comes from `metadata_source`.
pub async fn serve_with_metadata(fixture: Fixture, metadata_source: Fixture) -> StubServer {
    let metadata = ["a-beatles", "a-abba", "a-zappa"]
        .iter()
        .filter_map(|id| metadata_source.album(id).map(|a| ((*id).to_string(), a)))
        .collect();
    let hits = Arc::new(Hits::default());
    let state = Arc::new(ServerState {
        fixture,
        metadata,
        hits: hits.clone(),
    });

    let app = Router::new()
        .route("/api/music/songs", get(songs))
        .route("/api/music/albums", get(albums))
        .route("/api/music/album/{id}/metadata", get(metadata_handler))
        .route("/api/music/album/{id}/cover", get(cover))
        .route("/api/music/thumbnail", get(thumbnail))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubServer {
        root: format!("http://{addr}/api"),
        hits,
    }
}

async fn songs(State(state): State<Arc<ServerState>>) -> Json<Value> {
    state.hits.songs.fetch_add(1, Ordering::SeqCst);
    Json(state.fixture.songs.clone())
}

async fn albums(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.albums.fetch_add(1, Ordering::SeqCst);
    match &state.fixture.albums {
        Some(albums) => Json(albums.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn metadata_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Response {
    state.hits.metadata.fetch_add(1, Ordering::SeqCst);
    match state.metadata.get(&id) {
        Some(album) => Json(album.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn cover(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> Response {
    state.hits.covers.fetch_add(1, Ordering::SeqCst);
    match state.fixture.covers.get(&id) {
        Some(data) => data.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn thumbnail(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ids = params.get("ids").cloned().unwrap_or_default();
    state.hits.thumbnail_ids.lock().unwrap().push(ids.clone());

    let mut records: Vec<Option<Vec<u8>>> = ids
        .split(',')
        .map(|id| state.fixture.thumbnails.get(id).cloned())
        .collect();
    match state.fixture.bundle {
        BundleShape::MissingLast => {
            records.pop();
        }
        BundleShape::ExtraRecord => records.push(Some(b"unrequested".to_vec())),
        BundleShape::Exact | BundleShape::Truncated => {}
    }

    let mut bundle = encode_bundle(&records);
    if state.fixture.bundle == BundleShape::Truncated {
        bundle.truncate(bundle.len() - 1);
    }
    bundle.into_response()
}

/// Audio sink that only records what it was asked to do.
#[derive(Default)]
pub struct RecordingSink {
    pub loads: Vec<(String, u64)>,
    pub paused: bool,
    pub stopped: usize,
}

impl RecordingSink {
    pub fn last_generation(&self) -> u64 {
        self.loads.last().map_or(0, |(_, generation)| *generation)
    }
}

impl AudioSink for RecordingSink {
    fn load(&mut self, url: &str, generation: u64) -> Result<()> {
        self.loads.push((url.to_string(), generation));
        self.paused = false;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.paused = true;
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.paused = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped += 1;
        Ok(())
    }
}
