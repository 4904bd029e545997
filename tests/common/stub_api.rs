//! Stub Spotify Web API served by axum on a background runtime.
//!
//! Every request is recorded as "METHOD /path?query". Tests can force error
//! statuses on requests matching a prefix with `fail_next`.

use super::constants::*;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::net::TcpListener;

struct ForcedStatus {
    prefix: String,
    status: StatusCode,
    remaining: usize,
}

#[derive(Clone, Default)]
struct StubState {
    requests: Arc<Mutex<Vec<String>>>,
    forced: Arc<Mutex<Vec<ForcedStatus>>>,
}

impl StubState {
    fn take_forced(&self, request_line: &str) -> Option<StatusCode> {
        let mut forced = self.forced.lock().unwrap();
        let entry = forced
            .iter_mut()
            .find(|f| f.remaining > 0 && request_line.starts_with(&f.prefix))?;
        entry.remaining -= 1;
        Some(entry.status)
    }
}

/// Stub server instance. The server shuts down when this is dropped.
pub struct StubApi {
    pub base_url: String,
    state: StubState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl StubApi {
    /// Binds to a random port and serves from a dedicated thread, so the
    /// blocking client under test can call it from the test thread.
    pub fn spawn() -> Self {
        let state = StubState::default();
        let app = make_app(state.clone());
        let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build stub runtime");
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind stub api");
                addr_tx
                    .send(listener.local_addr().expect("Failed to get local address"))
                    .expect("Stub api owner went away");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .expect("Stub api failed");
            });
        });

        let addr = addr_rx.recv().expect("Stub api did not start");
        Self {
            base_url: format!("http://{}", addr),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    /// Answers the next `times` requests starting with `request_prefix`
    /// (e.g. "GET /v1/recommendations") with `status` instead of routing them.
    pub fn fail_next(&self, request_prefix: &str, status: u16, times: usize) {
        self.state.forced.lock().unwrap().push(ForcedStatus {
            prefix: request_prefix.to_string(),
            status: StatusCode::from_u16(status).expect("Invalid status code"),
            remaining: times,
        });
    }

    /// "METHOD /path?query" of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

fn make_app(state: StubState) -> Router {
    Router::new()
        .route("/api/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/recommendations", get(recommendations))
        .route("/v1/tracks/{id}", get(track))
        .route("/v1/audio-features/{id}", get(audio_features))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

async fn record_request(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let line = format!("{} {}", request.method(), target);
    state.requests.lock().unwrap().push(line.clone());

    if let Some(status) = state.take_forced(&line) {
        return (status, Json(json!({ "error": { "status": status.as_u16() } }))).into_response();
    }
    next.run(request).await
}

async fn token() -> Json<Value> {
    Json(json!({ "access_token": STUB_TOKEN, "token_type": "Bearer", "expires_in": 3600 }))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let items = match params.get("q") {
        Some(q) if q == KNOWN_ARTIST => json!([{ "id": KNOWN_ARTIST_ID, "name": KNOWN_ARTIST }]),
        _ => json!([]),
    };
    Json(json!({ "artists": { "items": items } }))
}

async fn recommendations() -> Json<Value> {
    Json(json!({ "tracks": [
        { "id": TRACK_WITH_PREVIEW_ID },
        { "id": TRACK_WITHOUT_PREVIEW_ID },
    ] }))
}

async fn track(Path(id): Path<String>) -> Response {
    let body = if id == TRACK_WITH_PREVIEW_ID {
        json!({
            "id": TRACK_WITH_PREVIEW_ID,
            "name": TRACK_WITH_PREVIEW_NAME,
            "artists": [{ "name": KNOWN_ARTIST }, { "name": "Guest" }],
            "album": { "images": [
                { "url": "https://img.example/large.jpg" },
                { "url": "https://img.example/medium.jpg" },
                { "url": "https://img.example/small.jpg" },
            ] },
            "popularity": 64,
            "preview_url": "https://preview.example/track-1.mp3",
            "external_urls": { "spotify": "https://open.example/track/track-1" },
        })
    } else if id == TRACK_WITHOUT_PREVIEW_ID {
        json!({
            "id": TRACK_WITHOUT_PREVIEW_ID,
            "name": "Silent Track",
            "artists": [{ "name": KNOWN_ARTIST }],
            "album": { "images": [] },
            "popularity": 10,
            "preview_url": null,
        })
    } else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response();
    };
    Json(body).into_response()
}

async fn audio_features(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({
        "acousticness": 0.12,
        "danceability": 0.81,
        "duration_ms": 201000,
        "energy": 0.7,
        "instrumentalness": 0.0,
        "key": 7,
        "liveness": 0.09,
        "loudness": -4.2,
        "mode": 0,
        "speechiness": 0.05,
        "tempo": 124.0,
        "valence": 0.66,
    }))
}
