mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    region::Region,
    score::{score_location, ScoreResult},
    sun::{sun_position, sun_times, SunPosition, SunTimes},
    sync::{search_failure_message, MapFrame, MapSync, ViewState},
    tiles::Tile,
};

const MAX_GRID_SIZE: u32 = 128;

pub struct AppState {
    sync: MapSync,
    view: Mutex<ViewState>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(sync: MapSync) -> Arc<Self> {
        let (tx, _) = broadcast::channel::<String>(64);
        let view = Mutex::new(sync.default_view());
        Arc::new(Self {
            sync,
            view,
            broadcaster: tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    fn current_view(&self) -> ViewState {
        self.view.lock().expect("view lock poisoned").clone()
    }

    fn replace_view(&self, view: ViewState) {
        *self.view.lock().expect("view lock poisoned") = view;
    }

    fn publish(&self, frame: &MapFrame) {
        match serde_json::to_string(frame) {
            Ok(payload) => {
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!(error = %err, "failed to encode frame"),
        }
    }
}

pub struct WebServerConfig {
    pub app: AppConfig,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig { app, host, port } = config;
    let sync = MapSync::from_config(&app).context("building geo client")?;
    let state = AppState::new(sync);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    info!("solar map live at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/healthz", get(healthz))
        .route("/api/view", get(current_view))
        .route("/api/frame", get(frame))
        .route("/api/recenter", post(recenter))
        .route("/api/search", get(search))
        .route("/api/tiles", get(tiles))
        .route("/api/score", get(score))
        .route("/api/sun", get(sun))
        .route("/api/events", get(stream_events))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web UI");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewportQuery {
    lat: f64,
    lon: f64,
    lat_delta: Option<f64>,
    lon_delta: Option<f64>,
    at: Option<DateTime<Utc>>,
    grid: Option<u32>,
}

impl ViewportQuery {
    fn region(&self, fallback: &Region) -> Region {
        Region::new(
            self.lat,
            self.lon,
            self.lat_delta.unwrap_or(fallback.latitude_delta),
            self.lon_delta.unwrap_or(fallback.longitude_delta),
        )
    }

    fn at(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn current_view(State(state): State<Arc<AppState>>) -> Json<ViewState> {
    Json(state.current_view())
}

async fn frame(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewportQuery>,
) -> Json<MapFrame> {
    let view = {
        let mut guard = state.view.lock().expect("view lock poisoned");
        let region = query.region(&guard.region);
        guard.pan(region);
        guard.clone()
    };
    let frame = state.sync.refresh(&view, query.at());
    state.publish(&frame);
    Json(frame)
}

#[derive(Debug, Serialize)]
struct RecenterResponse {
    frame: MapFrame,
    status: Option<String>,
}

async fn recenter(State(state): State<Arc<AppState>>) -> Json<RecenterResponse> {
    let recentered = state.sync.recenter().await;
    state.replace_view(recentered.view.clone());
    let frame = state.sync.refresh(&recentered.view, Utc::now());
    state.publish(&frame);
    Json(RecenterResponse {
        frame,
        status: recentered.status,
    })
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    at: Option<DateTime<Utc>>,
}

async fn search(State(state): State<Arc<AppState>>, Query(query): Query<SearchQuery>) -> Response {
    match state.sync.search(&query.q).await {
        Ok(view) => {
            state.replace_view(view.clone());
            let frame = state.sync.refresh(&view, query.at.unwrap_or_else(Utc::now));
            state.publish(&frame);
            Json(frame).into_response()
        }
        Err(err) => {
            let status = match err {
                crate::geo::GeoError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, search_failure_message(&err))
        }
    }
}

#[derive(Debug, Serialize)]
struct TilesResponse {
    region: Region,
    tiles: Vec<Tile>,
}

async fn tiles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewportQuery>,
) -> Json<TilesResponse> {
    let region = query.region(&state.sync.default_region());
    let grid = query
        .grid
        .unwrap_or_else(|| state.sync.grid_size())
        .min(MAX_GRID_SIZE);
    Json(TilesResponse {
        region,
        tiles: state.sync.tiles(&region, query.at(), grid),
    })
}

#[derive(Debug, Deserialize)]
struct ScoreQuery {
    lat: f64,
    lon: f64,
    name: Option<String>,
}

async fn score(Query(query): Query<ScoreQuery>) -> Json<ScoreResult> {
    Json(score_location(query.lat, query.lon, query.name.as_deref()))
}

#[derive(Debug, Deserialize)]
struct SunQuery {
    lat: f64,
    lon: f64,
    at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct SunResponse {
    position: SunPosition,
    times: SunTimes,
}

async fn sun(Query(query): Query<SunQuery>) -> Json<SunResponse> {
    let at = query.at.unwrap_or_else(Utc::now);
    Json(SunResponse {
        position: sun_position(at, query.lat, query.lon),
        times: sun_times(at, query.lat, query.lon),
    })
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().event("frame").data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
