use crate::service::ServiceError;
use crate::state::{AppState, StreamUpdate};
use crate::training::JoinOutput;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rail_core::{SessionSnapshot, SimError, Snapshot};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, HeaderValue::from_static("http://localhost:5173"))
}

pub fn make_router_with_cors(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/simulation", get(simulation_handler))
        .route("/api/v1/simulation/tick", post(tick_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .route("/api/v1/session", get(session_handler))
        .route("/api/v1/session/join", post(join_handler))
        .route("/api/v1/session/leave", post(leave_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body: `{"error": {"code": ..., "message": ...}}`.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_json(rejection: &JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_JSON",
            message: rejection.body_text(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let (status, code) = match &err {
            ServiceError::InvalidTickDelta(_) => (StatusCode::BAD_REQUEST, "INVALID_TICK_DELTA"),
            ServiceError::InvalidDispatcherId(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_DISPATCHER_ID")
            }
            ServiceError::InvalidDispatcherName(_) => (StatusCode::BAD_REQUEST, "INVALID_NAME"),
            ServiceError::Simulation(SimError::DispatcherAlreadyExists(_)) => {
                (StatusCode::CONFLICT, "DISPATCHER_ALREADY_EXISTS")
            }
            ServiceError::Simulation(SimError::DispatcherNotFound(_)) => {
                (StatusCode::NOT_FOUND, "DISPATCHER_NOT_FOUND")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {err:#}");
            return Self {
                status,
                code,
                message: "internal error".to_string(),
            };
        }
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    pub delta_millis: i64,
}

/// Missing fields decode as empty strings and fail id/name validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub dispatcher_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[serde(default)]
    pub dispatcher_id: String,
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "session": app_state.service.session().as_str(),
        "simTimeMillis": app_state.service.sim_time_millis(),
        "ticksPerSec": app_state.ticks_per_sec,
        "tickMillis": app_state.tick_millis,
        "paused": app_state.paused.load(Ordering::Relaxed),
    }))
}

pub async fn simulation_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(app_state.service.get_simulation()?))
}

pub async fn tick_handler(
    State(app_state): State<AppState>,
    request: Result<Json<TickRequest>, JsonRejection>,
) -> Result<Json<Snapshot>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::bad_json(&rejection))?;
    let update = app_state.service.tick(request.delta_millis)?;
    let snapshot = update.snapshot.clone();
    let _ = app_state.event_tx.send(StreamUpdate::Tick(update));
    Ok(Json(snapshot))
}

pub async fn session_handler(
    State(app_state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(app_state.training.snapshot(Utc::now())?))
}

pub async fn join_handler(
    State(app_state): State<AppState>,
    request: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinOutput>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::bad_json(&rejection))?;
    let (output, events) = app_state
        .training
        .join(&request.dispatcher_id, &request.name, Utc::now())?;
    publish_session_events(&app_state, events);
    Ok(Json(output))
}

pub async fn leave_handler(
    State(app_state): State<AppState>,
    request: Result<Json<LeaveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::bad_json(&rejection))?;
    let events = app_state
        .training
        .leave(&request.dispatcher_id, Utc::now())?;
    publish_session_events(&app_state, events);
    Ok(Json(serde_json::json!({"ok": true})))
}

fn publish_session_events(app_state: &AppState, events: Vec<rail_core::SessionEvent>) {
    for event in events {
        tracing::info!(event = ?event, "session event");
        let _ = app_state.event_tx.send(StreamUpdate::Session(event));
    }
}

pub async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

pub async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.event_tx.subscribe();
    let service = app_state.service.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(5));
        heartbeat.tick().await; // discard the immediate first tick
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(update) => {
                            if let Some(event) = sse_event(&update) {
                                yield Ok(event);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "stream subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    let hb = serde_json::json!({
                        "heartbeat": true,
                        "simTimeMillis": service.sim_time_millis(),
                    });
                    yield Ok(Event::default().event("heartbeat").data(hb.to_string()));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Serializes one stream update; a failure is logged and the update skipped.
fn sse_event(update: &StreamUpdate) -> Option<Event> {
    let (name, data) = match update {
        StreamUpdate::Tick(tick) => ("tick", serde_json::to_string(tick)),
        StreamUpdate::Session(event) => ("session", serde_json::to_string(event)),
    };
    match data {
        Ok(data) => Some(Event::default().event(name).data(data)),
        Err(err) => {
            tracing::warn!(event = name, "dropping stream update that failed to serialize: {err}");
            None
        }
    }
}
