use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::{Event, Sse}, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::{OptimizationParams, ServerConfig};
use crate::error::ValidationError;
use crate::export::timetable_to_csv;
use crate::models::{CatalogInput, OptimizationProgress, OptimizationResult, ScheduleEntry};
use crate::orchestrator::{RunContext, StopFlag};
use crate::service::{OptimizationHandle, OptimizationRequest};
use crate::tune::{tune, ParamRange};

/// Shared server state. At most one optimization runs at a time, so the
/// status stream carries a single ordered sequence of snapshots.
#[derive(Clone)]
pub struct AppState {
    pub status_tx: broadcast::Sender<OptimizationProgress>,
    /// Stop flag of the request currently running, if any.
    pub active_stop: Arc<Mutex<Option<StopFlag>>>,
}

impl AppState {
    pub fn new(progress_capacity: usize) -> Self {
        let (status_tx, _) = broadcast::channel(progress_capacity);
        Self {
            status_tx,
            active_stop: Arc::new(Mutex::new(None)),
        }
    }
}

fn error_response(status: StatusCode, err: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "success": false, "error": err.to_string() }))).into_response()
}

/// Registration of the running request in `AppState::active_stop`.
///
/// Dropping it stops the request, which matters when the client goes away
/// before the result is ready, and frees the slot if it still holds this
/// request's flag.
struct ActiveRequest {
    slot: Arc<Mutex<Option<StopFlag>>>,
    flag: StopFlag,
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.flag.stop();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|f| f.same_as(&self.flag)) {
            *slot = None;
        }
    }
}

pub async fn stop_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let active = state
        .active_stop
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let stopped = match active {
        Some(flag) => {
            flag.stop();
            true
        }
        None => false,
    };
    Json(json!({ "success": true, "stopped": stopped }))
}

pub async fn status_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>> + 'static> {
    let mut rx = state.status_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(status) => match serde_json::to_string(&status) {
                    Ok(data) => yield Ok(Event::default().data(data).event("status")),
                    Err(e) => error!("Serialization error: {}", e),
                },
                // Slow client: skip the snapshots it missed.
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Status stream lagged, dropped {} snapshots", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
}

pub async fn optimize_handler(
    State(state): State<AppState>,
    Json(req): Json<OptimizationRequest>,
) -> Response {
    let (handle, _active) = {
        let mut slot = state
            .active_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            warn!("Rejected optimization request: another request is running");
            return error_response(
                StatusCode::CONFLICT,
                "another optimization request is already running",
            );
        }

        let ctx = RunContext::new(Some(state.status_tx.clone()));
        let handle = match OptimizationHandle::start(req, ctx) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Rejected optimization request: {}", e);
                return error_response(StatusCode::UNPROCESSABLE_ENTITY, e);
            }
        };
        *slot = Some(handle.stop_flag());
        let active = ActiveRequest {
            slot: Arc::clone(&state.active_stop),
            flag: handle.stop_flag(),
        };
        (handle, active)
    };

    let result: OptimizationResult = handle.join().await;
    Json(result).into_response()
}

pub async fn export_handler(Json(schedule): Json<Vec<ScheduleEntry>>) -> Response {
    match timetable_to_csv(&schedule) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct TuneRequest {
    pub params: OptimizationParams,
    pub range: ParamRange,
    #[serde(flatten)]
    pub catalog: CatalogInput,
}

pub async fn tune_handler(Json(req): Json<TuneRequest>) -> Response {
    let TuneRequest {
        params,
        range,
        catalog,
    } = req;

    let catalog = match Catalog::new(catalog) {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e),
    };

    match tokio::task::spawn_blocking(move || tune(&catalog, &params, &range)).await {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e),
        Err(e) => {
            error!("Tuning task failed: {}", e);
            Json(OptimizationResult::failure(format!("internal error: {e}"))).into_response()
        }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Result<Router, ValidationError> {
    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|_| {
        ValidationError::parameter(
            ServerConfig::ALLOWED_ORIGIN_VAR,
            format!("`{}` is not a valid origin", config.allowed_origin),
        )
    })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    Ok(Router::new()
        .route("/optimize", post(optimize_handler))
        .route("/status", get(status_handler))
        .route("/stop", post(stop_handler))
        .route("/export", post(export_handler))
        .route("/tune", post(tune_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
