// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The API is the chart frontend's only
// surface: session control, candle snapshots, indicator configuration, and
// point-in-time value resolution.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::EngineError;
use crate::market_data::{history, Interval, SessionKey};
use crate::registry::{IndicatorParams, InstanceStyle};
use crate::resolver::TimeQuery;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/session", get(get_session))
        .route("/api/v1/session", post(switch_session))
        .route("/api/v1/candles", get(candles))
        .route("/api/v1/indicators", get(list_indicators))
        .route("/api/v1/indicators", post(add_indicator))
        .route("/api/v1/indicators/:id", patch(update_indicator))
        .route("/api/v1/indicators/:id", delete(remove_indicator))
        .route("/api/v1/resolve", get(resolve))
        .layer(cors)
        .with_state(state)
}

/// Map engine errors onto HTTP responses.
fn error_response(err: EngineError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        EngineError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        EngineError::UnknownInstance(_) => StatusCode::NOT_FOUND,
        EngineError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_s: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_s: state.start_time.elapsed().as_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Session
// =============================================================================

#[derive(Serialize)]
struct SessionResponse {
    symbol: String,
    interval: Interval,
    epoch: u64,
    candle_count: usize,
}

async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read();
    Json(SessionResponse {
        symbol: session.key().symbol.clone(),
        interval: session.key().interval,
        epoch: session.epoch(),
        candle_count: session.candle_count(),
    })
}

#[derive(Deserialize)]
struct SwitchSessionRequest {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    interval: Option<Interval>,
}

/// Switch symbol and/or interval. The old session's market data is discarded
/// immediately; a background task fetches fresh history for the new epoch.
async fn switch_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwitchSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if req.symbol.is_none() && req.interval.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "nothing to switch: provide symbol and/or interval" })),
        ));
    }

    let (key, epoch) = {
        let mut session = state.session.write();
        let current = session.key().clone();
        let symbol = req
            .symbol
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| current.symbol.clone());
        let interval = req.interval.unwrap_or(current.interval);
        let key = SessionKey::new(symbol, interval);
        if key == current {
            // No-op switch keeps the session (and its buffer) intact.
            let epoch = session.epoch();
            (key, epoch)
        } else {
            let epoch = session.switch(key.clone());
            (key, epoch)
        }
    };
    state.increment_version();

    // Persist the new session as the startup default (best-effort).
    {
        let mut config = state.runtime_config.write();
        config.symbol = key.symbol.clone();
        config.interval = key.interval;
        let snapshot = config.clone();
        drop(config);
        if let Err(e) = snapshot.save("runtime_config.json") {
            warn!(error = %e, "failed to persist session switch");
        }
    }

    spawn_history_fetch(state.clone(), key.clone(), epoch);
    info!(session = %key, epoch, "session switched via API");

    let session = state.session.read();
    Ok(Json(SessionResponse {
        symbol: session.key().symbol.clone(),
        interval: session.key().interval,
        epoch: session.epoch(),
        candle_count: session.candle_count(),
    }))
}

/// Fetch history for `key` and seed it into the session, unless a newer
/// epoch has replaced it in the meantime.
pub fn spawn_history_fetch(state: Arc<AppState>, key: SessionKey, epoch: u64) {
    let limit = state.runtime_config.read().history_limit;
    tokio::spawn(async move {
        match history::fetch_klines(&state.http, &key.symbol, key.interval, limit).await {
            Ok(fetched) => {
                if state.session.write().seed_history(epoch, fetched) {
                    state.increment_version();
                }
            }
            Err(e) => {
                error!(session = %key, error = %e, "history fetch failed");
            }
        }
    });
}

// =============================================================================
// Candles
// =============================================================================

async fn candles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.session.read().candles();
    Json(snapshot)
}

// =============================================================================
// Indicators
// =============================================================================

async fn list_indicators(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read();
    let registry = session.registry();
    Json(serde_json::json!({
        "instances": registry.instances(),
        "outputs": registry.outputs(),
    }))
}

#[derive(Deserialize)]
struct AddIndicatorRequest {
    #[serde(flatten)]
    params: IndicatorParams,
    #[serde(default)]
    style: InstanceStyle,
}

async fn add_indicator(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddIndicatorRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let result = state.session.write().add_indicator(req.params, req.style);
    match result {
        Ok(id) => {
            state.increment_version();
            let session = state.session.read();
            let instance = session.registry().get(id).cloned();
            Ok((StatusCode::CREATED, Json(serde_json::json!({ "instance": instance }))))
        }
        Err(e) => Err(error_response(e)),
    }
}

#[derive(Deserialize)]
struct UpdateIndicatorRequest {
    /// New parameters, recognised by the presence of a `kind` tag.
    #[serde(flatten)]
    params: Option<IndicatorParams>,
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    style: Option<InstanceStyle>,
}

async fn update_indicator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIndicatorRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    {
        let mut session = state.session.write();
        if let Some(params) = req.params {
            session.update_indicator(id, params).map_err(error_response)?;
        }
        if let Some(enabled) = req.enabled {
            session
                .set_indicator_enabled(id, enabled)
                .map_err(error_response)?;
        }
        if let Some(style) = req.style {
            session.set_indicator_style(id, style).map_err(error_response)?;
        }
    }
    state.increment_version();

    let session = state.session.read();
    let instance = session.registry().get(id).cloned();
    Ok(Json(serde_json::json!({ "instance": instance })))
}

async fn remove_indicator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    state
        .session
        .write()
        .remove_indicator(id)
        .map_err(error_response)?;
    state.increment_version();
    Ok(Json(serde_json::json!({ "removed": id })))
}

// =============================================================================
// Value resolution
// =============================================================================

#[derive(Deserialize)]
struct ResolveQuery {
    /// Unix seconds, or "latest" (the default).
    #[serde(default)]
    time: Option<String>,
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let time_query = match query.time.as_deref() {
        None => TimeQuery::Latest,
        Some(raw) => raw.parse::<TimeQuery>().map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e })),
            )
        })?,
    };

    let resolved = state.session.read().resolve(time_query);
    Ok(Json(resolved))
}
