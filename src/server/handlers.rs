use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::city::{self, CityRecord};
use crate::coord::{self, GeoPoint};
use crate::location::{CitySnapshot, LocateOutcome, LocationError};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn parse_point(lat: Option<f64>, lng: Option<f64>) -> Result<GeoPoint, ApiError> {
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters"));
    };
    GeoPoint::checked(lat, lng).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

// ─── GET /api/transform ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct TransformQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// GCJ-02 → WGS-84 instead
    #[serde(default)]
    pub reverse: bool,
}

#[derive(Serialize)]
pub struct TransformResponse {
    pub lat: f64,
    pub lng: f64,
    pub in_china: bool,
}

pub async fn transform(Query(params): Query<TransformQuery>) -> Result<Json<TransformResponse>, ApiError> {
    let point = parse_point(params.lat, params.lng)?;
    let out = if params.reverse {
        coord::gcj02_to_wgs84(point)
    } else {
        coord::wgs84_to_gcj02(point)
    };

    Ok(Json(TransformResponse {
        lat: out.lat,
        lng: out.lng,
        in_china: !coord::out_of_china(point),
    }))
}

// ─── GET /api/city-id ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CityIdQuery {
    pub name: Option<String>,
}

pub async fn city_id(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityIdQuery>,
) -> Result<Json<CityRecord>, ApiError> {
    let name = params.name.as_deref().map(city::trim_city).unwrap_or("");
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'name' parameter"));
    }

    Ok(Json(CityRecord {
        name: name.to_string(),
        id: city::resolve_id(name, &state.table),
    }))
}

// ─── GET /api/cities ─────────────────────────────────────────────

pub async fn city_list(State(state): State<Arc<AppState>>) -> Json<Vec<CityRecord>> {
    Json(state.table.records().to_vec())
}

// ─── GET /api/locate ─────────────────────────────────────────────

fn locate_error(e: LocationError) -> ApiError {
    match e {
        LocationError::Network(_) | LocationError::InvalidResponse(_) => {
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
        // start() runs just before the fix, so this only signals a broken service
        LocationError::NotListening(_) => {
            error!("locate: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Deserialize)]
pub struct LocateQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub relocate: bool,
}

pub async fn locate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateQuery>,
) -> Result<Json<LocateOutcome>, ApiError> {
    let start = Instant::now();
    let raw = parse_point(params.lat, params.lng)?;

    // the geocoder call blocks
    let result = tokio::task::spawn_blocking(move || {
        let mut service = state.service.lock().unwrap_or_else(|e| e.into_inner());
        service.start(params.relocate);
        service.on_location_changed(raw)
    })
    .await
    .map_err(|e| {
        error!("locate task failed: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "locate task failed")
    })?;

    let outcome = result.map_err(locate_error)?;

    info!(
        "GET /api/locate lat={} lng={} -> {} ({:.1}ms)",
        raw.lat,
        raw.lng,
        outcome.city,
        start.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(Json(outcome))
}

// ─── GET /api/state ──────────────────────────────────────────────

pub async fn store_state(State(state): State<Arc<AppState>>) -> Json<CitySnapshot> {
    Json(state.store.snapshot())
}
