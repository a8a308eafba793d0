//! HTTP entry point: adapts JSON requests into neighborhood lookups.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::ResolveError;
use crate::models::Resolution;
use crate::pip::PointResolver;

/// Application state shared across handlers
pub struct AppState {
    pub resolver: PointResolver,
    pub default_label: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Latitude and longitude are required")]
    InvalidCoordinate(#[source] ResolveError),

    #[error("Failed to determine neighborhood")]
    Unavailable(#[source] ResolveError),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidCoordinate(_) => ApiError::InvalidCoordinate(err),
            ResolveError::DataUnavailable(_) => ApiError::Unavailable(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NeighborhoodRequest {
    /// Number or numeric string
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    /// Fallback label when no neighborhood matches
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NeighborhoodResponse {
    pub neighborhood: String,
    pub borough: Option<String>,
    pub matched: bool,
}

impl From<Resolution> for NeighborhoodResponse {
    fn from(r: Resolution) -> Self {
        Self {
            neighborhood: r.label,
            borough: r.group,
            matched: r.matched,
        }
    }
}

/// Parse a required coordinate field. Numbers and numeric strings are accepted.
pub fn parse_coordinate(field: &str, value: Option<&Value>) -> Result<f64, ResolveError> {
    match value {
        None | Some(Value::Null) => Err(ResolveError::InvalidCoordinate(format!(
            "{} is required",
            field
        ))),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            ResolveError::InvalidCoordinate(format!("{} is not representable as f64", field))
        }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            ResolveError::InvalidCoordinate(format!("{} is not numeric: {:?}", field, s))
        }),
        Some(other) => Err(ResolveError::InvalidCoordinate(format!(
            "{} must be a number, got {}",
            field, other
        ))),
    }
}

/// Resolve one request against `resolver`, falling back to the request's
/// city or else `default_label`.
pub fn resolve_request(
    resolver: &PointResolver,
    default_label: &str,
    request: &NeighborhoodRequest,
) -> Result<NeighborhoodResponse, ResolveError> {
    let latitude = parse_coordinate("latitude", request.latitude.as_ref())?;
    let longitude = parse_coordinate("longitude", request.longitude.as_ref())?;

    let fallback = request
        .city
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(default_label);

    resolver
        .resolve_detailed(latitude, longitude, fallback)
        .map(NeighborhoodResponse::from)
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/geofence", post(geofence_handler))
        .route("/v1/regions", get(regions_handler))
        .with_state(state)
}

/// Run `f` on the blocking pool. Until the store has loaded, any call may
/// read the dataset from disk.
async fn with_store<T, F>(state: Arc<AppState>, f: F) -> Result<T, ResolveError>
where
    F: FnOnce(&AppState) -> Result<T, ResolveError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| ResolveError::DataUnavailable(format!("lookup task failed: {}", e)))?
}

/// Neighborhood lookup
async fn geofence_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NeighborhoodRequest>,
) -> Result<Json<NeighborhoodResponse>, ApiError> {
    let response = with_store(state, move |s| {
        resolve_request(&s.resolver, &s.default_label, &request)
    })
    .await
    .map_err(|e| {
        if !e.is_client_error() {
            tracing::error!("Neighborhood lookup failed: {}", e);
        }
        ApiError::from(e)
    })?;

    Ok(Json(response))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    regions: usize,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let regions = with_store(state, |s| s.resolver.store().load().map(|r| r.len())).await;

    Json(HealthResponse {
        status: if regions.is_ok() { "ok" } else { "degraded" },
        regions: regions.unwrap_or(0),
    })
}

#[derive(Debug, Serialize)]
struct RegionSummary {
    name: String,
    borough: Option<String>,
}

/// List regions in resolution priority order
async fn regions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RegionSummary>>, ApiError> {
    let regions = with_store(state, |s| {
        let regions = s.resolver.store().load()?;
        Ok(regions
            .iter()
            .map(|r| RegionSummary {
                name: r.name.clone(),
                borough: r.group_name.clone(),
            })
            .collect::<Vec<_>>())
    })
    .await
    .map_err(|e| {
        tracing::error!("Failed to load regions: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(regions))
}
