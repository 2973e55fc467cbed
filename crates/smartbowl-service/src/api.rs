//! REST API endpoints for the smartbowl-service.
//!
//! Bowls post one text line per report to `/datasets/{id}` and read their
//! remaining daily ration from `/configurations/{id}`. Dashboards read CSV
//! from `GET /datasets/{id}`. Devices are managed as JSON under `/devices`.
//!
//! ## Error Handling
//!
//! Failures are returned as structured JSON errors via [`AppError`]. Store
//! errors map to the matching 4xx status where one exists and to HTTP 500
//! otherwise.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use smartbowl_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use smartbowl_store::{SampleQuery, ration};
use smartbowl_types::{Device, Reading, normalize_device_id};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::validate_device;
use crate::state::AppState;

/// Dataset that is regenerated with simulated samples on every read.
pub const TEST_DATASET_ID: &str = "test";

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        // Sample ingest and export
        .route(
            "/datasets/{id}",
            get(get_dataset).post(add_sample).delete(clear_dataset),
        )
        // Ration status for bowls
        .route("/configurations/{id}", get(get_configuration))
        // Device registry
        .route("/devices", get(list_devices).post(add_device))
        .route("/devices/{id}", get(get_device).put(update_device))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub uptime_seconds: i64,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.now(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Query parameters for dataset export.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatasetQuery {
    /// Number of most recent raw samples, 0 for all.
    #[serde(default)]
    pub num_entries: i64,
    /// Hourly roll-up span in hours, used when `num_entries` is 0.
    #[serde(default)]
    pub hours_back: i64,
}

impl DatasetQuery {
    /// The store query these parameters select.
    pub fn to_sample_query(&self) -> SampleQuery {
        SampleQuery::from_params(self.num_entries, self.hours_back)
    }
}

/// Export a dataset as CSV.
///
/// The `test` dataset is replaced with freshly simulated samples first.
async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DatasetQuery>,
) -> Result<String, AppError> {
    let id = normalize_device_id(&id);
    let now = state.now();
    if id == TEST_DATASET_ID {
        state.simulator.fill(&state.store, &id, params.hours_back, now);
    }

    let query = params.to_sample_query();
    debug!("Exporting {} as {}", id, query);
    Ok(state.store.to_csv_at(&id, &query, now)?)
}

/// Append one sample from a `remaining,consumed,added,refills` text line.
async fn add_sample(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, AppError> {
    let reading: Reading = body.parse().map_err(|e| {
        warn!("Rejected sample for {}: {}", id, e);
        AppError::BadRequest(format!("Invalid sample '{}': {}", body.trim(), e))
    })?;

    state.store.append(&id, Some(state.now()), reading);
    Ok(StatusCode::OK)
}

/// Remove all samples of a dataset.
async fn clear_dataset(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> StatusCode {
    state.store.clear(&id);
    StatusCode::OK
}

/// Query parameters for the ration status.
#[derive(Debug, Deserialize)]
pub struct ConfigurationQuery {
    /// Comma-separated field names.
    #[serde(default = "default_fields")]
    pub fields: String,
    /// Separator placed between the rendered fields.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for ConfigurationQuery {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_fields() -> String {
    "rationLeft,secondsLeft".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Ration left and seconds left in the device's local day, as plain text.
async fn get_configuration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ConfigurationQuery>,
) -> Result<String, AppError> {
    let device = state
        .devices
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

    let status = ration::compute_at(&state.store, &device, state.now())?;
    Ok(status.render(&params.fields, &params.delimiter))
}

/// List registered devices.
async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<Device>> {
    Json(state.devices.list())
}

/// Get a registered device.
async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Device>, AppError> {
    state
        .devices
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))
}

/// Register a new device.
///
/// # Errors
///
/// - [`AppError::BadRequest`] if the device fails validation.
/// - [`AppError::Conflict`] if the id is taken (case-insensitive).
async fn add_device(
    State(state): State<Arc<AppState>>,
    Json(device): Json<Device>,
) -> Result<(StatusCode, Json<Device>), AppError> {
    check_device(&device)?;
    let device = state.devices.add(device)?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// Replace a registered device.
///
/// The id in the body must match the path, ignoring case.
async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(device): Json<Device>,
) -> Result<Json<Device>, AppError> {
    if normalize_device_id(&device.id) != normalize_device_id(&id) {
        return Err(AppError::BadRequest(format!(
            "Device id '{}' does not match path '{}'",
            device.id, id
        )));
    }
    check_device(&device)?;
    Ok(Json(state.devices.update(device)?))
}

fn check_device(device: &Device) -> Result<(), AppError> {
    let errors = validate_device(device, "device");
    if errors.is_empty() {
        return Ok(());
    }
    Err(AppError::BadRequest(
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    ))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Store(smartbowl_store::Error),
}

impl From<smartbowl_store::Error> for AppError {
    fn from(e: smartbowl_store::Error) -> Self {
        match e {
            smartbowl_store::Error::DeviceNotFound(_) => AppError::NotFound(e.to_string()),
            smartbowl_store::Error::DeviceExists(_) => AppError::Conflict(e.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
