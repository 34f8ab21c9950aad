//! Request handlers.
//!
//! Handlers authenticate first, then validate the body, then run the
//! blocking service call on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use tokio::task::spawn_blocking;
use zeroize::Zeroizing;

use super::error::ApiError;
use super::state::SharedState;
use crate::auth::{bearer_token, AuthError};
use crate::location::Coordinate;
use crate::nearby::{NearbyError, NearbyResponse};
use crate::sharing::SharingTier;

/// Body of `POST /nearby`.
///
/// `lat`/`lng` are accepted as aliases. Missing fields are reported as 400
/// after authentication rather than by the JSON extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng")]
    pub longitude: Option<f64>,
    /// Search radius; default and upper bound come from `NearbyConfig`.
    pub radius_meters: Option<f64>,
}

/// Body of `PUT /location`.
#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng")]
    pub longitude: Option<f64>,
    /// Horizontal accuracy in meters, if the device reported one.
    pub accuracy: Option<f64>,
}

/// Body of `PUT /sharing/{viewer_id}`.
#[derive(Debug, Deserialize)]
pub struct SharingUpdate {
    /// One of `detailed`, `approximate`, `hidden` or `blocked`.
    pub tier: String,
}

/// `GET /health`: liveness check, no credential required.
pub async fn health_handler() -> &'static str {
    "ok"
}

/// `POST /nearby`: nearby users visible to the caller, masked per tier.
pub async fn nearby_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<NearbyRequest>, JsonRejection>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let requester = authenticate(&state, &headers).await?;

    let Json(request) = body.map_err(invalid_body)?;
    let center = coordinate(request.latitude, request.longitude)?;
    let radius_meters = radius(request.radius_meters)?;

    let response = run_blocking(move || {
        Ok(state
            .service
            .find_nearby(&requester, center, radius_meters)?)
    })
    .await?;

    Ok(Json(response))
}

/// `PUT /location`: records the caller's current position.
pub async fn location_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<LocationUpdate>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let owner = authenticate(&state, &headers).await?;

    let Json(update) = body.map_err(invalid_body)?;
    let coordinate = coordinate(update.latitude, update.longitude)?;

    run_blocking(move || {
        state
            .service
            .update_location(&owner, coordinate, update.accuracy)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /sharing/{viewer_id}`: sets the tier the caller shares with `viewer_id`.
pub async fn sharing_handler(
    State(state): State<SharedState>,
    Path(viewer_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<SharingUpdate>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let sharer = authenticate(&state, &headers).await?;

    let Json(update) = body.map_err(invalid_body)?;
    let tier = SharingTier::parse(update.tier.trim()).ok_or_else(|| {
        NearbyError::InvalidInput(format!("unknown sharing tier: {}", update.tier))
    })?;

    run_blocking(move || {
        state.service.set_sharing_tier(&sharer, &viewer_id, tier)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn authenticate(state: &SharedState, headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::InvalidCredential))
        .transpose()?;
    let token = Zeroizing::new(bearer_token(header)?.to_string());

    let state = Arc::clone(state);
    run_blocking(move || Ok(state.authenticator.authenticate(&token)?)).await
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    NearbyError::InvalidInput(rejection.body_text()).into()
}

fn coordinate(latitude: Option<f64>, longitude: Option<f64>) -> Result<Coordinate, NearbyError> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Coordinate::new(latitude, longitude)?),
        _ => Err(NearbyError::InvalidInput(
            "latitude and longitude are required".to_string(),
        )),
    }
}

// Radii beyond u32 are clamped by the service anyway.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn radius(radius_meters: Option<f64>) -> Result<Option<u32>, NearbyError> {
    match radius_meters {
        None => Ok(None),
        Some(r) if r.is_finite() && r > 0.0 => Ok(Some(r.ceil().min(f64::from(u32::MAX)) as u32)),
        Some(_) => Err(NearbyError::InvalidInput(
            "radiusMeters must be positive".to_string(),
        )),
    }
}
