// Ride handlers: offer, browse, join, leave, cancel

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::state::AppState;
use crate::models::ride::{rank_nearby, validate_coordinates};
use crate::models::{NearbyRide, NewRide, Ride, RideStatus};
use crate::utils::api_error::{ApiError, ApiResult};
use crate::utils::response_handler::HandlerResponse;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const MAX_RADIUS_KM: f64 = 100.0;

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

/// Rides the caller drives or has joined
#[instrument(name = "list_rides", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn list_rides(State(state): State<AppState>, identity: Identity) -> ApiResult {
    let rides: Vec<Ride> = state.repository.list_rides_for_user(identity.user_id).await?;
    let items: Vec<Value> = rides.iter().map(Ride::to_json).collect();

    Ok(HandlerResponse::new(StatusCode::OK).data(json!({
        "rides": items,
        "count": items.len(),
    })))
}

#[instrument(name = "create_ride", skip(state, identity, body), fields(user_id = %identity.user_id))]
pub async fn create_ride(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<NewRide>,
) -> ApiResult {
    let ride: NewRide = body.validated(Utc::now()).map_err(ApiError::BadRequest)?;
    let created: Ride = state.repository.create_ride(identity.user_id, ride).await?;

    info!("User {} offered ride {}", identity.user_id, created.id);

    Ok(HandlerResponse::new(StatusCode::CREATED)
        .data(created.to_json())
        .message("Ride created"))
}

/// Active upcoming rides whose origin is within the radius
#[instrument(name = "nearby_rides", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn nearby_rides(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<NearbyParams>,
) -> ApiResult {
    let (lat, lng) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(ApiError::BadRequest("lat and lng are required".to_string())),
    };
    validate_coordinates(lat, lng).map_err(ApiError::BadRequest)?;

    let radius_km: f64 = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
    if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > MAX_RADIUS_KM {
        return Err(ApiError::BadRequest(format!(
            "radius_km must be greater than 0 and at most {MAX_RADIUS_KM}"
        )));
    }

    let now: DateTime<Utc> = Utc::now();
    let candidates: Vec<Ride> = state.repository.list_active_rides(now).await?;
    let nearby: Vec<NearbyRide> = rank_nearby(candidates, lat, lng, radius_km, now);
    let items: Vec<Value> = nearby.iter().map(NearbyRide::to_json).collect();

    Ok(HandlerResponse::new(StatusCode::OK).data(json!({
        "rides": items,
        "count": items.len(),
        "radius_km": radius_km,
    })))
}

#[instrument(name = "ride_detail", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn ride_detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult {
    let ride: Ride = load_ride(&state, &id).await?;

    Ok(HandlerResponse::new(StatusCode::OK).data(ride.to_json()))
}

#[instrument(name = "join_ride", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn join_ride(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult {
    let ride: Ride = load_ride(&state, &id).await?;

    if ride.status != RideStatus::Active {
        return Err(ApiError::Conflict("Ride is not active".to_string()));
    }
    if ride.departure_time <= Utc::now() {
        return Err(ApiError::Conflict("Ride has already departed".to_string()));
    }
    if ride.driver_id == identity.user_id {
        return Err(ApiError::BadRequest("You cannot join your own ride".to_string()));
    }
    if ride.is_participant(identity.user_id) {
        return Err(ApiError::Conflict("You already joined this ride".to_string()));
    }
    if ride.seats_available() == 0 {
        return Err(ApiError::Conflict("ride is full".to_string()));
    }

    // * The repository re-checks capacity atomically
    let updated: Ride = state.repository.add_participant(ride.id, identity.user_id).await?;
    info!("User {} joined ride {}", identity.user_id, updated.id);

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(updated.to_json())
        .message("Joined ride"))
}

#[instrument(name = "leave_ride", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn leave_ride(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult {
    let ride: Ride = load_ride(&state, &id).await?;

    if !ride.is_participant(identity.user_id) {
        return Err(ApiError::Conflict("You are not a participant of this ride".to_string()));
    }

    let updated: Ride = state.repository.remove_participant(ride.id, identity.user_id).await?;
    info!("User {} left ride {}", identity.user_id, updated.id);

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(updated.to_json())
        .message("Left ride"))
}

#[instrument(name = "cancel_ride", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn cancel_ride(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult {
    let ride: Ride = load_ride(&state, &id).await?;

    if ride.driver_id != identity.user_id {
        return Err(ApiError::Forbidden("Only the driver can cancel a ride".to_string()));
    }
    if ride.status != RideStatus::Active {
        return Err(ApiError::Conflict("Ride is not active".to_string()));
    }

    let updated: Ride = state.repository.set_ride_status(ride.id, RideStatus::Cancelled).await?;
    info!("User {} cancelled ride {}", identity.user_id, updated.id);

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(updated.to_json())
        .message("Ride cancelled"))
}

// =============================================================================
// INTERNAL
// =============================================================================

fn parse_ride_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ride id '{raw}'")))
}

async fn load_ride(state: &AppState, raw_id: &str) -> Result<Ride, ApiError> {
    let id: Uuid = parse_ride_id(raw_id)?;

    state
        .repository
        .get_ride(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))
}
