// Ride records, creation rules and distance math

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const EARTH_RADIUS_KM: f64 = 6371.0;
pub const MAX_SEATS: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Active => "active",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(RideStatus::Active),
            "cancelled" => Some(RideStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub status: RideStatus,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    pub fn seats_available(&self) -> i32 {
        (self.total_seats - self.participants.len() as i32).max(0)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.driver_id == user_id || self.is_participant(user_id)
    }

    /// JSON view with the derived seat count
    pub fn to_json(&self) -> serde_json::Value {
        let mut value: serde_json::Value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert("seats_available".into(), self.seats_available().into());
        }
        value
    }
}

/// Active ride with its distance from the searched point
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRide {
    pub ride: Ride,
    pub distance_km: f64,
}

impl NearbyRide {
    pub fn to_json(&self) -> serde_json::Value {
        let mut value: serde_json::Value = self.ride.to_json();
        if let Some(map) = value.as_object_mut() {
            map.insert("distance_km".into(), ((self.distance_km * 100.0).round() / 100.0).into());
        }
        value
    }
}

/// Request body for offering a ride
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRide {
    pub origin: String,
    pub destination: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
}

impl NewRide {
    pub fn validated(self, now: DateTime<Utc>) -> Result<Self, String> {
        let origin: String = self.origin.trim().to_string();
        let destination: String = self.destination.trim().to_string();

        if origin.is_empty() || destination.is_empty() {
            return Err("origin and destination are required".to_string());
        }
        validate_coordinates(self.origin_lat, self.origin_lng)?;
        validate_coordinates(self.destination_lat, self.destination_lng)?;
        if self.departure_time <= now {
            return Err("departure_time must be in the future".to_string());
        }
        if !(1..=MAX_SEATS).contains(&self.total_seats) {
            return Err(format!("total_seats must be between 1 and {MAX_SEATS}"));
        }

        Ok(Self { origin, destination, ..self })
    }
}

pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err("latitude must be between -90 and 90".to_string());
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err("longitude must be between -180 and 180".to_string());
    }
    Ok(())
}

/// Great-circle distance in kilometres
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat: f64 = (lat2 - lat1).to_radians();
    let d_lng: f64 = (lng2 - lng1).to_radians();

    let a: f64 = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Keeps active future rides within `radius_km`, nearest first
pub fn rank_nearby(
    rides: Vec<Ride>,
    lat: f64,
    lng: f64,
    radius_km: f64,
    now: DateTime<Utc>,
) -> Vec<NearbyRide> {
    let mut nearby: Vec<NearbyRide> = rides
        .into_iter()
        .filter(|ride: &Ride| ride.status == RideStatus::Active && ride.departure_time > now)
        .map(|ride: Ride| {
            let distance_km: f64 = haversine_km(lat, lng, ride.origin_lat, ride.origin_lng);
            NearbyRide { ride, distance_km }
        })
        .filter(|n: &NearbyRide| n.distance_km <= radius_km)
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}
