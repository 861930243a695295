//! # Geographic Primitives
//!
//! `GeoPoint` and great-circle distance for geofencing and pickup-proximity
//! checks. The stack never geocodes; coordinates arrive from GPS samples
//! and stored pickup/delivery stops.
//!
//! ## Distance Injection
//!
//! Consumers take a [`DistanceCalculator`] rather than calling
//! [`haversine_miles`] directly, so geofence and proximity logic is
//! testable with a fixed-distance double. [`HaversineDistance`] is the
//! production implementation.

use serde::{Deserialize, Serialize};

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Mean Earth radius in miles, per the IUGG sphere approximation.
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Construct a point from decimal degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two points in statute miles (haversine).
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Pluggable point-to-point distance.
///
/// The geofence trigger and the double-broker guard share one instance so
/// both answer proximity questions identically.
pub trait DistanceCalculator: Send + Sync {
    /// Distance between `a` and `b` in statute miles.
    fn distance_miles(&self, a: GeoPoint, b: GeoPoint) -> f64;
}

/// Production distance: great-circle haversine.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl DistanceCalculator for HaversineDistance {
    fn distance_miles(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        haversine_miles(a, b)
    }
}
