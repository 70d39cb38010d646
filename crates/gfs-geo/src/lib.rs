//! gfs-geo
//!
//! Great-circle geometry for geofencing.
//!
//! Every distance and radius in the workspace is a [`Meters`] value. Nothing
//! here converts through kilometers at the call site, so a radius can never be
//! compared against a distance expressed in a different unit.
//!
//! Pure numeric functions. No IO, no wall-clock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// Meters
// ---------------------------------------------------------------------------

/// A distance in meters.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl Meters {
    pub const ZERO: Meters = Meters(0.0);

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn as_km(self) -> f64 {
        self.0 / 1000.0
    }

    /// Whole meters, for messages and reports.
    pub fn rounded(self) -> i64 {
        self.0.round() as i64
    }

    /// `true` when this distance lies inside (or on) a circle of `radius`.
    pub fn within(self, radius: Meters) -> bool {
        self.0 <= radius.0
    }

    pub fn is_finite_positive(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.rounded())
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// WGS84 latitude/longitude in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other`.
    pub fn distance_to(&self, other: &Coordinates) -> Meters {
        haversine(self, other)
    }

    /// Point reached by travelling `distance` from here along `bearing_deg`
    /// (0 = north, 90 = east). Used to build synthetic tracks at known
    /// distances from a fixed point.
    pub fn offset(&self, distance: Meters, bearing_deg: f64) -> Coordinates {
        let delta = distance.get() / EARTH_RADIUS_METERS;
        let theta = bearing_deg.to_radians();
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let y = theta.sin() * delta.sin() * phi1.cos();
        let x = delta.cos() - phi1.sin() * phi2.sin();
        let lambda2 = lambda1 + y.atan2(x);

        Coordinates {
            latitude: phi2.to_degrees(),
            longitude: lambda2.to_degrees(),
        }
    }
}

/// Haversine great-circle distance between two coordinates.
pub fn haversine(a: &Coordinates, b: &Coordinates) -> Meters {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Meters(EARTH_RADIUS_METERS * c)
}

/// Average speed in km/h between two timestamped fixes.
///
/// Returns 0 when the elapsed time is zero or negative.
pub fn speed_kmh(
    from: &Coordinates,
    from_ts: DateTime<Utc>,
    to: &Coordinates,
    to_ts: DateTime<Utc>,
) -> f64 {
    let elapsed_ms = (to_ts - from_ts).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0.0;
    }
    let hours = elapsed_ms as f64 / 3_600_000.0;
    haversine(from, to).as_km() / hours
}
