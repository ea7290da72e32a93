//! Geographic helpers: haversine distance and bounding boxes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Rough bounding box around Finland, used to ignore locations elsewhere.
pub const FINLAND: BoundingBox = BoundingBox {
    min_latitude: 59.5,
    max_latitude: 70.1,
    min_longitude: 19.0,
    max_longitude: 31.6,
};

/// A WGS84 coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn haversine_km(&self, other: &Self) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Axis-aligned latitude/longitude box. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELSINKI: Coordinate = Coordinate::new(60.1719, 24.9414);
    const TAMPERE: Coordinate = Coordinate::new(61.4986, 23.7733);

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(HELSINKI.haversine_km(&HELSINKI), 0.0);
    }

    #[test]
    fn helsinki_to_tampere() {
        let d = HELSINKI.haversine_km(&TAMPERE);
        assert!((d - 160.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = HELSINKI.haversine_km(&TAMPERE);
        let b = TAMPERE.haversine_km(&HELSINKI);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn finland_contains_helsinki() {
        assert!(FINLAND.contains(&HELSINKI));
        assert!(FINLAND.contains(&TAMPERE));
    }

    #[test]
    fn finland_excludes_stockholm() {
        assert!(!FINLAND.contains(&Coordinate::new(59.3293, 18.0686)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let bbox = BoundingBox {
            min_latitude: 0.0,
            max_latitude: 1.0,
            min_longitude: 0.0,
            max_longitude: 1.0,
        };
        assert!(bbox.contains(&Coordinate::new(0.0, 1.0)));
        assert!(!bbox.contains(&Coordinate::new(1.0001, 0.5)));
    }
}
