//! Clock-in location checks against a job site radius.

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default radius for jobs that never set one.
pub const DEFAULT_RADIUS_METERS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn from_options(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Self::new(lat, lon)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Result of checking a clock-in position against a site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationCheck {
    pub distance_meters: f64,
    pub within_radius: bool,
}

pub fn check(site: Coordinates, position: Coordinates, radius_meters: i32) -> LocationCheck {
    let radius = if radius_meters > 0 { radius_meters } else { DEFAULT_RADIUS_METERS };
    let distance = distance_meters(site, position);
    LocationCheck {
        distance_meters: (distance * 10.0).round() / 10.0,
        within_radius: distance <= f64::from(radius),
    }
}
