pub mod export;
pub mod financials;
pub mod geofence;
pub mod preferences;
