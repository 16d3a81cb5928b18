//! Projection Adapter
//!
//! Converts between planar projected coordinates (easting, northing, zone,
//! band) and geographic latitude/longitude. The simulator only needs the
//! [`Projection`] trait; [`UtmProjection`] adapts the `utm` crate's WGS84
//! conversions and is used by default.

mod wgs84;

pub use self::wgs84::UtmProjection;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latitude band letters in south to north order (I and O are not used)
pub const BAND_LETTERS: &str = "CDEFGHJKLMNPQRSTUVWX";

/// Lowest valid UTM zone number
pub const MIN_ZONE: u8 = 1;
/// Highest valid UTM zone number
pub const MAX_ZONE: u8 = 60;

/// Errors raised by a projection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Zone number outside 1-60
    #[error("Invalid zone number: {0} (expected {MIN_ZONE}-{MAX_ZONE})")]
    InvalidZone(u8),

    /// Band letter outside C-X, or I/O
    #[error("Invalid latitude band: '{0}'")]
    InvalidBand(char),

    /// Easting outside the 100 km to 1000 km grid range
    #[error("Easting out of range: {0}")]
    EastingOutOfRange(f64),

    /// Northing outside 0 to 10 000 km
    #[error("Northing out of range: {0}")]
    NorthingOutOfRange(f64),

    /// Latitude outside 80°S to 84°N
    #[error("Latitude out of projection range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside -180° to 180°
    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    /// NaN or infinite input
    #[error("Coordinate is not finite")]
    NonFinite,
}

/// A coordinate in a planar transverse mercator grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCoord {
    /// Meters east, including the false easting
    pub easting: f64,
    /// Meters north, including the false northing in the southern hemisphere
    pub northing: f64,
    /// Zone number (1-60)
    pub zone: u8,
    /// Latitude band letter (C-X)
    pub band: char,
}

impl ProjectedCoord {
    /// Create a projected coordinate
    pub fn new(easting: f64, northing: f64, zone: u8, band: char) -> Self {
        Self {
            easting,
            northing,
            zone,
            band,
        }
    }

    /// Whether the band lies in the northern hemisphere
    pub fn is_northern(&self) -> bool {
        self.band.to_ascii_uppercase() >= 'N'
    }

    /// Check zone and band are valid
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !(MIN_ZONE..=MAX_ZONE).contains(&self.zone) {
            return Err(ProjectionError::InvalidZone(self.zone));
        }
        if !BAND_LETTERS.contains(self.band.to_ascii_uppercase()) {
            return Err(ProjectionError::InvalidBand(self.band));
        }
        if !self.easting.is_finite() || !self.northing.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        Ok(())
    }
}

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    /// Latitude, positive north
    pub lat: f64,
    /// Longitude, positive east
    pub lon: f64,
}

impl GeoCoord {
    /// Create a geographic coordinate
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Conversion between a planar grid and geographic coordinates.
///
/// Implementations must be pure: the same input always gives the same output.
pub trait Projection: Send + Sync {
    /// Convert a projected coordinate to latitude/longitude
    fn to_geographic(&self, coord: &ProjectedCoord) -> Result<GeoCoord, ProjectionError>;

    /// Convert latitude/longitude to a projected coordinate, optionally
    /// forcing the zone number
    fn to_projected(
        &self,
        geo: &GeoCoord,
        force_zone: Option<u8>,
    ) -> Result<ProjectedCoord, ProjectionError>;
}
