//! WGS84 Universal Transverse Mercator
//!
//! Adapter over the `utm` crate. Validation and error mapping happen here;
//! the series math is the crate's.

use ::utm::WSG84ToLatLonError;

use super::{GeoCoord, ProjectedCoord, Projection, ProjectionError, MAX_ZONE, MIN_ZONE};
use crate::unit_conversion::wrap_degrees;

/// False northing added in the southern hemisphere (m)
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// WGS84 UTM projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtmProjection;

impl UtmProjection {
    /// Create the projection
    pub fn new() -> Self {
        Self
    }

    /// Longitude of a zone's central meridian in degrees
    pub fn central_longitude(zone: u8) -> f64 {
        (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

fn map_inverse_error(err: WSG84ToLatLonError, coord: &ProjectedCoord) -> ProjectionError {
    match err {
        WSG84ToLatLonError::EastingOutOfRange => ProjectionError::EastingOutOfRange(coord.easting),
        WSG84ToLatLonError::NorthingOutOfRange => {
            ProjectionError::NorthingOutOfRange(coord.northing)
        }
        WSG84ToLatLonError::ZoneNumOutOfRange => ProjectionError::InvalidZone(coord.zone),
        WSG84ToLatLonError::ZoneLetterOutOfRange => ProjectionError::InvalidBand(coord.band),
    }
}

/// Wrap degrees into [-180, 180)
fn wrap_longitude(lon: f64) -> f64 {
    wrap_degrees(lon + 180.0) - 180.0
}

impl Projection for UtmProjection {
    fn to_geographic(&self, coord: &ProjectedCoord) -> Result<GeoCoord, ProjectionError> {
        coord.validate()?;

        let band = coord.band.to_ascii_uppercase();
        let (lat, lon) = ::utm::wsg84_utm_to_lat_lon(coord.easting, coord.northing, coord.zone, band)
            .map_err(|e| map_inverse_error(e, coord))?;

        Ok(GeoCoord::new(lat, wrap_longitude(lon)))
    }

    fn to_projected(
        &self,
        geo: &GeoCoord,
        force_zone: Option<u8>,
    ) -> Result<ProjectedCoord, ProjectionError> {
        if !geo.lat.is_finite() || !geo.lon.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        let band =
            ::utm::lat_to_zone_letter(geo.lat).ok_or(ProjectionError::LatitudeOutOfRange(geo.lat))?;
        if !(-180.0..=180.0).contains(&geo.lon) {
            return Err(ProjectionError::LongitudeOutOfRange(geo.lon));
        }
        let zone = match force_zone {
            Some(z) if !(MIN_ZONE..=MAX_ZONE).contains(&z) => {
                return Err(ProjectionError::InvalidZone(z))
            }
            Some(z) => z,
            None => ::utm::lat_lon_to_zone_number(geo.lat, geo.lon),
        };

        let (mut northing, easting, _convergence) = ::utm::to_utm_wgs84(geo.lat, geo.lon, zone);
        // The crate applies the southern false northing at exactly 0°
        if geo.lat >= 0.0 && northing >= FALSE_NORTHING_SOUTH {
            northing -= FALSE_NORTHING_SOUTH;
        }

        Ok(ProjectedCoord::new(easting, northing, zone, band))
    }
}
