//! WGS-84 → GCJ-02 ("Mars") coordinate correction.
//!
//! GCJ-02 is the obfuscated datum mandated for maps published in mainland
//! China. It is WGS-84 plus a non-linear offset of a few hundred metres,
//! computed from two fixed polynomial + sinusoid series and scaled by the
//! Krasovsky ellipsoid. Outside China's bounding box no offset is applied.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Semi-major axis of the Krasovsky 1940 ellipsoid (metres).
const SEMI_MAJOR_AXIS: f64 = 6378245.0;
/// First eccentricity squared.
const ECCENTRICITY_SQ: f64 = 0.006_693_421_622_965_943;

// China bounding box (degrees)
const CHINA_MIN_LNG: f64 = 72.004;
const CHINA_MAX_LNG: f64 = 137.8347;
const CHINA_MIN_LAT: f64 = 0.8293;
const CHINA_MAX_LAT: f64 = 55.8271;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point, rejecting latitudes outside ±90 and longitudes outside ±180.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, CoordError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordError::OutOfRange { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    OutOfRange { lat: f64, lng: f64 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { lat, lng } => write!(
                f,
                "Invalid coordinates ({}, {}). Lat: -90..90, Lng: -180..180",
                lat, lng
            ),
        }
    }
}

impl std::error::Error for CoordError {}

/// True when the point falls outside the region where GCJ-02 applies.
pub fn out_of_china(point: GeoPoint) -> bool {
    if point.lng < CHINA_MIN_LNG || point.lng > CHINA_MAX_LNG {
        return true;
    }
    point.lat < CHINA_MIN_LAT || point.lat > CHINA_MAX_LAT
}

/// Convert a WGS-84 point to GCJ-02. Identity outside China.
pub fn wgs84_to_gcj02(point: GeoPoint) -> GeoPoint {
    if out_of_china(point) {
        return point;
    }
    let (d_lat, d_lng) = offset(point);
    GeoPoint::new(point.lat + d_lat, point.lng + d_lng)
}

/// Approximate GCJ-02 → WGS-84 inverse (single step, ~1-2 m error).
///
/// The offset is evaluated at the GCJ-02 point rather than the unknown
/// WGS-84 one, which is good enough for display and geocoding purposes.
pub fn gcj02_to_wgs84(point: GeoPoint) -> GeoPoint {
    if out_of_china(point) {
        return point;
    }
    let (d_lat, d_lng) = offset(point);
    GeoPoint::new(point.lat - d_lat, point.lng - d_lng)
}

/// Offset in degrees (Δlat, Δlng) to add to a WGS-84 point at `point`.
fn offset(point: GeoPoint) -> (f64, f64) {
    let d_lat = transform_lat(point.lat - 35.0, point.lng - 105.0);
    let d_lng = transform_lng(point.lat - 35.0, point.lng - 105.0);

    let rad_lat = point.lat / 180.0 * PI;
    let mut magic = rad_lat.sin();
    magic = 1.0 - ECCENTRICITY_SQ * magic * magic;
    let sqrt_magic = magic.sqrt();

    // meridian and parallel radii of curvature
    let d_lat = (d_lat * 180.0)
        / ((SEMI_MAJOR_AXIS * (1.0 - ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    let d_lng = (d_lng * 180.0) / (SEMI_MAJOR_AXIS / sqrt_magic * rad_lat.cos() * PI);
    (d_lat, d_lng)
}

fn transform_lat(lat: f64, lng: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * lng + 3.0 * lat + 0.2 * lat * lat + 0.1 * lng * lat
        + 0.2 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lat * PI).sin() + 40.0 * (lat / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (lat / 12.0 * PI).sin() + 320.0 * (lat * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(lat: f64, lng: f64) -> f64 {
    let mut ret = 300.0 + lng + 2.0 * lat + 0.1 * lng * lng + 0.1 * lng * lat
        + 0.1 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lng * PI).sin() + 40.0 * (lng / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (lng / 12.0 * PI).sin() + 300.0 * (lng / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_beijing_reference() {
        let out = wgs84_to_gcj02(GeoPoint::new(39.908692, 116.397477));
        assert_abs_diff_eq!(out.lat, 39.910095494, epsilon = 1e-6);
        assert_abs_diff_eq!(out.lng, 116.403720567, epsilon = 1e-6);
    }

    #[test]
    fn test_beijing_shift_magnitude() {
        let raw = GeoPoint::new(39.908692, 116.397477);
        let out = wgs84_to_gcj02(raw);
        let d_lat = (out.lat - raw.lat).abs();
        let d_lng = (out.lng - raw.lng).abs();
        assert!((0.0010..0.006).contains(&d_lat), "d_lat = {}", d_lat);
        assert!((0.0015..0.008).contains(&d_lng), "d_lng = {}", d_lng);
    }

    #[test]
    fn test_other_cities() {
        // Shanghai
        let out = wgs84_to_gcj02(GeoPoint::new(31.230416, 121.473701));
        assert_abs_diff_eq!(out.lat, 31.228473742, epsilon = 1e-6);
        assert_abs_diff_eq!(out.lng, 121.478224057, epsilon = 1e-6);

        // Chengdu
        let out = wgs84_to_gcj02(GeoPoint::new(30.572815, 104.066801));
        assert_abs_diff_eq!(out.lat, 30.570361148, epsilon = 1e-6);
        assert_abs_diff_eq!(out.lng, 104.069306480, epsilon = 1e-6);
    }

    #[test]
    fn test_identity_outside_china() {
        let points = [
            GeoPoint::new(59.3293, 18.0686),   // Stockholm
            GeoPoint::new(40.7128, -74.0060),  // New York
            GeoPoint::new(-33.8688, 151.2093), // Sydney
            GeoPoint::new(35.6762, 139.6503),  // Tokyo, east of the box
            GeoPoint::new(60.0, 100.0),        // north of the box
            GeoPoint::new(0.5, 110.0),         // south of the box
        ];
        for p in points {
            assert_eq!(wgs84_to_gcj02(p), p);
            assert_eq!(wgs84_to_gcj02(wgs84_to_gcj02(p)), p);
        }
    }

    #[test]
    fn test_bounding_box_edges() {
        assert!(out_of_china(GeoPoint::new(30.0, 72.003)));
        assert!(!out_of_china(GeoPoint::new(30.0, 72.004)));
        assert!(!out_of_china(GeoPoint::new(30.0, 137.8347)));
        assert!(out_of_china(GeoPoint::new(30.0, 137.8348)));
        assert!(out_of_china(GeoPoint::new(0.8292, 100.0)));
        assert!(out_of_china(GeoPoint::new(55.8272, 100.0)));
    }

    #[test]
    fn test_deterministic() {
        let p = GeoPoint::new(22.543096, 114.057865);
        assert_eq!(wgs84_to_gcj02(p), wgs84_to_gcj02(p));
    }

    #[test]
    fn test_inverse_round_trip() {
        let raw = GeoPoint::new(22.543096, 114.057865);
        let back = gcj02_to_wgs84(wgs84_to_gcj02(raw));
        assert_abs_diff_eq!(back.lat, raw.lat, epsilon = 2e-5);
        assert_abs_diff_eq!(back.lng, raw.lng, epsilon = 2e-5);
    }

    #[test]
    fn test_checked_rejects_out_of_range() {
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, -180.5).is_err());
        assert!(GeoPoint::checked(39.9, 116.4).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(GeoPoint::new(39.5, 116.25).to_string(), "39.5,116.25");
    }
}
