//! Ground station frames
//!
//! A station is one more leaf in the frame graph: a topocentric frame whose
//! edge to its planetocentric parent is a fixed rotation (built from the
//! geodetic coordinates and the station heading) plus the station's
//! Earth-fixed position as translation. Topocentric frames rotate before
//! translating; the local z axis points to the zenith, so the elevation of
//! a target is the spherical latitude of its state in the station frame.

use crate::constants::{WGS84_INVERSE_FLATTENING, WGS84_RADIUS};
use crate::framelib::{Frame, FrameGraph, FrameTransform, TransformFn, WGS84};
use crate::matrixlib::{rot2, rot3};
use crate::Result;
use nalgebra::Vector3;
use std::f64::consts::PI;
use std::sync::Arc;

/// Station heading: which way the topocentric x axis points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    North,
    South,
    East,
    West,
    /// Arbitrary heading in radians
    Azimuth(f64),
}

impl Orientation {
    /// The heading angle in radians.
    pub fn angle(&self) -> f64 {
        match self {
            Orientation::North => PI,
            Orientation::South => 0.0,
            Orientation::East => PI / 2.0,
            Orientation::West => 3.0 * PI / 2.0,
            Orientation::Azimuth(a) => *a,
        }
    }
}

/// Convert geodetic coordinates to cartesian on the WGS84 ellipsoid.
///
/// # Arguments
/// * `latitude` - geodetic latitude in radians
/// * `longitude` - geodetic longitude in radians, east positive
/// * `altitude` - height above the ellipsoid in meters
///
/// Returns the Earth-fixed position in meters.
pub fn geodetic_to_cartesian(latitude: f64, longitude: f64, altitude: f64) -> Vector3<f64> {
    let f = 1.0 / WGS84_INVERSE_FLATTENING;
    let e2 = f * (2.0 - f);
    let (sin_lat, cos_lat) = latitude.sin_cos();

    // Radii of curvature in the prime vertical and meridian directions
    let denom = (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let c = WGS84_RADIUS / denom;
    let s = WGS84_RADIUS * (1.0 - e2) / denom;

    let r_d = (c + altitude) * cos_lat;
    let r_k = (s + altitude) * sin_lat;

    let norm = (r_d * r_d + r_k * r_k).sqrt();
    norm * Vector3::new(
        cos_lat * longitude.cos(),
        cos_lat * longitude.sin(),
        sin_lat,
    )
}

/// Create a ground station frame and register it on the graph.
///
/// # Arguments
/// * `graph` - the frame graph to extend
/// * `name` - station frame name
/// * `latlonalt` - latitude and longitude in degrees, altitude in meters
/// * `parent` - planetocentric rotating parent frame (`None` for WGS84)
/// * `orientation` - station heading
pub fn create_station(
    graph: &FrameGraph,
    name: &str,
    latlonalt: (f64, f64, f64),
    parent: Option<&str>,
    orientation: Orientation,
) -> Result<Arc<Frame>> {
    let (lat_deg, lon_deg, altitude) = latlonalt;
    let latitude = lat_deg.to_radians();
    let longitude = lon_deg.to_radians();

    let coordinates = geodetic_to_cartesian(latitude, longitude, altitude);
    let rotation = rot3(-longitude) * rot2(latitude - PI / 2.0) * rot3(orientation.angle());

    let to_parent: TransformFn = Arc::new(move |_| {
        Ok(FrameTransform {
            rotation,
            translation: coordinates,
            angular_velocity: None,
        })
    });

    graph.register_frame(name, Some((parent.unwrap_or(WGS84), to_parent)), true)
}
