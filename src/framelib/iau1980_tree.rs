//! Built-in IAU-1980 reference frame tree
//!
//! ```text
//! G50 -- EME2000 -- MOD -- TOD -- PEF -- ITRF -- WGS84
//!                            `-- TEME
//! ```
//!
//! Every edge is a rotation; the PEF link is the one rotating-frame edge and
//! carries the LOD-corrected Earth rotation rate so velocities pick up the
//! transport term.

use super::{FrameGraph, FrameTransform, TransformFn};
use crate::eoplib::EopProvider;
use crate::iau1980::{Iau1980, SiderealModel, N_TERMS};
use crate::matrixlib::rot3;
use crate::Result;
use nalgebra::Matrix3;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Mean equator and equinox of J2000
pub const EME2000: &str = "EME2000";
/// Mean (equator) of date
pub const MOD: &str = "MOD";
/// True (equator) of date
pub const TOD: &str = "TOD";
/// Pseudo Earth fixed
pub const PEF: &str = "PEF";
/// International terrestrial reference frame
pub const ITRF: &str = "ITRF";
/// WGS84, treated as coincident with ITRF
pub const WGS84: &str = "WGS84";
/// True equator, mean equinox (the SGP4 output frame)
pub const TEME: &str = "TEME";
/// Gamma 50 reference frame
pub const G50: &str = "G50";

/// G50 to EME2000 rotation
static G50_TO_EME2000: Lazy<Matrix3<f64>> = Lazy::new(|| {
    Matrix3::new(
        0.9999256794956877,
        -0.0111814832204662,
        -0.0048590038153592,
        0.0111814832391717,
        0.9999375448327091,
        -0.0000271625947142,
        0.0048590037723143,
        -0.0000271702937440,
        0.9999881946023742,
    )
});

/// Build a frame graph holding the standard IAU-1980 tree.
///
/// All Earth-orientation edges read pole and time-scale data from the given
/// provider at evaluation time; the graph itself stays static. Station
/// frames can be registered on top afterwards.
pub fn iau1980_graph(provider: Arc<EopProvider>) -> Result<FrameGraph> {
    let model = Arc::new(Iau1980::new(provider));
    let graph = FrameGraph::new();

    graph.register_frame(EME2000, None, false)?;

    let m = Arc::clone(&model);
    let precession: TransformFn =
        Arc::new(move |epoch| Ok(FrameTransform::rotation(m.precession(epoch)?)));
    graph.register_frame(MOD, Some((EME2000, precession)), false)?;

    let m = Arc::clone(&model);
    let nutation: TransformFn =
        Arc::new(move |epoch| Ok(FrameTransform::rotation(m.nutation(epoch, true, N_TERMS)?)));
    graph.register_frame(TOD, Some((MOD, nutation)), false)?;

    let m = Arc::clone(&model);
    let sidereal: TransformFn = Arc::new(move |epoch| {
        let rotation = m.sidereal_matrix(epoch, SiderealModel::Apparent, true, N_TERMS)?;
        Ok(FrameTransform::rotating(rotation, m.rate(epoch)?))
    });
    graph.register_frame(PEF, Some((TOD, sidereal)), false)?;

    let m = Arc::clone(&model);
    let pole_motion: TransformFn =
        Arc::new(move |epoch| Ok(FrameTransform::rotation(m.pole_motion(epoch)?)));
    graph.register_frame(ITRF, Some((PEF, pole_motion)), false)?;

    let identity: TransformFn = Arc::new(|_| Ok(FrameTransform::identity()));
    graph.register_frame(WGS84, Some((ITRF, identity)), false)?;

    let m = model;
    let equinox: TransformFn = Arc::new(move |epoch| {
        let equin = m.equinox(epoch, false, 4, false)?;
        Ok(FrameTransform::rotation(rot3(-equin.to_radians())))
    });
    graph.register_frame(TEME, Some((TOD, equinox)), false)?;

    let g50: TransformFn = Arc::new(|_| Ok(FrameTransform::rotation(*G50_TO_EME2000)));
    graph.register_frame(G50, Some((EME2000, g50)), false)?;

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EARTH_ROTATION_RATE;
    use crate::eoplib::EopRow;
    use crate::framelib::State;
    use crate::timelib::{Epoch, TimeScale};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn provider() -> Arc<EopProvider> {
        // Three synthetic days around the fixture epoch with realistic
        // magnitudes for every published field
        let rows = (53100..53103)
            .map(|mjd| {
                let mut row = EopRow::plain(mjd, -0.14, 0.30, -0.44);
                row.lod = 1.5;
                row.dpsi = -52.0;
                row.deps = -3.8;
                row.dx = 0.1;
                row.dy = -0.2;
                row
            })
            .collect();
        Arc::new(EopProvider::from_rows(rows, vec![(41317, 99999, 32)]))
    }

    fn epoch() -> Epoch {
        Epoch::new(53101.0, TimeScale::Utc)
    }

    #[test]
    fn test_tree_shape() {
        let graph = iau1980_graph(provider()).unwrap();
        assert_eq!(
            graph.find_path(ITRF, EME2000).unwrap(),
            [ITRF, PEF, TOD, MOD, EME2000]
        );
        assert_eq!(graph.find_path(TEME, PEF).unwrap(), [TEME, TOD, PEF]);
        assert_eq!(graph.find_path(G50, MOD).unwrap(), [G50, EME2000, MOD]);
    }

    #[test]
    fn test_rotation_chain_preserves_radius() {
        let graph = iau1980_graph(provider()).unwrap();
        let s = State::cartesian(
            EME2000,
            Vector3::new(7000e3, -1200e3, 3000e3),
            Vector3::new(1.0e3, 7.0e3, -0.5e3),
        );
        let out = graph.transform(&s, ITRF, &epoch()).unwrap();
        // Every edge is a pure rotation, so the radius must survive
        assert_relative_eq!(
            out.position.norm(),
            s.position.norm(),
            max_relative = 1e-12
        );
        assert_eq!(out.frame, ITRF);
    }

    #[test]
    fn test_round_trip_eme2000_itrf() {
        let graph = iau1980_graph(provider()).unwrap();
        let s = State::cartesian(
            EME2000,
            Vector3::new(7000e3, -1200e3, 3000e3),
            Vector3::new(1.0e3, 7.0e3, -0.5e3),
        );
        let there = graph.transform(&s, ITRF, &epoch()).unwrap();
        let back = graph.transform(&there, EME2000, &epoch()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(back.position[i], s.position[i], max_relative = 1e-8);
            assert_relative_eq!(back.velocity[i], s.velocity[i], max_relative = 1e-8);
        }
    }

    #[test]
    fn test_round_trip_teme_g50() {
        let graph = iau1980_graph(provider()).unwrap();
        let s = State::cartesian(
            TEME,
            Vector3::new(-4400e3, 5800e3, 100e3),
            Vector3::new(-5.0e3, -3.0e3, 4.0e3),
        );
        let there = graph.transform(&s, G50, &epoch()).unwrap();
        let back = graph.transform(&there, TEME, &epoch()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(back.position[i], s.position[i], max_relative = 1e-8);
            assert_relative_eq!(back.velocity[i], s.velocity[i], max_relative = 1e-8);
        }
    }

    #[test]
    fn test_wgs84_is_itrf_alias() {
        let graph = iau1980_graph(provider()).unwrap();
        let s = State::cartesian(
            WGS84,
            Vector3::new(6378e3, 10e3, -20e3),
            Vector3::new(0.0, 1.0, 2.0),
        );
        let out = graph.transform(&s, ITRF, &epoch()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(out.position[i], s.position[i], epsilon = 1e-9);
            assert_relative_eq!(out.velocity[i], s.velocity[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ground_point_velocity_in_tod() {
        let graph = iau1980_graph(provider()).unwrap();
        // A point at rest on the rotating Earth sweeps eastward in TOD at
        // about omega * r
        let s = State::cartesian(
            PEF,
            Vector3::new(6378e3, 0.0, 0.0),
            Vector3::zeros(),
        );
        let out = graph.transform(&s, TOD, &epoch()).unwrap();
        let expected = EARTH_ROTATION_RATE * 6378e3;
        assert_relative_eq!(out.velocity.norm(), expected, max_relative = 1e-3);
        // And the transport term vanishes on the way back
        let back = graph.transform(&out, PEF, &epoch()).unwrap();
        assert!(back.velocity.norm() < 1e-6);
    }

    #[test]
    fn test_teme_close_to_tod() {
        let graph = iau1980_graph(provider()).unwrap();
        // The equation of the equinoxes is tiny: TEME and TOD differ by a
        // small rotation about z
        let s = State::cartesian(
            TEME,
            Vector3::new(7000e3, 0.0, 0.0),
            Vector3::zeros(),
        );
        let out = graph.transform(&s, TOD, &epoch()).unwrap();
        let displacement = (out.position - s.position).norm();
        assert!(displacement > 0.0, "TEME and TOD must not be identical");
        assert!(
            displacement < 1000.0,
            "TEME-TOD displacement should be sub-kilometer at 7000 km, got {displacement}"
        );
    }

    #[test]
    fn test_epoch_dependence() {
        let graph = iau1980_graph(provider()).unwrap();
        let s = State::cartesian(
            EME2000,
            Vector3::new(7000e3, 0.0, 0.0),
            Vector3::zeros(),
        );
        let day1 = graph.transform(&s, ITRF, &epoch()).unwrap();
        let later = Epoch::new(53101.5, TimeScale::Utc);
        let day2 = graph.transform(&s, ITRF, &later).unwrap();
        // Half a sidereal day apart the Earth-fixed coordinates must differ
        assert!((day1.position - day2.position).norm() > 1e6);
    }
}
