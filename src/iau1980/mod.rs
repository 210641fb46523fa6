//! IAU 1980 Earth orientation model
//!
//! Implements precession (IAU 1976 angles), nutation (1980 IAU Theory,
//! 106-term series), the equation of the equinoxes, mean and apparent
//! sidereal time (GMST 1982 polynomial), polar motion, and the LOD-corrected
//! Earth rotation-rate vector. Pure functions of an epoch and an injected
//! [`EopProvider`]; rotation matrices out, never the frame graph.
//!
//! The historical constants are kept exactly as published: the model is
//! meant to be comparable digit-for-digit with legacy IAU-1980 pipelines,
//! not to track modern precession-nutation theory.
//!
//! Angle bookkeeping follows the source theory: polynomials evaluate in
//! degrees or arcseconds and every intermediate is converted explicitly
//! before reaching a trigonometric function.

mod nutation_data;

pub use nutation_data::N_TERMS;

use crate::constants::{DAY_S, EARTH_ROTATION_RATE};
use crate::eoplib::EopProvider;
use crate::matrixlib::{rot1, rot2, rot3};
use crate::timelib::{Epoch, TimeScale};
use crate::Result;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Sidereal time flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiderealModel {
    /// Greenwich Mean Sidereal Time
    Mean,
    /// Greenwich Apparent Sidereal Time (equation of the equinoxes applied)
    Apparent,
}

/// First MJD on which the kinematic equinox terms apply (1992-02-27)
const KINEMATIC_START_MJD: f64 = 50506.0;

/// Divisor taking 0.0001-arcsecond series amplitudes to degrees
const TENTH_MAS_PER_DEG: f64 = 36_000_000.0;

/// Divisor taking milliarcsecond pole corrections to degrees
const MAS_PER_DEG: f64 = 3_600_000.0;

/// Cache key for the nutation series: exact epoch bits, scale, correction
/// flag and term count.
type NutationKey = (u64, u8, bool, usize);

/// IAU 1980 Earth orientation model bound to an EOP provider.
///
/// The nutation series is by far the most expensive evaluation and is
/// invoked repeatedly for identical epochs while composing a transform
/// chain, so its results are memoized per exact call parameters.
pub struct Iau1980 {
    provider: Arc<EopProvider>,
    nutation_cache: Mutex<HashMap<NutationKey, (f64, f64, f64)>>,
}

impl Iau1980 {
    pub fn new(provider: Arc<EopProvider>) -> Self {
        Iau1980 {
            provider,
            nutation_cache: Mutex::new(HashMap::new()),
        }
    }

    /// The provider this model reads pole and time-scale data from.
    pub fn provider(&self) -> &Arc<EopProvider> {
        &self.provider
    }

    /// Precession angles zeta, theta, z in degrees.
    pub fn precession_angles(&self, epoch: &Epoch) -> Result<(f64, f64, f64)> {
        let t = epoch.to_scale(TimeScale::Tt, &self.provider)?.julian_century();
        let zeta = (2306.2181 * t + 0.30188 * t * t + 0.017998 * t * t * t) / 3600.0;
        let theta = (2004.3109 * t - 0.42665 * t * t - 0.041833 * t * t * t) / 3600.0;
        let z = (2306.2181 * t + 1.09468 * t * t + 0.018203 * t * t * t) / 3600.0;
        Ok((zeta, theta, z))
    }

    /// Precession as a rotation matrix.
    pub fn precession(&self, epoch: &Epoch) -> Result<Matrix3<f64>> {
        let (zeta, theta, z) = self.precession_angles(epoch)?;
        Ok(rot3(zeta.to_radians()) * rot2(-theta.to_radians()) * rot3(z.to_radians()))
    }

    /// Nutation angles of the 1980 model: mean obliquity, nutation in
    /// longitude and nutation in obliquity, all in degrees.
    ///
    /// `terms` selects how many series entries to sum (up to [`N_TERMS`]);
    /// the table is amplitude-ordered, so small counts keep the dominant
    /// contributions. With `eop_correction`, the tabulated dpsi/deps pole
    /// corrections for the day are added.
    pub fn nutation_angles(
        &self,
        epoch: &Epoch,
        eop_correction: bool,
        terms: usize,
    ) -> Result<(f64, f64, f64)> {
        let key: NutationKey = (
            epoch.mjd().to_bits(),
            epoch.scale() as u8,
            eop_correction,
            terms,
        );
        {
            let cache = self.lock_cache();
            if let Some(&hit) = cache.get(&key) {
                return Ok(hit);
            }
        }

        let ttt = epoch.to_scale(TimeScale::Tt, &self.provider)?.julian_century();
        let r = 360.0;

        let epsilon_bar =
            23.439291 - 0.0130042 * ttt - 1.64e-7 * ttt * ttt + 5.04e-7 * ttt * ttt * ttt;

        // Mean anomaly of the moon
        let m_m = 134.96298139
            + (1325.0 * r + 198.8673981) * ttt
            + 0.0086972 * ttt * ttt
            + 1.78e-5 * ttt * ttt * ttt;

        // Mean anomaly of the sun
        let m_s = 357.52772333 + (99.0 * r + 359.0503400) * ttt
            - 0.0001603 * ttt * ttt
            - 3.3e-6 * ttt * ttt * ttt;

        // Argument of latitude of the moon (L - Omega)
        let u_m_m = 93.27191028 + (1342.0 * r + 82.0175381) * ttt - 0.0036825 * ttt * ttt
            + 3.1e-6 * ttt * ttt * ttt;

        // Mean elongation of the moon from the sun
        let d_s = 297.85036306 + (1236.0 * r + 307.11148) * ttt - 0.0019142 * ttt * ttt
            + 5.3e-6 * ttt * ttt * ttt;

        // Mean longitude of the ascending node of the moon
        let om_m = 125.04452222 - (5.0 * r + 134.1362608) * ttt
            + 0.0020708 * ttt * ttt
            + 2.2e-6 * ttt * ttt * ttt;

        let mut delta_psi = 0.0;
        let mut delta_eps = 0.0;
        let count = terms.min(N_TERMS);
        for &(a1, a2, a3, a4, a5, big_a, big_b, big_c, big_d) in
            &nutation_data::NUTATION_1980[..count]
        {
            let arg = a1 as f64 * m_m
                + a2 as f64 * m_s
                + a3 as f64 * u_m_m
                + a4 as f64 * d_s
                + a5 as f64 * om_m;
            let arg = arg.to_radians();
            delta_psi +=
                (big_a / TENTH_MAS_PER_DEG + big_b / TENTH_MAS_PER_DEG * ttt) * arg.sin();
            delta_eps +=
                (big_c / TENTH_MAS_PER_DEG + big_d / TENTH_MAS_PER_DEG * ttt) * arg.cos();
        }

        if eop_correction {
            let pole = self.provider.get_pole(epoch.mjd())?;
            delta_psi += pole.dpsi / MAS_PER_DEG;
            delta_eps += pole.deps / MAS_PER_DEG;
        }

        let result = (epsilon_bar, delta_psi, delta_eps);
        self.lock_cache().insert(key, result);
        Ok(result)
    }

    /// Nutation as a rotation matrix.
    pub fn nutation(
        &self,
        epoch: &Epoch,
        eop_correction: bool,
        terms: usize,
    ) -> Result<Matrix3<f64>> {
        let (epsilon_bar, delta_psi, delta_eps) =
            self.nutation_angles(epoch, eop_correction, terms)?;
        let epsilon_bar = epsilon_bar.to_radians();
        let delta_psi = delta_psi.to_radians();
        let epsilon = epsilon_bar + delta_eps.to_radians();
        Ok(rot1(-epsilon_bar) * rot3(delta_psi) * rot1(epsilon))
    }

    /// Equation of the equinoxes in degrees.
    ///
    /// From 1992-02-27 on, with `kinematic` enabled, the two lunar-node
    /// terms of the kinematic definition are included.
    pub fn equinox(
        &self,
        epoch: &Epoch,
        eop_correction: bool,
        terms: usize,
        kinematic: bool,
    ) -> Result<f64> {
        let (epsilon_bar, delta_psi, delta_eps) =
            self.nutation_angles(epoch, eop_correction, terms)?;

        let mut equin = delta_psi * 3600.0 * (epsilon_bar + delta_eps).to_radians().cos();

        if epoch.day() >= KINEMATIC_START_MJD && kinematic {
            let ttt = epoch.to_scale(TimeScale::Tt, &self.provider)?.julian_century();
            let om_m = 125.04455501 - (5.0 * 360.0 + 134.1361851) * ttt
                + 0.0020756 * ttt * ttt
                + 2.139e-6 * ttt * ttt * ttt;
            equin +=
                0.00264 * om_m.to_radians().sin() + 6.3e-5 * (2.0 * om_m).to_radians().sin();
        }

        Ok(equin / 3600.0)
    }

    /// Sidereal time at the epoch in degrees, normalized to [0, 360).
    ///
    /// `longitude` is the observer's east longitude in degrees; zero gives
    /// Greenwich sidereal time. [`SiderealModel::Apparent`] applies the
    /// equation of the equinoxes on top of the GMST polynomial.
    pub fn sidereal(
        &self,
        epoch: &Epoch,
        longitude: f64,
        model: SiderealModel,
        eop_correction: bool,
        terms: usize,
    ) -> Result<f64> {
        let t = epoch.to_scale(TimeScale::Ut1, &self.provider)?.julian_century();

        // GMST polynomial in seconds of time
        let mut theta = 67310.54841 + (876600.0 * 3600.0 + 8640184.812866) * t
            + 0.093104 * t * t
            - 6.2e-6 * t * t * t;

        // Seconds of time to arcseconds, then degrees
        theta *= 15.0;
        theta /= 3600.0;

        if model == SiderealModel::Apparent {
            theta += self.equinox(epoch, eop_correction, terms, true)?;
        }

        theta += longitude;
        Ok(theta.rem_euclid(360.0))
    }

    /// Greenwich sidereal time as a rotation about the polar axis.
    pub fn sidereal_matrix(
        &self,
        epoch: &Epoch,
        model: SiderealModel,
        eop_correction: bool,
        terms: usize,
    ) -> Result<Matrix3<f64>> {
        let theta = self.sidereal(epoch, 0.0, model, eop_correction, terms)?;
        Ok(rot3(-theta.to_radians()))
    }

    /// Polar motion as a rotation matrix.
    pub fn pole_motion(&self, epoch: &Epoch) -> Result<Matrix3<f64>> {
        let pole = self.provider.get_pole(epoch.mjd())?;
        let x_p = (pole.x / 3600.0).to_radians();
        let y_p = (pole.y / 3600.0).to_radians();
        Ok(rot1(y_p) * rot2(x_p))
    }

    /// Earth rotation-rate vector in rad/s, corrected for the tabulated
    /// length-of-day excess.
    pub fn rate(&self, epoch: &Epoch) -> Result<Vector3<f64>> {
        let lod_s = self.provider.get_pole(epoch.mjd())?.lod / 1000.0;
        Ok(Vector3::new(
            0.0,
            0.0,
            EARTH_ROTATION_RATE * (1.0 - lod_s / DAY_S),
        ))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<NutationKey, (f64, f64, f64)>> {
        self.nutation_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
