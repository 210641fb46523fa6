//! Epochs and time scales
//!
//! An [`Epoch`] is a Modified Julian Date tagged with the time scale it is
//! expressed in. Conversions between UT1, UTC, TAI and TT route through TAI:
//! TT = TAI + 32.184 s, TAI = UTC + leap seconds, UT1 = UTC + (UT1-UTC),
//! with the tabulated offsets supplied by an [`EopProvider`].

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY, MJD_JD_OFFSET, TT_TAI_S};
use crate::eoplib::{EopProvider, ScalesDiff};
use crate::{FramefieldError, Result};
use chrono::NaiveDate;

/// Time scales supported by [`Epoch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeScale {
    /// Universal Time, tied to Earth rotation
    Ut1,
    /// Coordinated Universal Time
    Utc,
    /// International Atomic Time
    Tai,
    /// Terrestrial Time
    Tt,
}

impl std::fmt::Display for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TimeScale::Ut1 => "UT1",
            TimeScale::Utc => "UTC",
            TimeScale::Tai => "TAI",
            TimeScale::Tt => "TT",
        };
        write!(f, "{name}")
    }
}

/// An instant in time: a fractional Modified Julian Date in a given scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Epoch {
    mjd: f64,
    scale: TimeScale,
}

impl Epoch {
    /// Create an epoch from a fractional MJD in the given scale.
    pub const fn new(mjd: f64, scale: TimeScale) -> Self {
        Epoch { mjd, scale }
    }

    /// Create an epoch from a Gregorian calendar date and time of day.
    pub fn from_gregorian(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
        scale: TimeScale,
    ) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            FramefieldError::InvalidDate(format!("{year:04}-{month:02}-{day:02}"))
        })?;
        if hour > 23 || minute > 59 || !(0.0..60.0).contains(&second) {
            return Err(FramefieldError::InvalidDate(format!(
                "{hour:02}:{minute:02}:{second}"
            )));
        }
        // MJD 0 is 1858-11-17T00:00:00
        let mjd_origin = NaiveDate::from_ymd_opt(1858, 11, 17)
            .ok_or_else(|| FramefieldError::InvalidDate("MJD origin".into()))?;
        let days = date.signed_duration_since(mjd_origin).num_days() as f64;
        let day_fraction = ((hour * 3600 + minute * 60) as f64 + second) / DAY_S;
        Ok(Epoch::new(days + day_fraction, scale))
    }

    /// Fractional Modified Julian Date.
    pub fn mjd(&self) -> f64 {
        self.mjd
    }

    /// Integer day part of the MJD.
    pub fn day(&self) -> f64 {
        self.mjd.floor()
    }

    /// Julian date.
    pub fn jd(&self) -> f64 {
        self.mjd + MJD_JD_OFFSET
    }

    /// Time scale this epoch is expressed in.
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Julian centuries since J2000.0 in this epoch's scale.
    pub fn julian_century(&self) -> f64 {
        (self.jd() - J2000) / JULIAN_CENTURY
    }

    /// Convert this epoch to another time scale.
    ///
    /// TAI↔TT is a fixed offset; conversions touching UTC or UT1 look up the
    /// tabulated offsets at this epoch's date and fail with a data-range error
    /// outside table coverage.
    pub fn to_scale(&self, target: TimeScale, provider: &EopProvider) -> Result<Epoch> {
        if self.scale == target {
            return Ok(*self);
        }
        let needs_tables = |s: TimeScale| matches!(s, TimeScale::Ut1 | TimeScale::Utc);
        let scales = if needs_tables(self.scale) || needs_tables(target) {
            provider.get_timescales(self.mjd)?
        } else {
            ScalesDiff::default()
        };
        let from = offset_from_tai(self.scale, &scales);
        let to = offset_from_tai(target, &scales);
        Ok(Epoch::new(self.mjd + (to - from) / DAY_S, target))
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MJD {:.9} {}", self.mjd, self.scale)
    }
}

/// Seconds to add to a TAI reading of an instant to express it in `scale`.
fn offset_from_tai(scale: TimeScale, scales: &ScalesDiff) -> f64 {
    match scale {
        TimeScale::Tai => 0.0,
        TimeScale::Tt => TT_TAI_S,
        TimeScale::Utc => -scales.tai_utc,
        TimeScale::Ut1 => scales.ut1_tai,
    }
}
