//! Earth-orientation parameter provider
//!
//! Parses the IERS `finals.all` / `finals2000A.all` tables (fixed-width
//! columns, MJD-keyed rows) and a leap-second range table, then serves
//! pole position, pole corrections, length-of-day and time-scale offsets
//! for any covered date. Integer dates return the tabulated entry; fractional
//! dates linearly interpolate between the floor and ceiling days. Leap
//! seconds are a step function and are never interpolated.
//!
//! Tables are parsed once, lazily, on first access. A malformed row in the
//! common fields (MJD, X, Y, UT1-UTC) ends the useful data of that table;
//! rows already parsed stay available. Missing dX/dY, dpsi/deps or LOD fields
//! are backfilled from the previous tabulated day.

use crate::{io_err, FramefieldError, Result};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;

/// Time-scale offsets at a date, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalesDiff {
    /// UT1 - TAI
    pub ut1_tai: f64,
    /// UT1 - UTC
    pub ut1_utc: f64,
    /// TAI - UTC (integer leap seconds, carried as f64 after interpolation)
    pub tai_utc: f64,
}

/// Pole position and corrections at a date.
///
/// X and Y in arcseconds; dpsi, deps, dX, dY in milliarcseconds; LOD in
/// milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoleValues {
    pub x: f64,
    pub y: f64,
    pub dpsi: f64,
    pub deps: f64,
    pub dx: f64,
    pub dy: f64,
    pub lod: f64,
}

/// One merged day of Earth-orientation data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EopRow {
    pub mjd: i64,
    /// Pole X in arcseconds
    pub x: f64,
    /// Pole Y in arcseconds
    pub y: f64,
    /// UT1 - UTC in seconds
    pub ut1_utc: f64,
    /// Length of day in milliseconds
    pub lod: f64,
    /// Nutation correction dpsi in milliarcseconds
    pub dpsi: f64,
    /// Nutation correction deps in milliarcseconds
    pub deps: f64,
    /// Celestial pole offset dX in milliarcseconds
    pub dx: f64,
    /// Celestial pole offset dY in milliarcseconds
    pub dy: f64,
}

impl EopRow {
    /// A row with only the always-published fields set.
    pub fn plain(mjd: i64, x: f64, y: f64, ut1_utc: f64) -> Self {
        EopRow {
            mjd,
            x,
            y,
            ut1_utc,
            lod: 0.0,
            dpsi: 0.0,
            deps: 0.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

/// Where a backing table comes from.
#[derive(Debug, Clone)]
enum TableSource {
    Path(PathBuf),
    Text(String),
    Empty,
}

impl TableSource {
    fn load(&self) -> Result<String> {
        match self {
            TableSource::Path(p) => fs::read_to_string(p).map_err(|e| io_err(p.clone(), e)),
            TableSource::Text(t) => Ok(t.clone()),
            TableSource::Empty => Ok(String::new()),
        }
    }
}

/// Provider of tabulated Earth-orientation parameters and time-scale offsets.
///
/// Constructible from file paths, raw table text, or prebuilt rows (synthetic
/// tables for tests). Parsing happens once, on first access, and is
/// thread-safe.
#[derive(Debug)]
pub struct EopProvider {
    /// finals.all source (dpsi/deps in the delta columns)
    finals: TableSource,
    /// finals2000A.all source (dX/dY in the delta columns)
    finals2000a: TableSource,
    /// leap-second range table source
    tai_utc: TableSource,
    rows: OnceCell<BTreeMap<i64, EopRow>>,
    leaps: OnceCell<Vec<(i64, i64, i64)>>,
}

impl EopProvider {
    /// Provider backed by table files on disk, loaded lazily.
    pub fn from_files(
        finals: impl Into<PathBuf>,
        finals2000a: impl Into<PathBuf>,
        tai_utc: impl Into<PathBuf>,
    ) -> Self {
        EopProvider {
            finals: TableSource::Path(finals.into()),
            finals2000a: TableSource::Path(finals2000a.into()),
            tai_utc: TableSource::Path(tai_utc.into()),
            rows: OnceCell::new(),
            leaps: OnceCell::new(),
        }
    }

    /// Provider backed by raw table text.
    pub fn from_strings(finals: &str, finals2000a: &str, tai_utc: &str) -> Self {
        EopProvider {
            finals: TableSource::Text(finals.to_owned()),
            finals2000a: TableSource::Text(finals2000a.to_owned()),
            tai_utc: TableSource::Text(tai_utc.to_owned()),
            rows: OnceCell::new(),
            leaps: OnceCell::new(),
        }
    }

    /// Provider over prebuilt rows and leap ranges; no parsing involved.
    pub fn from_rows(rows: Vec<EopRow>, leaps: Vec<(i64, i64, i64)>) -> Self {
        let provider = EopProvider {
            finals: TableSource::Empty,
            finals2000a: TableSource::Empty,
            tai_utc: TableSource::Empty,
            rows: OnceCell::new(),
            leaps: OnceCell::new(),
        };
        let map = rows.into_iter().map(|r| (r.mjd, r)).collect();
        let _ = provider.rows.set(map);
        let _ = provider.leaps.set(leaps);
        provider
    }

    /// Provider with no data; every dated lookup fails with a range error.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new(), Vec::new())
    }

    /// Pole position and corrections at a fractional MJD.
    pub fn get_pole(&self, mjd: f64) -> Result<PoleValues> {
        if mjd.fract() == 0.0 {
            return Ok(pole_values(self.row(mjd as i64, mjd)?));
        }
        let (d0, d1) = day_boundaries(mjd);
        let start = pole_values(self.row(d0, mjd)?);
        let stop = pole_values(self.row(d1, mjd)?);
        let (x0, x1) = (d0 as f64, d1 as f64);
        Ok(PoleValues {
            x: linear(mjd, x0, x1, start.x, stop.x),
            y: linear(mjd, x0, x1, start.y, stop.y),
            dpsi: linear(mjd, x0, x1, start.dpsi, stop.dpsi),
            deps: linear(mjd, x0, x1, start.deps, stop.deps),
            dx: linear(mjd, x0, x1, start.dx, stop.dx),
            dy: linear(mjd, x0, x1, start.dy, stop.dy),
            lod: linear(mjd, x0, x1, start.lod, stop.lod),
        })
    }

    /// Time-scale offsets at a fractional MJD.
    ///
    /// UT1-TAI and UT1-UTC interpolate linearly between days; TAI-UTC is a
    /// step function and comes from the floor day.
    pub fn get_timescales(&self, mjd: f64) -> Result<ScalesDiff> {
        if mjd.fract() == 0.0 {
            return self.scales_at(mjd as i64, mjd);
        }
        let (d0, d1) = day_boundaries(mjd);
        let start = self.scales_at(d0, mjd)?;
        let stop = self.scales_at(d1, mjd)?;
        let (x0, x1) = (d0 as f64, d1 as f64);
        Ok(ScalesDiff {
            ut1_tai: linear(mjd, x0, x1, start.ut1_tai, stop.ut1_tai),
            ut1_utc: linear(mjd, x0, x1, start.ut1_utc, stop.ut1_utc),
            tai_utc: start.tai_utc,
        })
    }

    /// Leap-second count (TAI - UTC) at a date.
    ///
    /// Scans the ordered ranges and returns the value whose range contains
    /// the date; dates outside every range degrade to the oldest known value
    /// (zero when no ranges are loaded at all). Never fails.
    pub fn get_tai_utc(&self, mjd: f64) -> i64 {
        let leaps = match self.leap_table() {
            Ok(l) => l,
            Err(_) => return 0,
        };
        let mut value = leaps.first().map_or(0, |&(_, _, v)| v);
        for &(start, stop, v) in leaps {
            if (start as f64) <= mjd && mjd < stop as f64 {
                value = v;
            }
        }
        value
    }

    fn scales_at(&self, day: i64, requested: f64) -> Result<ScalesDiff> {
        let ut1_utc = self.row(day, requested)?.ut1_utc;
        let tai_utc = self.get_tai_utc(day as f64) as f64;
        Ok(ScalesDiff {
            ut1_tai: ut1_utc - tai_utc,
            ut1_utc,
            tai_utc,
        })
    }

    fn row(&self, day: i64, requested: f64) -> Result<&EopRow> {
        self.merged_rows()?
            .get(&day)
            .ok_or(FramefieldError::DataRange { mjd: requested })
    }

    fn merged_rows(&self) -> Result<&BTreeMap<i64, EopRow>> {
        self.rows.get_or_try_init(|| {
            let with_deltas = parse_finals(&self.finals2000a.load()?);
            let with_nutation = parse_finals(&self.finals.load()?);

            let mut merged: BTreeMap<i64, EopRow> = BTreeMap::new();
            for (&mjd, raw) in &with_deltas {
                merged.insert(
                    mjd,
                    EopRow {
                        mjd,
                        x: raw.x,
                        y: raw.y,
                        ut1_utc: raw.ut1_utc,
                        lod: raw.lod,
                        dx: raw.delta_a,
                        dy: raw.delta_b,
                        dpsi: 0.0,
                        deps: 0.0,
                    },
                );
            }
            // finals.all refines the common fields and contributes dpsi/deps;
            // UT1-UTC stays with the finals2000A value when both tables cover
            // the day.
            for (&mjd, raw) in &with_nutation {
                let row = merged.entry(mjd).or_insert_with(|| EopRow {
                    mjd,
                    x: raw.x,
                    y: raw.y,
                    ut1_utc: raw.ut1_utc,
                    lod: raw.lod,
                    dx: 0.0,
                    dy: 0.0,
                    dpsi: 0.0,
                    deps: 0.0,
                });
                row.x = raw.x;
                row.y = raw.y;
                row.lod = raw.lod;
                row.dpsi = raw.delta_a;
                row.deps = raw.delta_b;
            }
            Ok(merged)
        })
    }

    fn leap_table(&self) -> Result<&Vec<(i64, i64, i64)>> {
        self.leaps
            .get_or_try_init(|| Ok(parse_tai_utc(&self.tai_utc.load()?)))
    }
}

/// One parsed line of a finals-format table, before merging.
#[derive(Debug, Clone, Copy)]
struct RawRow {
    x: f64,
    y: f64,
    ut1_utc: f64,
    lod: f64,
    delta_a: f64,
    delta_b: f64,
}

/// Fixed-width column layout of the IERS finals format.
const COL_MJD: Range<usize> = 7..15;
const COL_X: Range<usize> = 18..27;
const COL_Y: Range<usize> = 37..46;
const COL_UT1_UTC: Range<usize> = 58..68;
const COL_LOD: Range<usize> = 79..86;
const COL_DELTA_A: Range<usize> = 97..106;
const COL_DELTA_B: Range<usize> = 116..125;

fn field(line: &str, range: Range<usize>) -> Option<f64> {
    line.get(range)?.trim().parse().ok()
}

/// Parse a finals-format table.
///
/// Stops at the first line whose common fields (MJD, X, Y, UT1-UTC) do not
/// parse: predicted rows at the end of real files lose those columns, and
/// everything after them is treated as absent. Missing LOD or delta fields
/// are carried forward from the previous day (zero when there is no
/// previous day).
fn parse_finals(text: &str) -> BTreeMap<i64, RawRow> {
    let mut rows: BTreeMap<i64, RawRow> = BTreeMap::new();
    for line in text.lines() {
        let common = (
            field(line, COL_MJD),
            field(line, COL_X),
            field(line, COL_Y),
            field(line, COL_UT1_UTC),
        );
        let (Some(mjd), Some(x), Some(y), Some(ut1_utc)) = common else {
            break;
        };
        let mjd = mjd as i64;
        let prev = rows.get(&(mjd - 1)).copied();
        let lod = field(line, COL_LOD)
            .or_else(|| prev.map(|p| p.lod))
            .unwrap_or(0.0);
        let deltas = (field(line, COL_DELTA_A), field(line, COL_DELTA_B));
        let (delta_a, delta_b) = match deltas {
            (Some(a), Some(b)) => (a, b),
            _ => prev.map_or((0.0, 0.0), |p| (p.delta_a, p.delta_b)),
        };
        rows.insert(
            mjd,
            RawRow {
                x,
                y,
                ut1_utc,
                lod,
                delta_a,
                delta_b,
            },
        );
    }
    rows
}

/// Parse the leap-second table: whitespace-separated `start stop value`
/// integer-MJD ranges, `#` comments and blank lines skipped.
fn parse_tai_utc(text: &str) -> Vec<(i64, i64, i64)> {
    let mut ranges = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let parsed = (
            parts.next().and_then(|s| s.parse().ok()),
            parts.next().and_then(|s| s.parse().ok()),
            parts.next().and_then(|s| s.parse().ok()),
        );
        let (Some(start), Some(stop), Some(value)) = parsed else {
            break;
        };
        ranges.push((start, stop, value));
    }
    ranges
}

fn pole_values(row: &EopRow) -> PoleValues {
    PoleValues {
        x: row.x,
        y: row.y,
        dpsi: row.dpsi,
        deps: row.deps,
        dx: row.dx,
        dy: row.dy,
        lod: row.lod,
    }
}

fn day_boundaries(mjd: f64) -> (i64, i64) {
    (mjd.floor() as i64, mjd.ceil() as i64)
}

/// Linear interpolation of `y` at `x` between `(x0, y0)` and `(x1, y1)`.
fn linear(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
