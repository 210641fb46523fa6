//! # framefield
//!
//! Reference-frame graph with IAU-1980 Earth orientation transforms.
//!
//! Converts a position/velocity state expressed in one reference frame into
//! another frame at an arbitrary epoch, by resolving the chain of elementary
//! transforms in a frame graph and composing them with the time-dependent
//! Earth-orientation corrections (precession, nutation, sidereal rotation,
//! polar motion, pole/UT1 offsets) that the terrestrial-to-inertial links need.
//!
//! ## Example
//!
//! ```no_run
//! use framefield::eoplib::EopProvider;
//! use framefield::framelib::{iau1980_graph, State};
//! use framefield::timelib::{Epoch, TimeScale};
//! use nalgebra::Vector3;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(EopProvider::from_files(
//!     "data/finals.all",
//!     "data/finals2000A.all",
//!     "data/tai-utc.txt",
//! ));
//! let graph = iau1980_graph(provider)?;
//!
//! let epoch = Epoch::from_gregorian(2024, 6, 15, 12, 0, 0.0, TimeScale::Utc)?;
//! let state = State::cartesian(
//!     "EME2000",
//!     Vector3::new(7000e3, 0.0, 0.0),
//!     Vector3::new(0.0, 7.5e3, 0.0),
//! );
//! let itrf = graph.transform(&state, "ITRF", &epoch)?;
//! # Ok::<(), framefield::FramefieldError>(())
//! ```

pub mod constants;
pub mod eoplib;
pub mod formlib;
pub mod framelib;
pub mod iau1980;
pub mod matrixlib;
pub mod stationlib;
pub mod timelib;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for framefield operations
#[derive(Error, Debug)]
pub enum FramefieldError {
    /// A table file could not be read
    #[error("File I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No path exists between two frames in the graph
    #[error("no route between frames '{from}' and '{to}'")]
    NoRoute { from: String, to: String },

    /// A frame name is not present in the graph
    #[error("unknown frame '{0}'")]
    UnknownFrame(String),

    /// A frame with this name already exists in the graph
    #[error("frame '{0}' is already registered")]
    DuplicateFrame(String),

    /// A date falls outside the coverage of the loaded Earth-orientation tables
    #[error("MJD {mjd} is outside the loaded Earth-orientation tables")]
    DataRange { mjd: f64 },

    /// A calendar date could not be converted to an epoch
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for framefield operations
pub type Result<T> = std::result::Result<T, FramefieldError>;

/// Convert a std::io::Error to FramefieldError with path context
pub(crate) fn io_err(path: impl Into<PathBuf>, err: std::io::Error) -> FramefieldError {
    FramefieldError::Io {
        path: path.into(),
        source: err,
    }
}
