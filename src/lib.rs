//! # `taylorgreen`: Grid convergence verification of a flow solver
//!<img align="right" src="https://rustacean.net/assets/cuddlyferris.png" width="80">
//!
//! Loads the output of 2-D Taylor-Green vortex runs on a staggered
//! grid, compares it with the analytic solution, and estimates the
//! observed order of accuracy of every numerical scheme from a
//! sequence of grid refinements.
//!
//! # Dependencies
//! - cargo >= v1.62
//! - `hdf5` (sudo apt-get install -y libhdf5-dev), only with feature `hdf5`
//!
//! # Details
//!
//! The pipeline consists of
//! - [`reference`]: analytic Taylor-Green solution on the staggered grid
//! - [`norm`]: error norms between simulated and analytic fields
//! - [`convergence`]: observed order of accuracy from error and spacing
//! - [`study`]: runs all of the above over schemes and resolutions
//!
//! Runs are read by a [`loader::RunLoader`]. Implemented are raw binary
//! dumps, hdf5 files and synthetic runs with a prescribed order.
//!
//! # Example
//! Verify two synthetic schemes
//! ```
//! use taylorgreen::grid::Resolution;
//! use taylorgreen::loader::SyntheticLoader;
//! use taylorgreen::study::{run_study, StudyParameters};
//!
//! let (viscosity, time) = (0.1, 0.1);
//! let loader = SyntheticLoader::new(viscosity, time)
//!     .unwrap()
//!     .with_scheme("2nd", 2.)
//!     .with_scheme("4th", 4.);
//! let resolutions = vec![Resolution::new(16, 8), Resolution::new(32, 16)];
//! let params = StudyParameters::new(&["2nd", "4th"], resolutions, viscosity, time, 1);
//! let report = run_study(&params, &loader).unwrap();
//! assert!((report.order("2nd", "p").unwrap() - 2.).abs() < 0.1);
//! ```
//!
//! Run a study from a configuration file
//!
//! `cargo run --release -- cases/taylorgreen_diff.toml`
//!
//! ## Documentation
//!
//! Download and run:
//!
//! `cargo doc --open`
#![warn(missing_docs)]
#![allow(clippy::unnecessary_cast)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate enum_dispatch;
pub mod config;
pub mod convergence;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;
pub mod loader;
pub mod logging;
pub mod norm;
pub mod reference;
pub mod report;
pub mod run;
pub mod study;
pub mod types;

pub use error::{Result, VerifyError};

#[cfg(test)]
pub(crate) mod tests {
    use ndarray::{ArrayBase, Data, Dimension};

    /// Panics if two arrays differ by more than round-off
    pub(crate) fn approx_eq<S, D>(result: &ArrayBase<S, D>, expected: &ArrayBase<S, D>)
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        assert_eq!(result.shape(), expected.shape());
        let dif = 1e-12;
        for (a, b) in expected.iter().zip(result.iter()) {
            if (a - b).abs() > dif {
                panic!("Large difference of values, got {} expected {}.", b, a)
            }
        }
    }
}
