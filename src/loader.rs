//! # Run loaders
//! Boundary between the solver output on disk and the
//! verification pipeline. A loader turns a run label, a
//! resolution and a timestep into a [`SimulationRun`].
//!
//! Implemented:
//! - [`BinaryLoader`]: raw binary dumps of the solver
//! - [`Hdf5Loader`]: hdf5 files (feature `hdf5`)
//! - [`SyntheticLoader`]: analytic solution plus a prescribed
//!   discretization error
pub mod binary;
#[cfg(feature = "hdf5")]
pub mod h5;
pub mod synthetic;
use crate::error::Result;
use crate::grid::Resolution;
use crate::run::SimulationRun;
pub use binary::BinaryLoader;
#[cfg(feature = "hdf5")]
pub use h5::Hdf5Loader;
pub use synthetic::SyntheticLoader;

/// Velocity and pressure, the fields the Taylor-Green study compares
pub const DEFAULT_FIELDS: [&str; 3] = ["u", "w", "p"];

/// Load one simulation run.
///
/// Loaders are shared between threads of a study.
pub trait RunLoader: Sync {
    /// Load run `label` at `resolution`, sampled at `timestep`
    ///
    /// # Errors
    /// `LoadFailure` if the run can't be read or parsed
    fn load(&self, label: &str, resolution: Resolution, timestep: usize) -> Result<SimulationRun>;
}

/// Fill a run label pattern.
///
/// Placeholders: `{scheme}`, `{nx}`, `{nz}`.
///
/// # Example
/// ```
/// use taylorgreen::grid::Resolution;
/// use taylorgreen::loader::format_label;
///
/// let label = format_label("taylorgreen{nx}_{scheme}", "2nd", Resolution::new(16, 8));
/// assert_eq!(label, "taylorgreen16_2nd");
/// ```
pub fn format_label(pattern: &str, scheme: &str, resolution: Resolution) -> String {
    pattern
        .replace("{scheme}", scheme)
        .replace("{nx}", &resolution.nx.to_string())
        .replace("{nz}", &resolution.nz.to_string())
}

/// File name suffix of a timestep, zero padded to seven digits
pub(crate) fn timestep_suffix(timestep: usize) -> String {
    format!("{:07}", timestep)
}
