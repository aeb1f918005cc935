//! # Input / Output
//! Raw binary dumps as written by the solver, and
//! (with feature `hdf5`) hdf5 files.
pub mod binary;
#[cfg(feature = "hdf5")]
pub mod read_write_hdf5;
pub use binary::{read_f64_file, write_f64_file, ByteOrder};
#[cfg(feature = "hdf5")]
pub use hdf5::H5Type;
#[cfg(feature = "hdf5")]
pub use read_write_hdf5::{read_from_hdf5, read_scalar_from_hdf5};
#[cfg(feature = "hdf5")]
pub use read_write_hdf5::{write_scalar_to_hdf5, write_to_hdf5};

/// Result type of the hdf5 routines
#[cfg(feature = "hdf5")]
pub type Result<T> = hdf5::Result<T>;
