//! # Scalar field sampled on a staggered grid
//! A named 3-D array (`[k, j, i]` ordering) together with the
//! location (center or face) of its samples along each axis.
use crate::error::{Result, VerifyError};
use crate::grid::{Grid, Stagger};
use ndarray::{Array1, Array3};
use std::collections::BTreeMap;

/// Fields of a run or a reference solution, keyed by name
pub type FieldSet = BTreeMap<String, GridField>;

/// Named scalar field
///
/// v: ndarray
///
///   Samples, indexed `[k, j, i]` (z, y, x)
///
/// stagger:
///
///   Center or face location of the samples along each axis.
///   Together with the [`Grid`] of the run this fixes the
///   coordinates of every sample.
#[derive(Clone, Debug, PartialEq)]
pub struct GridField {
    /// Field name (`u`, `w`, `p`, ...)
    pub name: String,
    /// Location along each axis
    pub stagger: Stagger,
    /// Samples
    pub v: Array3<f64>,
}

impl GridField {
    /// Wrap an array, checking its shape against the grid
    ///
    /// # Errors
    /// `ShapeMismatch` if the array does not have the shape
    /// the grid prescribes for this stagger.
    pub fn new(name: &str, stagger: Stagger, v: Array3<f64>, grid: &Grid) -> Result<Self> {
        let expected = grid.shape_of(stagger);
        if v.shape() != expected {
            return Err(VerifyError::ShapeMismatch {
                field: name.to_owned(),
                expected: expected.to_vec(),
                found: v.shape().to_vec(),
            });
        }
        Ok(Self {
            name: name.to_owned(),
            stagger,
            v,
        })
    }

    /// Sample `f(x, y, z)` at the field locations
    pub fn from_fn<F>(name: &str, stagger: Stagger, grid: &Grid, f: F) -> Self
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        let (x, y, z) = Self::axes(stagger, grid);
        let v = Array3::from_shape_fn((z.len(), y.len(), x.len()), |(k, j, i)| {
            f(x[i], y[j], z[k])
        });
        Self {
            name: name.to_owned(),
            stagger,
            v,
        }
    }

    /// Coordinates `(x, y, z)` of the samples of a field with
    /// the given stagger
    pub fn axes(stagger: Stagger, grid: &Grid) -> (&Array1<f64>, &Array1<f64>, &Array1<f64>) {
        (
            grid.x_at(stagger.x),
            grid.y_at(stagger.y),
            grid.z_at(stagger.z),
        )
    }

    /// Array shape
    pub fn shape(&self) -> &[usize] {
        self.v.shape()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.v.len()
    }

    /// True if the field holds no samples
    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}
