//! One solver execution, as handed over by a run loader
use crate::error::{Result, VerifyError};
use crate::field::{FieldSet, GridField};
use crate::grid::{Grid, Resolution};
use serde::Serialize;
use std::fmt;

/// Identifies a run inside a convergence study
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunKey {
    /// Numerical scheme label (e.g. `2nd`, `4th`)
    pub scheme: String,
    /// Grid resolution
    pub resolution: Resolution,
}

impl RunKey {
    /// Return a new key
    pub fn new(scheme: &str, resolution: Resolution) -> Self {
        Self {
            scheme: scheme.to_owned(),
            resolution,
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.scheme, self.resolution)
    }
}

/// Output of one simulation run at one timestep
#[derive(Clone, Debug)]
pub struct SimulationRun {
    /// Run label, as passed to the loader
    pub label: String,
    /// Numerical scheme, if known to the loader
    pub scheme: Option<String>,
    /// Grid resolution
    pub resolution: Resolution,
    /// Timestep index the fields were sampled at
    pub timestep: usize,
    /// Grid coordinates
    pub grid: Grid,
    /// Sampled fields
    pub fields: FieldSet,
}

impl SimulationRun {
    /// Return a run without fields
    pub fn new(label: &str, resolution: Resolution, timestep: usize, grid: Grid) -> Self {
        Self {
            label: label.to_owned(),
            scheme: None,
            resolution,
            timestep,
            grid,
            fields: FieldSet::new(),
        }
    }

    /// Tag the run with its numerical scheme
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = Some(scheme.to_owned());
        self
    }

    /// Add a field, checking its shape against the grid
    ///
    /// # Errors
    /// `ShapeMismatch` if the field does not fit the grid
    pub fn insert(&mut self, field: GridField) -> Result<()> {
        let expected = self.grid.shape_of(field.stagger);
        if field.shape() != expected {
            return Err(VerifyError::ShapeMismatch {
                field: field.name.clone(),
                expected: expected.to_vec(),
                found: field.shape().to_vec(),
            });
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Field by name
    pub fn field(&self, name: &str) -> Option<&GridField> {
        self.fields.get(name)
    }
}
