//! # Error norms
//! Reduce the difference between a simulated field and its
//! analytic counterpart to a single nonnegative number.
//!
//! The default is the unweighted root mean square
//! $$
//! e = \sqrt{ \frac{1}{N} \sum (f\\_{sim} - f\\_{ref})^2 }
//! $$
//! which is what equidistant grids call for. Volume weighted
//! norms are available for stretched grids.
use crate::error::{Result, VerifyError};
use crate::field::GridField;
use crate::grid::{Grid, Stagger};
use crate::reference::ReferenceSolution;
use crate::run::SimulationRun;
use crate::types::FloatNum;
use ndarray::{Array3, ArrayBase, Data, Dimension};
use serde::Serialize;
use std::collections::BTreeMap;

/// Return root mean square of an array (zero if empty)
pub fn norm_rms<A, S, D>(array: &ArrayBase<S, D>) -> A
where
    A: FloatNum,
    S: Data<Elem = A>,
    D: Dimension,
{
    match A::from_usize(array.len()) {
        Some(n) if !array.is_empty() => (array.iter().map(|x| x.powi(2)).sum::<A>() / n).sqrt(),
        _ => A::zero(),
    }
}

/// Return volume weighted l2 norm, normalized by the total volume
pub fn norm_weighted_l2<A, S1, S2, D>(array: &ArrayBase<S1, D>, weights: &ArrayBase<S2, D>) -> A
where
    A: FloatNum,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    let volume: A = weights.iter().copied().sum();
    if volume <= A::zero() {
        return A::zero();
    }
    let sum: A = array
        .iter()
        .zip(weights.iter())
        .map(|(x, w)| *w * x.powi(2))
        .sum();
    (sum / volume).sqrt()
}

/// Return volume integral of the absolute value
pub fn norm_weighted_l1<A, S1, S2, D>(array: &ArrayBase<S1, D>, weights: &ArrayBase<S2, D>) -> A
where
    A: FloatNum,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    array
        .iter()
        .zip(weights.iter())
        .map(|(x, w)| *w * x.abs())
        .sum()
}

/// Return maximum absolute value (zero if empty)
pub fn norm_max<A, S, D>(array: &ArrayBase<S, D>) -> A
where
    A: FloatNum,
    S: Data<Elem = A>,
    D: Dimension,
{
    array.iter().fold(A::zero(), |acc, x| acc.max(x.abs()))
}

/// Reduce a pointwise difference to a scalar
#[enum_dispatch]
pub trait ErrorNorm {
    /// `diff` is sampled at the locations `stagger` selects on `grid`
    fn reduce(&self, diff: &Array3<f64>, grid: &Grid, stagger: Stagger) -> f64;
}

/// Unweighted root mean square
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rms;

/// Root mean square, weighted by cell volume
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeightedL2;

/// Volume integral of the absolute difference
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeightedL1;

/// Maximum absolute difference
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaxAbs;

impl ErrorNorm for Rms {
    fn reduce(&self, diff: &Array3<f64>, _grid: &Grid, _stagger: Stagger) -> f64 {
        norm_rms(diff)
    }
}

impl ErrorNorm for WeightedL2 {
    fn reduce(&self, diff: &Array3<f64>, grid: &Grid, stagger: Stagger) -> f64 {
        norm_weighted_l2(diff, &grid.cell_volumes(stagger))
    }
}

impl ErrorNorm for WeightedL1 {
    fn reduce(&self, diff: &Array3<f64>, grid: &Grid, stagger: Stagger) -> f64 {
        norm_weighted_l1(diff, &grid.cell_volumes(stagger))
    }
}

impl ErrorNorm for MaxAbs {
    fn reduce(&self, diff: &Array3<f64>, _grid: &Grid, _stagger: Stagger) -> f64 {
        norm_max(diff)
    }
}

/// Collection of error norms
#[enum_dispatch(ErrorNorm)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Norm {
    /// Unweighted root mean square (default)
    Rms(Rms),
    /// Volume weighted root mean square
    WeightedL2(WeightedL2),
    /// Volume integral of absolute difference
    WeightedL1(WeightedL1),
    /// Maximum absolute difference
    MaxAbs(MaxAbs),
}

impl Default for Norm {
    fn default() -> Self {
        Self::Rms(Rms)
    }
}

impl Norm {
    /// Short name, as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rms(_) => "rms",
            Self::WeightedL2(_) => "weighted_l2",
            Self::WeightedL1(_) => "weighted_l1",
            Self::MaxAbs(_) => "max",
        }
    }
}

/// Error magnitude per field of one run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ErrorReport {
    errors: BTreeMap<String, f64>,
}

impl ErrorReport {
    /// Error of a field
    pub fn get(&self, field: &str) -> Option<f64> {
        self.errors.get(field).copied()
    }

    /// Iterate over (field, error), ordered by field name
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names of the reported fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Number of reported fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True if no field was reported
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Root mean square error of every field present in both
/// the run and the reference.
///
/// # Errors
/// See [`error_with`]
pub fn error(simulated: &SimulationRun, reference: &ReferenceSolution) -> Result<ErrorReport> {
    error_with(simulated, reference, &Norm::default())
}

/// Error of every field present in both the run and the reference,
/// measured in `norm`. Fields present in only one of them are skipped.
///
/// # Errors
/// `ShapeMismatch` if a field's arrays differ in shape,
/// `CoordinateMismatch` if they are sampled on different x or z
/// coordinates. Arrays are never interpolated.
pub fn error_with(
    simulated: &SimulationRun,
    reference: &ReferenceSolution,
    norm: &Norm,
) -> Result<ErrorReport> {
    let mut report = ErrorReport::default();
    for (name, sim) in &simulated.fields {
        let refe = match reference.field(name) {
            Some(refe) => refe,
            None => continue,
        };
        check_compatible(name, sim, &simulated.grid, refe, &reference.grid)?;
        let diff = &sim.v - &refe.v;
        let value = norm.reduce(&diff, &simulated.grid, sim.stagger);
        report.errors.insert(name.clone(), value);
    }
    Ok(report)
}

/// Shapes must agree, as well as the x and z coordinates.
/// The homogeneous y direction is only checked through the shape.
fn check_compatible(
    name: &str,
    sim: &GridField,
    sim_grid: &Grid,
    refe: &GridField,
    ref_grid: &Grid,
) -> Result<()> {
    if sim.shape() != refe.shape() {
        return Err(VerifyError::ShapeMismatch {
            field: name.to_owned(),
            expected: refe.shape().to_vec(),
            found: sim.shape().to_vec(),
        });
    }
    if sim_grid.x_at(sim.stagger.x) != ref_grid.x_at(refe.stagger.x) {
        return Err(VerifyError::CoordinateMismatch {
            field: name.to_owned(),
            axis: "x",
        });
    }
    if sim_grid.z_at(sim.stagger.z) != ref_grid.z_at(refe.stagger.z) {
        return Err(VerifyError::CoordinateMismatch {
            field: name.to_owned(),
            axis: "z",
        });
    }
    Ok(())
}
