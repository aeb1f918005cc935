//! # Analytic reference: decaying Taylor-Green vortex
//! Closed form solution of the 2-D Navier-Stokes equations on the
//! unit-periodic square (`x`-`z` plane):
//! $$
//! u = -\cos(2\pi x_h) \sin(2\pi z) e^{-2(2\pi)^2 \nu t}
//! $$
//! $$
//! w = \sin(2\pi x) \cos(2\pi z_h) e^{-2(2\pi)^2 \nu t}
//! $$
//! $$
//! p = -\frac{1}{4} (\cos(4\pi x) + \cos(4\pi z)) e^{-4(2\pi)^2 \nu t}
//! $$
//! `u` lives on x-faces, `w` on z-faces, `p` on cell centers. The
//! homogeneous direction `y` carries no variation.
//!
//! # Example
//! ```
//! use taylorgreen::reference::evaluate;
//!
//! let x = [0.125, 0.375, 0.625, 0.875];
//! let xh = [0., 0.25, 0.5, 0.75];
//! let z = [0.125, 0.375];
//! let zh = [0., 0.25];
//! let reference = evaluate(&x, &xh, &z, &zh, 0.1, 0.).unwrap();
//! assert_eq!(reference.field("u").unwrap().shape(), &[2, 1, 4]);
//! ```
use crate::error::{Result, VerifyError};
use crate::field::{FieldSet, GridField};
use crate::grid::{Grid, Stagger};
use ndarray::{Array1, Array3};
use std::f64::consts::PI;

const TWO_PI: f64 = 2. * PI;

/// Return kinematic viscosity from a Reynolds number (`nu = 1/Re`)
///
/// # Errors
/// `InvalidInput` if `re` is not positive and finite
pub fn viscosity_from_reynolds(re: f64) -> Result<f64> {
    if !(re.is_finite() && re > 0.) {
        return Err(VerifyError::InvalidInput(format!(
            "Reynolds number must be positive, got {}",
            re
        )));
    }
    Ok(1. / re)
}

/// Taylor-Green vortex with fixed viscosity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaylorGreen {
    viscosity: f64,
}

impl TaylorGreen {
    /// Return a new Taylor-Green solution
    ///
    /// # Errors
    /// `InvalidInput` if the viscosity is not positive and finite
    pub fn new(viscosity: f64) -> Result<Self> {
        if !(viscosity.is_finite() && viscosity > 0.) {
            return Err(VerifyError::InvalidInput(format!(
                "viscosity must be positive, got {}",
                viscosity
            )));
        }
        Ok(Self { viscosity })
    }

    /// Kinematic viscosity
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    /// Amplitude of the velocity at time `t`
    pub fn velocity_decay(&self, t: f64) -> f64 {
        (-2. * TWO_PI.powi(2) * self.viscosity * t).exp()
    }

    /// Amplitude of the pressure at time `t`
    pub fn pressure_decay(&self, t: f64) -> f64 {
        (-4. * TWO_PI.powi(2) * self.viscosity * t).exp()
    }

    /// Horizontal velocity at (`xh`, `z`)
    pub fn u(&self, xh: f64, z: f64, t: f64) -> f64 {
        -(TWO_PI * xh).cos() * (TWO_PI * z).sin() * self.velocity_decay(t)
    }

    /// Vertical velocity at (`x`, `zh`)
    pub fn w(&self, x: f64, zh: f64, t: f64) -> f64 {
        (TWO_PI * x).sin() * (TWO_PI * zh).cos() * self.velocity_decay(t)
    }

    /// Pressure at (`x`, `z`)
    pub fn p(&self, x: f64, z: f64, t: f64) -> f64 {
        -0.25 * ((2. * TWO_PI * x).cos() + (2. * TWO_PI * z).cos()) * self.pressure_decay(t)
    }

    /// Evaluate `u`, `w` and `p` on every sample location of `grid`.
    ///
    /// Each field is the outer combination of a profile in `x`
    /// and a profile in `z`, broadcast along `y`.
    ///
    /// # Errors
    /// `InvalidInput` if `time` is negative or not finite
    pub fn evaluate_on(&self, grid: &Grid, time: f64) -> Result<ReferenceSolution> {
        if !(time.is_finite() && time >= 0.) {
            return Err(VerifyError::InvalidInput(format!(
                "time must be nonnegative, got {}",
                time
            )));
        }
        let ny = grid.y.len();
        let vel = self.velocity_decay(time);
        let pres = self.pressure_decay(time);

        let mut fields = FieldSet::new();

        // u on (xh, z)
        let fx = grid.xh.mapv(|x| -(TWO_PI * x).cos());
        let fz = grid.z.mapv(|z| (TWO_PI * z).sin() * vel);
        let stagger = Stagger::for_field("u");
        fields.insert("u".to_owned(), outer(&fz, ny, &fx, "u", stagger, |a, b| a * b));

        // w on (x, zh)
        let fx = grid.x.mapv(|x| (TWO_PI * x).sin());
        let fz = grid.zh.mapv(|z| (TWO_PI * z).cos() * vel);
        let stagger = Stagger::for_field("w");
        fields.insert("w".to_owned(), outer(&fz, ny, &fx, "w", stagger, |a, b| a * b));

        // p on (x, z)
        let fx = grid.x.mapv(|x| -0.25 * (2. * TWO_PI * x).cos() * pres);
        let fz = grid.z.mapv(|z| -0.25 * (2. * TWO_PI * z).cos() * pres);
        fields.insert(
            "p".to_owned(),
            outer(&fz, ny, &fx, "p", Stagger::CENTER, |a, b| a + b),
        );

        Ok(ReferenceSolution {
            grid: grid.clone(),
            time,
            viscosity: self.viscosity,
            fields,
        })
    }
}

/// Combine a z-profile and a x-profile to a `[k, j, i]` array
fn outer<F>(
    fz: &Array1<f64>,
    ny: usize,
    fx: &Array1<f64>,
    name: &str,
    stagger: Stagger,
    op: F,
) -> GridField
where
    F: Fn(f64, f64) -> f64,
{
    let v = Array3::from_shape_fn((fz.len(), ny, fx.len()), |(k, _, i)| op(fz[k], fx[i]));
    GridField {
        name: name.to_owned(),
        stagger,
        v,
    }
}

/// Evaluate the Taylor-Green vortex on a 2-D staggered grid.
///
/// The coordinates are sampled as given, they need not be ordered
/// nor interleave.
///
/// # Errors
/// `InvalidInput` for empty or non-finite coordinates, non-positive
/// viscosity, or negative time.
pub fn evaluate(
    x_centers: &[f64],
    x_faces: &[f64],
    z_centers: &[f64],
    z_faces: &[f64],
    viscosity: f64,
    time: f64,
) -> Result<ReferenceSolution> {
    let grid = Grid::sample_points_2d(
        Array1::from(x_centers.to_vec()),
        Array1::from(x_faces.to_vec()),
        Array1::from(z_centers.to_vec()),
        Array1::from(z_faces.to_vec()),
    )?;
    TaylorGreen::new(viscosity)?.evaluate_on(&grid, time)
}

/// Analytic fields on the coordinates of a run
#[derive(Clone, Debug)]
pub struct ReferenceSolution {
    /// Coordinates the fields are evaluated on, unordered
    /// if built by [`evaluate`]
    pub grid: Grid,
    /// Physical time
    pub time: f64,
    /// Kinematic viscosity
    pub viscosity: f64,
    /// `u`, `w` and `p`
    pub fields: FieldSet,
}

impl ReferenceSolution {
    /// Field by name
    pub fn field(&self, name: &str) -> Option<&GridField> {
        self.fields.get(name)
    }
}
