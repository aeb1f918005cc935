//! Manufactured runs with a prescribed order of accuracy
//!
//! Every field is the analytic solution, perturbed by
//! $$
//! C h^p ( f\\_{ref} + \epsilon \xi )
//! $$
//! with `h = 1/nx`, `p` the order of the scheme, and `xi` seeded
//! uniform noise in `[-1, 1]`. At timestep zero the velocity is
//! returned unperturbed, like a solver that starts from the exact
//! initial condition (the study is then run with `time = 0`).
use super::RunLoader;
use crate::error::{Result, VerifyError};
use crate::grid::{Grid, Resolution};
use crate::reference::TaylorGreen;
use crate::run::SimulationRun;
use ndarray::Array3;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use std::collections::BTreeMap;

/// Produces runs from the analytic solution
#[derive(Clone, Debug)]
pub struct SyntheticLoader {
    /// Taylor-Green solution the runs are built from
    pub solution: TaylorGreen,
    /// Physical time of the runs
    pub time: f64,
    /// Order of accuracy per scheme label
    pub orders: BTreeMap<String, f64>,
    /// Error constant `C`
    pub amplitude: f64,
    /// Relative noise amplitude `epsilon`
    pub noise: f64,
    /// Seed of the noise
    pub seed: u64,
    /// Number of points in the homogeneous direction
    pub ny: usize,
    /// Domain size `[x, y, z]`
    pub size: [f64; 3],
}

impl SyntheticLoader {
    /// Noise free loader on the `1 x 1 x 0.5` domain
    ///
    /// # Errors
    /// `InvalidInput` if the viscosity is not positive
    pub fn new(viscosity: f64, time: f64) -> Result<Self> {
        Ok(Self {
            solution: TaylorGreen::new(viscosity)?,
            time,
            orders: BTreeMap::new(),
            amplitude: 1.,
            noise: 0.,
            seed: 0,
            ny: 1,
            size: [1., 1., 0.5],
        })
    }

    /// Register a scheme label and its order
    pub fn with_scheme(mut self, scheme: &str, order: f64) -> Self {
        self.orders.insert(scheme.to_owned(), order);
        self
    }

    /// Order of the scheme whose label is the longest suffix of `label`
    pub fn order_of(&self, label: &str) -> Option<f64> {
        self.scheme_of(label).map(|(_, order)| order)
    }

    fn scheme_of(&self, label: &str) -> Option<(&str, f64)> {
        self.orders
            .iter()
            .filter(|(scheme, _)| label.ends_with(scheme.as_str()))
            .max_by_key(|(scheme, _)| scheme.len())
            .map(|(scheme, order)| (scheme.as_str(), *order))
    }
}

impl RunLoader for SyntheticLoader {
    fn load(&self, label: &str, resolution: Resolution, timestep: usize) -> Result<SimulationRun> {
        let (scheme, order) = self.scheme_of(label).ok_or_else(|| {
            VerifyError::load_failure(label, "no scheme matches the run label")
        })?;
        let grid = Grid::uniform(resolution.nx, self.ny, resolution.nz, self.size)
            .map_err(|e| VerifyError::load_failure(label, e))?;
        let reference = self.solution.evaluate_on(&grid, self.time)?;

        let scale = self.amplitude * resolution.spacing().powf(order);
        let mut run = SimulationRun::new(label, resolution, timestep, grid).with_scheme(scheme);
        for (i, mut field) in reference.fields.into_values().enumerate() {
            let exact = timestep == 0 && matches!(field.name.as_str(), "u" | "v" | "w");
            if !exact {
                let seed = self.seed ^ ((resolution.nx as u64) << 16) ^ (i as u64);
                let mut rng = StdRng::seed_from_u64(seed);
                let xi = Array3::random_using(field.v.raw_dim(), Uniform::new(-1., 1.), &mut rng);
                let perturbation = (&field.v + &(xi * self.noise)) * scale;
                field.v += &perturbation;
            }
            run.insert(field)?;
        }
        log::debug!("synthetic run {} ({}), order {}", label, resolution, order);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norm::error;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_scheme_lookup() {
        let loader = SyntheticLoader::new(0.1, 0.1)
            .unwrap()
            .with_scheme("2nd", 2.)
            .with_scheme("4th", 4.)
            .with_scheme("_4th", 3.);
        assert_eq!(loader.order_of("taylorgreen16_2nd"), Some(2.));
        assert_eq!(loader.order_of("taylorgreen16_4th"), Some(3.));
        assert_eq!(loader.order_of("taylorgreen16_44"), None);
        let err = loader
            .load("taylorgreen16_44", Resolution::new(16, 8), 1)
            .unwrap_err();
        assert!(matches!(err, VerifyError::LoadFailure { .. }));
    }

    #[test]
    fn test_error_scales_with_prescribed_order() {
        let loader = SyntheticLoader::new(0.1, 0.1).unwrap().with_scheme("2nd", 2.);
        let res = Resolution::new(16, 8);
        let run = loader.load("tg_2nd", res, 100).unwrap();
        let reference = loader.solution.evaluate_on(&run.grid, 0.1).unwrap();
        let report = error(&run, &reference).unwrap();
        let p_rms = crate::norm::norm_rms(&reference.field("p").unwrap().v);
        assert_abs_diff_eq!(report.get("p").unwrap(), p_rms / 256., epsilon = 1e-14);
    }

    #[test]
    fn test_initial_velocity_is_exact() {
        let mut loader = SyntheticLoader::new(0.1, 0.).unwrap().with_scheme("2nd", 2.);
        loader.noise = 0.1;
        let run = loader.load("tg_2nd", Resolution::new(16, 8), 0).unwrap();
        let reference = loader.solution.evaluate_on(&run.grid, 0.).unwrap();
        let report = error(&run, &reference).unwrap();
        assert_eq!(report.get("u"), Some(0.));
        assert_eq!(report.get("w"), Some(0.));
        assert!(report.get("p").unwrap() > 0.);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let mut loader = SyntheticLoader::new(0.1, 0.1).unwrap().with_scheme("4th", 4.);
        loader.noise = 0.5;
        loader.seed = 7;
        let a = loader.load("tg_4th", Resolution::new(32, 16), 10).unwrap();
        let b = loader.load("tg_4th", Resolution::new(32, 16), 10).unwrap();
        assert_eq!(a.fields, b.fields);
    }
}
