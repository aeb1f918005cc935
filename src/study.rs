//! # Convergence study
//! Load every (scheme, resolution) run, compare it with the analytic
//! solution and estimate the observed order per scheme and field.
//!
//! Runs are processed in parallel. A run that fails to load or to
//! compare is recorded as [`RunFailure`] and dropped from the order
//! estimate of its scheme; the remaining runs are still used.
use crate::convergence::{ConvergenceResult, OrderPolicy};
use crate::diagnostics::max_divergence;
use crate::error::{Result, VerifyError};
use crate::grid::Resolution;
use crate::loader::{format_label, RunLoader, DEFAULT_FIELDS};
use crate::norm::{error_with, ErrorReport, Norm};
use crate::reference::TaylorGreen;
use crate::run::RunKey;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Default run label pattern, see [`format_label`]
pub const DEFAULT_LABEL: &str = "taylorgreen{nx}_{scheme}";

/// Parameters of a convergence study
#[derive(Clone, Debug)]
pub struct StudyParameters {
    /// Scheme labels, in reporting order
    pub schemes: Vec<String>,
    /// Resolutions, every scheme is run at each of them
    pub resolutions: Vec<Resolution>,
    /// Kinematic viscosity
    pub viscosity: f64,
    /// Physical time the runs were sampled at
    pub time: f64,
    /// Timestep index the runs were sampled at
    pub timestep: usize,
    /// Run label pattern
    pub label: String,
    /// Error norm
    pub norm: Norm,
    /// How the order is fitted
    pub policy: OrderPolicy,
    /// Fields whose order is estimated
    pub fields: Vec<String>,
    /// Fields without an order at timestep zero
    pub skip_at_initial: Vec<String>,
}

impl StudyParameters {
    /// Parameters with default label, norm, policy and fields
    pub fn new(
        schemes: &[&str],
        resolutions: Vec<Resolution>,
        viscosity: f64,
        time: f64,
        timestep: usize,
    ) -> Self {
        Self {
            schemes: schemes.iter().map(|s| (*s).to_owned()).collect(),
            resolutions,
            viscosity,
            time,
            timestep,
            label: DEFAULT_LABEL.to_owned(),
            norm: Norm::default(),
            policy: OrderPolicy::default(),
            fields: DEFAULT_FIELDS.iter().map(|s| (*s).to_owned()).collect(),
            skip_at_initial: vec!["u".to_owned(), "w".to_owned()],
        }
    }

    /// All (scheme, resolution) pairs, scheme major
    pub fn keys(&self) -> Vec<RunKey> {
        self.schemes
            .iter()
            .flat_map(|scheme| {
                self.resolutions
                    .iter()
                    .map(move |res| RunKey::new(scheme, *res))
            })
            .collect()
    }

    /// Label of the run of `key`
    pub fn label_of(&self, key: &RunKey) -> String {
        format_label(&self.label, &key.scheme, key.resolution)
    }
}

/// A run that could not be verified
#[derive(Clone, Debug, PartialEq)]
pub struct RunFailure {
    /// Scheme and resolution of the run
    pub key: RunKey,
    /// Run label
    pub label: String,
    /// Reason
    pub error: VerifyError,
}

/// Outcome of the order estimate of one field of one scheme
#[derive(Clone, Debug, PartialEq)]
pub enum OrderOutcome {
    /// Order was estimated
    Estimated(ConvergenceResult),
    /// Not estimated on purpose
    Skipped(String),
    /// Estimate failed
    Failed(VerifyError),
}

impl OrderOutcome {
    /// Estimated order, if any
    pub fn order(&self) -> Option<f64> {
        match self {
            Self::Estimated(result) => Some(result.order),
            _ => None,
        }
    }
}

/// Everything a study found
#[derive(Clone, Debug)]
pub struct StudyReport {
    /// Scheme labels, in reporting order
    pub schemes: Vec<String>,
    /// Kinematic viscosity
    pub viscosity: f64,
    /// Physical time
    pub time: f64,
    /// Timestep index
    pub timestep: usize,
    /// Error norm used
    pub norm: Norm,
    /// Errors of every verified run
    pub errors: BTreeMap<RunKey, ErrorReport>,
    /// Maximum absolute divergence of every verified run with velocity
    pub divergence: BTreeMap<RunKey, f64>,
    /// Runs that could not be verified
    pub failures: Vec<RunFailure>,
    /// Order outcome per (scheme, field)
    pub orders: BTreeMap<(String, String), OrderOutcome>,
}

impl StudyReport {
    /// Outcome of the order estimate of `field` of `scheme`
    pub fn outcome(&self, scheme: &str, field: &str) -> Option<&OrderOutcome> {
        self.orders.get(&(scheme.to_owned(), field.to_owned()))
    }

    /// Estimated order of `field` of `scheme`
    pub fn order(&self, scheme: &str, field: &str) -> Option<f64> {
        self.outcome(scheme, field).and_then(OrderOutcome::order)
    }

    /// Verified (resolution, error) pairs of `field` of `scheme`, coarse to fine
    pub fn errors_of(&self, scheme: &str, field: &str) -> Vec<(Resolution, f64)> {
        self.errors
            .iter()
            .filter(|(key, _)| key.scheme == scheme)
            .filter_map(|(key, report)| report.get(field).map(|e| (key.resolution, e)))
            .collect()
    }

    /// Verified resolutions of `scheme`, coarse to fine
    pub fn resolutions_of(&self, scheme: &str) -> Vec<Resolution> {
        self.errors
            .keys()
            .filter(|key| key.scheme == scheme)
            .map(|key| key.resolution)
            .collect()
    }

    /// Fields with an order outcome of `scheme`
    pub fn fields_of(&self, scheme: &str) -> Vec<&str> {
        self.orders
            .keys()
            .filter(|(s, _)| s == scheme)
            .map(|(_, f)| f.as_str())
            .collect()
    }
}

/// Verification of a single run
struct RunVerification {
    errors: ErrorReport,
    divergence: Option<f64>,
}

fn verify_run<L: RunLoader + ?Sized>(
    params: &StudyParameters,
    solution: &TaylorGreen,
    loader: &L,
    label: &str,
    key: &RunKey,
) -> Result<RunVerification> {
    let mut run = loader.load(label, key.resolution, params.timestep)?;
    match &run.scheme {
        Some(scheme) if *scheme != key.scheme => {
            return Err(VerifyError::load_failure(
                label,
                format!("run belongs to scheme {}, expected {}", scheme, key.scheme),
            ));
        }
        Some(_) => {}
        None => run.scheme = Some(key.scheme.clone()),
    }
    let reference = solution.evaluate_on(&run.grid, params.time)?;
    let errors = error_with(&run, &reference, &params.norm)?;
    let divergence = max_divergence(&run)?;
    Ok(RunVerification { errors, divergence })
}

/// Run a convergence study
///
/// # Errors
/// `InvalidInput` if viscosity or time are invalid, or no scheme or
/// resolution is given. Failures of single runs or estimates are
/// recorded in the report.
pub fn run_study<L: RunLoader + ?Sized>(params: &StudyParameters, loader: &L) -> Result<StudyReport> {
    let solution = TaylorGreen::new(params.viscosity)?;
    if !params.time.is_finite() || params.time < 0. {
        return Err(VerifyError::InvalidInput(format!(
            "time must be non-negative and finite, got {}",
            params.time
        )));
    }
    if params.schemes.is_empty() || params.resolutions.is_empty() {
        return Err(VerifyError::InvalidInput(
            "a study needs at least one scheme and one resolution".to_owned(),
        ));
    }

    let keys = params.keys();
    log::info!(
        "verify {} runs ({} schemes, {} resolutions) at timestep {}",
        keys.len(),
        params.schemes.len(),
        params.resolutions.len(),
        params.timestep
    );
    let outcomes: Vec<(RunKey, String, Result<RunVerification>)> = keys
        .into_par_iter()
        .map(|key| {
            let label = params.label_of(&key);
            let outcome = verify_run(params, &solution, loader, &label, &key);
            (key, label, outcome)
        })
        .collect();

    let mut errors = BTreeMap::new();
    let mut divergence = BTreeMap::new();
    let mut failures = Vec::new();
    for (key, label, outcome) in outcomes {
        match outcome {
            Ok(verification) => {
                if let Some(div) = verification.divergence {
                    divergence.insert(key.clone(), div);
                }
                errors.insert(key, verification.errors);
            }
            Err(error) => {
                log::warn!("drop run {} ({}): {}", label, key, error);
                failures.push(RunFailure { key, label, error });
            }
        }
    }

    let mut fields: BTreeSet<String> = params.fields.iter().cloned().collect();
    fields.extend(
        errors
            .values()
            .flat_map(|report| report.fields().map(str::to_owned)),
    );

    let mut orders = BTreeMap::new();
    for scheme in &params.schemes {
        for field in &fields {
            let outcome = estimate_field(params, &errors, scheme, field);
            match &outcome {
                OrderOutcome::Estimated(result) => {
                    log::info!("order {}_{}: {:.2}", field, scheme, result.order);
                }
                OrderOutcome::Skipped(reason) => {
                    log::info!("skip order {}_{}: {}", field, scheme, reason);
                }
                OrderOutcome::Failed(error) => {
                    log::warn!("no order {}_{}: {}", field, scheme, error);
                }
            }
            orders.insert((scheme.clone(), field.clone()), outcome);
        }
    }

    Ok(StudyReport {
        schemes: params.schemes.clone(),
        viscosity: params.viscosity,
        time: params.time,
        timestep: params.timestep,
        norm: params.norm,
        errors,
        divergence,
        failures,
        orders,
    })
}

fn estimate_field(
    params: &StudyParameters,
    errors: &BTreeMap<RunKey, ErrorReport>,
    scheme: &str,
    field: &str,
) -> OrderOutcome {
    if params.timestep == 0 && params.skip_at_initial.iter().any(|f| f == field) {
        return OrderOutcome::Skipped("exact initial condition".to_owned());
    }
    // keys are ordered by resolution, i.e. coarse to fine
    let (spacings, errs): (Vec<f64>, Vec<f64>) = errors
        .iter()
        .filter(|(key, _)| key.scheme == scheme)
        .filter_map(|(key, report)| report.get(field).map(|e| (key.resolution.spacing(), e)))
        .unzip();
    if spacings.len() < 2 {
        return OrderOutcome::Failed(VerifyError::InsufficientData {
            required: 2,
            found: spacings.len(),
        });
    }
    match ConvergenceResult::estimate(scheme, field, params.policy, spacings, errs) {
        Ok(result) => OrderOutcome::Estimated(result),
        Err(error) => OrderOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SyntheticLoader;
    use approx::assert_abs_diff_eq;

    fn resolutions() -> Vec<Resolution> {
        vec![
            Resolution::new(16, 8),
            Resolution::new(32, 16),
            Resolution::new(64, 32),
        ]
    }

    #[test]
    fn test_keys_and_labels() {
        let params = StudyParameters::new(&["2nd", "4th"], resolutions(), 0.1, 0.1, 10);
        let keys = params.keys();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], RunKey::new("2nd", Resolution::new(16, 8)));
        assert_eq!(keys[3], RunKey::new("4th", Resolution::new(16, 8)));
        assert_eq!(params.label_of(&keys[5]), "taylorgreen64_4th");
    }

    #[test]
    fn test_synthetic_orders() {
        let loader = SyntheticLoader::new(0.1, 0.1)
            .unwrap()
            .with_scheme("2nd", 2.)
            .with_scheme("4th", 4.);
        let params = StudyParameters::new(&["2nd", "4th"], resolutions(), 0.1, 0.1, 10);
        let report = run_study(&params, &loader).unwrap();
        assert!(report.failures.is_empty());
        for field in ["u", "w", "p"] {
            assert_abs_diff_eq!(report.order("2nd", field).unwrap(), 2., epsilon = 1e-8);
            assert_abs_diff_eq!(report.order("4th", field).unwrap(), 4., epsilon = 1e-8);
        }
        assert_eq!(report.errors_of("2nd", "p").len(), 3);
        assert_eq!(report.divergence.len(), 6);
    }

    #[test]
    fn test_unknown_scheme_is_recorded() {
        let loader = SyntheticLoader::new(0.1, 0.1).unwrap().with_scheme("2nd", 2.);
        let params = StudyParameters::new(&["2nd", "44"], resolutions(), 0.1, 0.1, 10);
        let report = run_study(&params, &loader).unwrap();
        assert_eq!(report.failures.len(), 3);
        assert!(report.order("2nd", "p").is_some());
        assert_eq!(
            report.outcome("44", "p"),
            Some(&OrderOutcome::Failed(VerifyError::InsufficientData {
                required: 2,
                found: 0
            }))
        );
    }

    #[test]
    fn test_run_of_other_scheme_is_recorded() {
        // "2nd" is the longest registered suffix of "taylorgreen16_x2nd"
        let loader = SyntheticLoader::new(0.1, 0.1).unwrap().with_scheme("2nd", 2.);
        let params = StudyParameters::new(&["x2nd"], resolutions(), 0.1, 0.1, 10);
        let report = run_study(&params, &loader).unwrap();
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures[0]
            .error
            .to_string()
            .contains("belongs to scheme 2nd"));

        let run = loader
            .load("taylorgreen16_2nd", Resolution::new(16, 8), 10)
            .unwrap();
        assert_eq!(run.scheme.as_deref(), Some("2nd"));
    }

    #[test]
    fn test_initial_condition_skips_velocity() {
        let loader = SyntheticLoader::new(0.1, 0.).unwrap().with_scheme("2nd", 2.);
        let params = StudyParameters::new(&["2nd"], resolutions(), 0.1, 0., 0);
        let report = run_study(&params, &loader).unwrap();
        assert!(matches!(
            report.outcome("2nd", "u"),
            Some(OrderOutcome::Skipped(_))
        ));
        assert!(matches!(
            report.outcome("2nd", "w"),
            Some(OrderOutcome::Skipped(_))
        ));
        assert_abs_diff_eq!(report.order("2nd", "p").unwrap(), 2., epsilon = 1e-8);
    }

    #[test]
    fn test_invalid_parameters() {
        let loader = SyntheticLoader::new(0.1, 0.1).unwrap();
        let mut params = StudyParameters::new(&["2nd"], resolutions(), 0.1, -1., 10);
        assert!(matches!(
            run_study(&params, &loader),
            Err(VerifyError::InvalidInput(_))
        ));
        params.time = 0.1;
        params.viscosity = 0.;
        assert!(run_study(&params, &loader).is_err());
    }
}
