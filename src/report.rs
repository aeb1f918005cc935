//! Textual and serializable summary of a study
//!
//! The text form prints one line per scheme and field,
//! ```text
//! errors p_2nd [1.2e-3, 3.0e-4, ...]
//! convergence p_2nd 2.00
//! ```
//! followed by the runs that could not be verified.
use crate::study::{OrderOutcome, StudyReport};
use serde::Serialize;
use std::fmt;

/// Serializable summary of a [`StudyReport`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// Kinematic viscosity
    pub viscosity: f64,
    /// Physical time
    pub time: f64,
    /// Timestep index
    pub timestep: usize,
    /// Name of the error norm
    pub norm: String,
    /// One entry per scheme
    pub schemes: Vec<SchemeSummary>,
    /// Runs that could not be verified
    pub failures: Vec<FailureSummary>,
}

/// Summary of one scheme
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchemeSummary {
    /// Scheme label
    pub scheme: String,
    /// Verified resolutions `[nx, nz]`, coarse to fine
    pub resolutions: Vec<[usize; 2]>,
    /// Grid spacings of `resolutions`
    pub spacings: Vec<f64>,
    /// Maximum absolute divergence per verified resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub divergence: Vec<f64>,
    /// One entry per field
    pub fields: Vec<FieldSummary>,
}

/// Summary of one field of one scheme
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSummary {
    /// Field name
    pub field: String,
    /// Resolutions `[nx, nz]` of the runs holding the field
    pub resolutions: Vec<[usize; 2]>,
    /// Error at each of `resolutions`
    pub errors: Vec<f64>,
    /// Estimated order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Order between successive resolutions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub local_orders: Vec<f64>,
    /// Why no order was estimated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A run that could not be verified
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailureSummary {
    /// Run label
    pub label: String,
    /// Scheme label
    pub scheme: String,
    /// Resolution `[nx, nz]`
    pub resolution: [usize; 2],
    /// Reason
    pub reason: String,
}

impl StudyReport {
    /// Collect the report into a serializable summary
    pub fn summary(&self) -> Summary {
        let schemes = self
            .schemes
            .iter()
            .map(|scheme| {
                let resolutions = self.resolutions_of(scheme);
                let divergence = resolutions
                    .iter()
                    .filter_map(|res| {
                        self.divergence
                            .iter()
                            .find(|(key, _)| key.scheme == *scheme && key.resolution == *res)
                            .map(|(_, div)| *div)
                    })
                    .collect();
                let fields = self
                    .fields_of(scheme)
                    .into_iter()
                    .map(|field| self.field_summary(scheme, field))
                    .collect();
                SchemeSummary {
                    scheme: scheme.clone(),
                    resolutions: resolutions.iter().map(|r| [r.nx, r.nz]).collect(),
                    spacings: resolutions.iter().map(|r| r.spacing()).collect(),
                    divergence,
                    fields,
                }
            })
            .collect();
        let failures = self
            .failures
            .iter()
            .map(|f| FailureSummary {
                label: f.label.clone(),
                scheme: f.key.scheme.clone(),
                resolution: [f.key.resolution.nx, f.key.resolution.nz],
                reason: f.error.to_string(),
            })
            .collect();
        Summary {
            viscosity: self.viscosity,
            time: self.time,
            timestep: self.timestep,
            norm: self.norm.name().to_owned(),
            schemes,
            failures,
        }
    }

    fn field_summary(&self, scheme: &str, field: &str) -> FieldSummary {
        let (resolutions, errors): (Vec<[usize; 2]>, Vec<f64>) = self
            .errors_of(scheme, field)
            .into_iter()
            .map(|(r, e)| ([r.nx, r.nz], e))
            .unzip();
        let (order, local_orders, note) = match self.outcome(scheme, field) {
            Some(OrderOutcome::Estimated(result)) => {
                (Some(result.order), result.local_orders.clone(), None)
            }
            Some(OrderOutcome::Skipped(reason)) => (None, vec![], Some(reason.clone())),
            Some(OrderOutcome::Failed(error)) => (None, vec![], Some(error.to_string())),
            None => (None, vec![], None),
        };
        FieldSummary {
            field: field.to_owned(),
            resolutions,
            errors,
            order,
            local_orders,
            note,
        }
    }
}

impl Summary {
    /// Serialize to a TOML document
    ///
    /// # Errors
    /// If a value can't be represented in TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl fmt::Display for StudyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Taylor-Green verification: nu = {:.6e}, t = {}, timestep {}, norm {}",
            self.viscosity,
            self.time,
            self.timestep,
            self.norm.name()
        )?;
        for scheme in &self.schemes {
            let resolutions = self.resolutions_of(scheme);
            let dxs: Vec<String> = resolutions
                .iter()
                .map(|r| format!("{:.6e}", r.spacing()))
                .collect();
            writeln!(f)?;
            writeln!(f, "dxs {} [{}]", scheme, dxs.join(", "))?;
            for field in self.fields_of(scheme) {
                let errors = self.errors_of(scheme, field);
                if errors.len() != resolutions.len() {
                    let dxs: Vec<String> = errors
                        .iter()
                        .map(|(r, _)| format!("{:.6e}", r.spacing()))
                        .collect();
                    writeln!(f, "dxs {}_{} [{}]", field, scheme, dxs.join(", "))?;
                }
                let errs: Vec<String> = errors.iter().map(|(_, e)| format!("{:.6e}", e)).collect();
                writeln!(f, "errors {}_{} [{}]", field, scheme, errs.join(", "))?;
            }
            for field in self.fields_of(scheme) {
                match self.outcome(scheme, field) {
                    Some(OrderOutcome::Estimated(result)) => {
                        let local: Vec<String> = result
                            .local_orders
                            .iter()
                            .map(|p| format!("{:.2}", p))
                            .collect();
                        writeln!(
                            f,
                            "convergence {}_{} {:.2} (local {})",
                            field,
                            scheme,
                            result.order,
                            local.join(" ")
                        )?;
                    }
                    Some(OrderOutcome::Skipped(reason)) => {
                        writeln!(f, "convergence {}_{} skipped: {}", field, scheme, reason)?;
                    }
                    Some(OrderOutcome::Failed(error)) => {
                        writeln!(f, "convergence {}_{} failed: {}", field, scheme, error)?;
                    }
                    None => {}
                }
            }
        }
        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "failed runs:")?;
            for failure in &self.failures {
                writeln!(f, "  {} ({}): {}", failure.label, failure.key, failure.error)?;
            }
        }
        Ok(())
    }
}
