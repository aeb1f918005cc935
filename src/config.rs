//! # Study configuration
//! A study is described by a TOML file, e.g.
//! ```toml
//! timestep = 2000
//! time = 0.1
//! reynolds = 7.895683520871486
//! schemes = ["2nd", "44", "4th"]
//! resolutions = [[16, 8], [32, 16], [64, 32], [128, 64]]
//!
//! [loader]
//! kind = "binary"
//! root = "runs"
//! ```
//! Relative loader roots are resolved against the directory of the file.
use crate::convergence::OrderPolicy;
use crate::grid::Resolution;
use crate::io::ByteOrder;
use crate::loader::{BinaryLoader, RunLoader, SyntheticLoader, DEFAULT_FIELDS};
use crate::norm::{MaxAbs, Norm, Rms, WeightedL1, WeightedL2};
use crate::reference::viscosity_from_reynolds;
use crate::study::{StudyParameters, DEFAULT_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File can't be read
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },
    /// File is not valid TOML or misses keys
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Values are out of range or inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn invalid<T>(msg: String) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(msg))
}

/// Error norm, by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormKind {
    /// Root mean square
    #[default]
    Rms,
    /// Volume weighted root mean square
    WeightedL2,
    /// Volume integral of the absolute difference
    WeightedL1,
    /// Maximum absolute difference
    Max,
}

impl From<NormKind> for Norm {
    fn from(kind: NormKind) -> Self {
        match kind {
            NormKind::Rms => Rms.into(),
            NormKind::WeightedL2 => WeightedL2.into(),
            NormKind::WeightedL1 => WeightedL1.into(),
            NormKind::Max => MaxAbs.into(),
        }
    }
}

/// Where runs are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderConfig {
    /// Raw binary dumps, see [`BinaryLoader`]
    Binary {
        /// Directory with one sub-directory per run
        root: PathBuf,
        /// Points in the homogeneous direction
        #[serde(default = "default_ny")]
        ny: usize,
        /// Byte order of the dumps
        #[serde(default)]
        byte_order: ByteOrder,
        /// Fields to read
        #[serde(default = "default_fields")]
        fields: Vec<String>,
    },
    /// Hdf5 files, requires feature `hdf5`
    Hdf5 {
        /// Directory with one sub-directory per run
        root: PathBuf,
        /// Fields to read
        #[serde(default = "default_fields")]
        fields: Vec<String>,
    },
    /// Manufactured runs, see [`SyntheticLoader`]
    Synthetic {
        /// Order of accuracy per scheme label
        orders: BTreeMap<String, f64>,
        /// Error constant
        #[serde(default = "default_amplitude")]
        amplitude: f64,
        /// Relative noise amplitude
        #[serde(default)]
        noise: f64,
        /// Seed of the noise
        #[serde(default)]
        seed: u64,
        /// Domain height
        #[serde(default = "default_zsize")]
        zsize: f64,
        /// Points in the homogeneous direction
        #[serde(default = "default_ny")]
        ny: usize,
    },
}

fn positive(x: f64) -> bool {
    x > 0. && x.is_finite()
}

fn default_ny() -> usize {
    1
}

fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|s| (*s).to_owned()).collect()
}

fn default_amplitude() -> f64 {
    1.
}

fn default_zsize() -> f64 {
    0.5
}

fn default_label() -> String {
    DEFAULT_LABEL.to_owned()
}

fn default_skip_at_initial() -> Vec<String> {
    vec!["u".to_owned(), "w".to_owned()]
}

/// Complete study configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Timestep index the runs are sampled at
    pub timestep: usize,
    /// Physical time of `timestep`
    pub time: f64,
    /// Kinematic viscosity, alternative to `reynolds`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viscosity: Option<f64>,
    /// Reynolds number, viscosity is its inverse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reynolds: Option<f64>,
    /// Scheme labels
    pub schemes: Vec<String>,
    /// Resolutions `[nx, nz]`
    pub resolutions: Vec<[usize; 2]>,
    /// Run label pattern
    #[serde(default = "default_label")]
    pub label: String,
    /// Error norm
    #[serde(default)]
    pub norm: NormKind,
    /// How the order is fitted
    #[serde(default)]
    pub order_policy: OrderPolicy,
    /// Fields without an order at timestep zero
    #[serde(default = "default_skip_at_initial")]
    pub skip_at_initial: Vec<String>,
    /// Run source
    pub loader: LoaderConfig,
}

impl StudyConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    /// If the file can't be read, parsed or fails [`StudyConfig::validate`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_root(base);
        }
        log::debug!(" <== {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration
    ///
    /// # Errors
    /// If the string is not valid TOML or fails [`StudyConfig::validate`]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_root(&mut self, base: &Path) {
        match &mut self.loader {
            LoaderConfig::Binary { root, .. } | LoaderConfig::Hdf5 { root, .. } => {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
            LoaderConfig::Synthetic { .. } => {}
        }
    }

    /// Kinematic viscosity, given directly or through the Reynolds number
    ///
    /// # Errors
    /// If none or both are given, or the value is not positive
    pub fn viscosity(&self) -> Result<f64, ConfigError> {
        match (self.viscosity, self.reynolds) {
            (Some(nu), None) if positive(nu) => Ok(nu),
            (Some(nu), None) => invalid(format!("viscosity must be positive, got {}", nu)),
            (None, Some(re)) => {
                viscosity_from_reynolds(re).map_err(|e| ConfigError::Invalid(e.to_string()))
            }
            (None, None) => invalid("one of viscosity or reynolds is required".to_owned()),
            (Some(_), Some(_)) => invalid("give either viscosity or reynolds, not both".to_owned()),
        }
    }

    /// Check ranges and consistency of all values
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.viscosity()?;
        if !self.time.is_finite() || self.time < 0. {
            return invalid(format!("time must be non-negative, got {}", self.time));
        }
        if self.schemes.is_empty() {
            return invalid("at least one scheme is required".to_owned());
        }
        let unique: BTreeSet<&String> = self.schemes.iter().collect();
        if unique.len() != self.schemes.len() {
            return invalid(format!("schemes must be unique, got {:?}", self.schemes));
        }
        if self.resolutions.len() < 2 {
            return invalid(format!(
                "at least two resolutions are required, got {}",
                self.resolutions.len()
            ));
        }
        if self.resolutions.iter().any(|[nx, nz]| *nx == 0 || *nz == 0) {
            return invalid(format!(
                "resolutions must be positive, got {:?}",
                self.resolutions
            ));
        }
        let nxs: BTreeSet<usize> = self.resolutions.iter().map(|r| r[0]).collect();
        if nxs.len() != self.resolutions.len() {
            return invalid(format!(
                "resolutions must differ in nx, got {:?}",
                self.resolutions
            ));
        }
        if self.schemes.len() > 1 && !self.label.contains("{scheme}") {
            return invalid(format!("label {:?} lacks {{scheme}}", self.label));
        }
        if !self.label.contains("{nx}") && !self.label.contains("{nz}") {
            return invalid(format!("label {:?} lacks {{nx}} or {{nz}}", self.label));
        }
        self.validate_loader()
    }

    fn validate_loader(&self) -> Result<(), ConfigError> {
        match &self.loader {
            LoaderConfig::Binary { ny, fields, .. } => {
                if *ny == 0 {
                    return invalid("loader.ny must be positive".to_owned());
                }
                if fields.is_empty() {
                    return invalid("loader.fields must not be empty".to_owned());
                }
            }
            LoaderConfig::Hdf5 { fields, .. } => {
                if fields.is_empty() {
                    return invalid("loader.fields must not be empty".to_owned());
                }
            }
            LoaderConfig::Synthetic {
                orders,
                amplitude,
                noise,
                zsize,
                ny,
                ..
            } => {
                if orders.is_empty() {
                    return invalid("loader.orders must not be empty".to_owned());
                }
                if let Some((scheme, p)) = orders.iter().find(|(_, p)| !positive(**p)) {
                    return invalid(format!("order of {} must be positive, got {}", scheme, p));
                }
                let noise_ok = *noise == 0. || positive(*noise);
                if !positive(*amplitude) || !noise_ok || !positive(*zsize) || *ny == 0 {
                    return invalid(format!(
                        "synthetic loader needs amplitude > 0, noise >= 0, zsize > 0, ny > 0 \
                         (got {}, {}, {}, {})",
                        amplitude, noise, zsize, ny
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolutions of the study
    pub fn resolutions(&self) -> Vec<Resolution> {
        self.resolutions
            .iter()
            .map(|[nx, nz]| Resolution::new(*nx, *nz))
            .collect()
    }

    /// Parameters of the study
    ///
    /// # Errors
    /// If the viscosity is missing or invalid
    pub fn parameters(&self) -> Result<StudyParameters, ConfigError> {
        let fields = match &self.loader {
            LoaderConfig::Binary { fields, .. } | LoaderConfig::Hdf5 { fields, .. } => {
                fields.clone()
            }
            LoaderConfig::Synthetic { .. } => default_fields(),
        };
        Ok(StudyParameters {
            schemes: self.schemes.clone(),
            resolutions: self.resolutions(),
            viscosity: self.viscosity()?,
            time: self.time,
            timestep: self.timestep,
            label: self.label.clone(),
            norm: self.norm.into(),
            policy: self.order_policy,
            fields,
            skip_at_initial: self.skip_at_initial.clone(),
        })
    }

    /// Construct the configured loader
    ///
    /// # Errors
    /// If the loader can't be constructed, e.g. hdf5 without
    /// feature `hdf5`
    pub fn build_loader(&self) -> Result<Box<dyn RunLoader>, ConfigError> {
        match &self.loader {
            LoaderConfig::Binary {
                root,
                ny,
                byte_order,
                fields,
            } => {
                let mut loader = BinaryLoader::new(root);
                loader.ny = *ny;
                loader.byte_order = *byte_order;
                loader.fields = fields.clone();
                Ok(Box::new(loader))
            }
            #[cfg(feature = "hdf5")]
            LoaderConfig::Hdf5 { root, fields } => {
                let mut loader = crate::loader::Hdf5Loader::new(root);
                loader.fields = fields.clone();
                Ok(Box::new(loader))
            }
            #[cfg(not(feature = "hdf5"))]
            LoaderConfig::Hdf5 { .. } => {
                invalid("hdf5 loader requires building with feature `hdf5`".to_owned())
            }
            LoaderConfig::Synthetic {
                orders,
                amplitude,
                noise,
                seed,
                zsize,
                ny,
            } => {
                let mut loader = SyntheticLoader::new(self.viscosity()?, self.time)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                loader.orders = orders.clone();
                loader.amplitude = *amplitude;
                loader.noise = *noise;
                loader.seed = *seed;
                loader.ny = *ny;
                loader.size = [1., 1., *zsize];
                Ok(Box::new(loader))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SYNTHETIC: &str = r#"
        timestep = 2000
        time = 0.1
        reynolds = 10.0
        schemes = ["2nd", "4th"]
        resolutions = [[16, 8], [32, 16], [64, 32]]
        norm = "weighted_l2"

        [loader]
        kind = "synthetic"
        orders = { 2nd = 2.0, 4th = 4.0 }
        noise = 0.01
    "#;

    #[test]
    fn test_parse_synthetic() {
        let config = StudyConfig::from_toml(SYNTHETIC).unwrap();
        assert_abs_diff_eq!(config.viscosity().unwrap(), 0.1, epsilon = 1e-15);
        assert_eq!(config.label, DEFAULT_LABEL);
        assert_eq!(config.order_policy, OrderPolicy::Endpoints);
        assert_eq!(config.skip_at_initial, vec!["u", "w"]);
        let params = config.parameters().unwrap();
        assert_eq!(params.norm, Norm::from(WeightedL2));
        assert_eq!(params.resolutions[2], Resolution::new(64, 32));
        assert_eq!(params.fields, vec!["u", "w", "p"]);
        let loader = config.build_loader().unwrap();
        let run = loader
            .load("taylorgreen16_4th", Resolution::new(16, 8), 2000)
            .unwrap();
        assert_eq!(run.grid.zh.len(), 8);
    }

    #[test]
    fn test_parse_binary_defaults() {
        let config = StudyConfig::from_toml(
            r#"
            timestep = 0
            time = 0.0
            viscosity = 0.1
            schemes = ["2nd"]
            resolutions = [[16, 8], [32, 16]]
            order_policy = "least_squares"

            [loader]
            kind = "binary"
            root = "runs"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.loader,
            LoaderConfig::Binary {
                root: PathBuf::from("runs"),
                ny: 1,
                byte_order: ByteOrder::Little,
                fields: vec!["u".to_owned(), "w".to_owned(), "p".to_owned()],
            }
        );
        assert_eq!(config.order_policy, OrderPolicy::LeastSquares);
        let mut resolved = config.clone();
        resolved.resolve_root(Path::new("/data"));
        assert!(matches!(
            resolved.loader,
            LoaderConfig::Binary { ref root, .. } if root == Path::new("/data/runs")
        ));
    }

    #[test]
    fn test_invalid_configs() {
        let both = SYNTHETIC.replace("reynolds = 10.0", "reynolds = 10.0\nviscosity = 0.1");
        assert!(matches!(
            StudyConfig::from_toml(&both),
            Err(ConfigError::Invalid(_))
        ));
        let single = SYNTHETIC.replace(", [32, 16], [64, 32]", "");
        assert!(matches!(
            StudyConfig::from_toml(&single),
            Err(ConfigError::Invalid(_))
        ));
        let label = SYNTHETIC.replace("norm = ", "label = \"run{nx}\"\nnorm = ");
        assert!(matches!(
            StudyConfig::from_toml(&label),
            Err(ConfigError::Invalid(_))
        ));
        let norm = SYNTHETIC.replace("weighted_l2", "l3");
        assert!(matches!(
            StudyConfig::from_toml(&norm),
            Err(ConfigError::Parse(_))
        ));
        let negative = SYNTHETIC.replace("time = 0.1", "time = -0.1");
        assert!(matches!(
            StudyConfig::from_toml(&negative),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = StudyConfig::from_file("/nonexistent/taylorgreen.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_hdf5_requires_feature() {
        let config = StudyConfig::from_toml(
            r#"
            timestep = 1
            time = 0.1
            viscosity = 0.1
            schemes = ["2nd"]
            resolutions = [[16, 8], [32, 16]]

            [loader]
            kind = "hdf5"
            root = "runs"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.build_loader(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
