//! Engine configuration.
//!
//! Sources, lowest to highest precedence: `Default`, a JSON document
//! ([`EngineConfig::from_json`]), environment variables
//! ([`EngineConfig::from_env`]).
//!
//! | Variable | Field | Example |
//! |----------|-------|---------|
//! | `DIVERSITY_MAX_GRAPHS` | `max_graphs` | `4096` |
//! | `DIVERSITY_MAX_VECTOR_SPACES` | `max_vector_spaces` | `8` |
//! | `DIVERSITY_PRECISION` | `default_precision` | `fp64` |
//! | `DIVERSITY_METRIC` | `metric` | `cosine`, `minkowski:1.5` |
//! | `DIVERSITY_SIMILARITY_SENSITIVITY` | `similarity_sensitivity` | `2.0` |

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::model::Precision;
use crate::{Error, Result};

pub const ENV_MAX_GRAPHS: &str = "DIVERSITY_MAX_GRAPHS";
pub const ENV_MAX_VECTOR_SPACES: &str = "DIVERSITY_MAX_VECTOR_SPACES";
pub const ENV_PRECISION: &str = "DIVERSITY_PRECISION";
pub const ENV_METRIC: &str = "DIVERSITY_METRIC";
pub const ENV_SIMILARITY_SENSITIVITY: &str = "DIVERSITY_SIMILARITY_SENSITIVITY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Live graphs allowed at once.
    pub max_graphs: usize,
    /// Live vector spaces allowed at once.
    pub max_vector_spaces: usize,
    /// Precision used by loads that do not name one.
    pub default_precision: Precision,
    /// Metric for distances computed from embeddings.
    pub metric: DistanceMetric,
    /// Leinster-Cobbold `u`.
    pub similarity_sensitivity: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_graphs: 65_536,
            max_vector_spaces: 64,
            default_precision: Precision::Fp32,
            metric: DistanceMetric::default(),
            similarity_sensitivity: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `DIVERSITY_*` variables of the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup(ENV_MAX_GRAPHS) {
            self.max_graphs = parse_var(ENV_MAX_GRAPHS, &v, |s| s.parse().ok())?;
        }
        if let Some(v) = lookup(ENV_MAX_VECTOR_SPACES) {
            self.max_vector_spaces = parse_var(ENV_MAX_VECTOR_SPACES, &v, |s| s.parse().ok())?;
        }
        if let Some(v) = lookup(ENV_PRECISION) {
            self.default_precision = parse_var(ENV_PRECISION, &v, Precision::parse)?;
        }
        if let Some(v) = lookup(ENV_METRIC) {
            self.metric = parse_var(ENV_METRIC, &v, DistanceMetric::parse)?;
        }
        if let Some(v) = lookup(ENV_SIMILARITY_SENSITIVITY) {
            self.similarity_sensitivity = parse_var(ENV_SIMILARITY_SENSITIVITY, &v, |s| s.parse().ok())?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_graphs == 0 || self.max_vector_spaces == 0 {
            return Err(Error::Config("registry capacities must be positive".into()));
        }
        if !self.metric.is_valid() {
            return Err(Error::Config(format!("invalid metric {}", self.metric)));
        }
        if !self.similarity_sensitivity.is_finite() || self.similarity_sensitivity < 0.0 {
            return Err(Error::Config(format!(
                "similarity sensitivity must be finite and non-negative, got {}",
                self.similarity_sensitivity
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    parse(raw.trim()).ok_or_else(|| Error::Config(format!("{name}: cannot parse {raw:?}")))
}
