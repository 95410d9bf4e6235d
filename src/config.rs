//! Pipeline configuration: timeouts, scheduling cadence, and tunable
//! model parameters, loadable from a layered file + environment source
//! using the `config` crate, with a double-underscore nested-key
//! convention for environment variables.

use crate::pricing::{ElasticityTable, MultiplierBounds};
use crate::segment::DemandThresholds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All tunables for a running pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How often the scheduler triggers an automatic run.
    pub schedule_cadence_secs: u64,

    /// Forecast horizons computed on every run, in days.
    pub forecast_horizons_days: Vec<u32>,

    /// Wall-clock budget for Phase 1 (forecast + rule generation, run in
    /// parallel).
    pub phase1_timeout_secs: u64,

    /// Wall-clock budget for Phase 2 (recommendation engine).
    pub phase2_timeout_secs: u64,

    /// Wall-clock budget for an entire run.
    pub overall_timeout_secs: u64,

    /// Demand-profile classification thresholds.
    pub demand_thresholds: DemandThresholds,

    /// Combined-multiplier clamp bounds.
    pub multiplier_bounds: MultiplierBounds,

    /// Per-(loyalty tier, demand profile) elasticity.
    pub elasticity: ElasticityTable,

    /// Prefer combinations of multiple rules over single-rule
    /// recommendations when they tie on objectives met.
    pub prefer_multi_rule: bool,

    /// Repository connection string; interpretation depends on which of
    /// `sql`/`mongodb`/in-memory is compiled in.
    pub repository_connection_string: String,

    /// Retry attempts for transient persistence failures.
    pub persistence_retry_attempts: u32,

    /// Backoff between persistence retries.
    pub persistence_retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schedule_cadence_secs: 3600,
            forecast_horizons_days: vec![7, 30, 90],
            phase1_timeout_secs: 120,
            phase2_timeout_secs: 180,
            overall_timeout_secs: 360,
            demand_thresholds: DemandThresholds::default(),
            multiplier_bounds: MultiplierBounds::default(),
            elasticity: ElasticityTable::default(),
            prefer_multi_rule: true,
            repository_connection_string: "memory://default".to_string(),
            persistence_retry_attempts: 3,
            persistence_retry_backoff_ms: 500,
        }
    }
}

impl PipelineConfig {
    pub fn phase1_timeout(&self) -> Duration {
        Duration::from_secs(self.phase1_timeout_secs)
    }

    pub fn phase2_timeout(&self) -> Duration {
        Duration::from_secs(self.phase2_timeout_secs)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    pub fn persistence_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.persistence_retry_backoff_ms)
    }

    /// Load configuration from (in ascending priority) built-in
    /// defaults, an optional `pricing_pipeline.toml` file, a `.env` file,
    /// and `PRICING_PIPELINE__`-prefixed environment variables, e.g.
    /// `PRICING_PIPELINE__SCHEDULE_CADENCE_SECS=900`.
    #[cfg(feature = "config")]
    pub fn load() -> Result<Self, crate::errors::PipelineError> {
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(|e| {
                crate::errors::PipelineError::config(format!("invalid default config: {e}"))
            })?)
            .add_source(config::File::with_name("pricing_pipeline").required(false))
            .add_source(
                config::Environment::with_prefix("PRICING_PIPELINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::errors::PipelineError::config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| crate::errors::PipelineError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = PipelineConfig::default();
        assert!(config.phase1_timeout_secs < config.overall_timeout_secs);
        assert!(config.phase2_timeout_secs < config.overall_timeout_secs);
        assert!(!config.forecast_horizons_days.is_empty());
    }
}

