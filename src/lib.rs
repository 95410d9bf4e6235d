//! # Pricing Intelligence Core
//!
//! The pricing-intelligence pipeline for a rideshare analytics platform:
//! segment-level demand forecasting, pricing-rule generation, and
//! strategic recommendation search, orchestrated as a periodic or
//! on-demand run over a 162-cell segment lattice.
//!
//! ## Quick Start
//!
//! ```rust
//! use pricing_intel_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> PipelineResult<()> {
//! let factory = MemoryRepositoryFactory::new();
//! let orchestrator = PipelineOrchestrator::new(
//! PipelineConfig::default(),
//! Arc::new(InMemoryDataSource::default()),
//! ForecastEngine::without_model(SegmentLattice::default()),
//! Arc::new(factory.run_record_repository()),
//! Arc::new(factory.strategy_rule_repository()),
//! );
//!
//! let run = orchestrator.trigger_pipeline(TriggerKind::ManualForce).await?;
//! println!("run {} produced {} recommendations", run.run_id, run.recommendations.len());
//! # Ok(())
//! # }
//! ```

pub mod change_tracker;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod forecast;
pub mod ingestion;
pub mod models;
pub mod orchestrator;
pub mod pricing;
pub mod recommend;
pub mod repository;
pub mod rules;
pub mod run_record;
pub mod segment;

/// Convenience module for common imports.
pub mod prelude {
    pub use crate::change_tracker::ChangeTracker;
    pub use crate::collaborators::{ChatbotOrchestrator, Model, ReportGenerator};
    pub use crate::config::PipelineConfig;
    pub use crate::errors::{PipelineError, PipelineResult};
    pub use crate::forecast::{ForecastEngine, ForecastModel, ModelPrediction, NoopForecastModel};
    pub use crate::ingestion::{InMemoryDataSource, RawDataSource};
    pub use crate::models::*;
    pub use crate::orchestrator::PipelineOrchestrator;
    pub use crate::pricing::{ElasticityTable, MultiplierBounds, PricingKernel};
    pub use crate::recommend::RecommendationEngine;
    pub use crate::repository::memory::MemoryRepositoryFactory;
    pub use crate::repository::{
        RepositoryError, RepositoryResult, RunRecordRepository, StrategyRuleRepository,
    };
    pub use crate::rules::RuleGenerator;
    pub use crate::run_record::{PhaseStatus, RunRecord, RunStatus, TriggerKind};
    pub use crate::segment::{DemandThresholds, SegmentLattice};
}

