//! External collaborator contracts: boundaries the pipeline core
//! calls across but never implements itself. A host application supplies
//! concrete types; the core only depends on these traits.

use crate::errors::PipelineResult;
use crate::models::Recommendation;
use crate::run_record::RunRecord;
use async_trait::async_trait;

/// Trains and serves a demand/price prediction model external to the
/// pipeline core. `ForecastEngine` depends only on the narrower
/// `ForecastModel` predict-only contract in `forecast.rs`; this trait is
/// the fuller training lifecycle a host application implements around
/// it.
#[async_trait]
pub trait Model: Send + Sync {
    async fn train(&mut self, training_data: &[crate::models::HistoricalRide]) -> PipelineResult<()>;
    async fn is_ready(&self) -> bool;
}

/// Produces a human-readable report from a completed run, for dashboards
/// or email digests. Never called by the pipeline orchestrator itself;
/// documented as a boundary the host application wires up downstream of
/// `trigger_pipeline`.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, run: &RunRecord) -> PipelineResult<String>;
}

/// Answers natural-language questions about recommendations and their
/// rationale. Like `ReportGenerator`, a downstream consumer of
/// `RunRecord`/`Recommendation` data, not a pipeline-internal component.
#[async_trait]
pub trait ChatbotOrchestrator: Send + Sync {
    async fn answer(&self, question: &str, recommendations: &[Recommendation]) -> PipelineResult<String>;
}

