//! The pipeline orchestrator: drives a full run through
//! Phase 1 (forecast + rule generation, in parallel) and Phase 2
//! (recommendation search), enforcing a single in-flight run, phase and
//! overall timeouts, and cooperative cancellation.

use crate::change_tracker::ChangeTracker;
use crate::config::PipelineConfig;
use crate::errors::{retry_with_backoff, PipelineError, PipelineResult};
use crate::forecast::{ForecastEngine, ForecastModel, NoopForecastModel};
use crate::ingestion::RawDataSource;
use crate::models::{PricingRule, SegmentBaseline};
use crate::recommend::RecommendationEngine;
use crate::repository::{RunRecordRepository, StrategyRuleRepository};
use crate::rules::RuleGenerator;
use crate::run_record::{PhaseOutcome, RunDiagnostics, RunRecord, RunStatus, TriggerKind};
use crate::segment::SegmentLattice;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Coordinates a full forecast -> rule generation -> recommendation
/// run against one data source and one pair of repositories.
pub struct PipelineOrchestrator<D, RR, SR, M = NoopForecastModel>
where
D: RawDataSource,
RR: RunRecordRepository,
SR: StrategyRuleRepository,
M: ForecastModel,
{
    config: PipelineConfig,
    change_tracker: Arc<ChangeTracker>,
    data_source: Arc<D>,
    forecast_engine: Arc<ForecastEngine<M>>,
    rule_generator: RuleGenerator,
    recommendation_engine: RecommendationEngine,
    run_records: Arc<RR>,
    strategy_rules: Arc<SR>,
    run_lock: AsyncMutex<()>,
    in_flight: AtomicBool,
    cancellation: SyncMutex<Option<CancellationToken>>,
}

impl<D, RR, SR, M> PipelineOrchestrator<D, RR, SR, M>
where
D: RawDataSource,
RR: RunRecordRepository,
SR: StrategyRuleRepository,
M: ForecastModel,
{
    pub fn new(
        config: PipelineConfig,
        data_source: Arc<D>,
        forecast_engine: ForecastEngine<M>,
        run_records: Arc<RR>,
        strategy_rules: Arc<SR>,
    ) -> Self {
        let recommendation_engine = RecommendationEngine::new(
            crate::pricing::PricingKernel::new(config.multiplier_bounds, config.elasticity.clone()),
            config.prefer_multi_rule,
        );
        Self {
            config,
            change_tracker: ChangeTracker::new(),
            data_source,
            forecast_engine: Arc::new(forecast_engine),
            rule_generator: RuleGenerator::new(),
            recommendation_engine,
            run_records,
            strategy_rules,
            run_lock: AsyncMutex::new(()),
            in_flight: AtomicBool::new(false),
            cancellation: SyncMutex::new(None),
        }
    }

    pub fn change_tracker(&self) -> Arc<ChangeTracker> {
        self.change_tracker.clone()
    }

    /// Whether a run is currently executing.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request cancellation of the currently running pipeline, if any.
    /// A no-op when no run is in flight.
    pub fn cancel_current_run(&self) {
        if let Some(token) = self.cancellation.lock().as_ref() {
            token.cancel();
        }
    }

    /// Most recently started run, regardless of outcome.
    pub async fn get_last_run(&self) -> PipelineResult<Option<RunRecord>> {
        Ok(self.run_records.get_last_run().await?)
    }

    pub async fn get_history(&self, limit: u64) -> PipelineResult<Vec<RunRecord>> {
        Ok(self.run_records.get_all(Some(0), Some(limit)).await?)
    }

    pub async fn get_status(&self, run_id: Uuid) -> PipelineResult<Option<RunRecord>> {
        Ok(self.run_records.get_by_id(run_id).await?)
    }

    /// Discard pending change markers without running a pipeline.
    pub fn clear_changes(&self) {
        self.change_tracker.snapshot_and_clear();
    }

    /// Run the pipeline once. `ManualForce` bypasses the "no pending
    /// changes" no-op path that `Scheduler`/`Manual` triggers respect;
    /// all trigger kinds are rejected while another run is in flight.
    pub async fn trigger_pipeline(&self, trigger: TriggerKind) -> PipelineResult<RunRecord> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::component(
                    "PipelineOrchestrator",
                    "a pipeline run is already in progress",
            ));
        }
        let _permit = self.run_lock.lock().await;
        let token = CancellationToken::new();
        *self.cancellation.lock() = Some(token.clone());

        let result = self.run_once(trigger, token).await;

        *self.cancellation.lock() = None;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_once(
        &self,
        trigger: TriggerKind,
        token: CancellationToken,
    ) -> PipelineResult<RunRecord> {
        let changed = self.change_tracker.snapshot_and_clear();
        if trigger != TriggerKind::ManualForce && changed.is_empty() {
            let mut record = RunRecord::start(trigger);
            record.phases.forecast = PhaseOutcome::skipped();
            record.phases.analysis = PhaseOutcome::skipped();
            record.phases.recommendation = PhaseOutcome::skipped();
            record.finish(RunStatus::Succeeded);
            self.persist(&record).await?;
            return Ok(record);
        }

        let mut record = RunRecord::start(trigger);
        record.diagnostics.changed_base_combinations = changed.len() as u32;
        self.persist(&record).await?;

        let overall_start = Instant::now();
        let run_result = tokio::time::timeout(
            self.config.overall_timeout(),
            self.run_phases(&mut record, token.clone()),
        )
            .await;

        match run_result {
            Ok(Ok(())) => {
                record.finish(if token.is_cancelled() {
                        RunStatus::Cancelled
                    } else {
                        RunStatus::Succeeded
                });
            }
            Ok(Err(err)) => {
                record.finish(RunStatus::Failed);
                tracing::error!(run_id = %record.run_id, error = %err, "pipeline run failed");
            }
            Err(_) => {
                let elapsed_ms = overall_start.elapsed().as_millis() as u64;
                record.finish(RunStatus::Failed);
                tracing::error!(run_id = %record.run_id, elapsed_ms, "pipeline run exceeded overall timeout");
            }
        }

        self.persist(&record).await?;
        Ok(record)
    }

    async fn run_phases(&self, record: &mut RunRecord, token: CancellationToken) -> PipelineResult<()> {
        let since: DateTime<Utc> = record.started_at - chrono::Duration::days(90);
        let historical = self.data_source.historical_rides(since).await?;
        let competitor = self.data_source.competitor_rides(since).await?;

        if token.is_cancelled() {
            return Ok(());
        }

        let baselines = self.forecast_engine.compute_baselines(&historical, &competitor);
        self.tally_data_quality(record, &baselines);

        let phase1_start = Instant::now();
        let phase1_result = tokio::time::timeout(
            self.config.phase1_timeout(),
            self.run_phase1(&baselines, token.clone()),
        )
            .await;

        let rules = match phase1_result {
            Ok(Ok(rules)) => {
                record.phases.forecast = PhaseOutcome::succeeded(phase1_start.elapsed().as_millis() as u64);
                record.phases.analysis = PhaseOutcome::succeeded(phase1_start.elapsed().as_millis() as u64);
                rules
            }
            Ok(Err(err)) => {
                let elapsed = phase1_start.elapsed().as_millis() as u64;
                record.phases.forecast = PhaseOutcome::failed(elapsed, err.to_string());
                record.phases.analysis = PhaseOutcome::failed(elapsed, err.to_string());
                return Err(err);
            }
            Err(_) => {
                let elapsed = phase1_start.elapsed().as_millis() as u64;
                let timeout_err = PipelineError::timeout(
                    "phase1",
                    elapsed,
                    self.config.phase1_timeout_secs * 1000,
                );
                record.phases.forecast = PhaseOutcome::failed(elapsed, timeout_err.to_string());
                record.phases.analysis = PhaseOutcome::failed(elapsed, timeout_err.to_string());
                return Err(timeout_err);
            }
        };

        record.diagnostics.rules_generated = rules.len() as u32;
        self.persist_rules(&rules).await?;

        if token.is_cancelled() {
            return Ok(());
        }

        let phase2_start = Instant::now();
        let phase2_result = tokio::time::timeout(
            self.config.phase2_timeout(),
            self.run_phase2(&rules, &baselines),
        )
            .await;

        match phase2_result {
            Ok(Ok(recommendations)) => {
                record.phases.recommendation =
                PhaseOutcome::succeeded(phase2_start.elapsed().as_millis() as u64);
                record.diagnostics.recommendations_produced = recommendations.len() as u32;
                record.recommendations = recommendations;
                Ok(())
            }
            Ok(Err(err)) => {
                let elapsed = phase2_start.elapsed().as_millis() as u64;
                record.phases.recommendation = PhaseOutcome::failed(elapsed, err.to_string());
                Err(err)
            }
            Err(_) => {
                let elapsed = phase2_start.elapsed().as_millis() as u64;
                let timeout_err = PipelineError::timeout(
                    "phase2",
                    elapsed,
                    self.config.phase2_timeout_secs * 1000,
                );
                record.phases.recommendation = PhaseOutcome::failed(elapsed, timeout_err.to_string());
                Err(timeout_err)
            }
        }
    }

    /// Phase 1: forecast every horizon and generate candidate rules in
    /// parallel. Only the generated rules are returned to the
    /// caller; forecasts are computed for completeness/observability but
    /// are not themselves part of `RunRecord` — its phase outcomes
    /// track status, not the forecast payload itself.
    async fn run_phase1(
        &self,
        baselines: &[SegmentBaseline],
        token: CancellationToken,
    ) -> PipelineResult<Vec<PricingRule>> {
        let forecast_engine = self.forecast_engine.clone();
        let horizons = self.config.forecast_horizons_days.clone();
        let baselines_owned = baselines.to_vec();
        let forecast_fut = async move {
            for horizon in horizons {
                forecast_engine.forecast(&baselines_owned, horizon).await?;
            }
            Ok::<(), PipelineError>(())
        };

        let rule_generator = self.rule_generator.clone();
        let baselines_for_rules = baselines.to_vec();
        let rules_fut =
        async move { rule_generator.generate(&baselines_for_rules) };

        tokio::select! {
            _ = token.cancelled() => Ok(Vec::new()),
            result = async {
                let (forecast_result, rules_result) = tokio::join!(forecast_fut, rules_fut);
                forecast_result?;
                rules_result
            } => result,
        }
    }

    async fn run_phase2(
        &self,
        rules: &[PricingRule],
        baselines: &[SegmentBaseline],
    ) -> PipelineResult<Vec<crate::models::Recommendation>> {
        self.recommendation_engine.recommend(rules, baselines)
    }

    fn tally_data_quality(&self, record: &mut RunRecord, baselines: &[SegmentBaseline]) {
        use crate::models::DataQuality::*;
        for baseline in baselines {
            match baseline.data_quality {
                Measured => record.diagnostics.segments_with_measured_data += 1,
                Aggregated => record.diagnostics.segments_with_aggregated_data += 1,
                FallbackDefaults => record.diagnostics.segments_with_fallback_data += 1,
            }
        }
    }

    async fn persist(&self, record: &RunRecord) -> PipelineResult<()> {
        retry_with_backoff(
            || async {
                if self.run_records.exists(record.run_id).await? {
                    self.run_records.update(record).await?;
                } else {
                    self.run_records.create(record).await?;
                }
                Ok(())
            },
            self.config.persistence_retry_attempts,
            self.config.persistence_retry_backoff(),
        )
            .await
    }

    async fn persist_rules(&self, rules: &[PricingRule]) -> PipelineResult<()> {
        self.strategy_rules.ensure_business_objectives().await?;
        for rule in rules {
            self.strategy_rules.upsert(rule).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::InMemoryDataSource;
    use crate::repository::memory::MemoryRepositoryFactory;

    #[tokio::test]
    async fn a_run_with_no_pending_changes_is_a_quick_no_op() {
        let factory = MemoryRepositoryFactory::new();
        let orchestrator = PipelineOrchestrator::new(
            PipelineConfig::default(),
            Arc::new(InMemoryDataSource::default()),
            ForecastEngine::without_model(SegmentLattice::default()),
            Arc::new(factory.run_record_repository()),
            Arc::new(factory.strategy_rule_repository()),
        );

        let record = orchestrator.trigger_pipeline(TriggerKind::Manual).await.unwrap();
        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(record.diagnostics.rules_generated, 0);
    }

    #[tokio::test]
    async fn a_forced_run_produces_recommendations() {
        let factory = MemoryRepositoryFactory::new();
        let orchestrator = PipelineOrchestrator::new(
            PipelineConfig::default(),
            Arc::new(InMemoryDataSource::default()),
            ForecastEngine::without_model(SegmentLattice::default()),
            Arc::new(factory.run_record_repository()),
            Arc::new(factory.strategy_rule_repository()),
        );

        let record = orchestrator.trigger_pipeline(TriggerKind::ManualForce).await.unwrap();
        assert_eq!(record.status, RunStatus::Succeeded);
        assert!(record.diagnostics.rules_generated >= 15);
        assert!(!record.recommendations.is_empty());
    }

    #[tokio::test]
    async fn concurrent_triggers_reject_the_second() {
        let factory = MemoryRepositoryFactory::new();
        let orchestrator = Arc::new(PipelineOrchestrator::new(
                PipelineConfig::default(),
                Arc::new(InMemoryDataSource::default()),
                ForecastEngine::without_model(SegmentLattice::default()),
                Arc::new(factory.run_record_repository()),
                Arc::new(factory.strategy_rule_repository()),
        ));
        orchestrator.in_flight.store(true, Ordering::SeqCst);
        let err = orchestrator.trigger_pipeline(TriggerKind::Manual).await.unwrap_err();
        assert!(matches!(err, PipelineError::Component { .. }));
    }
}

