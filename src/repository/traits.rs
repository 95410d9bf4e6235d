//! Repository trait definitions
//!
//! Specialized repository traits for the two entities the pipeline core
//! persists: pipeline run records, and the durable strategy-rule
//! collection (generated rules plus the protected GOAL_* business
//! objective documents), generalized from a multi-entity repository
//! layer down to this pipeline's actual persistence surface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{BusinessObjective, PricingRule, RuleCategory};
use crate::run_record::{RunRecord, RunStatus, TriggerKind};

use super::{RepositoryResult, SearchableRepository};

/// Run-record repository trait.
#[async_trait]
pub trait RunRecordRepository:
SearchableRepository<RunRecord, RunRecordFilters> + Send + Sync
{
    /// The most recently started run, regardless of status.
    async fn get_last_run(&self) -> RepositoryResult<Option<RunRecord>>;

    /// The most recent run that completed successfully.
    async fn get_last_successful_run(&self) -> RepositoryResult<Option<RunRecord>>;

    /// Whether a run is currently in the `Running` state — backs the
    /// single-in-flight-run concurrency guard.
    async fn has_run_in_progress(&self) -> RepositoryResult<bool>;

    async fn update_status(&self, run_id: Uuid, status: RunStatus) -> RepositoryResult<()>;
}

/// Run-record search filters.
#[derive(Debug, Clone, Default)]
pub struct RunRecordFilters {
    pub trigger: Option<TriggerKind>,
    pub status: Option<RunStatus>,
    pub started_after: Option<DateTime<Utc>>,
    pub started_before: Option<DateTime<Utc>>,
}

/// Strategy-rule repository trait. Rules are mirrored here by
/// `rule_id` after each run; the four `GOAL_*` business-objective
/// documents are always present and are never deleted by a pipeline run,
/// only by explicit administrative action.
#[async_trait]
pub trait StrategyRuleRepository:
SearchableRepository<PricingRule, StrategyRuleFilters> + Send + Sync
{
    async fn get_by_rule_id(&self, rule_id: &str) -> RepositoryResult<Option<PricingRule>>;

    async fn get_by_category(&self, category: RuleCategory) -> RepositoryResult<Vec<PricingRule>>;

    /// Upsert a rule by `rule_id`, replacing any existing document with
    /// the same id.
    async fn upsert(&self, rule: &PricingRule) -> RepositoryResult<PricingRule>;

    /// Upsert the four fixed `GOAL_*` business-objective documents. Idempotent.
    async fn ensure_business_objectives(&self) -> RepositoryResult<()>;

    /// Delete a rule by id, refusing to delete a `GOAL_*` document.
    async fn delete_rule(&self, rule_id: &str) -> RepositoryResult<bool>;
}

/// Strategy-rule search filters.
#[derive(Debug, Clone, Default)]
pub struct StrategyRuleFilters {
    pub category: Option<RuleCategory>,
    pub affects_objective: Option<BusinessObjective>,
    pub min_estimated_impact_pct: Option<f64>,
}

/// Database transaction trait for atomic operations.
#[async_trait]
pub trait DatabaseTransaction: Send + Sync {
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Unit of Work pattern for managing multiple repository operations.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Transaction: DatabaseTransaction;

    async fn begin(&self) -> RepositoryResult<Self::Transaction>;

    async fn execute<F, T>(&self, operation: F) -> RepositoryResult<T>
    where
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static;
}

/// Repository factory trait for creating repository instances.
pub trait RepositoryFactory: Send + Sync {
    type RunRecordRepo: RunRecordRepository;
    type StrategyRuleRepo: StrategyRuleRepository;

    fn run_record_repository(&self) -> &Self::RunRecordRepo;
    fn strategy_rule_repository(&self) -> &Self::StrategyRuleRepo;
}

/// Configuration for repository connections.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub connection_string: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub query_timeout_seconds: u64,
    pub enable_logging: bool,
    pub options: HashMap<String, String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            connection_string: "sqlite::memory:".to_string(),
            max_connections: 10,
            connection_timeout_seconds: 30,
            query_timeout_seconds: 60,
            enable_logging: false,
            options: HashMap::new(),
        }
    }
}

impl RepositoryConfig {
    pub fn postgres(database_url: impl Into<String>) -> Self {
        Self {
            connection_string: database_url.into(),
            max_connections: 20,
            connection_timeout_seconds: 30,
            query_timeout_seconds: 60,
            enable_logging: true,
            options: HashMap::from([
                    ("application_name".to_string(), "pricing-intel-core".to_string()),
                    ("sslmode".to_string(), "prefer".to_string()),
            ]),
        }
    }

    pub fn mysql(database_url: impl Into<String>) -> Self {
        Self {
            connection_string: database_url.into(),
            max_connections: 15,
            connection_timeout_seconds: 30,
            query_timeout_seconds: 60,
            enable_logging: true,
            options: HashMap::new(),
        }
    }

    pub fn sqlite(database_path: impl Into<String>) -> Self {
        Self {
            connection_string: format!("sqlite:{}", database_path.into()),
            max_connections: 1,
            connection_timeout_seconds: 30,
            query_timeout_seconds: 60,
            enable_logging: false,
            options: HashMap::from([
                    ("journal_mode".to_string(), "WAL".to_string()),
                    ("synchronous".to_string(), "NORMAL".to_string()),
            ]),
        }
    }

    pub fn mongodb(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            max_connections: 10,
            connection_timeout_seconds: 30,
            query_timeout_seconds: 60,
            enable_logging: true,
            options: HashMap::from([
                    ("appName".to_string(), "pricing-intel-core".to_string()),
                    ("retryWrites".to_string(), "true".to_string()),
            ]),
        }
    }

    pub fn memory() -> Self {
        Self {
            connection_string: "memory://test".to_string(),
            max_connections: 1,
            connection_timeout_seconds: 1,
            query_timeout_seconds: 10,
            enable_logging: false,
            options: HashMap::new(),
        }
    }
}

