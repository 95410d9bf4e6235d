//! The persisted record of a single pipeline run.

use crate::models::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What initiated a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    Scheduler,
    Manual,
    ManualForce,
}

/// Outcome of one phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Timing and outcome for a single pipeline phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub status: PhaseStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl PhaseOutcome {
    pub fn succeeded(duration_ms: u64) -> Self {
        Self {
            status: PhaseStatus::Succeeded,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Failed,
            duration_ms,
            error: Some(error.into()),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: PhaseStatus::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

/// The three phases tracked on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcomes {
    pub forecast: PhaseOutcome,
    pub analysis: PhaseOutcome,
    pub recommendation: PhaseOutcome,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Free-form diagnostic counters attached to a run, for observability
/// and debugging: segment counts, rule counts, retry counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub segments_with_measured_data: u32,
    pub segments_with_aggregated_data: u32,
    pub segments_with_fallback_data: u32,
    pub rules_generated: u32,
    pub recommendations_produced: u32,
    pub changed_base_combinations: u32,
}

/// The canonical persisted shape of a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub trigger: TriggerKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub phases: PhaseOutcomes,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: RunDiagnostics,
}

impl RunRecord {
    pub fn start(trigger: TriggerKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trigger,
            started_at: Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            phases: PhaseOutcomes {
                forecast: PhaseOutcome::skipped(),
                analysis: PhaseOutcome::skipped(),
                recommendation: PhaseOutcome::skipped(),
            },
            recommendations: Vec::new(),
            diagnostics: RunDiagnostics::default(),
        }
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }
}

