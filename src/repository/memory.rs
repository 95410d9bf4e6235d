//! In-memory repository implementation
//!
//! Backs `RunRecordRepository` and `StrategyRuleRepository` with
//! `Arc<RwLock<HashMap<>>>` storage, for testing, development, and
//! deployments that don't need durable persistence across restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::traits::{RunRecordFilters, StrategyRuleFilters};
use super::{Repository, RepositoryError, RepositoryResult, RunRecordRepository, SearchResult, SearchableRepository, StrategyRuleRepository};
use crate::models::{BusinessObjective, PricingRule, RuleCategory, RuleCondition, RuleSource};
use crate::run_record::{RunRecord, RunStatus};

type Storage<T> = Arc<RwLock<HashMap<Uuid, T>>>;

/// In-memory repository factory.
pub struct MemoryRepositoryFactory {
    pub run_records: Storage<RunRecord>,
    pub strategy_rules: Storage<PricingRule>,
}

impl MemoryRepositoryFactory {
    pub fn new() -> Self {
        Self {
            run_records: Arc::new(RwLock::new(HashMap::new())),
            strategy_rules: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn clear_all(&self) {
        self.run_records.write().unwrap().clear();
        self.strategy_rules.write().unwrap().clear();
    }

    pub fn run_record_repository(&self) -> MemoryRunRecordRepository {
        MemoryRunRecordRepository::new(self.run_records.clone())
    }

    pub fn strategy_rule_repository(&self) -> MemoryStrategyRuleRepository {
        MemoryStrategyRuleRepository::new(self.strategy_rules.clone())
    }
}

impl Default for MemoryRepositoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-record repository implementation.
pub struct MemoryRunRecordRepository {
    storage: Storage<RunRecord>,
}

impl MemoryRunRecordRepository {
    pub fn new(storage: Storage<RunRecord>) -> Self {
        Self { storage }
    }

    fn read_lock(
        &self,
    ) -> RepositoryResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.storage
            .read()
            .map_err(|_| RepositoryError::internal("failed to acquire read lock"))
    }

    fn write_lock(
        &self,
    ) -> RepositoryResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.storage
            .write()
            .map_err(|_| RepositoryError::internal("failed to acquire write lock"))
    }
}

#[async_trait]
impl Repository<RunRecord> for MemoryRunRecordRepository {
    async fn create(&self, entity: &RunRecord) -> RepositoryResult<RunRecord> {
        let mut storage = self.write_lock()?;
        if storage.contains_key(&entity.run_id) {
            return Err(RepositoryError::duplicate("RunRecord", entity.run_id.to_string()));
        }
        storage.insert(entity.run_id, entity.clone());
        Ok(entity.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<RunRecord>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    async fn update(&self, entity: &RunRecord) -> RepositoryResult<RunRecord> {
        let mut storage = self.write_lock()?;
        if !storage.contains_key(&entity.run_id) {
            return Err(RepositoryError::not_found("RunRecord", entity.run_id.to_string()));
        }
        storage.insert(entity.run_id, entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.write_lock()?.remove(&id).is_some())
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.read_lock()?.contains_key(&id))
    }

    async fn get_all(&self, offset: Option<u64>, limit: Option<u64>) -> RepositoryResult<Vec<RunRecord>> {
        let storage = self.read_lock()?;
        let mut items: Vec<RunRecord> = storage.values().cloned().collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        paginate(items, offset, limit)
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.read_lock()?.len() as u64)
    }
}

#[async_trait]
impl SearchableRepository<RunRecord, RunRecordFilters> for MemoryRunRecordRepository {
    async fn search(&self, filters: RunRecordFilters) -> RepositoryResult<Vec<RunRecord>> {
        let storage = self.read_lock()?;
        let mut items: Vec<RunRecord> = storage
            .values()
            .filter(|r| matches_run_record(r, &filters))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items)
    }

    async fn search_paginated(
        &self,
        filters: RunRecordFilters,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> RepositoryResult<SearchResult<RunRecord>> {
        let matching = self.search(filters).await?;
        let total_count = matching.len() as u64;
        let offset_val = offset.unwrap_or(0);
        let limit_val = limit.unwrap_or(1000);
        let items = paginate(matching, offset, limit)?;
        Ok(SearchResult::new(items, total_count, offset_val, limit_val))
    }

    async fn count_filtered(&self, filters: RunRecordFilters) -> RepositoryResult<u64> {
        Ok(self.search(filters).await?.len() as u64)
    }
}

#[async_trait]
impl RunRecordRepository for MemoryRunRecordRepository {
    async fn get_last_run(&self) -> RepositoryResult<Option<RunRecord>> {
        let storage = self.read_lock()?;
        Ok(storage.values().max_by_key(|r| r.started_at).cloned())
    }

    async fn get_last_successful_run(&self) -> RepositoryResult<Option<RunRecord>> {
        let storage = self.read_lock()?;
        Ok(storage
            .values()
            .filter(|r| r.status == RunStatus::Succeeded)
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn has_run_in_progress(&self) -> RepositoryResult<bool> {
        let storage = self.read_lock()?;
        Ok(storage.values().any(|r| r.status == RunStatus::Running))
    }

    async fn update_status(&self, run_id: Uuid, status: RunStatus) -> RepositoryResult<()> {
        let mut storage = self.write_lock()?;
        let record = storage
            .get_mut(&run_id)
            .ok_or_else(|| RepositoryError::not_found("RunRecord", run_id.to_string()))?;
        record.status = status;
        Ok(())
    }
}

fn matches_run_record(record: &RunRecord, filters: &RunRecordFilters) -> bool {
    if let Some(trigger) = filters.trigger {
        if record.trigger != trigger {
            return false;
        }
    }
    if let Some(status) = filters.status {
        if record.status != status {
            return false;
        }
    }
    if let Some(after) = filters.started_after {
        if record.started_at < after {
            return false;
        }
    }
    if let Some(before) = filters.started_before {
        if record.started_at > before {
            return false;
        }
    }
    true
}

/// Strategy-rule repository implementation.
pub struct MemoryStrategyRuleRepository {
    storage: Storage<PricingRule>,
}

impl MemoryStrategyRuleRepository {
    pub fn new(storage: Storage<PricingRule>) -> Self {
        Self { storage }
    }

    fn read_lock(
        &self,
    ) -> RepositoryResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, PricingRule>>> {
        self.storage
            .read()
            .map_err(|_| RepositoryError::internal("failed to acquire read lock"))
    }

    fn write_lock(
        &self,
    ) -> RepositoryResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, PricingRule>>> {
        self.storage
            .write()
            .map_err(|_| RepositoryError::internal("failed to acquire write lock"))
    }

    fn business_objective_rule(objective: BusinessObjective) -> PricingRule {
        PricingRule {
            id: Uuid::new_v4(),
            rule_id: objective.goal_id().to_string(),
            category: RuleCategory::BusinessObjectives,
            name: format!("{:?}", objective),
            multiplier: 1.0,
            condition: RuleCondition::default(),
            affects_objectives: vec![objective],
            estimated_impact_pct: 0.0,
            source: RuleSource::External,
        }
    }
}

#[async_trait]
impl Repository<PricingRule> for MemoryStrategyRuleRepository {
    async fn create(&self, entity: &PricingRule) -> RepositoryResult<PricingRule> {
        let mut storage = self.write_lock()?;
        if storage.values().any(|r| r.rule_id == entity.rule_id) {
            return Err(RepositoryError::duplicate("PricingRule", entity.rule_id.clone()));
        }
        storage.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<PricingRule>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    async fn update(&self, entity: &PricingRule) -> RepositoryResult<PricingRule> {
        let mut storage = self.write_lock()?;
        if !storage.contains_key(&entity.id) {
            return Err(RepositoryError::not_found("PricingRule", entity.id.to_string()));
        }
        storage.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.write_lock()?.remove(&id).is_some())
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.read_lock()?.contains_key(&id))
    }

    async fn get_all(&self, offset: Option<u64>, limit: Option<u64>) -> RepositoryResult<Vec<PricingRule>> {
        let storage = self.read_lock()?;
        let mut items: Vec<PricingRule> = storage.values().cloned().collect();
        items.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        paginate(items, offset, limit)
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.read_lock()?.len() as u64)
    }
}

#[async_trait]
impl SearchableRepository<PricingRule, StrategyRuleFilters> for MemoryStrategyRuleRepository {
    async fn search(&self, filters: StrategyRuleFilters) -> RepositoryResult<Vec<PricingRule>> {
        let storage = self.read_lock()?;
        let mut items: Vec<PricingRule> = storage
            .values()
            .filter(|r| matches_strategy_rule(r, &filters))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        Ok(items)
    }

    async fn search_paginated(
        &self,
        filters: StrategyRuleFilters,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> RepositoryResult<SearchResult<PricingRule>> {
        let matching = self.search(filters).await?;
        let total_count = matching.len() as u64;
        let offset_val = offset.unwrap_or(0);
        let limit_val = limit.unwrap_or(1000);
        let items = paginate(matching, offset, limit)?;
        Ok(SearchResult::new(items, total_count, offset_val, limit_val))
    }

    async fn count_filtered(&self, filters: StrategyRuleFilters) -> RepositoryResult<u64> {
        Ok(self.search(filters).await?.len() as u64)
    }
}

#[async_trait]
impl StrategyRuleRepository for MemoryStrategyRuleRepository {
    async fn get_by_rule_id(&self, rule_id: &str) -> RepositoryResult<Option<PricingRule>> {
        Ok(self
            .read_lock()?
            .values()
            .find(|r| r.rule_id == rule_id)
            .cloned())
    }

    async fn get_by_category(&self, category: RuleCategory) -> RepositoryResult<Vec<PricingRule>> {
        Ok(self
            .read_lock()?
            .values()
            .filter(|r| r.category == category)
            .cloned()
            .collect())
    }

    async fn upsert(&self, rule: &PricingRule) -> RepositoryResult<PricingRule> {
        let mut storage = self.write_lock()?;
        if let Some(existing_id) = storage
            .values()
            .find(|r| r.rule_id == rule.rule_id)
            .map(|r| r.id)
        {
            storage.remove(&existing_id);
        }
        storage.insert(rule.id, rule.clone());
        Ok(rule.clone())
    }

    async fn ensure_business_objectives(&self) -> RepositoryResult<()> {
        for objective in BusinessObjective::ALL {
            let rule = Self::business_objective_rule(objective);
            if self.get_by_rule_id(&rule.rule_id).await?.is_none() {
                self.upsert(&rule).await?;
            }
        }
        Ok(())
    }

    async fn delete_rule(&self, rule_id: &str) -> RepositoryResult<bool> {
        if rule_id.starts_with("GOAL_") {
            return Err(RepositoryError::invalid_operation(
                    "business objective documents cannot be deleted",
            ));
        }
        let mut storage = self.write_lock()?;
        let id = storage.values().find(|r| r.rule_id == rule_id).map(|r| r.id);
        match id {
            Some(id) => Ok(storage.remove(&id).is_some()),
            None => Ok(false),
        }
    }
}

fn matches_strategy_rule(rule: &PricingRule, filters: &StrategyRuleFilters) -> bool {
    if let Some(category) = filters.category {
        if rule.category != category {
            return false;
        }
    }
    if let Some(objective) = filters.affects_objective {
        if !rule.inferred_objectives().contains(&objective) {
            return false;
        }
    }
    if let Some(min_impact) = filters.min_estimated_impact_pct {
        if rule.estimated_impact_pct < min_impact {
            return false;
        }
    }
    true
}

fn paginate<T>(mut items: Vec<T>, offset: Option<u64>, limit: Option<u64>) -> RepositoryResult<Vec<T>> {
    let offset = offset.unwrap_or(0) as usize;
    let limit = limit.unwrap_or(1000) as usize;
    if offset >= items.len() {
        return Ok(Vec::new());
    }
    items.drain(0..offset);
    items.truncate(limit);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_record::TriggerKind;

    #[tokio::test]
    async fn create_and_fetch_run_record() {
        let factory = MemoryRepositoryFactory::new();
        let repo = factory.run_record_repository();
        let record = RunRecord::start(TriggerKind::Manual);
        repo.create(&record).await.unwrap();
        let fetched = repo.get_by_id(record.run_id).await.unwrap().unwrap();
        assert_eq!(fetched.run_id, record.run_id);
        assert!(repo.has_run_in_progress().await.unwrap());
    }

    #[tokio::test]
    async fn business_objectives_are_seeded_and_protected() {
        let factory = MemoryRepositoryFactory::new();
        let repo = factory.strategy_rule_repository();
        repo.ensure_business_objectives().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 4);
        let err = repo.delete_rule("GOAL_MAXIMIZE_REVENUE").await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn upsert_replaces_existing_rule_id() {
        let factory = MemoryRepositoryFactory::new();
        let repo = factory.strategy_rule_repository();
        let mut rule = PricingRule {
            id: Uuid::new_v4(),
            rule_id: "LOC_01".into(),
            category: RuleCategory::LocationBased,
            name: "first".into(),
            multiplier: 1.1,
            condition: RuleCondition::default(),
            affects_objectives: vec![],
            estimated_impact_pct: 1.0,
            source: RuleSource::Generated,
        };
        repo.upsert(&rule).await.unwrap();
        rule.name = "second".into();
        repo.upsert(&rule).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        let fetched = repo.get_by_rule_id("LOC_01").await.unwrap().unwrap();
        assert_eq!(fetched.name, "second");
    }
}

