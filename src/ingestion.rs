//! Raw data ingestion: typed records for the five external
//! signal sources the pipeline consumes, plus the `RawDataSource`
//! collaborator contract the host application implements to supply
//! them.

use crate::errors::PipelineResult;
use crate::models::{CompetitorRide, HistoricalRide, Metadata};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A local event (concert, game, festival) that may affect ride demand
/// in a geographic area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: String,
    pub location_category: crate::models::LocationCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub expected_attendance: Option<u32>,
    pub metadata: Metadata,
}

/// A traffic-conditions sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub observed_at: DateTime<Utc>,
    pub location_category: crate::models::LocationCategory,
    pub congestion_level: String,
    pub average_speed_kmh: f64,
}

/// A news article whose sentiment may move market expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticleRecord {
    pub article_id: String,
    pub published_at: DateTime<Utc>,
    pub sentiment: String,
    pub relevance_score: f64,
    pub summary: String,
}

/// Ingestion source contract. The host application owns how data
/// actually reaches it (files, message queues, HTTP pulls); the pipeline
/// core only depends on this trait to read typed records at run time.
#[async_trait]
pub trait RawDataSource: Send + Sync {
    async fn historical_rides(&self, since: DateTime<Utc>) -> PipelineResult<Vec<HistoricalRide>>;
    async fn competitor_rides(&self, since: DateTime<Utc>) -> PipelineResult<Vec<CompetitorRide>>;
    async fn events(&self, since: DateTime<Utc>) -> PipelineResult<Vec<EventRecord>>;
    async fn traffic(&self, since: DateTime<Utc>) -> PipelineResult<Vec<TrafficRecord>>;
    async fn news_articles(&self, since: DateTime<Utc>) -> PipelineResult<Vec<NewsArticleRecord>>;
}

/// An in-memory `RawDataSource` for tests and local experimentation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    pub historical: Vec<HistoricalRide>,
    pub competitor: Vec<CompetitorRide>,
    pub events: Vec<EventRecord>,
    pub traffic: Vec<TrafficRecord>,
    pub news: Vec<NewsArticleRecord>,
}

#[async_trait]
impl RawDataSource for InMemoryDataSource {
    async fn historical_rides(&self, since: DateTime<Utc>) -> PipelineResult<Vec<HistoricalRide>> {
        Ok(self.historical.iter().filter(|r| r.order_date >= since).cloned().collect())
    }

    async fn competitor_rides(&self, since: DateTime<Utc>) -> PipelineResult<Vec<CompetitorRide>> {
        Ok(self.competitor.iter().filter(|r| r.order_date >= since).cloned().collect())
    }

    async fn events(&self, since: DateTime<Utc>) -> PipelineResult<Vec<EventRecord>> {
        Ok(self.events.iter().filter(|e| e.starts_at >= since).cloned().collect())
    }

    async fn traffic(&self, since: DateTime<Utc>) -> PipelineResult<Vec<TrafficRecord>> {
        Ok(self.traffic.iter().filter(|t| t.observed_at >= since).cloned().collect())
    }

    async fn news_articles(&self, since: DateTime<Utc>) -> PipelineResult<Vec<NewsArticleRecord>> {
        Ok(self.news.iter().filter(|n| n.published_at >= since).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationCategory, LoyaltyTier, PricingModel, VehicleType};

    #[tokio::test]
    async fn in_memory_source_filters_by_since() {
        let mut source = InMemoryDataSource::default();
        source.historical.push(HistoricalRide {
                order_date: Utc::now(),
                pricing_model: PricingModel::Standard,
                location_category: LocationCategory::Urban,
                loyalty_tier: LoyaltyTier::Gold,
                vehicle_type: VehicleType::Premium,
                num_riders: 2,
                num_drivers: 1,
                ride_duration_minutes: 10.0,
                historical_cost: 20.0,
        });
        let future = Utc::now() + chrono::Duration::days(1);
        let rides = source.historical_rides(future).await.unwrap();
        assert!(rides.is_empty());
    }
}

