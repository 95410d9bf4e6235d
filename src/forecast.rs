//! Baseline computation and demand forecasting.
//!
//! Every one of the 162 segments gets a baseline and a forecast at every
//! configured horizon, even when no ride ever fell into that segment —
//! `industry_default_baseline` supplies the fallback tier.

use crate::errors::{PipelineError, PipelineResult};
use crate::models::{
    BaseCombination, CompetitorRide, Confidence, DataQuality, HistoricalRide, RideAggregate,
    Segment, SegmentBaseline, SegmentForecast,
};
use crate::segment::SegmentLattice;
use async_trait::async_trait;
use std::collections::HashMap;

/// External ML-model collaborator contract. The pipeline core
/// never trains a model; it only calls `predict` against one supplied by
/// the host application. `None` from `predict` means "no model available
/// for this segment", triggering the seasonal-naive fallback.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    async fn predict(
        &self,
        segment: &Segment,
        horizon_days: u32,
        baseline: &SegmentBaseline,
    ) -> PipelineResult<Option<ModelPrediction>>;
}

/// A model's raw prediction for one segment/horizon pair.
#[derive(Debug, Clone, Copy)]
pub struct ModelPrediction {
    pub predicted_rides: f64,
    pub predicted_unit_price: f64,
    pub confidence: Confidence,
}

/// A `ForecastModel` that never has anything to offer; used when the
/// host application has not wired in a trained model. Every segment
/// falls through to the seasonal-naive baseline projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopForecastModel;

#[async_trait]
impl ForecastModel for NoopForecastModel {
    async fn predict(
        &self,
        _segment: &Segment,
        _horizon_days: u32,
        _baseline: &SegmentBaseline,
    ) -> PipelineResult<Option<ModelPrediction>> {
        Ok(None)
    }
}

/// Minimum sample size for a segment's own baseline to be considered
/// "measured" rather than falling back to a coarser tier.
const MIN_MEASURED_SAMPLES: u32 = 3;

/// Sample-size cutoffs for the tiered confidence assigned to a measured
/// baseline.
const HIGH_CONFIDENCE_SAMPLES: u32 = 30;
const MEDIUM_CONFIDENCE_SAMPLES: u32 = 10;

/// The historical/competitor lookback window ingestion queries over.
/// A measured or aggregated baseline's `sample_size` is rated against
/// this many days to produce a per-day ride rate.
const OBSERVATION_WINDOW_DAYS: f64 = 90.0;

/// Conservative per-day ride rate for segments with no measured or
/// aggregated data, derived from the industry-default anchor's
/// riders-per-order figure spread across the observation window.
const FALLBACK_DAILY_RIDE_RATE: f64 = 30.0 / OBSERVATION_WINDOW_DAYS;

/// Confidence tier for a measured baseline, by sample size.
fn measured_confidence(sample_size: u32) -> Confidence {
    if sample_size >= HIGH_CONFIDENCE_SAMPLES {
        Confidence::High
    } else if sample_size >= MEDIUM_CONFIDENCE_SAMPLES {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Industry-default baseline (unit_price, ride_duration, riders_per_order,
/// drivers_per_order) for a segment with neither measured nor aggregatable
/// data. Anchored at Urban/Premium/Standard/Medium demand with
/// multiplicative adjustments layered on for the other dimensions; the
/// anchor is silent on loyalty tier, so loyalty tier does not move the
/// default price.
pub fn industry_default_baseline(segment: Segment) -> (f64, f64, f64, f64) {
    use crate::models::{DemandProfile::*, LocationCategory::*, PricingModel::*, VehicleType::*};

    let mut unit_price = 3.00_f64;
    let mut duration = 25.0_f64;
    let riders = 30.0_f64;
    let drivers = 15.0_f64;

    if segment.location_category == Rural {
        unit_price *= 0.80;
        duration *= 1.1;
    }
    if segment.vehicle_type == Economy {
        unit_price *= 0.75;
    }
    if segment.pricing_model == Custom {
        unit_price *= 1.10;
    }
    match segment.demand_profile {
        High => unit_price *= 1.10,
        Low => unit_price *= 0.90,
        Medium => {}
    }

    (unit_price, duration, riders, drivers)
}

/// Computes baselines and forecasts for the full segment lattice.
pub struct ForecastEngine<M: ForecastModel = NoopForecastModel> {
    lattice: SegmentLattice,
    model: M,
}

impl ForecastEngine<NoopForecastModel> {
    pub fn without_model(lattice: SegmentLattice) -> Self {
        Self {
            lattice,
            model: NoopForecastModel,
        }
    }
}

impl<M: ForecastModel> ForecastEngine<M> {
    pub fn with_model(lattice: SegmentLattice, model: M) -> Self {
        Self { lattice, model }
    }

    /// Classify and aggregate historical and competitor rides, producing
    /// both a per-segment aggregate (the 162-cell measured tier) and a
    /// per-base-combination aggregate pooled across all three demand
    /// buckets of a base group (the 54-cell aggregated tier). Rides with
    /// non-positive duration are dropped per the `unit_price` contract on
    /// `HistoricalRide`/`CompetitorRide`.
    fn aggregate_rides(
        &self,
        historical: &[HistoricalRide],
        competitor: &[CompetitorRide],
    ) -> (
        HashMap<Segment, RideAggregate>,
        HashMap<BaseCombination, RideAggregate>,
    ) {
        let mut per_segment: HashMap<Segment, RideAggregate> = HashMap::new();
        let mut per_base: HashMap<BaseCombination, RideAggregate> = HashMap::new();

        for ride in historical {
            if let Some(unit_price) = ride.unit_price() {
                let base = ride.base_combination();
                let segment = self.lattice.segment_for(base, ride.num_riders, ride.num_drivers);
                per_segment.entry(segment).or_default().push(
                    unit_price,
                    ride.ride_duration_minutes,
                    ride.num_riders,
                    ride.num_drivers,
                );
                per_base.entry(base).or_default().push(
                    unit_price,
                    ride.ride_duration_minutes,
                    ride.num_riders,
                    ride.num_drivers,
                );
            }
        }
        for ride in competitor {
            if let Some(unit_price) = ride.unit_price() {
                let base = BaseCombination {
                    location_category: ride.location_category,
                    loyalty_tier: ride.loyalty_tier,
                    vehicle_type: ride.vehicle_type,
                    pricing_model: ride.pricing_model,
                };
                let segment = self.lattice.segment_for(base, ride.num_riders, ride.num_drivers);
                per_segment.entry(segment).or_default().push(
                    unit_price,
                    ride.ride_duration_minutes,
                    ride.num_riders,
                    ride.num_drivers,
                );
                per_base.entry(base).or_default().push(
                    unit_price,
                    ride.ride_duration_minutes,
                    ride.num_riders,
                    ride.num_drivers,
                );
            }
        }

        (per_segment, per_base)
    }

    /// Three-tier baseline resolution for one segment: use the segment's
    /// own measured aggregate if it has enough samples; otherwise fall
    /// back to its base group's aggregate pooled across all three demand
    /// buckets; otherwise use industry defaults.
    fn baseline_for_segment(
        &self,
        segment: Segment,
        per_segment: &HashMap<Segment, RideAggregate>,
        per_base: &HashMap<BaseCombination, RideAggregate>,
    ) -> SegmentBaseline {
        if let Some(agg) = per_segment.get(&segment) {
            if agg.sample_size >= MIN_MEASURED_SAMPLES {
                return SegmentBaseline {
                    segment_key: segment.key(),
                    segment,
                    sample_size: agg.sample_size,
                    avg_fcs_unit_price: agg.mean_unit_price(),
                    avg_fcs_ride_duration: agg.mean_duration(),
                    avg_riders_per_order: agg.mean_riders(),
                    avg_drivers_per_order: agg.mean_drivers(),
                    segment_demand_profile: segment.demand_profile,
                    confidence: measured_confidence(agg.sample_size),
                    data_quality: DataQuality::Measured,
                };
            }
        }

        if let Some(agg) = per_base.get(&segment.base_combination()) {
            if agg.sample_size > 0 {
                return SegmentBaseline {
                    segment_key: segment.key(),
                    segment,
                    sample_size: agg.sample_size,
                    avg_fcs_unit_price: agg.mean_unit_price(),
                    avg_fcs_ride_duration: agg.mean_duration(),
                    avg_riders_per_order: agg.mean_riders(),
                    avg_drivers_per_order: agg.mean_drivers(),
                    segment_demand_profile: segment.demand_profile,
                    confidence: Confidence::Low,
                    data_quality: DataQuality::Aggregated,
                };
            }
        }

        let (unit_price, duration, riders, drivers) = industry_default_baseline(segment);
        SegmentBaseline {
            segment_key: segment.key(),
            segment,
            sample_size: 0,
            avg_fcs_unit_price: unit_price,
            avg_fcs_ride_duration: duration,
            avg_riders_per_order: riders,
            avg_drivers_per_order: drivers,
            segment_demand_profile: segment.demand_profile,
            confidence: Confidence::VeryLow,
            data_quality: DataQuality::FallbackDefaults,
        }
    }

    /// Produce baselines for all 162 segments.
    pub fn compute_baselines(
        &self,
        historical: &[HistoricalRide],
        competitor: &[CompetitorRide],
    ) -> Vec<SegmentBaseline> {
        let (per_segment, per_base) = self.aggregate_rides(historical, competitor);

        SegmentLattice::enumerate()
            .into_iter()
            .map(|segment| self.baseline_for_segment(segment, &per_segment, &per_base))
            .collect()
    }

    /// Seasonal-naive fallback forecast: a measured or aggregated
    /// baseline's ride rate (`sample_size` over the observation window)
    /// is scaled up to the horizon. `fallback_defaults` baselines have no
    /// samples to rate and use the industry-default anchor's conservative
    /// per-day rate instead.
    fn seasonal_naive_forecast(baseline: &SegmentBaseline, horizon_days: u32) -> ModelPrediction {
        let daily_rate = if baseline.data_quality == DataQuality::FallbackDefaults {
            FALLBACK_DAILY_RIDE_RATE
        } else {
            baseline.sample_size as f64 / OBSERVATION_WINDOW_DAYS
        };
        ModelPrediction {
            predicted_rides: daily_rate * horizon_days as f64,
            predicted_unit_price: baseline.avg_fcs_unit_price,
            confidence: baseline.confidence,
        }
    }

    /// Forecast every segment at `horizon_days`, preferring the model's
    /// prediction and falling back to the seasonal-naive projection when
    /// the model declines to predict or errors.
    pub async fn forecast(
        &self,
        baselines: &[SegmentBaseline],
        horizon_days: u32,
    ) -> PipelineResult<Vec<SegmentForecast>> {
        if baselines.len() != 162 {
            return Err(PipelineError::component(
                    "ForecastEngine",
                    format!(
                        "expected 162 segment baselines, got {}",
                        baselines.len()
                    ),
            ));
        }

        let mut forecasts = Vec::with_capacity(baselines.len());
        for baseline in baselines {
            let prediction = match self.model.predict(&baseline.segment, horizon_days, baseline).await {
                Ok(Some(prediction)) => prediction,
                Ok(None) => Self::seasonal_naive_forecast(baseline, horizon_days),
                Err(err) => {
                    tracing::warn!(segment = %baseline.segment_key, error = %err, "model prediction failed, using seasonal-naive fallback");
                    Self::seasonal_naive_forecast(baseline, horizon_days)
                }
            };

            let predicted_revenue =
            prediction.predicted_rides * baseline.avg_fcs_ride_duration * prediction.predicted_unit_price;

            forecasts.push(SegmentForecast {
                    segment_key: baseline.segment_key.clone(),
                    horizon_days,
                    predicted_rides: prediction.predicted_rides,
                    predicted_unit_price: prediction.predicted_unit_price,
                    predicted_ride_duration: baseline.avg_fcs_ride_duration,
                    predicted_revenue,
                    confidence: prediction.confidence,
            });
        }
        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemandProfile, LocationCategory, LoyaltyTier, PricingModel, VehicleType};
    use chrono::Utc;

    fn ride(unit_price: f64, duration: f64, riders: u32, drivers: u32) -> HistoricalRide {
        HistoricalRide {
            order_date: Utc::now(),
            pricing_model: PricingModel::Standard,
            location_category: LocationCategory::Urban,
            loyalty_tier: LoyaltyTier::Gold,
            vehicle_type: VehicleType::Premium,
            num_riders: riders,
            num_drivers: drivers,
            ride_duration_minutes: duration,
            historical_cost: unit_price * duration,
        }
    }

    #[tokio::test]
    async fn every_segment_gets_a_baseline_and_forecast() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        // rho = (1/2)*100 = 50 => Medium demand.
        let rides: Vec<HistoricalRide> = (0..10).map(|_| ride(2.0, 15.0, 2, 1)).collect();
        let baselines = engine.compute_baselines(&rides, &[]);
        assert_eq!(baselines.len(), 162);
        let forecasts = engine.forecast(&baselines, 30).await.unwrap();
        assert_eq!(forecasts.len(), 162);
        for forecast in &forecasts {
            assert!(forecast.satisfies_revenue_identity());
        }
    }

    #[test]
    fn zero_duration_rides_are_excluded_from_aggregation() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let mut rides = vec![ride(2.0, 15.0, 2, 1)];
        rides.push(HistoricalRide {
            ride_duration_minutes: 0.0,
            ..ride(2.0, 0.0, 2, 1)
        });
        let baselines = engine.compute_baselines(&rides, &[]);
        let urban_gold_premium_standard_medium = baselines
            .iter()
            .find(|b| {
                b.segment.location_category == LocationCategory::Urban
                && b.segment.loyalty_tier == LoyaltyTier::Gold
                && b.segment.vehicle_type == VehicleType::Premium
                && b.segment.pricing_model == PricingModel::Standard
                && b.segment.demand_profile == DemandProfile::Medium
        })
            .unwrap();
        assert_eq!(urban_gold_premium_standard_medium.sample_size, 1);
    }

    #[test]
    fn own_samples_above_threshold_yield_a_measured_baseline_with_tiered_confidence() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let rides: Vec<HistoricalRide> = (0..3).map(|_| ride(2.5, 12.0, 20, 10)).collect();
        let baselines = engine.compute_baselines(&rides, &[]);
        // rho = (10/20)*100 = 50 => Medium demand.
        let measured = baselines
            .iter()
            .find(|b| {
                b.segment.loyalty_tier == LoyaltyTier::Gold
                && b.segment.vehicle_type == VehicleType::Premium
                && b.segment.pricing_model == PricingModel::Standard
                && b.segment.location_category == LocationCategory::Urban
                && b.segment.demand_profile == DemandProfile::Medium
        })
            .unwrap();
        assert_eq!(measured.data_quality, DataQuality::Measured);
        assert_eq!(measured.sample_size, 3);
        assert_eq!(measured.confidence, Confidence::Low);
    }

    #[test]
    fn fewer_than_threshold_falls_back_to_base_group_aggregate() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let rides: Vec<HistoricalRide> = (0..2).map(|_| ride(2.5, 12.0, 20, 10)).collect();
        let baselines = engine.compute_baselines(&rides, &[]);
        let aggregated = baselines
            .iter()
            .find(|b| {
                b.segment.loyalty_tier == LoyaltyTier::Gold
                && b.segment.vehicle_type == VehicleType::Premium
                && b.segment.pricing_model == PricingModel::Standard
                && b.segment.location_category == LocationCategory::Urban
                && b.segment.demand_profile == DemandProfile::Medium
        })
            .unwrap();
        assert_eq!(aggregated.data_quality, DataQuality::Aggregated);
        assert_eq!(aggregated.sample_size, 2);
    }

    #[test]
    fn industry_default_applies_every_multiplicative_adjustment() {
        let segment = Segment {
            location_category: LocationCategory::Rural,
            loyalty_tier: LoyaltyTier::Regular,
            vehicle_type: VehicleType::Economy,
            pricing_model: PricingModel::Custom,
            demand_profile: DemandProfile::High,
        };
        let (unit_price, duration, riders, drivers) = industry_default_baseline(segment);
        let expected_price = 3.00 * 0.80 * 0.75 * 1.10 * 1.10;
        assert!((unit_price - expected_price).abs() < 1e-9);
        assert!((duration - 25.0 * 1.1).abs() < 1e-9);
        assert_eq!(riders, 30.0);
        assert_eq!(drivers, 15.0);
    }
}
