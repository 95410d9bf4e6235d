//! Domain entities for the pricing-intelligence core: the segment lattice's
//! dimension enums, raw ride records, and the computed artifacts
//! (baselines, forecasts, rules, impacts, recommendations) that flow
//! between components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the three location categories in the segment lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationCategory {
    Urban,
    Suburban,
    Rural,
}

/// One of the three loyalty tiers in the segment lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Gold,
    Silver,
    Regular,
}

/// One of the two vehicle types in the segment lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Premium,
    Economy,
}

/// One of the three pricing models in the segment lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingModel {
    Standard,
    Contracted,
    Custom,
}

/// Dynamic demand classification. Never persisted as a source of
/// truth; always recomputed from a rider/driver ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemandProfile {
    High,
    Medium,
    Low,
}

impl LocationCategory {
    pub const ALL: [LocationCategory; 3] = [Self::Urban, Self::Suburban, Self::Rural];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Suburban => "Suburban",
            Self::Rural => "Rural",
        }
    }
}

impl LoyaltyTier {
    pub const ALL: [LoyaltyTier; 3] = [Self::Gold, Self::Silver, Self::Regular];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Regular => "Regular",
        }
    }
}

impl VehicleType {
    pub const ALL: [VehicleType; 2] = [Self::Premium, Self::Economy];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "Premium",
            Self::Economy => "Economy",
        }
    }
}

impl PricingModel {
    pub const ALL: [PricingModel; 3] = [Self::Standard, Self::Contracted, Self::Custom];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Contracted => "CONTRACTED",
            Self::Custom => "CUSTOM",
        }
    }
}

impl DemandProfile {
    pub const ALL: [DemandProfile; 3] = [Self::High, Self::Medium, Self::Low];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// The quadruple identifying a base combination, i.e. a segment
/// without its demand_profile dimension. 54 distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseCombination {
    pub location_category: LocationCategory,
    pub loyalty_tier: LoyaltyTier,
    pub vehicle_type: VehicleType,
    pub pricing_model: PricingModel,
}

/// A single cell of the 162-cell segment lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub location_category: LocationCategory,
    pub loyalty_tier: LoyaltyTier,
    pub vehicle_type: VehicleType,
    pub pricing_model: PricingModel,
    pub demand_profile: DemandProfile,
}

impl Segment {
    pub fn new(base: BaseCombination, demand_profile: DemandProfile) -> Self {
        Self {
            location_category: base.location_category,
            loyalty_tier: base.loyalty_tier,
            vehicle_type: base.vehicle_type,
            pricing_model: base.pricing_model,
            demand_profile,
        }
    }

    pub fn base_combination(&self) -> BaseCombination {
        BaseCombination {
            location_category: self.location_category,
            loyalty_tier: self.loyalty_tier,
            vehicle_type: self.vehicle_type,
            pricing_model: self.pricing_model,
        }
    }

    /// The canonical segment_key: the five values joined by `_` in
    /// dimension order.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.location_category.as_str(),
            self.loyalty_tier.as_str(),
            self.vehicle_type.as_str(),
            self.pricing_model.as_str(),
            self.demand_profile.as_str()
        )
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A historical ride record, read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRide {
    pub order_date: DateTime<Utc>,
    pub pricing_model: PricingModel,
    pub location_category: LocationCategory,
    pub loyalty_tier: LoyaltyTier,
    pub vehicle_type: VehicleType,
    pub num_riders: u32,
    pub num_drivers: u32,
    pub ride_duration_minutes: f64,
    pub historical_cost: f64,
}

impl HistoricalRide {
    /// `unit_price = historical_cost / ride_duration_minutes`; undefined
    /// (returns `None`) when duration is non-positive — such rides are
    /// dropped by every consumer.
    pub fn unit_price(&self) -> Option<f64> {
        if self.ride_duration_minutes > 0.0 {
            Some(self.historical_cost / self.ride_duration_minutes)
        } else {
            None
        }
    }

    pub fn base_combination(&self) -> BaseCombination {
        BaseCombination {
            location_category: self.location_category,
            loyalty_tier: self.loyalty_tier,
            vehicle_type: self.vehicle_type,
            pricing_model: self.pricing_model,
        }
    }

    /// Whether this ride is usable at all: positive duration and riders.
    pub fn is_usable(&self) -> bool {
        self.ride_duration_minutes > 0.0 && self.num_riders > 0
    }
}

/// Competing company observed in `CompetitorRide` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Company {
    Hwco,
    Competitor,
}

/// A competitor ride record — same shape as `HistoricalRide` plus
/// `company`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRide {
    pub order_date: DateTime<Utc>,
    pub pricing_model: PricingModel,
    pub location_category: LocationCategory,
    pub loyalty_tier: LoyaltyTier,
    pub vehicle_type: VehicleType,
    pub num_riders: u32,
    pub num_drivers: u32,
    pub ride_duration_minutes: f64,
    pub historical_cost: f64,
    pub company: Company,
}

impl CompetitorRide {
    pub fn unit_price(&self) -> Option<f64> {
        if self.ride_duration_minutes > 0.0 {
            Some(self.historical_cost / self.ride_duration_minutes)
        } else {
            None
        }
    }
}

/// Confidence level attached to a baseline or forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    VeryLow,
}

/// Provenance of a computed `SegmentBaseline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    Measured,
    Aggregated,
    FallbackDefaults,
}

/// One baseline per segment. Always present for all 162 segments
/// after `ForecastEngine` runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentBaseline {
    pub segment_key: String,
    pub segment: Segment,
    pub sample_size: u32,
    pub avg_fcs_unit_price: f64,
    pub avg_fcs_ride_duration: f64,
    pub avg_riders_per_order: f64,
    pub avg_drivers_per_order: f64,
    pub segment_demand_profile: DemandProfile,
    pub confidence: Confidence,
    pub data_quality: DataQuality,
}

/// One forecast per segment per horizon H.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentForecast {
    pub segment_key: String,
    pub horizon_days: u32,
    pub predicted_rides: f64,
    pub predicted_unit_price: f64,
    pub predicted_ride_duration: f64,
    pub predicted_revenue: f64,
    pub confidence: Confidence,
}

impl SegmentForecast {
    /// `predicted_revenue = predicted_rides · predicted_ride_duration ·
    /// predicted_unit_price` within ±1.0 absolute tolerance.
    pub fn satisfies_revenue_identity(&self) -> bool {
        let expected =
        self.predicted_rides * self.predicted_ride_duration * self.predicted_unit_price;
        (expected - self.predicted_revenue).abs() <= 1.0
    }
}

/// One of the nine pricing-rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    LocationBased,
    LoyaltyBased,
    DemandBased,
    VehicleBased,
    PricingBased,
    TimeBased,
    EventBased,
    NewsBased,
    SurgeBased,
    /// Durable business-objective documents (GOAL_*) share the same
    /// collection for retrieval symmetry.
    BusinessObjectives,
}

/// One of the four fixed business objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessObjective {
    MaximizeRevenue,
    MaximizeProfitMargins,
    StayCompetitive,
    CustomerRetention,
}

impl BusinessObjective {
    pub const ALL: [BusinessObjective; 4] = [
        Self::MaximizeRevenue,
        Self::MaximizeProfitMargins,
        Self::StayCompetitive,
        Self::CustomerRetention,
    ];

    pub fn goal_id(&self) -> &'static str {
        match self {
            Self::MaximizeRevenue => "GOAL_MAXIMIZE_REVENUE",
            Self::MaximizeProfitMargins => "GOAL_MAXIMIZE_PROFIT_MARGINS",
            Self::StayCompetitive => "GOAL_STAY_COMPETITIVE",
            Self::CustomerRetention => "GOAL_CUSTOMER_RETENTION",
        }
    }
}

/// Provenance of a generated `PricingRule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSource {
    Generated,
    Fallback,
    External,
}

/// A rule's condition over segment dimensions and/or external-data keys.
/// Typed rather than a `HashMap<String, String>` so each constraint is
/// checked against the right field. Every field is optional; an
/// entirely-`None` condition matches every segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub location_category: Option<LocationCategory>,
    pub loyalty_tier: Option<LoyaltyTier>,
    pub vehicle_type: Option<VehicleType>,
    pub pricing_model: Option<PricingModel>,
    pub demand_profile: Option<DemandProfile>,

    // External-data keys: never constrain the segment match, but
    // are recorded so downstream reporting/chat can explain a rule.
    pub event_type: Option<String>,
    pub traffic_level: Option<String>,
    pub market_trend: Option<String>,
    pub market_factor: Option<String>,
    pub time_of_day: Option<String>,
    pub weather: Option<String>,
    pub min_rides: Option<u32>,
}

impl RuleCondition {
    pub fn is_empty(&self) -> bool {
        self == &RuleCondition::default()
    }

    /// Whether only external-data keys are set (so the segment-constraining
    /// part of the condition is empty, and the rule applies to every
    /// segment).
    pub fn has_segment_constraints(&self) -> bool {
        self.location_category.is_some()
        || self.loyalty_tier.is_some()
        || self.vehicle_type.is_some()
        || self.pricing_model.is_some()
        || self.demand_profile.is_some()
    }

    /// The rule-applicability predicate: every segment-dimension
    /// field set in the condition must exactly match `segment`; external
    /// keys never constrain the match.
    pub fn matches(&self, segment: &Segment) -> bool {
        if let Some(v) = self.location_category {
            if v != segment.location_category {
                return false;
            }
        }
        if let Some(v) = self.loyalty_tier {
            if v != segment.loyalty_tier {
                return false;
            }
        }
        if let Some(v) = self.vehicle_type {
            if v != segment.vehicle_type {
                return false;
            }
        }
        if let Some(v) = self.pricing_model {
            if v != segment.pricing_model {
                return false;
            }
        }
        if let Some(v) = self.demand_profile {
            if v != segment.demand_profile {
                return false;
            }
        }
        true
    }
}

/// A pricing rule: a multiplier plus a (possibly empty) condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    /// Surrogate key required by the generic repository layer; distinct
    /// from `rule_id`, which is the human-readable, stable identity used
    /// for matching and deduplication.
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: uuid::Uuid,
    pub rule_id: String,
    pub category: RuleCategory,
    pub name: String,
    pub multiplier: f64,
    pub condition: RuleCondition,
    pub affects_objectives: Vec<BusinessObjective>,
    pub estimated_impact_pct: f64,
    pub source: RuleSource,
}

impl PricingRule {
    /// Infer `affects_objectives` when a rule was produced without an
    /// explicit assignment.
    pub fn inferred_objectives(&self) -> Vec<BusinessObjective> {
        if !self.affects_objectives.is_empty() {
            return self.affects_objectives.clone();
        }
        let mut objectives = Vec::new();
        let is_gold_retention =
        self.multiplier < 1.0 && self.condition.loyalty_tier == Some(LoyaltyTier::Gold);
        let is_high_demand_surge =
        self.multiplier > 1.0 && self.condition.demand_profile == Some(DemandProfile::High);
        let is_external_surge = self.multiplier > 1.0 && !self.condition.has_segment_constraints();

        if is_gold_retention {
            objectives.push(BusinessObjective::CustomerRetention);
            objectives.push(BusinessObjective::StayCompetitive);
        }
        if is_high_demand_surge {
            objectives.push(BusinessObjective::MaximizeRevenue);
            objectives.push(BusinessObjective::MaximizeProfitMargins);
        }
        if is_external_surge && !objectives.contains(&BusinessObjective::MaximizeRevenue) {
            objectives.push(BusinessObjective::MaximizeRevenue);
        }
        objectives
    }
}

/// A rule applied to a segment, as recorded on a `PerSegmentImpact` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule_id: String,
    pub rule_name: String,
    pub multiplier: f64,
}

/// A segment's metrics at one point (baseline or post-recommendation),
/// used inside `PerSegmentImpact`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub rides: f64,
    pub unit_price: f64,
    pub duration_minutes: f64,
    pub revenue: f64,
}

impl SegmentMetrics {
    pub fn zero(duration_minutes: f64) -> Self {
        Self {
            rides: 0.0,
            unit_price: 0.0,
            duration_minutes,
            revenue: 0.0,
        }
    }
}

/// Percent-change fields recorded alongside `with_recommendation`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentChanges {
    pub price_pct: f64,
    pub demand_pct: f64,
    pub revenue_pct: f64,
}

/// A computed row: one segment, one recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerSegmentImpact {
    pub segment_key: String,
    pub segment: Segment,
    pub baseline: SegmentMetrics,
    pub with_recommendation: SegmentMetrics,
    pub percent_changes: PercentChanges,
    pub applied_rules: Vec<AppliedRule>,
    pub explanation: String,
}

/// A strategic rule-combination recommendation with per-segment impact
/// detail attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: u8,
    pub rules: Vec<String>,
    pub objectives_met: Vec<BusinessObjective>,
    pub expected_revenue_impact_pct: f64,
    pub per_segment_impacts: Vec<PerSegmentImpact>,
}

/// Aggregated info about historical/competitor rides grouped by base
/// combination, used internally by `ForecastEngine` and `RuleGenerator`.
#[derive(Debug, Clone, Default)]
pub struct RideAggregate {
    pub sample_size: u32,
    pub sum_unit_price: f64,
    pub sum_duration: f64,
    pub sum_riders: f64,
    pub sum_drivers: f64,
}

impl RideAggregate {
    pub fn push(&mut self, unit_price: f64, duration: f64, riders: u32, drivers: u32) {
        self.sample_size += 1;
        self.sum_unit_price += unit_price;
        self.sum_duration += duration;
        self.sum_riders += riders as f64;
        self.sum_drivers += drivers as f64;
    }

    pub fn mean_unit_price(&self) -> f64 {
        self.safe_mean(self.sum_unit_price)
    }
    pub fn mean_duration(&self) -> f64 {
        self.safe_mean(self.sum_duration)
    }
    pub fn mean_riders(&self) -> f64 {
        self.safe_mean(self.sum_riders)
    }
    pub fn mean_drivers(&self) -> f64 {
        self.safe_mean(self.sum_drivers)
    }

    fn safe_mean(&self, sum: f64) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            sum / self.sample_size as f64
        }
    }
}

/// Arbitrary string-keyed metadata carried by external-signal inputs
/// (events/news/traffic) that don't otherwise fit a typed field: a
/// side-channel map on top of an otherwise strongly-typed entity.
pub type Metadata = HashMap<String, String>;

