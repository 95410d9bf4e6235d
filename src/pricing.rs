//! The pricing kernel: combining applicable rules into a
//! single multiplier, clamping it, and projecting baseline metrics
//! through it with segment-specific elasticity.

use crate::models::{DemandProfile, LoyaltyTier, PricingRule, Segment, SegmentMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds applied to the combined multiplier before it is used for
/// projection. Prevents a chain of compounding rules from
/// producing an absurd price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiplierBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for MultiplierBounds {
    fn default() -> Self {
        Self { min: 0.5, max: 3.0 }
    }
}

impl MultiplierBounds {
    pub fn clamp(&self, multiplier: f64) -> f64 {
        multiplier.clamp(self.min, self.max)
    }
}

/// Lower and upper bounds every resolved elasticity is clamped to,
/// regardless of loyalty tier or demand-profile override.
const ELASTICITY_MIN: f64 = 0.3;
const ELASTICITY_MAX: f64 = 2.0;

/// Per-(loyalty_tier, demand_profile) price elasticity of demand used to
/// translate a price change into a ride-volume change, expressed as a
/// positive magnitude (the volume response is negated against the price
/// change in `project`/`demand_pct_change`). Resolved from a base
/// elasticity per loyalty tier with a demand-profile override, then
/// clamped; entries in `overrides` take precedence over that formula for
/// callers that need a specific pair tuned by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticityTable {
    overrides: HashMap<(LoyaltyTier, DemandProfile), f64>,
}

impl Default for ElasticityTable {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }
}

impl ElasticityTable {
    /// Gold riders are least price-sensitive, Regular riders the most.
    fn base_elasticity(loyalty_tier: LoyaltyTier) -> f64 {
        match loyalty_tier {
            LoyaltyTier::Gold => 0.6,
            LoyaltyTier::Silver => 1.0,
            LoyaltyTier::Regular => 1.4,
        }
    }

    /// High demand makes riders less price-sensitive (less elastic); low
    /// demand makes them more price-sensitive (more elastic).
    fn demand_adjustment(demand_profile: DemandProfile) -> f64 {
        match demand_profile {
            DemandProfile::High => -0.2,
            DemandProfile::Medium => 0.0,
            DemandProfile::Low => 0.3,
        }
    }

    pub fn elasticity_for(&self, loyalty_tier: LoyaltyTier, demand_profile: DemandProfile) -> f64 {
        if let Some(value) = self.overrides.get(&(loyalty_tier, demand_profile)) {
            return *value;
        }
        let elasticity =
            Self::base_elasticity(loyalty_tier) + Self::demand_adjustment(demand_profile);
        elasticity.clamp(ELASTICITY_MIN, ELASTICITY_MAX)
    }

    pub fn set(&mut self, loyalty_tier: LoyaltyTier, demand_profile: DemandProfile, value: f64) {
        self.overrides.insert((loyalty_tier, demand_profile), value);
    }
}

/// Combines rules and projects baseline metrics through them.
#[derive(Debug, Clone)]
pub struct PricingKernel {
    pub bounds: MultiplierBounds,
    pub elasticity: ElasticityTable,
}

impl Default for PricingKernel {
    fn default() -> Self {
        Self {
            bounds: MultiplierBounds::default(),
            elasticity: ElasticityTable::default(),
        }
    }
}

impl PricingKernel {
    pub fn new(bounds: MultiplierBounds, elasticity: ElasticityTable) -> Self {
        Self { bounds, elasticity }
    }

    /// The rules among `rules` whose condition matches `segment`.
    pub fn applicable_rules<'a>(
        &self,
        rules: &'a [PricingRule],
        segment: &Segment,
    ) -> Vec<&'a PricingRule> {
        rules.iter().filter(|r| r.condition.matches(segment)).collect()
    }

    /// Multiplicatively combine applicable rule multipliers, then clamp.
    /// An empty rule set combines to exactly 1.0 (no-op).
    pub fn combined_multiplier(&self, rules: &[&PricingRule]) -> f64 {
        let raw = rules.iter().fold(1.0_f64, |acc, r| acc * r.multiplier);
        self.bounds.clamp(raw)
    }

    /// Project `baseline` metrics through `multiplier` for `segment`,
    /// using price elasticity of demand to derive the ride-volume
    /// response. Revenue is always recomputed from the projected
    /// rides/duration/price rather than scaled directly, to preserve the
    /// revenue identity invariant.
    pub fn project(
        &self,
        segment: &Segment,
        baseline: SegmentMetrics,
        multiplier: f64,
    ) -> SegmentMetrics {
        let new_unit_price = baseline.unit_price * multiplier;
        let price_pct_change = if multiplier.is_finite() { multiplier - 1.0 } else { 0.0 };
        let elasticity = self
            .elasticity
            .elasticity_for(segment.loyalty_tier, segment.demand_profile);
        let demand_pct_change = -elasticity * price_pct_change;
        let new_rides = (baseline.rides * (1.0 + demand_pct_change)).max(0.0);
        let revenue = new_rides * baseline.duration_minutes * new_unit_price;
        SegmentMetrics {
            rides: new_rides,
            unit_price: new_unit_price,
            duration_minutes: baseline.duration_minutes,
            revenue,
        }
    }

    /// Percent change in rides implied by a multiplier for `segment`,
    /// without running a full projection. Used by the recommendation
    /// engine's scoring pass.
    pub fn demand_pct_change(&self, segment: &Segment, multiplier: f64) -> f64 {
        let price_pct_change = multiplier - 1.0;
        -self
            .elasticity
            .elasticity_for(segment.loyalty_tier, segment.demand_profile)
        * price_pct_change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationCategory, PricingModel, RuleCategory, RuleCondition, RuleSource, VehicleType};

    fn segment() -> Segment {
        Segment {
            location_category: LocationCategory::Urban,
            loyalty_tier: LoyaltyTier::Gold,
            vehicle_type: VehicleType::Premium,
            pricing_model: PricingModel::Standard,
            demand_profile: DemandProfile::High,
        }
    }

    fn rule(multiplier: f64) -> PricingRule {
        PricingRule {
            id: uuid::Uuid::new_v4(),
            rule_id: "R1".into(),
            category: RuleCategory::DemandBased,
            name: "test".into(),
            multiplier,
            condition: RuleCondition::default(),
            affects_objectives: vec![],
            estimated_impact_pct: 0.0,
            source: RuleSource::Generated,
        }
    }

    #[test]
    fn empty_rules_combine_to_identity() {
        let kernel = PricingKernel::default();
        assert_eq!(kernel.combined_multiplier(&[]), 1.0);
    }

    #[test]
    fn multiplier_is_clamped() {
        let kernel = PricingKernel::default();
        let r1 = rule(3.0);
        let r2 = rule(3.0);
        let combined = kernel.combined_multiplier(&[&r1, &r2]);
        assert_eq!(combined, kernel.bounds.max);
    }

    #[test]
    fn default_elasticity_matches_loyalty_base_and_demand_override() {
        let table = ElasticityTable::default();
        assert_eq!(table.elasticity_for(LoyaltyTier::Gold, DemandProfile::Medium), 0.6);
        assert_eq!(table.elasticity_for(LoyaltyTier::Silver, DemandProfile::Medium), 1.0);
        assert_eq!(table.elasticity_for(LoyaltyTier::Regular, DemandProfile::Medium), 1.4);
        assert_eq!(table.elasticity_for(LoyaltyTier::Gold, DemandProfile::High), 0.4);
        assert_eq!(table.elasticity_for(LoyaltyTier::Regular, DemandProfile::Low), 1.7);
    }

    #[test]
    fn set_overrides_the_formula_for_a_single_pair() {
        let mut table = ElasticityTable::default();
        table.set(LoyaltyTier::Gold, DemandProfile::Low, 5.0);
        assert_eq!(table.elasticity_for(LoyaltyTier::Gold, DemandProfile::Low), 5.0);
        // Unrelated pairs still fall through to the formula.
        assert_eq!(table.elasticity_for(LoyaltyTier::Gold, DemandProfile::High), 0.4);
    }

    #[test]
    fn projection_preserves_revenue_identity() {
        let kernel = PricingKernel::default();
        let seg = segment();
        let baseline = SegmentMetrics {
            rides: 100.0,
            unit_price: 2.0,
            duration_minutes: 15.0,
            revenue: 3000.0,
        };
        let projected = kernel.project(&seg, baseline, 1.1);
        let expected = projected.rides * projected.duration_minutes * projected.unit_price;
        assert!((expected - projected.revenue).abs() < 1e-6);
    }
}

