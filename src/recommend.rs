//! Combinatorial rule-combination search and per-segment impact
//! projection. Searches subsets of the top-ranked candidate rules
//! for the combinations that best satisfy the four fixed business
//! objectives, then scores and ranks them.

use crate::errors::{PipelineError, PipelineResult};
use crate::models::{
    AppliedRule, BusinessObjective, PercentChanges, PerSegmentImpact, PricingRule, Recommendation,
    Segment, SegmentBaseline, SegmentMetrics,
};
use crate::pricing::PricingKernel;
use crate::segment::SegmentLattice;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How many of the highest-impact candidate rules are considered for
/// combination search. Bounds the combinatorial search space:
/// with `top_n = 12` and cardinality up to 5 there are at most
/// sum_{k=1}^{5} C(12, k) = 1486 combinations to score.
const TOP_N_RULES: usize = 12;

/// Maximum number of rules combined into a single recommendation.
const MAX_CARDINALITY: usize = 5;

/// Number of distinct, non-subset recommendations returned.
const RECOMMENDATIONS_RETURNED: usize = 3;

/// Produces ranked strategic recommendations from candidate rules.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    pub kernel: PricingKernel,
    /// When true (the default), prefer combinations of multiple rules
    /// over a single rule when both achieve the same objective count;
    /// reflects the open design decision to value breadth of coverage.
    pub prefer_multi_rule: bool,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            kernel: PricingKernel::default(),
            prefer_multi_rule: true,
        }
    }
}

struct ScoredCombination<'a> {
    rules: Vec<&'a PricingRule>,
    objectives_met: Vec<BusinessObjective>,
    combined_revenue_pct: f64,
    score: f64,
}

impl RecommendationEngine {
    pub fn new(kernel: PricingKernel, prefer_multi_rule: bool) -> Self {
        Self {
            kernel,
            prefer_multi_rule,
        }
    }

    /// Generate the top `RECOMMENDATIONS_RETURNED` recommendations from
    /// `rules` and `baselines`. When `rules` is empty, synthesizes
    /// a single no-op recommendation so the pipeline always has
    /// something to report rather than failing the run.
    pub fn recommend(
        &self,
        rules: &[PricingRule],
        baselines: &[SegmentBaseline],
    ) -> PipelineResult<Vec<Recommendation>> {
        if baselines.len() != 162 {
            return Err(PipelineError::component(
                    "RecommendationEngine",
                    format!("expected 162 segment baselines, got {}", baselines.len()),
            ));
        }

        if rules.is_empty() {
            return Ok(vec![self.no_op_recommendation(baselines)]);
        }

        let top_rules: Vec<&PricingRule> = rules.iter().take(TOP_N_RULES).collect();
        let combinations = Self::subsets_up_to(&top_rules, MAX_CARDINALITY);

        let mut scored: Vec<ScoredCombination> = combinations
            .into_iter()
            .map(|combo| self.score_combination(combo, baselines))
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let selected = self.select_distinct(scored);

        Ok(selected
            .into_iter()
            .enumerate()
            .map(|(i, combo)| {
                    let per_segment_impacts = self.per_segment_impacts(&combo.rules, baselines);
                    Recommendation {
                        recommendation_id: (i + 1) as u8,
                        rules: combo.rules.iter().map(|r| r.rule_id.clone()).collect(),
                        objectives_met: combo.objectives_met,
                        expected_revenue_impact_pct: combo.combined_revenue_pct,
                        per_segment_impacts,
                    }
            })
                .collect())
    }

    /// All non-empty subsets of `rules` with size from 1 up to `max_k`.
    fn subsets_up_to<'a>(
        rules: &[&'a PricingRule],
        max_k: usize,
    ) -> Vec<Vec<&'a PricingRule>> {
        let mut combos = Vec::new();
        let n = rules.len();
        for k in 1..=max_k.min(n) {
            let mut indices: Vec<usize> = (0..k).collect();
            loop {
                combos.push(indices.iter().map(|&i| rules[i]).collect());
                if !Self::next_combination(&mut indices, n) {
                    break;
                }
            }
        }
        combos
    }

    fn next_combination(indices: &mut [usize], n: usize) -> bool {
        let k = indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                return false;
            }
            i -= 1;
            if indices[i] != i + n - k {
                indices[i] += 1;
                for j in i + 1..k {
                    indices[j] = indices[j - 1] + 1;
                }
                return true;
            }
        }
    }

    fn score_combination<'a>(
        &self,
        rules: Vec<&'a PricingRule>,
        baselines: &[SegmentBaseline],
    ) -> ScoredCombination<'a> {
        let mut objectives_met: Vec<BusinessObjective> = Vec::new();
        for rule in &rules {
            for objective in rule.inferred_objectives() {
                if !objectives_met.contains(&objective) {
                    objectives_met.push(objective);
                }
            }
        }

        let combined_revenue_pct = self.combined_revenue_pct(&rules, baselines);

        let multi_bonus = if self.prefer_multi_rule {
            rules.len() as f64 * 200.0
        } else {
            0.0
        };

        let score = objectives_met.len() as f64 * 1000.0 + multi_bonus + combined_revenue_pct;

        ScoredCombination {
            rules,
            objectives_met,
            combined_revenue_pct,
            score,
        }
    }

    /// Percent change in total revenue across all 162 segments if
    /// `rules` were applied, relative to the sum of baseline revenues.
    fn combined_revenue_pct(&self, rules: &[&PricingRule], baselines: &[SegmentBaseline]) -> f64 {
        let mut baseline_total = 0.0;
        let mut projected_total = 0.0;
        for baseline in baselines {
            let segment = baseline.segment;
            let metrics = Self::baseline_metrics(baseline);
            baseline_total += metrics.revenue;

            let applicable = self.kernel.applicable_rules(rules, &segment);
            let multiplier = self.kernel.combined_multiplier(&applicable);
            let projected = self.kernel.project(&segment, metrics, multiplier);
            projected_total += projected.revenue;
        }
        if baseline_total.abs() < f64::EPSILON {
            0.0
        } else {
            (projected_total - baseline_total) / baseline_total * 100.0
        }
    }

    fn baseline_metrics(baseline: &SegmentBaseline) -> SegmentMetrics {
        SegmentMetrics {
            rides: baseline.avg_riders_per_order,
            unit_price: baseline.avg_fcs_unit_price,
            duration_minutes: baseline.avg_fcs_ride_duration,
            revenue: baseline.avg_riders_per_order
            * baseline.avg_fcs_ride_duration
            * baseline.avg_fcs_unit_price,
        }
    }

    /// Select the top `RECOMMENDATIONS_RETURNED` combinations that are
    /// not rule-subsets of an already-selected, higher-scored
    /// combination.
    fn select_distinct<'a>(&self, scored: Vec<ScoredCombination<'a>>) -> Vec<ScoredCombination<'a>> {
        let mut selected: Vec<ScoredCombination> = Vec::new();
        for candidate in scored {
            let candidate_ids: std::collections::HashSet<&str> =
            candidate.rules.iter().map(|r| r.rule_id.as_str()).collect();
            let is_subset_of_selected = selected.iter().any(|s| {
                    let selected_ids: std::collections::HashSet<&str> =
                    s.rules.iter().map(|r| r.rule_id.as_str()).collect();
                    candidate_ids.is_subset(&selected_ids)
            });
            if !is_subset_of_selected {
                selected.push(candidate);
            }
            if selected.len() >= RECOMMENDATIONS_RETURNED {
                break;
            }
        }
        selected
    }

    /// Project `rules` onto every segment for reporting. Runs
    /// across segments in parallel when the `parallel` feature is
    /// enabled.
    fn per_segment_impacts(
        &self,
        rules: &[&PricingRule],
        baselines: &[SegmentBaseline],
    ) -> Vec<PerSegmentImpact> {
        #[cfg(feature = "parallel")]
        {
            baselines
                .par_iter()
                .map(|baseline| self.impact_for_segment(rules, baseline))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            baselines
                .iter()
                .map(|baseline| self.impact_for_segment(rules, baseline))
                .collect()
        }
    }

    fn impact_for_segment(
        &self,
        rules: &[&PricingRule],
        baseline: &SegmentBaseline,
    ) -> PerSegmentImpact {
        let segment: Segment = baseline.segment;
        let baseline_metrics = Self::baseline_metrics(baseline);
        let applicable = self.kernel.applicable_rules(rules, &segment);
        let multiplier = self.kernel.combined_multiplier(&applicable);
        let projected = self.kernel.project(&segment, baseline_metrics, multiplier);

        let price_pct = if baseline_metrics.unit_price.abs() > f64::EPSILON {
            (projected.unit_price - baseline_metrics.unit_price) / baseline_metrics.unit_price * 100.0
        } else {
            0.0
        };
        let demand_pct = if baseline_metrics.rides.abs() > f64::EPSILON {
            (projected.rides - baseline_metrics.rides) / baseline_metrics.rides * 100.0
        } else {
            0.0
        };
        let revenue_pct = if baseline_metrics.revenue.abs() > f64::EPSILON {
            (projected.revenue - baseline_metrics.revenue) / baseline_metrics.revenue * 100.0
        } else {
            0.0
        };

        let applied_rules: Vec<AppliedRule> = applicable
            .iter()
            .map(|r| AppliedRule {
                rule_id: r.rule_id.clone(),
                rule_name: r.name.clone(),
                multiplier: r.multiplier,
        })
            .collect();

        let explanation = if applied_rules.is_empty() {
            "no applicable rules; baseline pricing retained".to_string()
        } else {
            format!(
                "{} rule(s) applied, combined multiplier {:.3}",
                applied_rules.len(),
                multiplier
            )
        };

        PerSegmentImpact {
            segment_key: baseline.segment_key.clone(),
            segment,
            baseline: baseline_metrics,
            with_recommendation: projected,
            percent_changes: PercentChanges {
                price_pct,
                demand_pct,
                revenue_pct,
            },
            applied_rules,
            explanation,
        }
    }

    fn no_op_recommendation(&self, baselines: &[SegmentBaseline]) -> Recommendation {
        let per_segment_impacts = self.per_segment_impacts(&[], baselines);
        Recommendation {
            recommendation_id: 1,
            rules: vec![],
            objectives_met: vec![],
            expected_revenue_impact_pct: 0.0,
            per_segment_impacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastEngine;
    use crate::rules::RuleGenerator;
    use crate::segment::SegmentLattice;

    #[test]
    fn empty_rules_produce_a_single_no_op_recommendation() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let baselines = engine.compute_baselines(&[], &[]);
        let recs = RecommendationEngine::default().recommend(&[], &baselines).unwrap();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].rules.is_empty());
        assert_eq!(recs[0].per_segment_impacts.len(), 162);
    }

    #[test]
    fn returns_up_to_three_distinct_recommendations() {
        let engine = ForecastEngine::without_model(SegmentLattice::default());
        let baselines = engine.compute_baselines(&[], &[]);
        let rules = RuleGenerator::new().generate(&baselines).unwrap();
        let recs = RecommendationEngine::default().recommend(&rules, &baselines).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.len() <= RECOMMENDATIONS_RETURNED);
        for rec in &recs {
            assert_eq!(rec.per_segment_impacts.len(), 162);
        }
    }
}

