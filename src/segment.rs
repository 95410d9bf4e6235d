//! The 162-cell segment lattice: enumeration in a
//! deterministic order, and the rider/driver-ratio classification rule
//! that assigns a `DemandProfile` to a base combination.

use crate::models::{
    BaseCombination, DemandProfile, LocationCategory, LoyaltyTier, PricingModel, Segment,
    VehicleType,
};

/// Demand classification cutoffs on the driver/rider ratio
/// rho = (num_drivers / num_riders) * 100. Configurable so that
/// deployments can tune sensitivity without a code change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandThresholds {
    /// rho < high_cutoff => High
    pub high_cutoff: f64,
    /// high_cutoff <= rho < low_cutoff => Medium; rho >= low_cutoff => Low
    pub low_cutoff: f64,
}

impl Default for DemandThresholds {
    fn default() -> Self {
        Self {
            high_cutoff: 34.0,
            low_cutoff: 67.0,
        }
    }
}

impl DemandThresholds {
    /// Classify a segment's demand profile from its driver/rider ratio.
    /// A rider count of zero is degenerate (no ratio to compute) and
    /// is treated as Medium rather than producing a division error.
    pub fn classify(&self, num_riders: u32, num_drivers: u32) -> DemandProfile {
        if num_riders == 0 {
            return DemandProfile::Medium;
        }
        let rho = num_drivers as f64 / num_riders as f64 * 100.0;
        if rho < self.high_cutoff {
            DemandProfile::High
        } else if rho < self.low_cutoff {
            DemandProfile::Medium
        } else {
            DemandProfile::Low
        }
    }
}

/// Enumerates and classifies the full segment lattice.
#[derive(Debug, Clone, Default)]
pub struct SegmentLattice {
    thresholds: DemandThresholds,
}

impl SegmentLattice {
    pub fn new(thresholds: DemandThresholds) -> Self {
        Self { thresholds }
    }

    /// All 54 base combinations (location x loyalty x vehicle x pricing
    /// model), in the fixed dimension order used for `segment_key`
    /// construction everywhere else in the pipeline.
    pub fn base_combinations() -> Vec<BaseCombination> {
        let mut combos = Vec::with_capacity(54);
        for location_category in LocationCategory::ALL {
            for loyalty_tier in LoyaltyTier::ALL {
                for vehicle_type in VehicleType::ALL {
                    for pricing_model in PricingModel::ALL {
                        combos.push(BaseCombination {
                            location_category,
                            loyalty_tier,
                            vehicle_type,
                            pricing_model,
                        });
                    }
                }
            }
        }
        combos
    }

    /// All 162 segments (54 base combinations x 3 demand profiles), in
    /// deterministic order.
    pub fn enumerate() -> Vec<Segment> {
        let mut segments = Vec::with_capacity(162);
        for base in Self::base_combinations() {
            for demand_profile in DemandProfile::ALL {
                segments.push(Segment::new(base, demand_profile));
            }
        }
        segments
    }

    /// Assign a segment's `demand_profile` from an observed rider/driver
    /// ratio.
    pub fn classify(&self, num_riders: u32, num_drivers: u32) -> DemandProfile {
        self.thresholds.classify(num_riders, num_drivers)
    }

    pub fn segment_for(
        &self,
        base: BaseCombination,
        num_riders: u32,
        num_drivers: u32,
    ) -> Segment {
        Segment::new(base, self.classify(num_riders, num_drivers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enumerates_exactly_162_distinct_segments() {
        let segments = SegmentLattice::enumerate();
        assert_eq!(segments.len(), 162);
        let keys: HashSet<String> = segments.iter().map(|s| s.key()).collect();
        assert_eq!(keys.len(), 162);
    }

    #[test]
    fn base_combinations_are_54_and_distinct() {
        let combos = SegmentLattice::base_combinations();
        assert_eq!(combos.len(), 54);
        let keys: HashSet<(String, String, String, String)> = combos
            .iter()
            .map(|c| {
                (
                    c.location_category.as_str().to_string(),
                    c.loyalty_tier.as_str().to_string(),
                    c.vehicle_type.as_str().to_string(),
                    c.pricing_model.as_str().to_string(),
                )
            })
            .collect();
        assert_eq!(keys.len(), 54);
    }

    #[test]
    fn zero_drivers_classifies_as_high_demand() {
        let lattice = SegmentLattice::default();
        assert_eq!(lattice.classify(5, 0), DemandProfile::High);
    }

    #[test]
    fn zero_riders_is_the_degenerate_medium_case() {
        let lattice = SegmentLattice::default();
        assert_eq!(lattice.classify(0, 0), DemandProfile::Medium);
        assert_eq!(lattice.classify(0, 7), DemandProfile::Medium);
    }

    #[test]
    fn classification_thresholds() {
        let lattice = SegmentLattice::default();
        // rho = (10/9) * 100 ~= 111.1 => Low
        assert_eq!(lattice.classify(9, 10), DemandProfile::Low);
        // rho = (10/20) * 100 = 50 => Medium
        assert_eq!(lattice.classify(20, 10), DemandProfile::Medium);
        // rho = (10/100) * 100 = 10 => High
        assert_eq!(lattice.classify(100, 10), DemandProfile::High);
    }
}

