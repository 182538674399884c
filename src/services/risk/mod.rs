// Actuarial Risk Module
// Personal financial-risk assessment of a health insurance policy:
// - tables: disease catalog, age bands and cover tiers
// - policy_terms: policy profile derived from extracted facts
// - engine: expected out-of-pocket, rejection probability and composite score

pub mod tables;
pub mod policy_terms;
pub mod engine;

use serde::{Deserialize, Serialize};

pub use engine::{
    calculate_risk_score,
    disease_exposure,
    exclusion_density_score,
    expected_out_of_pocket,
    financial_exposure_ratio,
    risk_tier,
    EventExposure,
    OutOfPocketSummary,
};
pub use policy_terms::derive_policy_profile;

/// Weights of the four composite-score components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub financial_exposure: f64,
    pub rejection_risk: f64,
    pub exclusion_density: f64,
    pub oracle_signal: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            financial_exposure: 0.38,
            rejection_risk: 0.32,
            exclusion_density: 0.22,
            oracle_signal: 0.08,
        }
    }
}

/// Per-fact weights of the raw exclusion density count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityWeights {
    pub exclusions: f64,
    pub waiting_periods: f64,
    pub hidden_limits: f64,
    pub copayments: f64,
}

impl Default for DensityWeights {
    fn default() -> Self {
        Self {
            exclusions: 3.0,
            waiting_periods: 2.5,
            hidden_limits: 2.0,
            copayments: 1.5,
        }
    }
}

/// Tunable actuarial constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Assumed standard room rent per day
    pub standard_room_rent: f64,
    /// Share of a hospital bill tied to the room category
    pub room_rent_bill_share: f64,
    pub projection_years: u32,
    /// Upper clamp on annual probability before compounding
    pub probability_cap: f64,
    pub disposable_income_share: f64,
    /// Exposure ratio at or above which spending is catastrophic
    pub catastrophic_threshold: f64,
    pub default_treatment_cost: f64,
    pub density_weights: DensityWeights,
    pub density_steepness: f64,
    pub density_midpoint: f64,
    pub composite_weights: CompositeWeights,
    pub high_risk_cutoff: u8,
    pub moderate_risk_cutoff: u8,
    pub low_moderate_risk_cutoff: u8,
    /// Waiting period assumed when a clause names none
    pub default_waiting_years: f64,
    /// Oracle signal used when extraction produced nothing
    pub neutral_oracle_score: u8,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            standard_room_rent: 5_000.0,
            room_rent_bill_share: 0.4,
            projection_years: 5,
            probability_cap: 0.99,
            disposable_income_share: 0.7,
            catastrophic_threshold: 0.40,
            default_treatment_cost: 100_000.0,
            density_weights: DensityWeights::default(),
            density_steepness: 0.1,
            density_midpoint: 15.0,
            composite_weights: CompositeWeights::default(),
            high_risk_cutoff: 75,
            moderate_risk_cutoff: 50,
            low_moderate_risk_cutoff: 25,
            default_waiting_years: 2.0,
            neutral_oracle_score: 50,
        }
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Compact rupee amount: `Rs. 3.0 Cr`, `Rs. 1.2 L`, `Rs. 45.0 K`, `Rs. 950`
pub fn format_inr(amount: f64) -> String {
    let abs = amount.abs();
    if abs >= 10_000_000.0 {
        format!("Rs. {:.1} Cr", amount / 10_000_000.0)
    } else if abs >= 100_000.0 {
        format!("Rs. {:.1} L", amount / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("Rs. {:.1} K", amount / 1_000.0)
    } else {
        format!("Rs. {:.0}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(66.66, 1), 66.7);
        assert_eq!(round_to(1234.5, 0), 1235.0);
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(30_000_000.0), "Rs. 3.0 Cr");
        assert_eq!(format_inr(120_000.0), "Rs. 1.2 L");
        assert_eq!(format_inr(45_000.0), "Rs. 45.0 K");
        assert_eq!(format_inr(950.0), "Rs. 950");
    }

    #[test]
    fn test_partial_parameters_fill_defaults() {
        let params: RiskParameters =
            serde_json::from_str(r#"{"standard_room_rent": 4000, "composite_weights": {"oracle_signal": 0.1}}"#)
                .unwrap();
        assert_eq!(params.standard_room_rent, 4000.0);
        assert_eq!(params.composite_weights.oracle_signal, 0.1);
        assert_eq!(params.composite_weights.financial_exposure, 0.38);
        assert_eq!(params.density_midpoint, 15.0);
    }
}
