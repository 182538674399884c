// Actuarial Risk Engine
// Expected out-of-pocket spend, claim-rejection probability and composite risk score

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::tables::{disease_probability, lookup_disease, treatment_cost, DISEASE_CATALOG};
use super::{round_to, RiskParameters};
use crate::models::{
    DiseaseBreakdown, FactCounts, PolicyProfile, RiskReport, RiskTier, ScoreComponents, UserProfile,
};

/// Policyholder share of a single treatment event, by source
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventExposure {
    pub room_rent_penalty: f64,
    pub sub_limit_shortfall: f64,
    pub deductible_exposure: f64,
    pub copay_exposure: f64,
    pub sum_insured_shortfall: f64,
}

impl EventExposure {
    /// Gross out-of-pocket amount for one event
    pub fn gross(&self) -> f64 {
        self.sub_limit_shortfall
            + self.deductible_exposure
            + self.copay_exposure
            + self.sum_insured_shortfall
            + self.room_rent_penalty
    }
}

/// Aggregate of the per-disease projection
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfPocketSummary {
    /// Five-year expected out-of-pocket total, whole rupees
    pub total_oop_5yr: f64,
    /// Probability of at least one rejected claim, four decimals
    pub rejection_probability: f64,
    pub breakdown: BTreeMap<String, DiseaseBreakdown>,
}

/// Exposure for one treatment event of cost `cost` under a payout cap `sub_limit`.
///
/// Room-rent penalty and sub-limit shortfall are both charged against the
/// same bill.
pub fn disease_exposure(
    cost: f64,
    sub_limit: f64,
    policy: &PolicyProfile,
    sum_insured: f64,
    params: &RiskParameters,
) -> EventExposure {
    let room_rent_penalty = match policy.room_rent_daily_cap {
        Some(cap) if cap < params.standard_room_rent && params.standard_room_rent > 0.0 => {
            let proportion = cap.max(0.0) / params.standard_room_rent;
            cost * (1.0 - proportion) * params.room_rent_bill_share
        }
        _ => 0.0,
    };

    let deductible = policy.deductible.max(0.0);
    let admissible = (cost.min(sub_limit) - deductible).max(0.0);

    EventExposure {
        room_rent_penalty,
        sub_limit_shortfall: (cost - sub_limit).max(0.0),
        deductible_exposure: deductible.min(cost),
        copay_exposure: admissible * policy.copay_rate,
        sum_insured_shortfall: (cost - sum_insured).max(0.0),
    }
}

// Case-insensitive lookup in a disease-keyed policy map.
fn policy_value(map: &BTreeMap<String, f64>, disease: &str) -> Option<f64> {
    map.get(disease).copied().or_else(|| {
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(disease))
            .map(|(_, v)| *v)
    })
}

// Catalog diseases plus every declared one. The flag marks pre-existing conditions.
fn diseases_in_scope(user: &UserProfile) -> BTreeMap<String, bool> {
    let mut diseases: BTreeMap<String, bool> = DISEASE_CATALOG
        .iter()
        .map(|entry| (entry.name.to_string(), false))
        .collect();

    for declared in &user.declared_diseases {
        let name = match lookup_disease(declared) {
            Some(entry) => entry.name.to_string(),
            None => {
                warn!(
                    "[risk_engine] Declared disease '{}' not in catalog; using default cost and prevalence",
                    declared
                );
                declared.clone()
            }
        };
        diseases.insert(name, true);
    }

    diseases
}

/// Project out-of-pocket spend and rejection probability across every disease in scope
pub fn expected_out_of_pocket(
    policy: &PolicyProfile,
    user: &UserProfile,
    params: &RiskParameters,
) -> OutOfPocketSummary {
    let mut total_oop = 0.0;
    let mut no_rejection = 1.0;
    let mut breakdown = BTreeMap::new();

    for (disease, pre_existing) in diseases_in_scope(user) {
        let p = if pre_existing {
            1.0
        } else {
            disease_probability(user.age, &disease)
        };
        let cost = treatment_cost(&disease, params.default_treatment_cost);
        let sub_limit = policy_value(&policy.sub_limits, &disease).unwrap_or(user.sum_insured);
        let exposure = disease_exposure(cost, sub_limit, policy, user.sum_insured, params);

        let in_waiting = policy_value(&policy.waiting_periods, &disease).is_some_and(|years| years > 0.0);

        let oop_5yr = if in_waiting {
            no_rejection *= 1.0 - p;
            cost
        } else {
            let five_year_p = 1.0 - (1.0 - p.min(params.probability_cap)).powi(params.projection_years as i32);
            five_year_p * exposure.gross()
        };

        total_oop += oop_5yr;

        debug!(
            "[risk_engine] {}: p={:.3}, cost={}, gross={:.0}, waiting={}, oop_5yr={:.0}",
            disease,
            p,
            cost,
            exposure.gross(),
            in_waiting,
            oop_5yr
        );

        breakdown.insert(
            disease,
            DiseaseBreakdown {
                annual_probability: round_to(p, 3),
                treatment_cost: cost,
                expected_oop_5yr: oop_5yr.round(),
                in_waiting_period: in_waiting,
                sub_limit_shortfall: exposure.sub_limit_shortfall.round(),
                copay_exposure: exposure.copay_exposure.round(),
                pre_existing,
            },
        );
    }

    OutOfPocketSummary {
        total_oop_5yr: total_oop.round(),
        rejection_probability: round_to(1.0 - no_rejection, 4),
        breakdown,
    }
}

/// Share of disposable income over the projection horizon consumed by
/// out-of-pocket spend, capped at 1.0. Non-positive income is maximal exposure.
pub fn financial_exposure_ratio(expected_oop: f64, annual_income: f64, params: &RiskParameters) -> f64 {
    if annual_income <= 0.0 {
        return 1.0;
    }
    let disposable = annual_income * params.projection_years as f64 * params.disposable_income_share;
    if disposable <= 0.0 {
        return 1.0;
    }
    (expected_oop / disposable).clamp(0.0, 1.0)
}

/// Sigmoid of the weighted fact count, in (0, 1)
pub fn exclusion_density_score(counts: &FactCounts, params: &RiskParameters) -> f64 {
    let w = &params.density_weights;
    let raw = counts.exclusions as f64 * w.exclusions
        + counts.waiting_periods as f64 * w.waiting_periods
        + counts.hidden_limits as f64 * w.hidden_limits
        + counts.copayments as f64 * w.copayments;
    1.0 / (1.0 + (-params.density_steepness * (raw - params.density_midpoint)).exp())
}

pub fn risk_tier(final_score: u8, params: &RiskParameters) -> RiskTier {
    if final_score >= params.high_risk_cutoff {
        RiskTier::High
    } else if final_score >= params.moderate_risk_cutoff {
        RiskTier::Moderate
    } else if final_score >= params.low_moderate_risk_cutoff {
        RiskTier::LowModerate
    } else {
        RiskTier::Low
    }
}

/// Full risk assessment of a policy for one policyholder. Pure and deterministic.
pub fn calculate_risk_score(
    policy: &PolicyProfile,
    user: &UserProfile,
    counts: &FactCounts,
    oracle_score: u8,
    params: &RiskParameters,
) -> RiskReport {
    let summary = expected_out_of_pocket(policy, user, params);

    let fer = financial_exposure_ratio(summary.total_oop_5yr, user.annual_income, params);
    let fer_score = fer * 100.0;
    let rejection_score = summary.rejection_probability * 100.0;
    let density_score = exclusion_density_score(counts, params) * 100.0;
    let oracle_score = oracle_score.min(100);

    let w = &params.composite_weights;
    let composite = w.financial_exposure * fer_score
        + w.rejection_risk * rejection_score
        + w.exclusion_density * density_score
        + w.oracle_signal * oracle_score as f64;
    // Truncation, not rounding
    let final_score = composite.clamp(0.0, 100.0) as u8;

    let tier = risk_tier(final_score, params);
    let catastrophic = fer >= params.catastrophic_threshold;

    info!(
        "[risk_engine] score={} tier={:?} oop_5yr={} rejection={:.4} fer={:.3} density={:.1}",
        final_score, tier, summary.total_oop_5yr, summary.rejection_probability, fer, density_score
    );
    if catastrophic {
        warn!("[risk_engine] Catastrophic expenditure threshold reached (fer={:.3})", fer);
    }

    RiskReport {
        final_score,
        risk_tier: tier,
        risk_tier_label: tier.label().to_string(),
        risk_tier_detail: tier.detail().to_string(),
        expected_oop_5yr: summary.total_oop_5yr,
        rejection_probability_pct: round_to(rejection_score, 1),
        financial_exposure_ratio_pct: round_to(fer_score, 1),
        exclusion_density_score: round_to(density_score, 1),
        catastrophic_expenditure_warning: catastrophic,
        disease_breakdown: summary.breakdown,
        score_components: ScoreComponents {
            financial_exposure: round_to(fer_score, 1),
            rejection_risk: round_to(rejection_score, 1),
            exclusion_density: round_to(density_score, 1),
            oracle_signal: oracle_score,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(diseases: &[&str]) -> UserProfile {
        UserProfile::new(35, 800_000.0, 500_000.0, diseases.iter().copied()).unwrap()
    }

    fn no_facts() -> FactCounts {
        FactCounts::default()
    }

    #[test]
    fn test_exposure_ratio_edges() {
        let params = RiskParameters::default();
        assert_eq!(financial_exposure_ratio(0.0, 800_000.0, &params), 0.0);
        assert_eq!(financial_exposure_ratio(50_000.0, 0.0, &params), 1.0);
        assert_eq!(financial_exposure_ratio(50_000.0, -10.0, &params), 1.0);
        assert_eq!(financial_exposure_ratio(10_000_000.0, 100_000.0, &params), 1.0);
        let ratio = financial_exposure_ratio(280_000.0, 800_000.0, &params);
        assert!((ratio - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_density_midpoint() {
        let params = RiskParameters::default();
        let counts = FactCounts {
            exclusions: 5,
            ..Default::default()
        };
        let density = exclusion_density_score(&counts, &params) * 100.0;
        assert!((density - 50.0).abs() <= 0.5);
        assert!(exclusion_density_score(&no_facts(), &params) < 0.5);
    }

    #[test]
    fn test_declared_disease_without_waiting_has_no_oop() {
        let params = RiskParameters::default();
        let report = calculate_risk_score(&PolicyProfile::default(), &user(&["Diabetes"]), &no_facts(), 0, &params);

        let diabetes = &report.disease_breakdown["Diabetes"];
        assert_eq!(diabetes.annual_probability, 1.0);
        assert_eq!(diabetes.treatment_cost, 85_000.0);
        assert_eq!(diabetes.expected_oop_5yr, 0.0);
        assert!(!diabetes.in_waiting_period);
        assert!(diabetes.pre_existing);
    }

    #[test]
    fn test_waiting_period_bears_full_cost() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile::default();
        policy.waiting_periods.insert("Diabetes".to_string(), 2.0);

        let report = calculate_risk_score(&policy, &user(&["Diabetes"]), &no_facts(), 0, &params);
        let diabetes = &report.disease_breakdown["Diabetes"];
        assert!(diabetes.in_waiting_period);
        assert_eq!(diabetes.expected_oop_5yr, 85_000.0);
        assert_eq!(report.rejection_probability_pct, 100.0);
    }

    #[test]
    fn test_waiting_dominates_other_terms() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile {
            copay_rate: 0.2,
            deductible: 10_000.0,
            room_rent_daily_cap: Some(2_000.0),
            ..Default::default()
        };
        policy.waiting_periods.insert("diabetes".to_string(), 3.0);
        policy.sub_limits.insert("Diabetes".to_string(), 20_000.0);

        let report = calculate_risk_score(&policy, &user(&["Diabetes"]), &no_facts(), 0, &params);
        assert_eq!(report.disease_breakdown["Diabetes"].expected_oop_5yr, 85_000.0);
    }

    #[test]
    fn test_undeclared_waiting_disease_feeds_rejection() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile::default();
        policy.waiting_periods.insert("Cataract".to_string(), 2.0);

        let report = calculate_risk_score(&policy, &user(&[]), &no_facts(), 0, &params);
        assert_eq!(report.disease_breakdown["Cataract"].expected_oop_5yr, 55_000.0);
        assert_eq!(report.rejection_probability_pct, 1.0);
    }

    #[test]
    fn test_baseline_policy_score() {
        // Only cancer exceeds the 5 L cover: 1 L over the sub-limit plus 1 L over the sum insured
        let params = RiskParameters::default();
        let report = calculate_risk_score(&PolicyProfile::default(), &user(&[]), &no_facts(), 50, &params);

        assert_eq!(report.disease_breakdown["Cancer"].sub_limit_shortfall, 100_000.0);
        assert_eq!(report.disease_breakdown["Cancer"].expected_oop_5yr, 19_216.0);
        assert_eq!(report.expected_oop_5yr, 19_216.0);
        assert_eq!(report.rejection_probability_pct, 0.0);
        assert_eq!(report.exclusion_density_score, 18.2);
        assert_eq!(report.final_score, 8);
        assert_eq!(report.risk_tier, RiskTier::Low);
        assert!(!report.catastrophic_expenditure_warning);
    }

    #[test]
    fn test_exposure_components() {
        let params = RiskParameters::default();
        let policy = PolicyProfile {
            copay_rate: 0.1,
            deductible: 10_000.0,
            ..Default::default()
        };
        let exposure = disease_exposure(85_000.0, 50_000.0, &policy, 500_000.0, &params);
        assert_eq!(exposure.sub_limit_shortfall, 35_000.0);
        assert_eq!(exposure.deductible_exposure, 10_000.0);
        assert!((exposure.copay_exposure - 4_000.0).abs() < 1e-9);
        assert_eq!(exposure.sum_insured_shortfall, 0.0);
        assert!((exposure.gross() - 49_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_room_rent_penalty() {
        let params = RiskParameters::default();
        let capped = PolicyProfile {
            room_rent_daily_cap: Some(2_500.0),
            ..Default::default()
        };
        let exposure = disease_exposure(100_000.0, 500_000.0, &capped, 500_000.0, &params);
        assert!((exposure.room_rent_penalty - 20_000.0).abs() < 1e-9);

        let generous = PolicyProfile {
            room_rent_daily_cap: Some(6_000.0),
            ..Default::default()
        };
        let exposure = disease_exposure(100_000.0, 500_000.0, &generous, 500_000.0, &params);
        assert_eq!(exposure.room_rent_penalty, 0.0);
    }

    #[test]
    fn test_tiers() {
        let params = RiskParameters::default();
        assert_eq!(risk_tier(100, &params), RiskTier::High);
        assert_eq!(risk_tier(75, &params), RiskTier::High);
        assert_eq!(risk_tier(74, &params), RiskTier::Moderate);
        assert_eq!(risk_tier(50, &params), RiskTier::Moderate);
        assert_eq!(risk_tier(49, &params), RiskTier::LowModerate);
        assert_eq!(risk_tier(25, &params), RiskTier::LowModerate);
        assert_eq!(risk_tier(24, &params), RiskTier::Low);
        assert_eq!(risk_tier(0, &params), RiskTier::Low);
    }

    #[test]
    fn test_score_bounds_and_catastrophic_flag() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile {
            copay_rate: 1.0,
            deductible: 1_000_000.0,
            room_rent_daily_cap: Some(0.0),
            ..Default::default()
        };
        for entry in DISEASE_CATALOG.iter() {
            policy.waiting_periods.insert(entry.name.to_string(), 4.0);
        }
        let poor = UserProfile::new(
            70,
            10_000.0,
            200_000.0,
            DISEASE_CATALOG.iter().map(|e| e.name),
        )
        .unwrap();
        let counts = FactCounts {
            exclusions: 40,
            waiting_periods: 20,
            hidden_limits: 20,
            copayments: 10,
        };

        let report = calculate_risk_score(&policy, &poor, &counts, 255, &params);
        // The density sigmoid never reaches 1.0, so truncation may land on 99
        assert!(report.final_score >= 99 && report.final_score <= 100);
        assert_eq!(report.risk_tier, RiskTier::High);
        assert_eq!(report.score_components.oracle_signal, 100);
        assert!(report.catastrophic_expenditure_warning);
        assert_eq!(report.financial_exposure_ratio_pct, 100.0);

        let low = calculate_risk_score(&PolicyProfile::default(), &user(&[]), &no_facts(), 0, &params);
        assert!(low.final_score <= 100);
        assert_eq!(
            low.catastrophic_expenditure_warning,
            low.financial_exposure_ratio_pct / 100.0 >= params.catastrophic_threshold
        );
    }

    #[test]
    fn test_catastrophic_flag_at_exact_threshold() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile::default();
        policy.waiting_periods.insert("Heart Disease".to_string(), 2.0);

        // 350,000 over 250,000 x 5 x 0.7 disposable is exactly 0.40
        let at = UserProfile::new(35, 250_000.0, 1_000_000.0, ["Heart Disease"]).unwrap();
        let report = calculate_risk_score(&policy, &at, &no_facts(), 50, &params);
        assert_eq!(report.expected_oop_5yr, 350_000.0);
        assert_eq!(report.financial_exposure_ratio_pct, 40.0);
        assert!(report.catastrophic_expenditure_warning);

        let below = UserProfile::new(35, 250_001.0, 1_000_000.0, ["Heart Disease"]).unwrap();
        let report = calculate_risk_score(&policy, &below, &no_facts(), 50, &params);
        assert_eq!(report.expected_oop_5yr, 350_000.0);
        assert!(!report.catastrophic_expenditure_warning);
    }

    #[test]
    fn test_unknown_declared_disease_uses_defaults() {
        let params = RiskParameters::default();
        let report = calculate_risk_score(
            &PolicyProfile::default(),
            &user(&["Rare Syndrome"]),
            &no_facts(),
            0,
            &params,
        );
        let entry = &report.disease_breakdown["Rare Syndrome"];
        assert_eq!(entry.treatment_cost, 100_000.0);
        assert_eq!(entry.annual_probability, 1.0);
        assert_eq!(report.disease_breakdown.len(), DISEASE_CATALOG.len() + 1);
    }

    #[test]
    fn test_deterministic_and_serializable() {
        let params = RiskParameters::default();
        let mut policy = PolicyProfile {
            copay_rate: 0.2,
            ..Default::default()
        };
        policy.waiting_periods.insert("Hypertension".to_string(), 2.0);
        let counts = FactCounts {
            exclusions: 3,
            waiting_periods: 2,
            hidden_limits: 1,
            copayments: 1,
        };

        let a = calculate_risk_score(&policy, &user(&["Hypertension"]), &counts, 60, &params);
        let b = calculate_risk_score(&policy, &user(&["Hypertension"]), &counts, 60, &params);
        assert_eq!(a, b);

        let value = serde_json::to_value(&a).unwrap();
        assert!(value["disease_breakdown"]["Hypertension"]["in_waiting_period"]
            .as_bool()
            .unwrap());
        assert!(value["final_score"].is_u64());
        let back: RiskReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, a);
    }
}
