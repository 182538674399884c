// Policy Decoder Data Models
// Records exchanged between the relevance filter, the extraction boundary and the risk engine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::services::risk::tables::{canonical_disease_name, MAX_AGE, MIN_AGE, SUM_INSURED_TIERS};

// ============ Relevance Filter ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterStats {
    pub total_paragraphs: usize,
    pub selected_paragraphs: usize,
    pub total_chars: usize,
    pub filtered_chars: usize,
    /// Percentage of characters removed, one decimal place.
    pub reduction_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub text: String,
    pub stats: FilterStats,
    /// True when the low-threshold retry had to widen the selection.
    #[serde(default)]
    pub used_fallback: bool,
}

// ============ Extracted Policy Facts ============

/// One loosely-typed record returned by the extraction oracle.
///
/// Always a mapping: structured objects are kept as-is, anything else is
/// wrapped as `{"value": "<stringified>"}`. Named fields are never guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FactRecord(Map<String, Value>);

impl FactRecord {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::String(s) => Self::scalar(s),
            other => Self::scalar(other.to_string()),
        }
    }

    pub fn scalar(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("value".to_string(), Value::String(text.into()));
        Self(map)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field rendered as text; `None` when absent, null or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        let rendered = match self.0.get(key)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    /// Named field, falling back to the scalar `value` wrapper.
    pub fn text_or_value(&self, key: &str) -> Option<String> {
        self.text(key).or_else(|| self.text("value"))
    }

    pub fn severity(&self) -> Option<AlertSeverity> {
        self.text("severity").and_then(|s| AlertSeverity::from_label(&s))
    }

    /// Identity used for deduplication (canonical serialized form).
    pub fn identity(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
}

impl AlertSeverity {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            _ => None,
        }
    }
}

/// Structured output of the extraction boundary (one or two merged oracle calls).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyFacts {
    #[serde(default)]
    pub risk_score: u8,
    #[serde(default)]
    pub waiting_periods: Vec<FactRecord>,
    #[serde(default)]
    pub exclusions: Vec<FactRecord>,
    #[serde(default)]
    pub co_payment: Vec<FactRecord>,
    #[serde(default)]
    pub hidden_limits: Vec<FactRecord>,
    #[serde(default)]
    pub danger_alerts: Vec<FactRecord>,
}

impl PolicyFacts {
    /// Merge two partial results: highest risk score wins, lists concatenate.
    pub fn merge(mut self, other: PolicyFacts) -> PolicyFacts {
        self.risk_score = self.risk_score.max(other.risk_score);
        self.waiting_periods.extend(other.waiting_periods);
        self.exclusions.extend(other.exclusions);
        self.co_payment.extend(other.co_payment);
        self.hidden_limits.extend(other.hidden_limits);
        self.danger_alerts.extend(other.danger_alerts);
        self
    }

    /// Copy with identical records removed, first occurrence kept.
    pub fn deduplicated(&self) -> PolicyFacts {
        PolicyFacts {
            risk_score: self.risk_score,
            waiting_periods: dedup_records(&self.waiting_periods),
            exclusions: dedup_records(&self.exclusions),
            co_payment: dedup_records(&self.co_payment),
            hidden_limits: dedup_records(&self.hidden_limits),
            danger_alerts: dedup_records(&self.danger_alerts),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waiting_periods.is_empty()
            && self.exclusions.is_empty()
            && self.co_payment.is_empty()
            && self.hidden_limits.is_empty()
            && self.danger_alerts.is_empty()
    }

    pub fn counts(&self) -> FactCounts {
        FactCounts {
            exclusions: self.exclusions.len(),
            waiting_periods: self.waiting_periods.len(),
            hidden_limits: self.hidden_limits.len(),
            copayments: self.co_payment.len(),
        }
    }
}

fn dedup_records(records: &[FactRecord]) -> Vec<FactRecord> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.identity()))
        .cloned()
        .collect()
}

/// Raw fact counts feeding the exclusion density score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FactCounts {
    pub exclusions: usize,
    pub waiting_periods: usize,
    pub hidden_limits: usize,
    pub copayments: usize,
}

// ============ Risk Engine Inputs ============

/// Policy terms fed to the risk engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyProfile {
    /// Fraction of the admissible amount borne by the policyholder, 0..=1.
    pub copay_rate: f64,
    pub deductible: f64,
    /// Daily room-rent cap; `None` means uncapped.
    pub room_rent_daily_cap: Option<f64>,
    /// Disease -> waiting period in years.
    #[serde(default)]
    pub waiting_periods: BTreeMap<String, f64>,
    /// Disease -> payout cap. Missing entries are capped at the sum insured.
    #[serde(default)]
    pub sub_limits: BTreeMap<String, f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("age {0} is outside the supported range {MIN_AGE}-{MAX_AGE}")]
    AgeOutOfRange(u32),
    #[error("annual income must be positive, got {0}")]
    NonPositiveIncome(f64),
    #[error("sum insured {0} is not one of the offered cover tiers")]
    UnsupportedSumInsured(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub annual_income: f64,
    pub sum_insured: f64,
    #[serde(default)]
    pub declared_diseases: BTreeSet<String>,
}

impl UserProfile {
    /// Validated constructor. Declared diseases are mapped onto catalog names
    /// when they match case-insensitively; unknown names are kept verbatim.
    pub fn new<I, S>(
        age: u32,
        annual_income: f64,
        sum_insured: f64,
        declared_diseases: I,
    ) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(ProfileError::AgeOutOfRange(age));
        }
        if !(annual_income > 0.0) {
            return Err(ProfileError::NonPositiveIncome(annual_income));
        }
        if !SUM_INSURED_TIERS.iter().any(|t| (*t - sum_insured).abs() < f64::EPSILON) {
            return Err(ProfileError::UnsupportedSumInsured(sum_insured));
        }

        // Unknown names keep their first spelling; later case variants are dropped
        let mut seen = HashSet::new();
        let declared_diseases = declared_diseases
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .map(|d| match canonical_disease_name(&d) {
                Some(name) if name.eq_ignore_ascii_case(&d) => name.to_string(),
                _ => d,
            })
            .filter(|d| seen.insert(d.to_lowercase()))
            .collect();

        Ok(Self {
            age,
            annual_income,
            sum_insured,
            declared_diseases,
        })
    }
}

// ============ Risk Report ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Low-Moderate")]
    LowModerate,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High")]
    High,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::LowModerate => "Low–Moderate Risk",
            RiskTier::Moderate => "Moderate Risk",
            RiskTier::High => "High Risk",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            RiskTier::High => {
                "This policy poses serious financial risk. Claim rejection likelihood is high and out-of-pocket costs could be catastrophic."
            }
            RiskTier::Moderate => {
                "Significant exclusions or waiting periods exist. You may face sizeable out-of-pocket expenses."
            }
            RiskTier::LowModerate => {
                "Policy has some limitations but is generally manageable. Review waiting periods before filing claims."
            }
            RiskTier::Low => "Policy appears transparent and claimant-friendly.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseBreakdown {
    pub annual_probability: f64,
    pub treatment_cost: f64,
    pub expected_oop_5yr: f64,
    pub in_waiting_period: bool,
    pub sub_limit_shortfall: f64,
    pub copay_exposure: f64,
    #[serde(default)]
    pub pre_existing: bool,
}

/// The four weighted inputs of the composite score, kept for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub financial_exposure: f64,
    pub rejection_risk: f64,
    pub exclusion_density: f64,
    pub oracle_signal: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub final_score: u8,
    pub risk_tier: RiskTier,
    pub risk_tier_label: String,
    pub risk_tier_detail: String,
    pub expected_oop_5yr: f64,
    pub rejection_probability_pct: f64,
    pub financial_exposure_ratio_pct: f64,
    pub exclusion_density_score: f64,
    pub catastrophic_expenditure_warning: bool,
    pub disease_breakdown: BTreeMap<String, DiseaseBreakdown>,
    pub score_components: ScoreComponents,
}

// ============ Full Analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAnalysis {
    pub analysis_id: Uuid,
    pub filter: FilterStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<PolicyFacts>,
    pub policy: PolicyProfile,
    pub report: RiskReport,
}
