// Policy Term Derivation
// Turns loosely-typed extracted facts into the numeric policy profile the engine consumes

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::tables::canonical_disease_name;
use super::RiskParameters;
use crate::models::{FactRecord, PolicyFacts, PolicyProfile};

fn percentage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percentage regex"))
}

// Optional currency marker, the amount, and a trailing percent sign when present.
fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(rs\.?|inr|rupees?|₹)?\s*(\d[\d,]*(?:\.\d+)?)\s*(%)?").expect("amount regex")
    })
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(years?|yrs?|months?|days?)").expect("duration regex")
    })
}

/// First absolute amount in the text; percentages are skipped.
/// With `require_currency` only amounts carrying a currency marker count.
fn parse_amount(text: &str, require_currency: bool) -> Option<f64> {
    let lower = text.to_lowercase();
    amount_re()
        .captures_iter(&lower)
        .filter(|caps| caps.get(3).is_none())
        .filter(|caps| !require_currency || caps.get(1).is_some())
        .find_map(|caps| caps[2].replace(',', "").parse::<f64>().ok())
}

/// Waiting duration in years from text such as "2 years", "24 months" or "90 days"
pub fn parse_duration_years(text: &str) -> Option<f64> {
    let caps = duration_re().captures(text)?;
    let n: f64 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    let years = if unit.starts_with('m') {
        n / 12.0
    } else if unit.starts_with('d') {
        n / 365.0
    } else {
        n
    };
    Some(years)
}

/// Co-payment rate from the first record carrying a percentage
pub fn parse_copay_rate(copayments: &[FactRecord]) -> f64 {
    copayments
        .iter()
        .filter_map(|record| record.text_or_value("percentage"))
        .find_map(|raw| {
            percentage_re()
                .captures(&raw)
                .and_then(|caps| caps[1].parse::<f64>().ok())
        })
        .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

fn limit_text(record: &FactRecord) -> Option<String> {
    record.text_or_value("limit").map(|t| t.to_lowercase())
}

/// Daily room-rent cap from a hidden limit mentioning room rent
pub fn parse_room_rent_cap(hidden_limits: &[FactRecord]) -> Option<f64> {
    hidden_limits
        .iter()
        .filter_map(limit_text)
        .filter(|text| text.contains("room") && text.contains("rent"))
        .find_map(|text| parse_amount(&text, false))
        .filter(|cap| *cap > 0.0)
}

/// Flat deductible from a hidden limit mentioning a deductible or excess
pub fn parse_deductible(hidden_limits: &[FactRecord]) -> f64 {
    hidden_limits
        .iter()
        .filter_map(limit_text)
        .filter(|text| text.contains("deductible") || text.contains("excess"))
        .find_map(|text| parse_amount(&text, false))
        .unwrap_or(0.0)
}

/// Catalog diseases capped by a hidden limit quoting a rupee amount
fn parse_disease_sub_limits(hidden_limits: &[FactRecord], profile: &mut PolicyProfile) {
    for record in hidden_limits {
        let Some(text) = limit_text(record) else {
            continue;
        };
        let Some(disease) = canonical_disease_name(&text) else {
            continue;
        };
        if let Some(amount) = parse_amount(&text, true) {
            profile
                .sub_limits
                .entry(disease.to_string())
                .or_insert(amount);
        }
    }
}

/// Condition named by each waiting-period record mapped to its duration in years.
/// Names that match the disease catalog use the catalog spelling.
fn parse_waiting_periods(waiting: &[FactRecord], params: &RiskParameters, profile: &mut PolicyProfile) {
    for record in waiting {
        let Some(condition) = record.text_or_value("condition") else {
            continue;
        };
        let name = canonical_disease_name(&condition)
            .map(str::to_string)
            .unwrap_or(condition);
        let years = record
            .text("duration")
            .and_then(|d| parse_duration_years(&d))
            .unwrap_or(params.default_waiting_years);

        // Longest stated wait wins when several clauses name the same condition
        let slot = profile.waiting_periods.entry(name).or_insert(years);
        if years > *slot {
            *slot = years;
        }
    }
}

/// Numeric policy profile derived from extracted facts
pub fn derive_policy_profile(facts: &PolicyFacts, params: &RiskParameters) -> PolicyProfile {
    let mut profile = PolicyProfile {
        copay_rate: parse_copay_rate(&facts.co_payment),
        deductible: parse_deductible(&facts.hidden_limits),
        room_rent_daily_cap: parse_room_rent_cap(&facts.hidden_limits),
        ..Default::default()
    };
    parse_waiting_periods(&facts.waiting_periods, params, &mut profile);
    parse_disease_sub_limits(&facts.hidden_limits, &mut profile);

    debug!(
        "[policy_terms] copay={:.2} deductible={} room_cap={:?} waiting={} sub_limits={}",
        profile.copay_rate,
        profile.deductible,
        profile.room_rent_daily_cap,
        profile.waiting_periods.len(),
        profile.sub_limits.len()
    );

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> FactRecord {
        FactRecord::from_value(value)
    }

    #[test]
    fn test_copay_rate() {
        let copay = vec![
            record(json!({"condition": "senior citizens"})),
            record(json!({"percentage": "20%", "condition": "age above 60"})),
        ];
        assert!((parse_copay_rate(&copay) - 0.2).abs() < 1e-12);
        assert!((parse_copay_rate(&[record(json!("10.5 % on all claims"))]) - 0.105).abs() < 1e-12);
        assert_eq!(parse_copay_rate(&[record(json!({"percentage": "nil"}))]), 0.0);
    }

    #[test]
    fn test_room_rent_cap() {
        let limits = vec![
            record(json!({"limit": "Ambulance charges up to Rs. 2,000"})),
            record(json!({"limit": "Room rent limited to Rs. 3,000 per day"})),
        ];
        assert_eq!(parse_room_rent_cap(&limits), Some(3_000.0));

        let pct_only = vec![record(json!({"limit": "Room rent capped at 1% of sum insured"}))];
        assert_eq!(parse_room_rent_cap(&pct_only), None);
        assert_eq!(parse_room_rent_cap(&[]), None);
    }

    #[test]
    fn test_deductible() {
        let limits = vec![record(json!("A deductible of INR 25,000 applies per claim"))];
        assert_eq!(parse_deductible(&limits), 25_000.0);
        assert_eq!(parse_deductible(&[record(json!({"limit": "No deductible"}))]), 0.0);
    }

    #[test]
    fn test_durations() {
        assert_eq!(parse_duration_years("2 years"), Some(2.0));
        assert_eq!(parse_duration_years("24 Months"), Some(2.0));
        assert_eq!(parse_duration_years("first 30 days"), Some(30.0 / 365.0));
        assert_eq!(parse_duration_years("until renewal"), None);
    }

    #[test]
    fn test_derive_profile() {
        let params = RiskParameters::default();
        let facts = PolicyFacts {
            risk_score: 60,
            waiting_periods: vec![
                record(json!({"condition": "diabetes and its complications", "duration": "36 months"})),
                record(json!({"condition": "Hernia", "impact": "claims rejected"})),
                record(json!("Cataract")),
                record(json!({"condition": "Diabetes", "duration": "1 year"})),
            ],
            co_payment: vec![record(json!({"percentage": "15%"}))],
            hidden_limits: vec![
                record(json!({"limit": "Cataract surgery limited to Rs. 40,000 per eye"})),
                record(json!({"limit": "Room rent up to INR 4000/day"})),
            ],
            ..Default::default()
        };

        let profile = derive_policy_profile(&facts, &params);
        assert!((profile.copay_rate - 0.15).abs() < 1e-12);
        assert_eq!(profile.room_rent_daily_cap, Some(4_000.0));
        assert_eq!(profile.deductible, 0.0);
        assert_eq!(profile.waiting_periods["Diabetes"], 3.0);
        assert_eq!(profile.waiting_periods["Hernia"], 2.0);
        assert_eq!(profile.waiting_periods["Cataract"], 2.0);
        assert_eq!(profile.sub_limits["Cataract"], 40_000.0);
        assert_eq!(profile.sub_limits.len(), 1);
    }
}
