// Extraction Result Parser
// Recovers a JSON object from free-form model output and coerces it into PolicyFacts

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::warn;

use crate::models::{FactRecord, PolicyFacts};

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?").expect("code fence regex"))
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate).ok()
}

/// First well-formed JSON object in model output.
///
/// Markdown fences are stripped, then the span from the first `{` to the last
/// `}` is tried. Failing that, every `{` is paired with every later `}`,
/// longest span first, and the first span that parses wins.
pub fn extract_json(raw: &str) -> Option<Value> {
    let clean = code_fence_re().replace_all(raw, "");
    let clean = clean.trim();

    let start = clean.find('{')?;
    if let Some(end) = clean.rfind('}') {
        if end > start {
            if let Some(value) = parse_object(&clean[start..=end]) {
                return Some(value);
            }
        }
    }

    let closers: Vec<usize> = clean.match_indices('}').map(|(i, _)| i).collect();
    for (open, _) in clean.match_indices('{') {
        for close in closers.iter().rev().filter(|c| **c > open) {
            if let Some(value) = parse_object(&clean[open..=*close]) {
                return Some(value);
            }
        }
    }

    None
}

// Integer score from a number or numeric string, clamped to 0..=100.
fn coerce_score(value: Option<&Value>) -> u8 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => Some(0.0),
        Some(_) => None,
    };
    match score {
        Some(s) if s.is_finite() => s.trunc().clamp(0.0, 100.0) as u8,
        _ => {
            warn!("[extraction] Unusable risk_score {:?}; defaulting to 0", value);
            0
        }
    }
}

// List field as records. A lone object or scalar becomes a single record.
fn coerce_records(map: &Map<String, Value>, key: &str) -> Vec<FactRecord> {
    match map.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .cloned()
            .map(FactRecord::from_value)
            .collect(),
        Some(other) => vec![FactRecord::from_value(other.clone())],
    }
}

/// Parse one oracle response. `None` when no JSON object can be recovered.
pub fn parse_extraction(raw: &str) -> Option<PolicyFacts> {
    let value = extract_json(raw)?;
    let Value::Object(map) = value else {
        warn!("[extraction] Oracle returned JSON that is not an object");
        return None;
    };

    Some(PolicyFacts {
        risk_score: coerce_score(map.get("risk_score")),
        waiting_periods: coerce_records(&map, "waiting_periods"),
        exclusions: coerce_records(&map, "exclusions"),
        co_payment: coerce_records(&map, "co_payment"),
        hidden_limits: coerce_records(&map, "hidden_limits"),
        danger_alerts: coerce_records(&map, "danger_alerts"),
    })
}

/// Merge the per-call results that survived. `None` when none did.
pub fn merge_results<I>(results: I) -> Option<PolicyFacts>
where
    I: IntoIterator<Item = Option<PolicyFacts>>,
{
    results
        .into_iter()
        .flatten()
        .reduce(|merged, next| merged.merge(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"risk_score\": 42, \"exclusions\": []}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["risk_score"], 42);
    }

    #[test]
    fn test_extracts_object_after_trailing_brace_noise() {
        let raw = r#"{"risk_score": 10} and a stray } brace"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"risk_score": 10}));
    }

    #[test]
    fn test_no_json_yields_none() {
        assert!(extract_json("I could not find any clauses.").is_none());
        assert!(extract_json("{ not json at all").is_none());
        assert!(parse_extraction("").is_none());
    }

    #[test]
    fn test_missing_keys_default() {
        let facts = parse_extraction(r#"{"exclusions": [{"item": "Cosmetic surgery"}]}"#).unwrap();
        assert_eq!(facts.risk_score, 0);
        assert_eq!(facts.exclusions.len(), 1);
        assert!(facts.waiting_periods.is_empty());
        assert!(facts.danger_alerts.is_empty());
    }

    #[test]
    fn test_score_is_clamped_and_coerced() {
        assert_eq!(parse_extraction(r#"{"risk_score": 250}"#).unwrap().risk_score, 100);
        assert_eq!(parse_extraction(r#"{"risk_score": -5}"#).unwrap().risk_score, 0);
        assert_eq!(parse_extraction(r#"{"risk_score": "72"}"#).unwrap().risk_score, 72);
        assert_eq!(parse_extraction(r#"{"risk_score": 64.9}"#).unwrap().risk_score, 64);
        assert_eq!(parse_extraction(r#"{"risk_score": "high"}"#).unwrap().risk_score, 0);
    }

    #[test]
    fn test_scalar_items_are_wrapped() {
        let facts = parse_extraction(
            r#"{"exclusions": ["Dental treatment", {"item": "Obesity"}], "co_payment": "20% for seniors"}"#,
        )
        .unwrap();
        assert_eq!(facts.exclusions[0].text("value").as_deref(), Some("Dental treatment"));
        assert_eq!(facts.exclusions[1].text("item").as_deref(), Some("Obesity"));
        assert_eq!(facts.co_payment.len(), 1);
        assert_eq!(facts.co_payment[0].text("value").as_deref(), Some("20% for seniors"));
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        assert!(parse_extraction(r#"prefix {"a": 1} [1, 2]"#).is_some());
        assert!(parse_extraction("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_merge_results() {
        let a = parse_extraction(r#"{"risk_score": 30, "exclusions": ["x"]}"#);
        let b = parse_extraction(r#"{"risk_score": 70, "exclusions": ["x", "y"]}"#);
        let merged = merge_results([a.clone(), b]).unwrap();
        assert_eq!(merged.risk_score, 70);
        assert_eq!(merged.exclusions.len(), 3);

        assert_eq!(merge_results([None, a.clone()]), a);
        assert_eq!(merge_results([None, None]), None);
    }
}
