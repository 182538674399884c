// Analysis Pipeline
// Document text -> relevance filter -> extraction oracle -> policy terms -> risk report

use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::config_store::AppConfig;
use super::document::{has_enough_text, load_document_text, DocumentError};
use super::extraction::{ExtractionOracle, PolicyDecoder};
use super::filter::{extract_relevant_text, FilterConfig};
use super::risk::{calculate_risk_score, derive_policy_profile, RiskParameters};
use super::text_processor::char_len;
use crate::models::{
    FilterResult, PolicyAnalysis, PolicyFacts, PolicyProfile, ProfileError, RiskReport, UserProfile,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No readable text found ({chars} chars). This may be a scanned PDF; use a text-based document.")]
    InsufficientText { chars: usize },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Output of the document half of the pipeline
#[derive(Debug, Clone)]
pub struct DecodedPolicy {
    pub filter: FilterResult,
    /// Deduplicated facts; `None` when the oracle produced nothing usable
    pub facts: Option<PolicyFacts>,
}

pub struct PolicyPipeline<O> {
    decoder: PolicyDecoder<O>,
    filter: FilterConfig,
    risk: RiskParameters,
}

impl<O: ExtractionOracle> PolicyPipeline<O> {
    pub fn new(oracle: O, config: &AppConfig) -> Self {
        let decoder = PolicyDecoder::new(oracle).with_limits(
            config.oracle.max_single_chars,
            Duration::from_secs(config.oracle.timeout_secs),
        );
        Self {
            decoder,
            filter: config.filter.clone(),
            risk: config.risk.clone(),
        }
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn risk_parameters(&self) -> &RiskParameters {
        &self.risk
    }

    /// Filter the document and extract structured facts from what remains
    pub async fn decode(&self, text: &str) -> Result<DecodedPolicy, PipelineError> {
        if !has_enough_text(text) {
            return Err(PipelineError::InsufficientText {
                chars: char_len(text.trim()),
            });
        }

        let filter = extract_relevant_text(text, &self.filter);
        info!(
            "[pipeline] Filtered {} -> {} chars ({}% reduction, {}/{} paragraphs)",
            filter.stats.total_chars,
            filter.stats.filtered_chars,
            filter.stats.reduction_pct,
            filter.stats.selected_paragraphs,
            filter.stats.total_paragraphs
        );

        let facts = self
            .decoder
            .decode(&filter.text)
            .await
            .map(|merged| merged.deduplicated());

        Ok(DecodedPolicy { filter, facts })
    }

    /// Score decoded policy terms for one policyholder
    pub fn assess(&self, decoded: &DecodedPolicy, user: &UserProfile) -> (PolicyProfile, RiskReport) {
        let empty = PolicyFacts::default();
        let facts = match &decoded.facts {
            Some(facts) => facts,
            None => {
                warn!(
                    "[pipeline] No extracted facts; using neutral oracle score {}",
                    self.risk.neutral_oracle_score
                );
                &empty
            }
        };
        let oracle_score = decoded
            .facts
            .as_ref()
            .map(|f| f.risk_score)
            .unwrap_or(self.risk.neutral_oracle_score);

        let policy = derive_policy_profile(facts, &self.risk);
        let report = calculate_risk_score(&policy, user, &facts.counts(), oracle_score, &self.risk);
        (policy, report)
    }

    /// Full analysis of document text for one policyholder
    pub async fn analyze(&self, text: &str, user: &UserProfile) -> Result<PolicyAnalysis, PipelineError> {
        let started = Instant::now();
        let decoded = self.decode(text).await?;
        let (policy, report) = self.assess(&decoded, user);

        let analysis = PolicyAnalysis {
            analysis_id: Uuid::new_v4(),
            filter: decoded.filter.stats,
            facts: decoded.facts,
            policy,
            report,
        };
        info!(
            "[pipeline] Analysis {} done: score={} ({}) elapsed_ms={}",
            analysis.analysis_id,
            analysis.report.final_score,
            analysis.report.risk_tier_label,
            started.elapsed().as_millis()
        );
        Ok(analysis)
    }

    pub async fn analyze_file(&self, path: &Path, user: &UserProfile) -> Result<PolicyAnalysis, PipelineError> {
        let text = load_document_text(path)?;
        self.analyze(&text, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskTier;
    use crate::services::extraction::decoder::tests::MockOracle;
    use crate::services::providers::ProviderError;
    use std::sync::atomic::Ordering;

    const POLICY: &str = "Section 4: Exclusions\n\n\
        The company shall not be liable for any expenses on cosmetic surgery or dental treatment.\n\n\
        Pre-existing diabetes is covered only after a waiting period of 2 years from inception.\n\n\
        A co-payment of 20% applies to every admissible claim for insured persons above 60 years.\n\n\
        The network hospital list is available on the website and at all branch offices.";

    const ORACLE_JSON: &str = r#"{
        "risk_score": 62,
        "waiting_periods": [{"condition": "Diabetes", "duration": "2 years"}],
        "exclusions": [{"item": "Cosmetic surgery"}, {"item": "Dental treatment"}, {"item": "Cosmetic surgery"}],
        "co_payment": [{"percentage": "20%", "condition": "above 60"}],
        "hidden_limits": [],
        "danger_alerts": [{"severity": "High", "message": "Diabetes claims rejected for 2 years"}]
    }"#;

    fn user() -> UserProfile {
        UserProfile::new(35, 800_000.0, 500_000.0, ["Diabetes"]).unwrap()
    }

    #[tokio::test]
    async fn test_short_document_is_rejected() {
        let pipeline = PolicyPipeline::new(MockOracle::new(|_: &str| Ok(ORACLE_JSON.to_string())), &AppConfig::default());
        let err = pipeline.analyze("Too short to be a policy.", &user()).await.unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientText { chars: 25 }));
        assert_eq!(pipeline.decoder.oracle().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_analysis() {
        let pipeline = PolicyPipeline::new(MockOracle::new(|_: &str| Ok(ORACLE_JSON.to_string())), &AppConfig::default());
        let analysis = pipeline.analyze(POLICY, &user()).await.unwrap();

        let facts = analysis.facts.as_ref().unwrap();
        assert_eq!(facts.exclusions.len(), 2);
        assert_eq!(facts.risk_score, 62);

        assert!((analysis.policy.copay_rate - 0.2).abs() < 1e-12);
        assert_eq!(analysis.policy.waiting_periods["Diabetes"], 2.0);

        let diabetes = &analysis.report.disease_breakdown["Diabetes"];
        assert!(diabetes.in_waiting_period);
        assert_eq!(diabetes.expected_oop_5yr, 85_000.0);
        assert_eq!(analysis.report.score_components.oracle_signal, 62);
        assert!(analysis.filter.total_paragraphs > 0);
        assert!(!analysis.analysis_id.is_nil());

        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["report"]["final_score"].is_u64());
    }

    #[tokio::test]
    async fn test_failed_extraction_uses_neutral_signal() {
        let pipeline = PolicyPipeline::new(
            MockOracle::new(|_: &str| Err(ProviderError::MissingContent)),
            &AppConfig::default(),
        );
        let analysis = pipeline.analyze(POLICY, &user()).await.unwrap();
        assert!(analysis.facts.is_none());
        assert_eq!(analysis.report.score_components.oracle_signal, 50);
        assert_eq!(analysis.policy, PolicyProfile::default());
        assert_ne!(analysis.report.risk_tier, RiskTier::High);
    }
}
