// Relevance Filter Module
// Reduces a long policy document to the paragraphs likely to carry risk clauses:
// - keywords: weighted keyword groups and section-header patterns
// - scoring: per-paragraph relevance score and header detection
// - content_filter: selection with neighbour/header expansion, safety net and reassembly

pub mod keywords;
pub mod scoring;
pub mod content_filter;

use serde::{Deserialize, Serialize};

pub use content_filter::{
    analyze_paragraphs,
    extract_relevant_text,
    extract_relevant_text_with_threshold,
    select_paragraphs,
    ParagraphSelection,
    BLOCK_SEPARATOR,
};
pub use keywords::{KeywordGroupKind, KEYWORD_GROUPS};
pub use scoring::{is_section_header, score_paragraph, score_paragraphs, ScoredParagraph};

/// Weight added for every keyword of a group found in a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupWeights {
    pub exclusions: f64,
    pub waiting_periods: f64,
    pub copay: f64,
    pub sublimits: f64,
    pub risk_signals: f64,
}

impl Default for GroupWeights {
    fn default() -> Self {
        Self {
            exclusions: 4.0,
            waiting_periods: 3.5,
            copay: 3.0,
            sublimits: 3.0,
            risk_signals: 1.5,
        }
    }
}

impl GroupWeights {
    pub fn weight_for(&self, kind: KeywordGroupKind) -> f64 {
        match kind {
            KeywordGroupKind::Exclusions => self.exclusions,
            KeywordGroupKind::WaitingPeriods => self.waiting_periods,
            KeywordGroupKind::Copay => self.copay,
            KeywordGroupKind::SubLimits => self.sublimits,
            KeywordGroupKind::RiskSignals => self.risk_signals,
        }
    }
}

/// Tunable constants of the relevance filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum score for a paragraph to be selected on its own merit
    pub min_score: f64,
    /// Neighbours force-selected on each side of a direct hit
    pub context_window: usize,
    /// Paragraphs force-selected after a section header
    pub header_followthrough: usize,
    /// Threshold used by the safety-net retry
    pub fallback_min_score: f64,
    pub fallback_min_fraction: f64,
    pub fallback_min_paragraphs: usize,
    pub min_paragraph_chars: usize,
    pub header_max_chars: usize,
    pub caps_header_max_chars: usize,
    /// Extra fraction of the group weight for whole-word matches
    pub phrase_bonus: f64,
    pub weights: GroupWeights,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_score: 2.0,
            context_window: 1,
            header_followthrough: 8,
            fallback_min_score: 0.5,
            fallback_min_fraction: 0.10,
            fallback_min_paragraphs: 3,
            min_paragraph_chars: 30,
            header_max_chars: 300,
            caps_header_max_chars: 100,
            phrase_bonus: 0.3,
            weights: GroupWeights::default(),
        }
    }
}
