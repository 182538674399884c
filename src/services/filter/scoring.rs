// Relevance Scoring
// Keyword-weighted paragraph scores and section-header detection

use serde::{Deserialize, Serialize};

use super::keywords::{compiled_groups, section_header_re, structural_marker_re};
use super::FilterConfig;
use crate::services::text_processor::char_len;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredParagraph {
    pub text: String,
    pub score: f64,
    pub is_header: bool,
}

/// Relevance score of a paragraph: for each keyword present as a substring
/// add its group weight, plus `phrase_bonus` of that weight when it also
/// matches on word boundaries. Case-insensitive and uncapped.
pub fn score_paragraph(para: &str, config: &FilterConfig) -> f64 {
    let lower = para.to_lowercase();
    let mut score = 0.0;

    for group in compiled_groups() {
        let weight = config.weights.weight_for(group.kind);
        for kw in &group.keywords {
            if lower.contains(kw.phrase) {
                score += weight;
                if kw.whole_word.is_match(&lower) {
                    score += weight * config.phrase_bonus;
                }
            }
        }
    }

    score
}

/// Whether a paragraph looks like a title introducing a section of interest
pub fn is_section_header(para: &str, config: &FilterConfig) -> bool {
    let len = char_len(para);
    if len > config.header_max_chars {
        return false;
    }

    let lower = para.trim().to_lowercase();
    if section_header_re().is_match(&lower) {
        return true;
    }

    if is_all_caps(para) && len < config.caps_header_max_chars {
        return true;
    }

    structural_marker_re().is_match(&lower)
}

// At least one cased character and no lowercase ones.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase()) && !s.chars().any(|c| c.is_lowercase())
}

pub fn score_paragraphs(paragraphs: Vec<String>, config: &FilterConfig) -> Vec<ScoredParagraph> {
    paragraphs
        .into_iter()
        .map(|text| ScoredParagraph {
            score: score_paragraph(&text, config),
            is_header: is_section_header(&text, config),
            text,
        })
        .collect()
}
