// Content Filter Module
// Selects the risk-bearing paragraphs of a policy document and reassembles them
// into a single filtered text for the extraction oracle

use tracing::{debug, info, warn};

use super::scoring::{score_paragraphs, ScoredParagraph};
use super::FilterConfig;
use crate::models::{FilterResult, FilterStats};
use crate::services::text_processor::{char_len, preview, split_paragraphs};

/// Marker placed between retained paragraphs that were not adjacent in the source
pub const BLOCK_SEPARATOR: &str = "---";

/// Paragraphs of a document with their scores and the final selection mask
#[derive(Debug, Clone)]
pub struct ParagraphSelection {
    pub paragraphs: Vec<ScoredParagraph>,
    pub include: Vec<bool>,
    pub used_fallback: bool,
}

impl ParagraphSelection {
    pub fn selected_count(&self) -> usize {
        self.include.iter().filter(|&&inc| inc).count()
    }

    pub fn selected_texts(&self) -> impl Iterator<Item = &str> {
        self.paragraphs
            .iter()
            .zip(self.include.iter())
            .filter(|(_, &inc)| inc)
            .map(|(p, _)| p.text.as_str())
    }
}

/// Selection mask for one threshold.
///
/// A paragraph scoring at least `min_score` is selected together with
/// `context_window` neighbours on each side. A header is selected together
/// with the next `header_followthrough` paragraphs. The result is the union.
pub fn select_paragraphs(
    paragraphs: &[ScoredParagraph],
    min_score: f64,
    config: &FilterConfig,
) -> Vec<bool> {
    let n = paragraphs.len();
    let mut include = vec![false; n];

    for (i, para) in paragraphs.iter().enumerate() {
        if para.score >= min_score {
            let lo = i.saturating_sub(config.context_window);
            let hi = (i + config.context_window + 1).min(n);
            include[lo..hi].iter_mut().for_each(|inc| *inc = true);
        }

        if para.is_header {
            let hi = (i + config.header_followthrough + 1).min(n);
            include[i..hi].iter_mut().for_each(|inc| *inc = true);
        }
    }

    include
}

fn minimum_selection(total: usize, config: &FilterConfig) -> usize {
    let fraction = (total as f64 * config.fallback_min_fraction) as usize;
    config.fallback_min_paragraphs.max(fraction)
}

/// Segment, score and select paragraphs, retrying at the fallback threshold
/// when the first pass keeps too little of the document.
pub fn analyze_paragraphs(text: &str, min_score: f64, config: &FilterConfig) -> ParagraphSelection {
    let paragraphs = score_paragraphs(split_paragraphs(text, config.min_paragraph_chars), config);
    let mut include = select_paragraphs(&paragraphs, min_score, config);
    let mut used_fallback = false;

    let selected = include.iter().filter(|&&inc| inc).count();
    let floor = minimum_selection(paragraphs.len(), config);
    if !paragraphs.is_empty() && selected < floor {
        let retry_threshold = config.fallback_min_score.min(min_score);
        warn!(
            "[content_filter] Only {} of {} paragraphs selected (minimum {}), retrying at threshold {}",
            selected,
            paragraphs.len(),
            floor,
            retry_threshold
        );
        include = select_paragraphs(&paragraphs, retry_threshold, config);
        used_fallback = true;
    }

    for (i, (para, inc)) in paragraphs.iter().zip(include.iter()).enumerate() {
        debug!(
            "[content_filter] P{:04} score={:.2} header={} selected={} {}",
            i,
            para.score,
            para.is_header,
            inc,
            preview(&para.text, 60)
        );
    }

    ParagraphSelection {
        paragraphs,
        include,
        used_fallback,
    }
}

/// Join retained paragraphs in source order. Runs separated by a gap of
/// dropped paragraphs get a `---` marker between them.
fn reassemble(selection: &ParagraphSelection) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut prev_included = false;

    for (para, &inc) in selection.paragraphs.iter().zip(selection.include.iter()) {
        if inc {
            if !parts.is_empty() && !prev_included {
                parts.push(BLOCK_SEPARATOR);
            }
            parts.push(&para.text);
        }
        prev_included = inc;
    }

    parts.join("\n\n")
}

fn reduction_pct(filtered_chars: usize, total_chars: usize) -> f64 {
    let ratio = 1.0 - filtered_chars as f64 / total_chars.max(1) as f64;
    (ratio * 1000.0).round() / 10.0
}

/// Filter `text` at the configured `min_score`
pub fn extract_relevant_text(text: &str, config: &FilterConfig) -> FilterResult {
    extract_relevant_text_with_threshold(text, config.min_score, config)
}

/// Filter `text`, keeping only paragraphs likely to hold exclusions,
/// waiting periods, co-payments or limits, plus their context.
pub fn extract_relevant_text_with_threshold(
    text: &str,
    min_score: f64,
    config: &FilterConfig,
) -> FilterResult {
    let total_chars = char_len(text);
    let selection = analyze_paragraphs(text, min_score, config);
    let total_paragraphs = selection.paragraphs.len();

    if total_paragraphs == 0 {
        info!("[content_filter] No paragraphs found in {} chars of text", total_chars);
        return FilterResult {
            text: text.to_string(),
            stats: FilterStats {
                total_paragraphs: 0,
                selected_paragraphs: 0,
                total_chars,
                filtered_chars: total_chars,
                reduction_pct: 0.0,
            },
            used_fallback: false,
        };
    }

    let selected_paragraphs = selection.selected_count();
    let mut filtered = reassemble(&selection);

    // Rejoining list items with blank lines can outgrow the source. Only hand
    // the source back when nothing was dropped.
    if selected_paragraphs == total_paragraphs && char_len(&filtered) >= total_chars {
        filtered = text.to_string();
    }
    let filtered_chars = char_len(&filtered);

    let stats = FilterStats {
        total_paragraphs,
        selected_paragraphs,
        total_chars,
        filtered_chars,
        reduction_pct: reduction_pct(filtered_chars, total_chars),
    };

    info!(
        "[content_filter] Final: {} -> {} paragraphs, {} -> {} chars ({}% reduction{})",
        stats.total_paragraphs,
        stats.selected_paragraphs,
        stats.total_chars,
        stats.filtered_chars,
        stats.reduction_pct,
        if selection.used_fallback { ", fallback threshold" } else { "" }
    );

    FilterResult {
        text: filtered,
        stats,
        used_fallback: selection.used_fallback,
    }
}
