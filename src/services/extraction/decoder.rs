// Policy Decoder
// Runs one or two oracle calls over filtered policy text and merges what comes back

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::oracle::{build_extraction_prompt, ExtractionOracle};
use super::parser::{merge_results, parse_extraction};
use crate::models::PolicyFacts;
use crate::services::text_processor::{char_len, preview, split_near_midpoint};

/// Above this many characters the text is split across two calls
pub const MAX_SINGLE_CHARS: usize = 6000;
pub const PARAGRAPH_SPLIT_WINDOW: usize = 500;
pub const LINE_SPLIT_WINDOW: usize = 200;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(180);

pub struct PolicyDecoder<O> {
    oracle: O,
    max_single_chars: usize,
    call_timeout: Duration,
}

impl<O: ExtractionOracle> PolicyDecoder<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            max_single_chars: MAX_SINGLE_CHARS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_limits(mut self, max_single_chars: usize, call_timeout: Duration) -> Self {
        self.max_single_chars = max_single_chars;
        self.call_timeout = call_timeout;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Structured facts for the filtered text, or `None` when no call produced
    /// a usable result. Two-call results are merged without deduplication.
    pub async fn decode(&self, filtered_text: &str) -> Option<PolicyFacts> {
        let text = filtered_text.trim();
        if text.is_empty() {
            debug!("[policy_decoder] Empty input, skipping oracle");
            return None;
        }

        let started = Instant::now();
        let len = char_len(text);

        let result = if len <= self.max_single_chars {
            self.extract_part("single", text).await
        } else {
            let (part_a, part_b) = split_near_midpoint(text, PARAGRAPH_SPLIT_WINDOW, LINE_SPLIT_WINDOW);
            info!(
                "[policy_decoder] Text too long ({} chars), splitting into 2 calls ({} + {})",
                len,
                char_len(part_a),
                char_len(part_b)
            );
            let (a, b) = tokio::join!(
                self.extract_part("part_a", part_a),
                self.extract_part("part_b", part_b)
            );
            merge_results([a, b])
        };

        match &result {
            Some(facts) => info!(
                "[policy_decoder] Extracted score={} exclusions={} waiting={} copay={} limits={} alerts={} elapsed_ms={}",
                facts.risk_score,
                facts.exclusions.len(),
                facts.waiting_periods.len(),
                facts.co_payment.len(),
                facts.hidden_limits.len(),
                facts.danger_alerts.len(),
                started.elapsed().as_millis()
            ),
            None => warn!("[policy_decoder] No extractable data from any oracle call"),
        }

        result
    }

    // One bounded oracle call; any failure yields None.
    async fn extract_part(&self, label: &str, text: &str) -> Option<PolicyFacts> {
        if text.is_empty() {
            return None;
        }

        let prompt = build_extraction_prompt(text);
        match tokio::time::timeout(self.call_timeout, self.oracle.complete(&prompt)).await {
            Ok(Ok(raw)) => {
                let parsed = parse_extraction(&raw);
                if parsed.is_none() {
                    warn!("[policy_decoder] {}: no JSON object in oracle output", label);
                    debug!("[policy_decoder] {} raw preview: {}", label, preview(&raw, 400));
                }
                parsed
            }
            Ok(Err(e)) => {
                warn!("[policy_decoder] {}: oracle call failed: {}", label, e);
                None
            }
            Err(_) => {
                warn!(
                    "[policy_decoder] {}: oracle call timed out ({}s)",
                    label,
                    self.call_timeout.as_secs_f64()
                );
                None
            }
        }
    }
}
