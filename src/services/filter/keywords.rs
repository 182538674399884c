// Keyword Tables
// Risk-signal vocabulary for paragraph scoring and section-title patterns for header detection

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordGroupKind {
    Exclusions,
    WaitingPeriods,
    Copay,
    SubLimits,
    RiskSignals,
}

pub struct KeywordGroup {
    pub kind: KeywordGroupKind,
    pub keywords: &'static [&'static str],
}

pub const KEYWORD_GROUPS: [KeywordGroup; 5] = [
    KeywordGroup {
        kind: KeywordGroupKind::Exclusions,
        keywords: &[
            "not covered", "not payable", "not admissible", "not entitled",
            "excluded", "exclusion", "exclusions", "shall not be liable",
            "shall not cover", "will not cover", "does not cover",
            "no benefit", "no claim", "no coverage", "outside the scope",
            "beyond the scope", "expressly excluded", "specifically excluded",
        ],
    },
    KeywordGroup {
        kind: KeywordGroupKind::WaitingPeriods,
        keywords: &[
            "waiting period", "waiting periods", "initial waiting",
            "specific illness", "pre-existing disease waiting",
            "ped waiting", "30-day waiting", "30 day waiting",
            "first 30 days", "first year", "first two years",
            "first 2 years", "first 4 years", "moratorium",
            "cooling period", "qualifying period",
        ],
    },
    KeywordGroup {
        kind: KeywordGroupKind::Copay,
        keywords: &[
            "co-payment", "co payment", "copayment", "copay", "co-pay",
            "deductible", "you shall bear", "insured shall bear",
            "policyholder shall pay", "out of pocket", "your share",
            "proportionate deduction",
        ],
    },
    KeywordGroup {
        kind: KeywordGroupKind::SubLimits,
        keywords: &[
            "sub-limit", "sub limit", "sublimit", "capped at", "cap of",
            "maximum payable", "maximum benefit", "maximum liability",
            "not exceed", "shall not exceed", "up to a maximum",
            "room rent", "room charge", "icu charges", "icu limit",
            "day care", "ambulance charge", "organ donor",
            "ayurvedic", "homeopathic", "dental limit",
            "maternity limit", "newborn limit",
        ],
    },
    KeywordGroup {
        kind: KeywordGroupKind::RiskSignals,
        keywords: &[
            "shall not", "will not", "is not", "are not", "cannot",
            "liable", "liability", "obligation",
            "clause", "condition", "provision", "exception",
            "herein", "notwithstanding", "irrespective",
            "subject to", "provided that", "provided however",
            "in no event", "under no circumstances",
        ],
    },
];

/// Section titles that introduce a block worth keeping even without keywords.
pub const SECTION_HEADER_PATTERNS: &[&str] = &[
    r"exclusion", r"not covered", r"what (is|are) not",
    r"waiting period", r"waiting clause",
    r"co.?pay", r"co.?payment", r"deductible",
    r"sub.?limit", r"coverage limit", r"benefit limit",
    r"general condition", r"special condition", r"important condition",
    r"terms and condition", r"definitions", r"interpretation",
    r"claim procedure", r"claim process",
];

pub(crate) struct CompiledKeyword {
    pub phrase: &'static str,
    pub whole_word: Regex,
}

pub(crate) struct CompiledGroup {
    pub kind: KeywordGroupKind,
    pub keywords: Vec<CompiledKeyword>,
}

/// Keyword groups with a whole-word matcher per phrase, built once per process.
pub(crate) fn compiled_groups() -> &'static [CompiledGroup] {
    static GROUPS: OnceLock<Vec<CompiledGroup>> = OnceLock::new();
    GROUPS.get_or_init(|| {
        KEYWORD_GROUPS
            .iter()
            .map(|group| CompiledGroup {
                kind: group.kind,
                keywords: group
                    .keywords
                    .iter()
                    .map(|&phrase| CompiledKeyword {
                        phrase,
                        whole_word: Regex::new(&format!(r"\b{}\b", regex::escape(phrase)))
                            .expect("keyword regex"),
                    })
                    .collect(),
            })
            .collect()
    })
}

pub(crate) fn section_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = SECTION_HEADER_PATTERNS
            .iter()
            .map(|p| format!("(?:{})", p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation).expect("section header regex")
    })
}

// "Section 4", "Clause IX", "Part ii", ... matched against lowercased text
pub(crate) fn structural_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(section|clause|article|schedule|part)\s+[\dIVXivx]+")
            .expect("structural marker regex")
    })
}
