// Extraction Module
// Boundary to the language model that reads filtered clauses:
// - oracle: prompt and model backend behind the ExtractionOracle trait
// - parser: JSON recovery, field coercion and result merge
// - decoder: one-or-two-call orchestration with per-call timeouts

pub mod oracle;
pub mod parser;
pub mod decoder;

pub use decoder::{PolicyDecoder, DEFAULT_CALL_TIMEOUT, MAX_SINGLE_CHARS};
pub use oracle::{build_extraction_prompt, ExtractionOracle, LlmOracle};
pub use parser::{extract_json, merge_results, parse_extraction};
