// Policy Decoder Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod document;
pub mod filter;
pub mod extraction;
pub mod risk;
pub mod pipeline;

pub use text_processor::*;
pub use config_store::*;
pub use providers::*;

pub use document::{load_document_text, DocumentError, DocumentKind, MIN_DOCUMENT_CHARS};
pub use extraction::{ExtractionOracle, LlmOracle, PolicyDecoder};
pub use filter::{extract_relevant_text, extract_relevant_text_with_threshold, FilterConfig};
pub use pipeline::{DecodedPolicy, PipelineError, PolicyPipeline};
pub use risk::{calculate_risk_score, derive_policy_profile, format_inr, RiskParameters};
