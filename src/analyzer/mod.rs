//! Draft-entity analyzer
//!
//! Proposes and creates draft related records for a source record:
//! - `models` — suggestions and the per-run report
//! - `parse` — all-or-nothing suggestion batch parsing
//! - `prompts` — kind-specific prompt construction
//! - `manager` — the analyzer itself

pub mod manager;
pub mod models;
pub mod parse;
pub mod prompts;

pub use manager::{AnalyzerConfig, DraftAnalyzer, TRANSACTION_SUGGESTION_CONFIDENCE};
pub use models::{AnalysisOutcome, AnalysisReport, SuggestedEntity};
pub use parse::parse_suggestion_batch;
pub use prompts::{analysis_prompt, SourceDigest};
